use qh_project::schema::*;
use qh_project::{LATEST_VERSION, load_json, load_yaml, save_json, save_yaml, validate_scenario};
use std::collections::BTreeMap;

fn small_scenario() -> Scenario {
    Scenario {
        version: LATEST_VERSION,
        name: "Roundtrip".to_string(),
        time_span_years: 30.0,
        sites: SitesDef::List {
            sites: vec![SiteDef {
                name: "a".to_string(),
                lat: 34.0,
                lon: -118.0,
                params: BTreeMap::from([("vs30".to_string(), 500.0)]),
            }],
        },
        sources: vec![SourceDef {
            name: "fault".to_string(),
            region: qh_model::TectonicRegion::ActiveShallowCrust,
            occurrence: qh_model::OccurrenceModel::Empirical,
            ruptures: vec![RuptureDef {
                magnitude: 6.2,
                rake: 90.0,
                probability: 0.03,
                surface: SurfaceDef::Gridded {
                    points: vec![[34.1, -118.0, 3.0], [34.2, -118.0, 3.0]],
                },
            }],
        }],
        gmm: GmmDef::default(),
        calc: qh_calc::CalcConfig {
            max_distance: 150.0,
            mag_dist_cutoff: Some(qh_calc::MagDistCutoff::usgs_default()),
            truncation: qh_model::Truncation::OneSided { level: 2.5 },
        },
        levels: vec![
            LevelsDef {
                imt: "PGA".to_string(),
                values: LevelValuesDef::Explicit(vec![0.01, 0.1, 1.0]),
            },
            LevelsDef {
                imt: "SA(1.0)".to_string(),
                values: LevelValuesDef::Sweep {
                    start: 0.01,
                    end: 2.0,
                    num_points: 12,
                    logarithmic: true,
                },
            },
        ],
        gmf: None,
        disagg: Some(DisaggDef {
            imt: "PGA".to_string(),
            target: DisaggTargetDef::Iml { value: 0.2 },
            bins: BinsDef {
                lat: vec![-1.0, 0.0, 1.0],
                lon: vec![-1.0, 0.0, 1.0],
                magnitude: vec![5.0, 6.0, 7.0],
                distance: vec![0.0, 50.0, 100.0],
                epsilon: vec![-2.0, 0.0, 2.0],
            },
        }),
    }
}

#[test]
fn roundtrip_yaml_scenario() {
    let scenario = small_scenario();
    validate_scenario(&scenario).unwrap();

    let path = std::env::temp_dir().join("qh_project_roundtrip.yaml");
    save_yaml(&path, &scenario).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(scenario, loaded);
}

#[test]
fn roundtrip_json_scenario() {
    let scenario = small_scenario();
    let path = std::env::temp_dir().join("qh_project_roundtrip.json");
    save_json(&path, &scenario).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(scenario, loaded);
}

#[test]
fn defaults_fill_sparse_yaml() {
    let yaml = r#"
version: 1
name: sparse
sites:
  type: grid
  min_lat: 0.0
  max_lat: 0.2
  min_lon: 0.0
  max_lon: 0.2
  spacing_deg: 0.1
"#;
    let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
    validate_scenario(&scenario).unwrap();
    assert_eq!(scenario.time_span_years, 50.0);
    assert_eq!(scenario.calc, qh_calc::CalcConfig::default());
    assert!(scenario.sources.is_empty());
    assert!(scenario.gmf.is_none());
}

#[test]
fn save_refuses_invalid_scenario() {
    let mut scenario = small_scenario();
    scenario.time_span_years = 0.0;
    let path = std::env::temp_dir().join("qh_project_invalid.yaml");
    assert!(save_yaml(&path, &scenario).is_err());
}
