use std::path::PathBuf;

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../apps/qh-cli/scenarios")
}

#[test]
fn bundled_scenarios_load_and_build() {
    for name in ["bay_demo.yaml"] {
        let path = scenario_dir().join(name);
        let scenario = qh_project::load(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display()));

        let sites = qh_project::build_sites(&scenario.sites).unwrap();
        assert_eq!(sites.len(), qh_project::site_labels(&scenario.sites).len());

        let forecast = qh_project::build_forecast(&scenario).unwrap();
        assert_eq!(
            qh_model::ForecastModel::num_sources(&forecast),
            scenario.sources.len()
        );

        qh_project::build_gmm(&scenario.gmm).unwrap();
        qh_project::build_calc_config(&scenario).unwrap();
        let requests = qh_project::build_curve_requests(&scenario).unwrap();
        assert_eq!(requests.len(), scenario.levels.len());

        if let Some(gmf) = &scenario.gmf {
            qh_project::build_gmf(gmf).unwrap();
        }
        if let Some(disagg) = &scenario.disagg {
            qh_project::build_bin_axes(&disagg.bins).unwrap();
            qh_project::build_disagg_target(&scenario, disagg).unwrap();
        }
    }
}
