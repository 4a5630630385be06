//! Scenario validation logic.

use crate::LATEST_VERSION;
use crate::schema::{
    BinsDef, DisaggDef, DisaggTargetDef, GmfDef, GmmDef, LevelValuesDef, LevelsDef, ModelDef,
    RuptureDef, Scenario, SiteDef, SitesDef, SourceDef, SurfaceDef,
};
use qh_model::IntensityMeasure;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

type ValidationResult = Result<(), ValidationError>;

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn ensure_positive(field: impl Into<String>, value: f64) -> ValidationResult {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

pub fn validate_scenario(scenario: &Scenario) -> ValidationResult {
    if scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }
    ensure_positive("time_span_years", scenario.time_span_years)?;

    validate_sites(&scenario.sites)?;

    let mut source_names = HashSet::new();
    for source in &scenario.sources {
        if !source_names.insert(&source.name) {
            return Err(ValidationError::DuplicateId {
                id: source.name.clone(),
                context: "sources".to_string(),
            });
        }
        validate_source(source)?;
    }

    validate_gmm(&scenario.gmm)?;

    scenario
        .calc
        .validate()
        .map_err(|e| invalid("calc", &e, "invalid calculation settings"))?;

    let mut imts = HashSet::new();
    for levels in &scenario.levels {
        let imt = parse_imt(&levels.imt, "levels imt")?;
        if !imts.insert(imt.to_string()) {
            return Err(ValidationError::DuplicateId {
                id: levels.imt.clone(),
                context: "levels".to_string(),
            });
        }
        validate_levels(levels)?;
    }

    if let Some(gmf) = &scenario.gmf {
        validate_gmf(gmf)?;
    }
    if let Some(disagg) = &scenario.disagg {
        validate_disagg(disagg, &imts)?;
    }

    Ok(())
}

/// Parse an intensity-measure name, mapping failures to a validation error.
pub fn parse_imt(text: &str, field: &str) -> Result<IntensityMeasure, ValidationError> {
    text.parse()
        .map_err(|e: qh_model::ModelError| invalid(field, text, &e.to_string()))
}

fn validate_sites(sites: &SitesDef) -> ValidationResult {
    match sites {
        SitesDef::List { sites } => {
            if sites.is_empty() {
                return Err(invalid("sites", "[]", "at least one site is required"));
            }
            let mut names = HashSet::new();
            for site in sites {
                if !names.insert(&site.name) {
                    return Err(ValidationError::DuplicateId {
                        id: site.name.clone(),
                        context: "sites".to_string(),
                    });
                }
                validate_site(site)?;
            }
            Ok(())
        }
        SitesDef::Grid {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            spacing_deg,
            params,
        } => {
            validate_lat_lon("grid min", *min_lat, *min_lon)?;
            validate_lat_lon("grid max", *max_lat, *max_lon)?;
            if max_lat < min_lat || max_lon < min_lon {
                return Err(invalid(
                    "grid bounds",
                    format!("[{min_lat}, {max_lat}] x [{min_lon}, {max_lon}]"),
                    "max must not be below min",
                ));
            }
            ensure_positive("grid spacing_deg", *spacing_deg)?;
            for (key, value) in params {
                if !value.is_finite() {
                    return Err(invalid(format!("grid param '{key}'"), value, "must be finite"));
                }
            }
            Ok(())
        }
    }
}

fn validate_lat_lon(context: &str, lat: f64, lon: f64) -> ValidationResult {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) {
        return Err(invalid(format!("{context} lat"), lat, "must lie in [-90, 90]"));
    }
    if !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(invalid(format!("{context} lon"), lon, "must lie in [-180, 180]"));
    }
    Ok(())
}

fn validate_site(site: &SiteDef) -> ValidationResult {
    validate_lat_lon(&format!("site '{}'", site.name), site.lat, site.lon)?;
    for (key, value) in &site.params {
        if !value.is_finite() {
            return Err(invalid(
                format!("site '{}' param '{key}'", site.name),
                value,
                "must be finite",
            ));
        }
    }
    Ok(())
}

fn validate_source(source: &SourceDef) -> ValidationResult {
    for (i, rupture) in source.ruptures.iter().enumerate() {
        validate_rupture(&format!("source '{}' rupture {i}", source.name), rupture)?;
    }
    Ok(())
}

fn validate_rupture(context: &str, rupture: &RuptureDef) -> ValidationResult {
    if !rupture.magnitude.is_finite() {
        return Err(invalid(format!("{context} magnitude"), rupture.magnitude, "must be finite"));
    }
    if !(-180.0..=180.0).contains(&rupture.rake) {
        return Err(invalid(format!("{context} rake"), rupture.rake, "must lie in [-180, 180]"));
    }
    if !(0.0..=1.0).contains(&rupture.probability) {
        return Err(invalid(
            format!("{context} probability"),
            rupture.probability,
            "must lie in [0, 1]",
        ));
    }
    match &rupture.surface {
        SurfaceDef::Point { lat, lon, depth } => {
            validate_lat_lon(context, *lat, *lon)?;
            validate_depth(context, *depth)
        }
        SurfaceDef::Gridded { points } => {
            if points.is_empty() {
                return Err(invalid(
                    format!("{context} surface"),
                    "[]",
                    "a gridded surface needs at least one point",
                ));
            }
            for [lat, lon, depth] in points {
                validate_lat_lon(context, *lat, *lon)?;
                validate_depth(context, *depth)?;
            }
            Ok(())
        }
    }
}

fn validate_depth(context: &str, depth: f64) -> ValidationResult {
    if depth.is_finite() && depth >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{context} depth"), depth, "must be non-negative and finite"))
    }
}

fn validate_gmm(gmm: &GmmDef) -> ValidationResult {
    let models = gmm.model.iter().chain(gmm.by_region.values());
    for model in models {
        match model {
            ModelDef::Reference {
                reference_vs30,
                coefficients,
                ..
            } => {
                if let Some(vs30) = reference_vs30 {
                    ensure_positive("gmm reference_vs30", *vs30)?;
                }
                if coefficients.as_ref().is_some_and(|c| c.is_empty()) {
                    return Err(invalid(
                        "gmm coefficients",
                        "[]",
                        "a coefficient table needs at least one row",
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_levels(levels: &LevelsDef) -> ValidationResult {
    let field = format!("levels for {}", levels.imt);
    match &levels.values {
        LevelValuesDef::Explicit(values) => {
            if values.is_empty() {
                return Err(invalid(field, "[]", "at least one level is required"));
            }
            for &v in values {
                ensure_positive(field.clone(), v)?;
            }
            if values.windows(2).any(|w| w[1] <= w[0]) {
                return Err(invalid(field, format!("{values:?}"), "must be strictly increasing"));
            }
            Ok(())
        }
        LevelValuesDef::Sweep {
            start,
            end,
            num_points,
            ..
        } => {
            ensure_positive(field.clone(), *start)?;
            if !(end.is_finite() && end > start) {
                return Err(invalid(field, end, "sweep end must exceed start"));
            }
            if *num_points < 2 {
                return Err(invalid(field, num_points, "a sweep needs at least 2 points"));
            }
            Ok(())
        }
    }
}

fn validate_gmf(gmf: &GmfDef) -> ValidationResult {
    parse_imt(&gmf.imt, "gmf imt")?;
    validate_rupture("gmf rupture", &gmf.rupture)?;
    if gmf.realizations == 0 {
        return Err(invalid("gmf realizations", 0, "must be positive"));
    }
    if let Some(factor) = gmf.correlation.and_then(|c| c.truncation_factor) {
        ensure_positive("gmf correlation truncation_factor", factor)?;
    }
    gmf.truncation
        .validate()
        .map_err(|e| invalid("gmf truncation", &e, "invalid truncation"))
}

fn validate_disagg(disagg: &DisaggDef, level_imts: &HashSet<String>) -> ValidationResult {
    let imt = parse_imt(&disagg.imt, "disagg imt")?;
    match disagg.target {
        DisaggTargetDef::Iml { value } => ensure_positive("disagg target iml", value)?,
        DisaggTargetDef::Poe { value } => {
            if !(value > 0.0 && value < 1.0) {
                return Err(invalid("disagg target poe", value, "must lie in (0, 1)"));
            }
            if !level_imts.contains(&imt.to_string()) {
                return Err(ValidationError::MissingReference {
                    id: disagg.imt.clone(),
                    context: "levels (needed by a probability disaggregation target)"
                        .to_string(),
                });
            }
        }
    }
    validate_bins(&disagg.bins)
}

fn validate_bins(bins: &BinsDef) -> ValidationResult {
    let axes = [
        ("lat", &bins.lat),
        ("lon", &bins.lon),
        ("magnitude", &bins.magnitude),
        ("distance", &bins.distance),
        ("epsilon", &bins.epsilon),
    ];
    for (name, edges) in axes {
        let field = format!("disagg bins {name}");
        if edges.len() < 2 {
            return Err(invalid(field, format!("{edges:?}"), "at least two edges are required"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid(field, format!("{edges:?}"), "edges must be finite"));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid(field, format!("{edges:?}"), "edges must be strictly increasing"));
        }
    }
    Ok(())
}
