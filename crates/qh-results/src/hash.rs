//! Content-based hashing for run IDs.

use qh_project::Scenario;
use sha2::{Digest, Sha256};

use crate::types::ResultKind;

pub fn compute_run_id(scenario: &Scenario, kind: &ResultKind, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let scenario_json = serde_json::to_string(scenario).unwrap_or_default();
    hasher.update(scenario_json.as_bytes());

    let kind_json = serde_json::to_string(kind).unwrap_or_default();
    hasher.update(kind_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    format!("{:x}", hasher.finalize())
}
