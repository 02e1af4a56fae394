use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declarative description of one check before construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Type tag selecting the check implementation.
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
    /// Per-type settings; keys are case-sensitive.
    #[serde(default, alias = "Config")]
    pub config: Map<String, Value>,
}

/// Parsed `report-card.yml` document.
///
/// Checks are keyed by name and kept sorted, which fixes the execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCardConfig {
    #[serde(default, alias = "Version")]
    pub version: String,
    #[serde(default, alias = "Checks")]
    pub checks: BTreeMap<String, CheckSpec>,
}

impl ReportCardConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("invalid report card configuration")
    }
}

/// Read and parse a report card configuration file (YAML or JSON).
pub fn load_config(path: &Path) -> Result<ReportCardConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read report card config at {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| {
        format!(
            "invalid YAML structure in report card config at {}",
            path.display()
        )
    })
}
