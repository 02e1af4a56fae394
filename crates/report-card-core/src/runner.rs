use std::{collections::BTreeMap, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::checks::{Check, CheckContext, CheckError};
use crate::config::ReportCardConfig;
use crate::factory::{build_check, ConfigError};
use crate::score::ReportCard;

/// Conditions that abort a whole run without producing a report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("check `{name}` could not be executed")]
    Check {
        name: String,
        #[source]
        source: CheckError,
    },
}

/// Executes configured checks sequentially against a project directory.
#[derive(Debug, Clone)]
pub struct Runner {
    root: PathBuf,
}

impl Runner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Construct every recognised check. Unknown type tags are logged and left out.
    pub fn plan(
        &self,
        config: &ReportCardConfig,
    ) -> Result<Vec<(String, Box<dyn Check>)>, RunError> {
        let mut planned = Vec::with_capacity(config.checks.len());
        for (name, spec) in &config.checks {
            match build_check(name, spec)? {
                Some(check) => planned.push((name.clone(), check)),
                None => {
                    warn!(check = %name, kind = %spec.kind, "skipping check with unknown type")
                }
            }
        }
        Ok(planned)
    }

    /// Run all checks in name order and score the results.
    ///
    /// Configuration errors surface before any check touches the filesystem; the first
    /// execution error stops the run.
    #[instrument(
        name = "run_checks",
        skip(self, config),
        fields(root = %self.root.display(), checks = config.checks.len())
    )]
    pub fn run(&self, config: &ReportCardConfig) -> Result<ReportCard, RunError> {
        let planned = self.plan(config)?;
        let ctx = CheckContext::new(&self.root);

        let mut results = BTreeMap::new();
        for (name, check) in planned {
            let result = check.execute(&ctx).map_err(|source| RunError::Check {
                name: name.clone(),
                source,
            })?;
            debug!(check = %name, outcome = %result.outcome, "check executed");
            results.insert(name, result);
        }

        let card = ReportCard::from_results(results);
        info!(
            score = card.score,
            failures = card.failures(),
            warnings = card.warnings(),
            "report card complete"
        );
        Ok(card)
    }
}
