use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::checks::{CheckResult, Outcome};

/// Aggregate of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCard {
    /// Percentage of checks that did not fail, rounded to a whole number (0–100).
    pub score: f64,
    pub results: BTreeMap<String, CheckResult>,
}

impl ReportCard {
    /// Derive the card from a complete result set.
    pub fn from_results(results: BTreeMap<String, CheckResult>) -> Self {
        Self {
            score: compute_score(&results),
            results,
        }
    }

    pub fn failures(&self) -> usize {
        count_outcome(&self.results, Outcome::Failure)
    }

    pub fn warnings(&self) -> usize {
        count_outcome(&self.results, Outcome::Warning)
    }
}

fn count_outcome(results: &BTreeMap<String, CheckResult>, outcome: Outcome) -> usize {
    results
        .values()
        .filter(|result| result.outcome == outcome)
        .count()
}

/// Share of non-failing results as a whole percentage.
///
/// Warnings do not lower the score. An empty result set scores 100.
pub fn compute_score(results: &BTreeMap<String, CheckResult>) -> f64 {
    if results.is_empty() {
        return 100.0;
    }
    let failures = count_outcome(results, Outcome::Failure) as f64;
    let total = results.len() as f64;
    (100.0 * (1.0 - failures / total)).round()
}
