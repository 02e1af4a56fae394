use std::fmt::Write;

use colored::Colorize;

use crate::checks::{CheckResult, Outcome};
use crate::score::ReportCard;

const RULE: &str =
    "================================================================================";

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Produce a report string from a `ReportCard` using the desired format.
pub fn render_report(card: &ReportCard, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(card),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(card)?),
    }
}

fn outcome_label(outcome: Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Success => outcome.as_str().green(),
        Outcome::Warning => outcome.as_str().yellow(),
        Outcome::Failure => outcome.as_str().red(),
    }
}

fn render_human(card: &ReportCard) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "{RULE}")?;
    writeln!(out, "{:^80}", "REPORT CARD")?;
    writeln!(out, "{RULE}")?;

    if card.results.is_empty() {
        writeln!(out, "No checks were run.")?;
    }
    // BTreeMap iteration is already sorted by check name.
    for (name, result) in &card.results {
        writeln!(out, "{}\t{}", outcome_label(result.outcome), name)?;
        if let Some(details) = visible_details(result) {
            writeln!(out, "       \t-> {}", sanitize_details(details))?;
        }
    }

    writeln!(out)?;
    let score = format!("{:.0}%", card.score);
    let failures = format!("{} failures", card.failures());
    let warnings = format!("{} warnings", card.warnings());
    writeln!(
        out,
        "{}  {}, {}",
        score.cyan(),
        failures.red(),
        warnings.yellow()
    )?;
    Ok(out)
}

fn visible_details(result: &CheckResult) -> Option<&str> {
    match result.outcome {
        Outcome::Success => None,
        Outcome::Warning | Outcome::Failure => result
            .details
            .as_deref()
            .filter(|details| !details.trim().is_empty()),
    }
}

fn sanitize_details(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}
