pub mod checks;
pub mod config;
pub mod factory;
pub mod report;
pub mod runner;
pub mod score;

pub use checks::{Check, CheckContext, CheckError, CheckResult, Outcome};
pub use config::{load_config, CheckSpec, ReportCardConfig};
pub use factory::{build_check, known_types, CheckTypeInfo, ConfigError};
pub use report::{render_report, OutputFormat};
pub use runner::{RunError, Runner};
pub use score::{compute_score, ReportCard};
