use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use report_card_core::OutputFormat;
use serde::Deserialize;

/// Tool defaults layered from an optional settings file and `REPORT_CARD_*` variables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Project directory that check paths are resolved against.
    pub root: Option<PathBuf>,
    /// Report card configuration file.
    pub config: Option<PathBuf>,
    /// `human` or `json`.
    pub format: Option<String>,
}

impl Settings {
    const ENV_PREFIX: &'static str = "REPORT_CARD";

    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix(Self::ENV_PREFIX))
            .build()
            .context("failed to load report-card settings")?
            .try_deserialize()
            .context("invalid report-card settings")
    }

    pub fn output_format(&self) -> Result<Option<OutputFormat>> {
        match self.format.as_deref() {
            None => Ok(None),
            Some(name) => match OutputFormat::from_name(name) {
                Some(format) => Ok(Some(format)),
                None => bail!("unsupported output format `{name}` (expected human or json)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_env() {
        env::remove_var("REPORT_CARD_ROOT");
        env::remove_var("REPORT_CARD_CONFIG");
        env::remove_var("REPORT_CARD_FORMAT");
    }

    #[test]
    fn defaults_are_empty() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output_format().unwrap(), None);
    }

    #[test]
    fn reads_file_and_environment() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(file.path(), "root = \"project\"\nformat = \"human\"\n").unwrap();
        env::set_var("REPORT_CARD_FORMAT", "json");

        let settings = Settings::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(settings.root, Some(PathBuf::from("project")));
        assert_eq!(settings.output_format().unwrap(), Some(OutputFormat::Json));
    }

    #[test]
    fn rejects_unknown_format() {
        let settings = Settings {
            format: Some("xml".into()),
            ..Settings::default()
        };
        let err = settings.output_format().expect_err("xml is not supported");
        assert!(err.to_string().contains("xml"));
    }
}
