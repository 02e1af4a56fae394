use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file;
pub mod project;

pub use file::{
    FileExists, FileHasString, FileHash, FileIsValidJson, FileMatchesJsonSchema, HashAlgorithm,
};
pub use project::{BaseImageWhitelist, DependencyBlacklist};

/// Detail attached to failures whose target artifact does not exist.
pub const NO_SUCH_FILE: &str = "no such file";

/// Classification of a single check execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    /// Reserved; none of the built-in checks produce it.
    Warning,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value produced exactly once per check execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CheckResult {
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            details: None,
        }
    }

    /// Bare failure without a human-readable explanation.
    pub fn failure() -> Self {
        Self {
            outcome: Outcome::Failure,
            details: None,
        }
    }

    pub fn failure_with(details: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure,
            details: Some(details.into()),
        }
    }

    pub fn warning(details: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Warning,
            details: Some(details.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }
}

/// Execution environment handed to every check.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Directory that relative target paths are resolved against.
    pub root: &'a Path,
}

impl<'a> CheckContext<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Resolve a configured path against the working root. Absolute paths are kept as-is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// A constructed, self-contained validation rule.
///
/// Implementations own every field they need and hold no shared mutable state,
/// so executing the same instance twice against unchanged files yields the same result.
pub trait Check: Send + Sync {
    /// Evaluate the rule. Conditions the rule can describe become a [`CheckResult`];
    /// anything else is a [`CheckError`] that aborts the whole run.
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError>;
}

/// Fatal conditions raised while executing a check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dependency manifest {} is not valid JSON: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema validation of {} could not run: {message}", path.display())]
    Schema { path: PathBuf, message: String },
    #[error("unable to determine base image from {}", path.display())]
    BaseImage { path: PathBuf },
}

impl CheckError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read a target file, mapping absence to a reportable failure.
///
/// `Ok(Err(result))` carries the failure to report when the file does not exist.
pub(crate) fn read_target(path: &Path) -> Result<Result<Vec<u8>, CheckResult>, CheckError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Ok(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Ok(Err(CheckResult::failure_with(NO_SUCH_FILE)))
        }
        Err(err) => Err(CheckError::io(path, err)),
    }
}
