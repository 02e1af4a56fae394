//! Checks that inspect a single target file.

use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use aho_corasick::AhoCorasick;
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::trace;

use super::{read_target, Check, CheckContext, CheckError, CheckResult, NO_SUCH_FILE};

/// Passes when the path resolves to any existing filesystem entry.
#[derive(Debug, Clone)]
pub struct FileExists {
    pub path: PathBuf,
}

impl Check for FileExists {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let path = ctx.resolve(&self.path);
        match fs::metadata(&path) {
            Ok(_) => Ok(CheckResult::success()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(CheckResult::failure()),
            Err(err) => Err(CheckError::io(&path, err)),
        }
    }
}

/// Digest used by [`FileHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" | "sha-256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Lowercase hex digest of everything `reader` yields.
    fn hex_digest<R: Read>(self, reader: &mut R) -> io::Result<String> {
        match self {
            Self::Md5 => stream_digest::<Md5, R>(reader),
            Self::Sha256 => stream_digest::<Sha256, R>(reader),
        }
    }
}

fn stream_digest<D, R>(reader: &mut R) -> io::Result<String>
where
    D: Digest + Write,
    R: Read,
{
    let mut hasher = D::new();
    io::copy(reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compares the content digest of a file with an expected hex value.
#[derive(Debug, Clone)]
pub struct FileHash {
    pub path: PathBuf,
    pub expected: String,
    pub algorithm: HashAlgorithm,
}

impl Check for FileHash {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let path = ctx.resolve(&self.path);
        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(CheckResult::failure_with(NO_SUCH_FILE))
            }
            Err(err) => return Err(CheckError::io(&path, err)),
        };
        let actual = self
            .algorithm
            .hex_digest(&mut file)
            .map_err(|err| CheckError::io(&path, err))?;
        trace!(path = %self.path.display(), %actual, "computed file digest");
        if actual.eq_ignore_ascii_case(self.expected.trim()) {
            Ok(CheckResult::success())
        } else {
            Ok(CheckResult::failure_with(format!("actual hash was: {actual}")))
        }
    }
}

/// Passes when the file content contains a literal substring.
#[derive(Debug, Clone)]
pub struct FileHasString {
    path: PathBuf,
    matcher: AhoCorasick,
}

impl FileHasString {
    pub fn new(
        path: impl Into<PathBuf>,
        needle: impl AsRef<str>,
    ) -> Result<Self, aho_corasick::BuildError> {
        let matcher = AhoCorasick::new([needle.as_ref()])?;
        Ok(Self {
            path: path.into(),
            matcher,
        })
    }
}

impl Check for FileHasString {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let bytes = match read_target(&ctx.resolve(&self.path))? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        if self.matcher.is_match(bytes.as_slice()) {
            Ok(CheckResult::success())
        } else {
            Ok(CheckResult::failure())
        }
    }
}

/// Passes when the file parses as a JSON object.
#[derive(Debug, Clone)]
pub struct FileIsValidJson {
    pub path: PathBuf,
}

impl Check for FileIsValidJson {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let bytes = match read_target(&ctx.resolve(&self.path))? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(&bytes) {
            Ok(_) => Ok(CheckResult::success()),
            Err(_) => Ok(CheckResult::failure_with("file is not valid JSON")),
        }
    }
}

/// Validates a JSON document against a JSON Schema document.
#[derive(Debug, Clone)]
pub struct FileMatchesJsonSchema {
    pub path: PathBuf,
    pub schema_path: PathBuf,
}

impl FileMatchesJsonSchema {
    fn parse(path: PathBuf, bytes: &[u8]) -> Result<serde_json::Value, CheckError> {
        serde_json::from_slice(bytes).map_err(|err| CheckError::Schema {
            path,
            message: format!("not valid JSON: {err}"),
        })
    }
}

impl Check for FileMatchesJsonSchema {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let document_path = ctx.resolve(&self.path);
        let document_bytes = match read_target(&document_path)? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        let schema_path = ctx.resolve(&self.schema_path);
        let schema_bytes = match read_target(&schema_path)? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        let document = Self::parse(document_path, &document_bytes)?;
        let schema = Self::parse(schema_path.clone(), &schema_bytes)?;

        let validator = jsonschema::validator_for(&schema).map_err(|err| CheckError::Schema {
            path: schema_path,
            message: err.to_string(),
        })?;
        let violations: Vec<String> = validator
            .iter_errors(&document)
            .map(|err| err.to_string())
            .collect();
        if violations.is_empty() {
            Ok(CheckResult::success())
        } else {
            Ok(CheckResult::failure_with(violations.join(" | ")))
        }
    }
}
