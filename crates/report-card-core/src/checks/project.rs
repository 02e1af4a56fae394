//! Checks over project metadata files: the dependency manifest and the container definition.

use std::path::PathBuf;

use serde_json::{Map, Value};

use super::{read_target, Check, CheckContext, CheckError, CheckResult};

pub const DEFAULT_MANIFEST: &str = "package.json";
pub const DEFAULT_CONTAINER_FILE: &str = "Dockerfile";

const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];
const BASE_IMAGE_MARKER: &str = "FROM";

/// Fails when any denied package is declared in the manifest.
#[derive(Debug, Clone)]
pub struct DependencyBlacklist {
    pub manifest: PathBuf,
    pub blacklist: Vec<String>,
}

impl DependencyBlacklist {
    pub fn new(blacklist: Vec<String>) -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            blacklist,
        }
    }

    /// Blacklisted names declared in `manifest`, in section then blacklist order.
    fn find_denied(&self, manifest: &Map<String, Value>) -> Vec<&str> {
        let mut found: Vec<&str> = Vec::new();
        for section in DEPENDENCY_SECTIONS {
            let Some(deps) = manifest.get(section).and_then(Value::as_object) else {
                continue;
            };
            for denied in &self.blacklist {
                if deps.contains_key(denied) && !found.contains(&denied.as_str()) {
                    found.push(denied.as_str());
                }
            }
        }
        found
    }
}

impl Check for DependencyBlacklist {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let path = ctx.resolve(&self.manifest);
        let bytes = match read_target(&path)? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        let manifest: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|source| CheckError::Manifest { path, source })?;

        let found = self.find_denied(&manifest);
        if found.is_empty() {
            return Ok(CheckResult::success());
        }
        Ok(CheckResult::failure_with(format!(
            "found the following blacklisted packages: {}",
            found.join(",")
        )))
    }
}

/// Passes when the container definition builds from an allowed base image.
#[derive(Debug, Clone)]
pub struct BaseImageWhitelist {
    pub container_file: PathBuf,
    pub whitelist: Vec<String>,
}

impl BaseImageWhitelist {
    pub fn new(whitelist: Vec<String>) -> Self {
        Self {
            container_file: PathBuf::from(DEFAULT_CONTAINER_FILE),
            whitelist,
        }
    }
}

/// Base image named on the first line, if that line is a `FROM` instruction.
fn base_image(content: &str) -> Option<&str> {
    let first = content.split('\n').next().unwrap_or_default();
    first.strip_prefix(BASE_IMAGE_MARKER).map(str::trim)
}

impl Check for BaseImageWhitelist {
    fn execute(&self, ctx: &CheckContext<'_>) -> Result<CheckResult, CheckError> {
        let path = ctx.resolve(&self.container_file);
        let bytes = match read_target(&path)? {
            Ok(bytes) => bytes,
            Err(missing) => return Ok(missing),
        };
        let content = String::from_utf8_lossy(&bytes);
        let image = base_image(&content).ok_or(CheckError::BaseImage { path })?;

        if self.whitelist.iter().any(|allowed| allowed == image) {
            Ok(CheckResult::success())
        } else {
            Ok(CheckResult::failure_with(format!(
                "dockerfile uses base image not found in whitelist: {image}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::NO_SUCH_FILE;
    use std::{fs, path::Path};

    fn blacklist(items: &[&str]) -> DependencyBlacklist {
        DependencyBlacklist::new(items.iter().map(|s| s.to_string()).collect())
    }

    fn whitelist(items: &[&str]) -> BaseImageWhitelist {
        BaseImageWhitelist::new(items.iter().map(|s| s.to_string()).collect())
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn blacklisted_dependency_fails() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"dependencies":{"oauth":"1.0"}}"#,
        );
        let result = blacklist(&["oauth", "babel-cli"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(
            result,
            CheckResult::failure_with("found the following blacklisted packages: oauth")
        );
    }

    #[test]
    fn dev_dependencies_are_checked_and_reported_once() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{
                "dependencies": {"left-pad": "1", "express": "4"},
                "devDependencies": {"babel-cli": "6", "left-pad": "1"}
            }"#,
        );
        let result = blacklist(&["babel-cli", "left-pad"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(
            result.details.as_deref(),
            Some("found the following blacklisted packages: left-pad,babel-cli")
        );
    }

    #[test]
    fn clean_manifest_passes() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "package.json",
            r#"{"name":"app","dependencies":"not-a-map","devDependencies":{"jest":"29"}}"#,
        );
        let result = blacklist(&["oauth"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(result, CheckResult::success());
    }

    #[test]
    fn manifest_path_is_configurable() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("web")).unwrap();
        write(
            temp.path(),
            "web/package.json",
            r#"{"devDependencies":{"oauth":"1"}}"#,
        );
        let check = DependencyBlacklist {
            manifest: "web/package.json".into(),
            ..blacklist(&["oauth"])
        };
        let result = check.execute(&CheckContext::new(temp.path())).unwrap();
        assert!(result.is_failure());
    }

    #[test]
    fn missing_manifest_is_reported_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let result = blacklist(&["oauth"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(result, CheckResult::failure_with(NO_SUCH_FILE));
    }

    #[test]
    fn malformed_manifest_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "package.json", "{ nope");
        let err = blacklist(&["oauth"])
            .execute(&CheckContext::new(temp.path()))
            .expect_err("unparseable manifest aborts");
        assert!(matches!(err, CheckError::Manifest { .. }));
    }

    #[test]
    fn whitelisted_base_image_passes() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "Dockerfile", "FROM alpine\nRUN apk add curl\n");
        let result = whitelist(&["alpine", "golang:bar"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(result, CheckResult::success());
    }

    #[test]
    fn unlisted_base_image_fails_with_image_name() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "Dockerfile", "FROM   ubuntu:22.04\r\nRUN true\r\n");
        let result = whitelist(&["alpine"])
            .execute(&CheckContext::new(temp.path()))
            .unwrap();
        assert_eq!(
            result,
            CheckResult::failure_with(
                "dockerfile uses base image not found in whitelist: ubuntu:22.04"
            )
        );
    }

    #[test]
    fn missing_from_line_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "Dockerfile", "RUN apt-get update\nFROM alpine\n");
        let err = whitelist(&["alpine"])
            .execute(&CheckContext::new(temp.path()))
            .expect_err("base image cannot be determined");
        assert!(matches!(err, CheckError::BaseImage { .. }));
        assert!(err.to_string().contains("unable to determine base image"));
    }

    #[test]
    fn base_image_parsing() {
        assert_eq!(base_image("FROM alpine"), Some("alpine"));
        assert_eq!(base_image("FROM golang:1.22 \n"), Some("golang:1.22"));
        assert_eq!(base_image(""), None);
        assert_eq!(base_image(" FROM alpine"), None);
    }
}
