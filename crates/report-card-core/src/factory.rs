//! Construction of concrete checks from a type tag and a loosely typed config mapping.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::checks::{
    BaseImageWhitelist, Check, DependencyBlacklist, FileExists, FileHasString, FileHash,
    FileIsValidJson, FileMatchesJsonSchema, HashAlgorithm,
};
use crate::config::CheckSpec;

/// Operator errors found while turning a [`CheckSpec`] into a [`Check`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("check `{check}` is missing required field `{field}`")]
    MissingField { check: String, field: &'static str },
    #[error("check `{check}` field `{field}` must be {expected}")]
    InvalidField {
        check: String,
        field: &'static str,
        expected: &'static str,
    },
    #[error("check `{check}` field `{field}` is invalid: {message}")]
    InvalidValue {
        check: String,
        field: &'static str,
        message: String,
    },
}

/// Field keys written by configuration files that use the legacy tag names.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("path", "Path"),
    ("expected-hash", "Hash"),
    ("substring", "String"),
    ("schema-path", "SchemaPath"),
    ("blacklist", "Blacklist"),
    ("whitelist", "Whitelist"),
];

/// Validated, field-level access to one check's configuration mapping.
pub struct ConfigFields<'a> {
    check: &'a str,
    values: &'a Map<String, Value>,
    legacy_keys: bool,
}

impl<'a> ConfigFields<'a> {
    pub fn new(check: &'a str, values: &'a Map<String, Value>) -> Self {
        Self {
            check,
            values,
            legacy_keys: false,
        }
    }

    /// Also accept the capitalised key of each field when the canonical key is absent.
    fn with_legacy_keys(mut self) -> Self {
        self.legacy_keys = true;
        self
    }

    fn lookup(&self, field: &'static str) -> Option<&'a Value> {
        if let Some(value) = self.values.get(field) {
            return Some(value);
        }
        if !self.legacy_keys {
            return None;
        }
        LEGACY_KEYS
            .iter()
            .find(|(canonical, _)| *canonical == field)
            .and_then(|(_, legacy)| self.values.get(*legacy))
    }

    pub fn string(&self, field: &'static str) -> Result<String, ConfigError> {
        self.optional_string(field)?
            .ok_or_else(|| ConfigError::MissingField {
                check: self.check.to_string(),
                field,
            })
    }

    pub fn optional_string(&self, field: &'static str) -> Result<Option<String>, ConfigError> {
        match self.lookup(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    pub fn string_list(&self, field: &'static str) -> Result<Vec<String>, ConfigError> {
        let items = match self.lookup(field) {
            None | Some(Value::Null) => {
                return Err(ConfigError::MissingField {
                    check: self.check.to_string(),
                    field,
                })
            }
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.invalid(field, "a list of strings")),
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(value) => Ok(value.clone()),
                _ => Err(self.invalid(field, "a list of strings")),
            })
            .collect()
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidField {
            check: self.check.to_string(),
            field,
            expected,
        }
    }

    fn invalid_value(&self, field: &'static str, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            check: self.check.to_string(),
            field,
            message: message.into(),
        }
    }
}

type CheckBuilder = fn(&ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError>;

/// Registry entry describing one built-in check type.
struct CheckType {
    tag: &'static str,
    /// Tags accepted for compatibility with older configuration files.
    aliases: &'static [&'static str],
    /// Config keys; a trailing `?` marks an optional key.
    fields: &'static [&'static str],
    build: CheckBuilder,
}

/// Serializable summary of a registered check type.
#[derive(Debug, Clone, Serialize)]
pub struct CheckTypeInfo {
    pub tag: &'static str,
    pub aliases: &'static [&'static str],
    pub fields: &'static [&'static str],
}

fn build_file_exists(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    Ok(Box::new(FileExists {
        path: fields.string("path")?.into(),
    }))
}

fn build_file_hash(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    let algorithm = match fields.optional_string("algorithm")? {
        None => HashAlgorithm::default(),
        Some(name) => HashAlgorithm::from_name(&name).ok_or_else(|| {
            fields.invalid_value("algorithm", format!("unsupported hash algorithm `{name}`"))
        })?,
    };
    Ok(Box::new(FileHash {
        path: fields.string("path")?.into(),
        expected: fields.string("expected-hash")?,
        algorithm,
    }))
}

fn build_file_has_string(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    let check = FileHasString::new(fields.string("path")?, fields.string("substring")?)
        .map_err(|err| fields.invalid_value("substring", err.to_string()))?;
    Ok(Box::new(check))
}

fn build_file_is_valid_json(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    Ok(Box::new(FileIsValidJson {
        path: fields.string("path")?.into(),
    }))
}

fn build_file_matches_json_schema(
    fields: &ConfigFields<'_>,
) -> Result<Box<dyn Check>, ConfigError> {
    Ok(Box::new(FileMatchesJsonSchema {
        path: fields.string("path")?.into(),
        schema_path: fields.string("schema-path")?.into(),
    }))
}

fn build_dependency_blacklist(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    let mut check = DependencyBlacklist::new(fields.string_list("blacklist")?);
    if let Some(path) = fields.optional_string("path")? {
        check.manifest = path.into();
    }
    Ok(Box::new(check))
}

fn build_base_image_whitelist(fields: &ConfigFields<'_>) -> Result<Box<dyn Check>, ConfigError> {
    let mut check = BaseImageWhitelist::new(fields.string_list("whitelist")?);
    if let Some(path) = fields.optional_string("path")? {
        check.container_file = path.into();
    }
    Ok(Box::new(check))
}

static CHECK_TYPES: &[CheckType] = &[
    CheckType {
        tag: "FileExists",
        aliases: &["CheckFileExists"],
        fields: &["path"],
        build: build_file_exists,
    },
    CheckType {
        tag: "FileHash",
        aliases: &["CheckFileMD5"],
        fields: &["path", "expected-hash", "algorithm?"],
        build: build_file_hash,
    },
    CheckType {
        tag: "FileHasString",
        aliases: &["CheckFileHasString"],
        fields: &["path", "substring"],
        build: build_file_has_string,
    },
    CheckType {
        tag: "FileIsValidJSON",
        aliases: &["CheckFileIsValidJSON"],
        fields: &["path"],
        build: build_file_is_valid_json,
    },
    CheckType {
        tag: "FileMatchesJSONSchema",
        aliases: &["CheckFileHasJSONSchema"],
        fields: &["path", "schema-path"],
        build: build_file_matches_json_schema,
    },
    CheckType {
        tag: "DependencyBlacklist",
        aliases: &["CheckNodeDependencies"],
        fields: &["blacklist", "path?"],
        build: build_dependency_blacklist,
    },
    CheckType {
        tag: "BaseImageWhitelist",
        aliases: &["CheckDockerBaseImage"],
        fields: &["whitelist", "path?"],
        build: build_base_image_whitelist,
    },
];

static REGISTRY: Lazy<BTreeMap<&'static str, &'static CheckType>> = Lazy::new(|| {
    let mut registry = BTreeMap::new();
    for check_type in CHECK_TYPES {
        registry.insert(check_type.tag, check_type);
        for alias in check_type.aliases {
            registry.insert(*alias, check_type);
        }
    }
    registry
});

/// Canonical descriptions of every built-in check type, in declaration order.
pub fn known_types() -> Vec<CheckTypeInfo> {
    CHECK_TYPES
        .iter()
        .map(|check_type| CheckTypeInfo {
            tag: check_type.tag,
            aliases: check_type.aliases,
            fields: check_type.fields,
        })
        .collect()
}

/// Build the check described by `spec`.
///
/// Returns `Ok(None)` when the type tag is not registered so the caller can skip it.
pub fn build_check(name: &str, spec: &CheckSpec) -> Result<Option<Box<dyn Check>>, ConfigError> {
    let Some(check_type) = REGISTRY.get(spec.kind.as_str()) else {
        return Ok(None);
    };
    let mut fields = ConfigFields::new(name, &spec.config);
    if spec.kind != check_type.tag {
        fields = fields.with_legacy_keys();
    }
    (check_type.build)(&fields).map(Some)
}
