use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};

pub const INCLUDE_COLLECTIONS_KEY: &str = "EDM:INPUT_INCLUDE_COLLECTIONS";
pub const EXCLUDE_COLLECTIONS_KEY: &str = "EDM:INPUT_EXCLUDE_COLLECTIONS";
pub const RUN_FOREVER_KEY: &str = "EDM:RUN_FOREVER";
pub const PRINT_TYPE_TABLE_KEY: &str = "EDM:PRINT_TYPE_TABLE";
pub const HEADER_COLLECTION_KEY: &str = "EDM:HEADER_COLLECTION";

pub const DEFAULT_HEADER_COLLECTION: &str = "EventHeader";

/// Opaque key-value parameter lookup.
///
/// The source only asks for the keys above; anything else the host keeps is
/// ignored.
pub trait ParameterSource {
    fn get_parameter(&self, key: &str) -> Option<String>;
}

impl ParameterSource for HashMap<String, String> {
    fn get_parameter(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ParameterSource for BTreeMap<String, String> {
    fn get_parameter(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ParameterSource for toml::Table {
    fn get_parameter(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Array(items) => Some(
                items
                    .iter()
                    .map(|v| match v {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => Some(other.to_string()),
        }
    }
}

/// Settings for one event source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// When non-empty, only these collections (names or `*` globs) are read.
    pub include_collections: Vec<String>,
    /// Collections never read. Applied after the include list.
    pub exclude_collections: Vec<String>,
    /// Start over at the first event instead of ending the stream.
    pub recycle_forever: bool,
    /// Log the collection table when the file is opened.
    pub print_collection_table: bool,
    /// Collection holding the run and event numbers.
    pub header_collection: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            include_collections: Vec::new(),
            exclude_collections: Vec::new(),
            recycle_forever: false,
            print_collection_table: false,
            header_collection: DEFAULT_HEADER_COLLECTION.to_string(),
        }
    }
}

impl SourceConfig {
    /// Read settings from a parameter source, falling back to defaults for
    /// missing keys.
    pub fn from_parameters(params: &dyn ParameterSource) -> SourceResult<Self> {
        let mut config = Self::default();
        if let Some(value) = params.get_parameter(INCLUDE_COLLECTIONS_KEY) {
            config.include_collections = parse_list(&value);
        }
        if let Some(value) = params.get_parameter(EXCLUDE_COLLECTIONS_KEY) {
            config.exclude_collections = parse_list(&value);
        }
        if let Some(value) = params.get_parameter(RUN_FOREVER_KEY) {
            config.recycle_forever = parse_bool(RUN_FOREVER_KEY, &value)?;
        }
        if let Some(value) = params.get_parameter(PRINT_TYPE_TABLE_KEY) {
            config.print_collection_table = parse_bool(PRINT_TYPE_TABLE_KEY, &value)?;
        }
        if let Some(value) = params.get_parameter(HEADER_COLLECTION_KEY) {
            let value = value.trim();
            if !value.is_empty() {
                config.header_collection = value.to_string();
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> SourceResult<Self> {
        let mut config: Self =
            toml::from_str(s).map_err(|e| SourceError::Config(e.to_string()))?;
        config.include_collections = normalize(config.include_collections);
        config.exclude_collections = normalize(config.exclude_collections);
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_collections = normalize(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_collections = normalize(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_recycle(mut self, recycle: bool) -> Self {
        self.recycle_forever = recycle;
        self
    }

    pub fn with_print_table(mut self, print: bool) -> Self {
        self.print_collection_table = print;
        self
    }

    pub fn with_header_collection(mut self, name: impl Into<String>) -> Self {
        self.header_collection = name.into();
        self
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a boolean parameter.
pub fn parse_bool(key: &str, value: &str) -> SourceResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SourceError::Config(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

fn normalize(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
