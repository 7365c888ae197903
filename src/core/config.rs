

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::Result;
use crate::{DEFAULT_MAPPING_CACHE_SIZE, DEFAULT_MARKER_FIELD};


/// Per-type soft-delete configuration as handed over by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteConfig {
    pub enabled: bool,
    pub marker_field_name: String,
}

impl SoftDeleteConfig {
    pub fn enabled(marker_field_name: impl Into<String>) -> Self {
        Self {
            enabled: true,
            marker_field_name: marker_field_name.into(),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            marker_field_name: DEFAULT_MARKER_FIELD.to_string(),
        }
    }
}

impl Default for SoftDeleteConfig {
    fn default() -> Self {
        Self::disabled()
    }
}


pub trait ConfigurationResolver {
    fn resolve(&self, type_name: &str) -> SoftDeleteConfig;
}

impl<F> ConfigurationResolver for F
where
    F: Fn(&str) -> SoftDeleteConfig,
{
    fn resolve(&self, type_name: &str) -> SoftDeleteConfig {
        self(type_name)
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSettings {
    pub type_name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_marker_field")]
    pub marker_field_name: String,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftDeleteSettings {
    #[serde(default = "default_cache_capacity")]
    pub mapping_cache_capacity: usize,
    #[serde(default)]
    pub strict_marker_types: bool,
    #[serde(default)]
    pub types: Vec<TypeSettings>,
}

fn default_enabled() -> bool {
    true
}

fn default_marker_field() -> String {
    DEFAULT_MARKER_FIELD.to_string()
}

fn default_cache_capacity() -> usize {
    DEFAULT_MAPPING_CACHE_SIZE
}

impl SoftDeleteSettings {
    /// Loads settings from an optional TOML file overlaid with
    /// `SOFT_DELETE__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Loading soft-delete settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("SOFT_DELETE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

impl Default for SoftDeleteSettings {
    fn default() -> Self {
        Self {
            mapping_cache_capacity: DEFAULT_MAPPING_CACHE_SIZE,
            strict_marker_types: false,
            types: Vec::new(),
        }
    }
}


/// Resolver backed by a fixed table; unknown types are not soft-deleteable.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigurationResolver {
    types: HashMap<String, SoftDeleteConfig>,
}

impl StaticConfigurationResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, config: SoftDeleteConfig) -> Self {
        self.types.insert(type_name.into(), config);
        self
    }

    pub fn from_settings(settings: &SoftDeleteSettings) -> Self {
        let types = settings
            .types
            .iter()
            .map(|entry| {
                (
                    entry.type_name.clone(),
                    SoftDeleteConfig {
                        enabled: entry.enabled,
                        marker_field_name: entry.marker_field_name.clone(),
                    },
                )
            })
            .collect();
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ConfigurationResolver for StaticConfigurationResolver {
    fn resolve(&self, type_name: &str) -> SoftDeleteConfig {
        self.types.get(type_name).cloned().unwrap_or_default()
    }
}
