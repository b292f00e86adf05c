//! Configuration for the emrcalc CLI.

use chrono::{DateTime, Utc};
use emrcalc_core::Dictionary;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

/// CLI configuration.
///
/// ```yaml
/// log_level: debug
/// dictionary:
///   concepts:
///     YES: "1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
///     PREGNANCY_STATUS: "5272AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
/// determinism:
///   evaluated_at: "2021-01-01T00:00:00Z"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Concept vocabulary, layered over the default concepts
    #[serde(default, deserialize_with = "dictionary_over_defaults")]
    pub dictionary: Dictionary,

    /// Determinism configuration
    #[serde(default)]
    pub determinism: DeterminismConfig,

    /// Default tracing filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Concepts named in the config replace the defaults of the same name; the
/// rest of the default vocabulary stays available.
fn dictionary_over_defaults<'de, D>(deserializer: D) -> Result<Dictionary, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = Dictionary::deserialize(deserializer)?;
    let mut dictionary = Dictionary::default();
    dictionary.concepts.extend(overrides.concepts);
    Ok(dictionary)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dictionary: Dictionary::default(),
            determinism: DeterminismConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl RunConfig {
    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: RunConfig = if path.extension().map(|e| e == "json").unwrap_or(false) {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        config.dictionary.validate()?;
        Ok(config)
    }
}

/// Determinism configuration for reproducible evaluations.
///
/// When `evaluated_at` is set, calculations run as of that moment instead of
/// the current system time. The CLI's `--evaluated-at` flag takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeterminismConfig {
    /// Format: ISO 8601 (e.g., "2021-01-01T00:00:00Z")
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
}
