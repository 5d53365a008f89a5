use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LAYER_RELATIVE_TOLERANCE: f64 = 1.0e-3;
pub const DEFAULT_PROBE_RELATIVE_TOLERANCE: f64 = 1.0e-2;
pub const DEFAULT_SIGNIFICANT_FIGURES: u32 = 6;

/// Relative tolerances used to match a reported value against DREAM table rows.
///
/// They encode how closely the engine's final model agrees with its own
/// best-point table, which depends on the engine version.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileTolerances {
    pub layer_relative_tolerance: f64,
    pub probe_relative_tolerance: f64,
}

impl Default for ReconcileTolerances {
    fn default() -> Self {
        Self {
            layer_relative_tolerance: DEFAULT_LAYER_RELATIVE_TOLERANCE,
            probe_relative_tolerance: DEFAULT_PROBE_RELATIVE_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    #[serde(flatten)]
    pub tolerances: ReconcileTolerances,
    pub significant_figures: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tolerances: ReconcileTolerances::default(),
            significant_figures: DEFAULT_SIGNIFICANT_FIGURES,
        }
    }
}

impl IngestConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline-config>"),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read ingest config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse ingest config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_ingest_config(config_path: impl AsRef<Path>) -> Result<IngestConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}
