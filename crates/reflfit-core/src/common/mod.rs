pub mod config;
pub mod constants;

pub use config::{ConfigError, IngestConfig, ReconcileTolerances, load_ingest_config};
