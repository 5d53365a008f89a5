//! Ingestion of reflectivity fit logs.
//!
//! A fitting batch job prints its result as free-form console output: curve
//! and profile data, a DREAM uncertainty table, and the final model either as
//! an attribute dump or as JSON. [`LogIngestor`] turns that text into typed
//! [`ReflectivityModel`]s (one per dataset for simultaneous fits) with values,
//! uncertainties, fixed flags and the run's chi-squared.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

pub use common::{ConfigError, IngestConfig, ReconcileTolerances, load_ingest_config};
pub use domain::{
    AttributeKey, BlockKind, DatasetFit, ExpectedShape, FitOutcome, FitParameter, FitRun,
    IngestError, IngestErrorKind, IngestReport, IngestRequest, IngestResult, LogBlock,
    ModelFormat, ParsedParameter, ReconciledLayer, ReflectivityModel, ShapeExpectation,
};
pub use modules::blocks::extract_blocks;
pub use modules::serialization::{render_human_summary, render_report_json};
pub use modules::{LogIngestor, detect_format, ingest_log};
