pub mod assemble;
pub mod blocks;
pub mod dream;
pub mod json_model;
pub mod param_table;
pub mod reconcile;
pub mod serialization;
pub mod slab_dump;

mod dispatch;
mod helpers;
mod traits;

pub use dispatch::{detect_format, detect_scanned_format, parser_for};
pub use traits::{ModelFormatParser, ParseContext, ParsedModels};

use crate::common::IngestConfig;
use crate::domain::{IngestError, IngestReport, IngestRequest, IngestResult, ShapeExpectation};
use assemble::{assemble_model, assemble_outcome};
use blocks::{LogScan, scan_log};
use dream::scan_dream_table;
use reconcile::Reconciler;
use tracing::{debug, warn};

const LOG_TAIL_LINES: usize = 5;

/// Turns one captured fit log into typed models plus fit statistics.
///
/// Holds no state between calls; one ingestor may serve any number of logs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogIngestor {
    config: IngestConfig,
}

impl LogIngestor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn ingest(&self, request: &IngestRequest<'_>) -> IngestResult<IngestReport> {
        let scan = scan_log(request.log_text);
        let mut diagnostics = scan.diagnostics.clone();

        let Some(format) = detect_scanned_format(&scan) else {
            return Err(IngestError::no_recognized_format(
                "LOG.NO_MODEL",
                "log holds no JSON model, slab dump or parameter table; the fit may have been cut short",
                log_tail(request.log_text),
            ));
        };
        debug!(
            "ingesting {} log ({} block(s), engine {})",
            format,
            scan.blocks.len(),
            scan.engine_version.as_deref().unwrap_or("unknown")
        );

        let context = ParseContext::new(request.log_text, &scan, &request.shape);
        let dream_rows = scan_dream_table(&context.statistics_text(), &mut diagnostics);
        let context = context.with_dream_rows(&dream_rows);
        let parsed = parser_for(format).parse_models(&context, &mut diagnostics)?;
        check_dataset_counts(&scan, &parsed);
        check_shape_coverage(&request.shape, &parsed, request.log_text)?;

        let reconciler = Reconciler::new(&dream_rows, &self.config, request.pretty);
        let mut models = Vec::with_capacity(parsed.models.len());
        for (index, raw) in parsed.models.iter().enumerate() {
            let model = assemble_model(
                reconciler.reconcile(raw),
                request.shape.for_dataset(index),
                raw.dataset_label.as_deref(),
                &raw.source,
            )?;
            models.push((raw.dataset_label.clone(), model));
        }

        let chi2 = parsed.overall_chi2.or(match models.as_slice() {
            [(_, only)] => only.chi2,
            _ => None,
        });
        let incomplete = chi2.is_none();
        if incomplete {
            let diagnostic = IngestError::missing_chi2(
                "FIT.MISSING_CHI2",
                "no chi-squared found in the log; the fit appears incomplete",
            );
            warn!("{}", diagnostic.diagnostic_line());
            diagnostics.push(diagnostic);
        }

        Ok(IngestReport {
            format,
            engine_version: scan.engine_version.clone(),
            outcome: assemble_outcome(models, scan.is_simultaneous(), chi2),
            chi2,
            incomplete,
            diagnostics,
        })
    }
}

pub fn ingest_log(request: &IngestRequest<'_>) -> IngestResult<IngestReport> {
    LogIngestor::default().ingest(request)
}

fn check_dataset_counts(scan: &LogScan, parsed: &ParsedModels) {
    if !scan.is_simultaneous() {
        return;
    }

    let labels = scan.dataset_names.len();
    if parsed.models.len() != labels {
        warn!(
            "SIMULTANEOUS header names {} dataset(s) but the log holds {} model(s)",
            labels,
            parsed.models.len()
        );
    }
    let with_chi2 = parsed
        .models
        .iter()
        .filter(|model| model.chi2.is_some())
        .count();
    if with_chi2 != labels {
        warn!(
            "SIMULTANEOUS header names {} dataset(s) but {} per-model chi-squared value(s) were found",
            labels, with_chi2
        );
    }
}

/// Per-dataset shapes must cover every model the log holds, no more and no fewer.
fn check_shape_coverage(
    shape: &ShapeExpectation,
    parsed: &ParsedModels,
    log_text: &str,
) -> IngestResult<()> {
    let ShapeExpectation::PerDataset(shapes) = shape else {
        return Ok(());
    };
    if shapes.len() == parsed.models.len() {
        return Ok(());
    }

    let fragment = parsed
        .models
        .get(shapes.len())
        .map(|model| model.source.as_str())
        .unwrap_or(log_text);
    Err(IngestError::shape_mismatch(
        "MODEL.DATASET_COUNT",
        format!(
            "expected shapes for {} dataset(s) but the log holds {} model(s)",
            shapes.len(),
            parsed.models.len()
        ),
        fragment,
    ))
}

fn log_tail(log_text: &str) -> String {
    let lines = log_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    lines[lines.len().saturating_sub(LOG_TAIL_LINES)..].join("\n")
}
