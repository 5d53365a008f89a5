//! Splits a captured fit log into its tagged regions.
//!
//! Each region kind has its own open/close state, driven only by the
//! `<KIND>_START` / `<KIND>_END` marker lines, and the whole log is read in a
//! single forward pass. `-- Model <n>` lines inside a `MODEL_PARAMS` region
//! are left in the block text; they are sub-delimiters for the slab-dump parser.

use crate::common::constants::{ENGINE_VERSION_MARKER, SIMULTANEOUS_MARKER};
use crate::domain::{BlockKind, IngestError, LogBlock};
use crate::modules::helpers::strip_marker;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogScan {
    pub blocks: Vec<LogBlock>,
    pub dataset_names: Vec<String>,
    pub engine_version: Option<String>,
    pub diagnostics: Vec<IngestError>,
}

impl LogScan {
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &LogBlock> {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    pub fn has_kind(&self, kind: BlockKind) -> bool {
        self.blocks_of(kind).next().is_some()
    }

    pub fn is_simultaneous(&self) -> bool {
        !self.dataset_names.is_empty()
    }

    pub fn dataset_label(&self, index: usize) -> Option<String> {
        self.dataset_names.get(index).cloned()
    }
}

#[derive(Debug)]
struct OpenBlock<'a> {
    start_line: usize,
    lines: Vec<&'a str>,
}

pub fn extract_blocks(log_text: &str) -> Vec<LogBlock> {
    scan_log(log_text).blocks
}

pub fn scan_log(log_text: &str) -> LogScan {
    let mut scan = LogScan::default();
    let mut open: [Option<OpenBlock<'_>>; BlockKind::COUNT] = Default::default();
    let mut emitted = [0_usize; BlockKind::COUNT];

    for (index, line) in log_text.lines().enumerate() {
        let line_number = index + 1;

        if let Some(rest) = strip_marker(line, SIMULTANEOUS_MARKER) {
            match serde_json::from_str::<Vec<String>>(rest.trim()) {
                Ok(names) => scan.dataset_names = names,
                Err(source) => {
                    let diagnostic = IngestError::unparsable_row(
                        "LOG.SIMULTANEOUS_HEADER",
                        format!("dataset label array at line {line_number} is not valid JSON: {source}"),
                        line,
                    );
                    warn!("{}", diagnostic.diagnostic_line());
                    scan.diagnostics.push(diagnostic);
                }
            }
            continue;
        }

        if let Some(rest) = strip_marker(line, ENGINE_VERSION_MARKER) {
            let version = rest.trim_start_matches([':', '=']).trim();
            if !version.is_empty() {
                scan.engine_version = Some(version.to_string());
            }
            continue;
        }

        if let Some(kind) = marker_kind(line, BlockKind::start_marker) {
            if let Some(previous) = open[kind.index()].take() {
                let diagnostic = IngestError::malformed_block(
                    "LOG.BLOCK_RESTARTED",
                    format!(
                        "{} block opened at line {} restarted at line {} before {}",
                        kind,
                        previous.start_line,
                        line_number,
                        kind.end_marker()
                    ),
                    previous.lines.join("\n"),
                );
                warn!("{}", diagnostic.diagnostic_line());
                scan.diagnostics.push(diagnostic);
            }
            open[kind.index()] = Some(OpenBlock {
                start_line: line_number,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(kind) = marker_kind(line, BlockKind::end_marker) {
            let Some(finished) = open[kind.index()].take() else {
                debug!("ignoring {} without an open block at line {}", kind.end_marker(), line_number);
                continue;
            };

            let text = finished.lines.join("\n");
            if text.trim().is_empty() {
                debug!("dropping empty {} block at line {}", kind, finished.start_line);
                continue;
            }

            let dataset_index = emitted[kind.index()];
            emitted[kind.index()] += 1;
            debug!(
                "extracted {} block #{} ({} lines) from line {}",
                kind,
                dataset_index,
                finished.lines.len(),
                finished.start_line
            );
            scan.blocks.push(LogBlock {
                kind,
                dataset_index,
                dataset_label: scan.dataset_label(dataset_index),
                text,
                source_line: finished.start_line,
            });
            continue;
        }

        for block in open.iter_mut().flatten() {
            block.lines.push(line);
        }
    }

    for (kind, unterminated) in BlockKind::ALL.into_iter().zip(open) {
        if let Some(unterminated) = unterminated {
            let diagnostic = IngestError::malformed_block(
                "LOG.UNTERMINATED_BLOCK",
                format!(
                    "{} block opened at line {} has no {}; dropped",
                    kind,
                    unterminated.start_line,
                    kind.end_marker()
                ),
                unterminated.lines.join("\n"),
            );
            warn!("{}", diagnostic.diagnostic_line());
            scan.diagnostics.push(diagnostic);
        }
    }

    scan
}

fn marker_kind(line: &str, marker: fn(BlockKind) -> &'static str) -> Option<BlockKind> {
    let trimmed = line.trim();
    BlockKind::ALL
        .into_iter()
        .find(|kind| trimmed.starts_with(marker(*kind)))
}
