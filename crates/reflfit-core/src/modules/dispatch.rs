use super::ModelFormatParser;
use super::blocks::{LogScan, scan_log};
use super::json_model::JsonModelFormat;
use super::param_table::ParameterTableFormat;
use super::slab_dump::{SlabDumpFormat, contains_sample_dump};
use crate::domain::{BlockKind, ModelFormat};

pub fn detect_format(log_text: &str) -> Option<ModelFormat> {
    detect_scanned_format(&scan_log(log_text))
}

/// Picks the model representation of a scanned log, newest format first.
pub fn detect_scanned_format(scan: &LogScan) -> Option<ModelFormat> {
    if scan.engine_version.is_some() || scan.has_kind(BlockKind::JsonModel) {
        return Some(ModelFormat::Json);
    }
    if scan
        .blocks_of(BlockKind::LegacyParams)
        .any(|block| contains_sample_dump(&block.text))
    {
        return Some(ModelFormat::SlabDump);
    }
    if scan.has_kind(BlockKind::LegacyParams) || scan.has_kind(BlockKind::BestValues) {
        return Some(ModelFormat::ParameterTable);
    }
    None
}

pub fn parser_for(format: ModelFormat) -> &'static dyn ModelFormatParser {
    match format {
        ModelFormat::Json => &JsonModelFormat,
        ModelFormat::SlabDump => &SlabDumpFormat,
        ModelFormat::ParameterTable => &ParameterTableFormat,
    }
}
