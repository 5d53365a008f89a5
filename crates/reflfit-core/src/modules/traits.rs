use crate::domain::{
    BlockKind, IngestError, IngestResult, ModelFormat, ParsedParameter, RawModel,
    ShapeExpectation,
};
use crate::modules::blocks::LogScan;

/// Everything a format parser may read: the raw log, its block scan and the caller's shape.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub log_text: &'a str,
    pub scan: &'a LogScan,
    pub shape: &'a ShapeExpectation,
    /// Decoded DREAM rows of the whole run.
    pub dream_rows: &'a [ParsedParameter],
}

impl<'a> ParseContext<'a> {
    pub fn new(log_text: &'a str, scan: &'a LogScan, shape: &'a ShapeExpectation) -> Self {
        Self {
            log_text,
            scan,
            shape,
            dream_rows: &[],
        }
    }

    pub fn with_dream_rows(mut self, dream_rows: &'a [ParsedParameter]) -> Self {
        self.dream_rows = dream_rows;
        self
    }

    /// Text holding the DREAM table and chi-squared lines: the `MODEL_PARAMS`
    /// regions when present, otherwise the whole log.
    pub fn statistics_text(&self) -> String {
        let regions = self
            .scan
            .blocks_of(BlockKind::LegacyParams)
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>();
        if regions.is_empty() {
            self.log_text.to_string()
        } else {
            regions.join("\n")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedModels {
    /// One entry per dataset, in log order.
    pub models: Vec<RawModel>,
    pub overall_chi2: Option<f64>,
}

pub trait ModelFormatParser {
    fn format(&self) -> ModelFormat;

    /// Recoverable problems go to `diagnostics`; an `Err` aborts the ingestion.
    fn parse_models(
        &self,
        context: &ParseContext<'_>,
        diagnostics: &mut Vec<IngestError>,
    ) -> IngestResult<ParsedModels>;
}
