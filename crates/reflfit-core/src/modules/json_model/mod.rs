mod model;
mod parser;

pub use model::{JsonFitModel, JsonLayer, JsonMaterial, JsonParameter, JsonProbe, JsonSample};
pub use parser::{decode_json_model, json_stack};

use super::helpers::scan_chi2_lines;
use super::{ModelFormatParser, ParseContext, ParsedModels};
use crate::domain::{BlockKind, IngestError, IngestResult, ModelFormat, RawModel};
use tracing::{debug, warn};

pub struct JsonModelFormat;

impl ModelFormatParser for JsonModelFormat {
    fn format(&self) -> ModelFormat {
        ModelFormat::Json
    }

    fn parse_models(
        &self,
        context: &ParseContext<'_>,
        diagnostics: &mut Vec<IngestError>,
    ) -> IngestResult<ParsedModels> {
        let chi2 = scan_chi2_lines(&context.statistics_text());
        let mut parsed = ParsedModels {
            models: Vec::new(),
            overall_chi2: chi2.overall,
        };

        for block in context.scan.blocks_of(BlockKind::JsonModel) {
            let payload = match decode_json_model(&block.text) {
                Ok(payload) => payload,
                Err(source) => {
                    let diagnostic = IngestError::malformed_block(
                        "JSON.PAYLOAD",
                        format!(
                            "MODEL_JSON block #{} at line {} is not a model payload: {source}",
                            block.dataset_index, block.source_line
                        ),
                        &block.text,
                    );
                    warn!("{}", diagnostic.diagnostic_line());
                    diagnostics.push(diagnostic);
                    continue;
                }
            };

            let (stack, probe) = json_stack(&payload);
            debug!(
                "MODEL_JSON block #{} holds {} stack entries",
                block.dataset_index,
                stack.len()
            );
            parsed.models.push(RawModel::from_engine_stack(
                block.dataset_label.clone(),
                stack,
                probe,
                chi2.per_model.get(block.dataset_index).copied(),
                &block.text,
            )?);
        }

        if parsed.models.is_empty() {
            return Err(IngestError::no_recognized_format(
                "JSON.NO_MODEL",
                "log announces a JSON model but holds no decodable MODEL_JSON region",
                context.log_text,
            ));
        }

        Ok(parsed)
    }
}
