//! Legacy model output: the engine's attribute dump of the probe and the sample
//! stack, printed inside `MODEL_PARAMS` regions by older engine versions.

mod parser;

pub use parser::{SlabDump, SlabDumpModel, parse_slab_dump};

use super::{ModelFormatParser, ParseContext, ParsedModels};
use crate::common::constants::SAMPLE_SECTION;
use crate::domain::{BlockKind, IngestError, IngestResult, ModelFormat, RawModel};
use tracing::debug;

pub struct SlabDumpFormat;

impl ModelFormatParser for SlabDumpFormat {
    fn format(&self) -> ModelFormat {
        ModelFormat::SlabDump
    }

    fn parse_models(
        &self,
        context: &ParseContext<'_>,
        diagnostics: &mut Vec<IngestError>,
    ) -> IngestResult<ParsedModels> {
        let mut parsed = ParsedModels::default();

        for block in context.scan.blocks_of(BlockKind::LegacyParams) {
            if !contains_sample_dump(&block.text) {
                continue;
            }

            let dump = parse_slab_dump(
                &block.text,
                &context.scan.dataset_names,
                block.dataset_label.as_deref(),
                diagnostics,
            )?;
            debug!(
                "slab dump at line {} holds {} model(s)",
                block.source_line,
                dump.models.len()
            );
            if dump.overall_chi2.is_some() {
                parsed.overall_chi2 = dump.overall_chi2;
            }

            for model in dump.models {
                parsed.models.push(RawModel::from_engine_stack(
                    model.dataset_label,
                    model.stack,
                    model.probe,
                    model.chi2,
                    &model.source,
                )?);
            }
        }

        if parsed.models.is_empty() {
            return Err(IngestError::no_recognized_format(
                "DUMP.NO_MODEL",
                "MODEL_PARAMS regions hold no sample stack",
                context.statistics_text(),
            ));
        }

        Ok(parsed)
    }
}

/// A `.sample` section at the start of a line marks a legacy attribute dump.
pub(crate) fn contains_sample_dump(text: &str) -> bool {
    text.lines().any(|line| line.starts_with(SAMPLE_SECTION))
}

#[cfg(test)]
mod tests {
    use super::{SlabDumpFormat, contains_sample_dump};
    use crate::domain::{AttributeKey, IngestErrorKind, ShapeExpectation};
    use crate::modules::blocks::scan_log;
    use crate::modules::{ModelFormatParser, ParseContext};

    const LEGACY_LOG: &str = "\
MODEL_PARAMS_START
.probe
  .intensity = Parameter(1.1, name='intensity', bounds=(0.9,1.2))
.sample
  .layers
    [0]
      .thickness = Parameter(0, name='Si thickness')
      .rho = Parameter(2.07, name='Si rho')
    [1]
      .thickness = Parameter(48.3, name='PS thickness', bounds=(20,80))
      .rho = Parameter(1.4, name='PS rho')
    [2]
      .thickness = Parameter(0, name='air thickness')
      .rho = Parameter(0, name='air rho')
[chisq=3.25(4), nllf=210.4]
MODEL_PARAMS_END
";

    #[test]
    fn legacy_block_becomes_front_to_back_model() {
        let scan = scan_log(LEGACY_LOG);
        let shape = ShapeExpectation::Unchecked;
        let context = ParseContext::new(LEGACY_LOG, &scan, &shape);
        let mut diagnostics = Vec::new();

        let parsed = SlabDumpFormat
            .parse_models(&context, &mut diagnostics)
            .expect("legacy dump should parse");
        assert!(diagnostics.is_empty());
        assert_eq!(parsed.models.len(), 1);

        let model = &parsed.models[0];
        assert_eq!(model.front.display_name(), "air");
        assert_eq!(model.back.display_name(), "Si");
        assert_eq!(model.layers.len(), 1);
        assert_eq!(model.layers[0].display_name(), "PS");
        let thickness = model.layers[0]
            .get(AttributeKey::Thickness)
            .expect("thickness");
        assert!(!thickness.fixed);
        assert_eq!(model.chi2, Some(3.25));
    }

    #[test]
    fn stack_with_only_one_entry_is_a_shape_mismatch() {
        let log = "MODEL_PARAMS_START\n.sample\n  [0]\n    .rho = Parameter(2.07, name='Si rho')\nMODEL_PARAMS_END\n";
        let scan = scan_log(log);
        let shape = ShapeExpectation::Unchecked;
        let context = ParseContext::new(log, &scan, &shape);

        let error = SlabDumpFormat
            .parse_models(&context, &mut Vec::new())
            .expect_err("one slot cannot hold both media");
        assert_eq!(error.kind(), IngestErrorKind::ShapeMismatch);
        assert!(error.fragment().contains("Si rho"));
    }

    #[test]
    fn dump_detection_needs_a_sample_section() {
        assert!(contains_sample_dump(".probe\n.sample\n  [0]"));
        assert!(!contains_sample_dump("  1 intensity 1.0(1) 1.0 1.0 [0.9 1.1] [0.8 1.2]"));
    }
}
