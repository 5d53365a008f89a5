//! Oldest log format: parameter tables only, no dump of the model itself.
//!
//! The stack is the caller's own model definition; each table row is applied
//! to the slot its name points at.

use super::dream::scan_best_values;
use super::helpers::{scan_chi2_lines, split_parameter_label};
use super::{ModelFormatParser, ParseContext, ParsedModels};
use crate::common::constants::{BACKGROUND_PARAMETER, INTENSITY_PARAMETER};
use crate::domain::{
    BlockKind, ExpectedShape, IngestError, IngestResult, ModelFormat, ParsedParameter,
    RawAttribute, RawLayerAttrs, RawModel, RawProbe, label_suffix,
};
use tracing::debug;

pub struct ParameterTableFormat;

impl ModelFormatParser for ParameterTableFormat {
    fn format(&self) -> ModelFormat {
        ModelFormat::ParameterTable
    }

    fn parse_models(
        &self,
        context: &ParseContext<'_>,
        diagnostics: &mut Vec<IngestError>,
    ) -> IngestResult<ParsedModels> {
        let statistics = context.statistics_text();
        let dataset_label = context
            .scan
            .blocks_of(BlockKind::LegacyParams)
            .chain(context.scan.blocks_of(BlockKind::BestValues))
            .find_map(|block| block.dataset_label.clone());

        let mut model = template_model(
            dataset_label,
            context.shape.for_dataset(0),
            &statistics,
        )?;

        let rows = if context.dream_rows.is_empty() {
            let best_values = context
                .scan
                .blocks_of(BlockKind::BestValues)
                .map(|block| block.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            scan_best_values(&best_values, diagnostics)
        } else {
            context.dream_rows.to_vec()
        };
        for row in &rows {
            apply_row(&mut model, row);
        }

        let chi2 = scan_chi2_lines(&statistics);
        model.chi2 = chi2.per_model.first().copied();

        Ok(ParsedModels {
            models: vec![model],
            overall_chi2: chi2.overall,
        })
    }
}

/// Empty model laid out from the caller's shape; unnamed media and no layers without one.
pub fn template_model(
    dataset_label: Option<String>,
    shape: Option<&ExpectedShape>,
    source: &str,
) -> IngestResult<RawModel> {
    let shape = shape.cloned().unwrap_or_default();
    if let Some(count) = shape.layer_count
        && count != shape.layer_names.len()
    {
        return Err(IngestError::shape_mismatch(
            "TABLE.UNNAMED_LAYERS",
            format!(
                "parameter-table log{} needs the names of all {} layers, {} given",
                label_suffix(dataset_label.as_deref()),
                count,
                shape.layer_names.len()
            ),
            source,
        ));
    }

    let medium = |name: Option<String>| RawLayerAttrs {
        name,
        semi_infinite: true,
        ..RawLayerAttrs::default()
    };

    Ok(RawModel {
        dataset_label,
        back: medium(shape.back_name),
        front: medium(shape.front_name),
        layers: shape
            .layer_names
            .into_iter()
            .map(RawLayerAttrs::named)
            .collect(),
        probe: RawProbe::default(),
        chi2: None,
        source: source.to_string(),
    })
}

fn apply_row(model: &mut RawModel, row: &ParsedParameter) {
    let attribute = RawAttribute::new(Some(row.raw_name.clone()), row.value).with_fixed(false);

    match row.raw_name.as_str() {
        INTENSITY_PARAMETER => {
            model.probe.intensity = Some(attribute);
            return;
        }
        BACKGROUND_PARAMETER => {
            model.probe.background = Some(attribute);
            return;
        }
        _ => {}
    }

    let (layer_name, Some(key)) = split_parameter_label(&row.raw_name) else {
        debug!("table row '{}' names no layer attribute", row.raw_name);
        return;
    };

    let slot = [&mut model.front, &mut model.back]
        .into_iter()
        .chain(model.layers.iter_mut())
        .find(|slot| slot.name.as_deref() == Some(layer_name));
    match slot {
        Some(slot) => slot.insert(key, attribute),
        None => debug!("table row '{}' matches no layer of the model", row.raw_name),
    }
}
