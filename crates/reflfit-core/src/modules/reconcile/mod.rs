//! Attaches DREAM uncertainties to the parsed model and freezes it into a
//! [`ReflectivityModel`].
//!
//! DREAM rows are matched by value proximity rather than by name alone:
//! constraints alias labels across layers, so a row is only taken for a
//! parameter when its label prefix fits and its best value agrees with the
//! value the model reports.

use super::helpers::parameter_label;
use super::serialization::format_display;
use crate::common::constants::{BACKGROUND_PARAMETER, INTENSITY_PARAMETER};
use crate::common::{IngestConfig, ReconcileTolerances};
use crate::domain::{
    AttributeKey, FitParameter, ParsedParameter, RawAttribute, RawLayerAttrs, RawModel,
    ReconciledLayer, ReflectivityModel,
};
use crate::numerics::{compare_with_relative_tolerance, round_significant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    dream_rows: &'a [ParsedParameter],
    tolerances: ReconcileTolerances,
    significant_figures: u32,
    pretty: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(dream_rows: &'a [ParsedParameter], config: &IngestConfig, pretty: bool) -> Self {
        Self {
            dream_rows,
            tolerances: config.tolerances,
            significant_figures: config.significant_figures,
            pretty,
        }
    }

    pub fn reconcile(&self, model: &RawModel) -> ReflectivityModel {
        let probe_tolerance = self.tolerances.probe_relative_tolerance;
        debug!(
            "reconciling {} layer(s) against {} DREAM row(s)",
            model.layers.len(),
            self.dream_rows.len()
        );

        ReflectivityModel {
            front_name: model.front.display_name().to_string(),
            front_sld: self.layer_parameter(&model.front, AttributeKey::Sld),
            back_name: model.back.display_name().to_string(),
            back_sld: self.layer_parameter(&model.back, AttributeKey::Sld),
            back_roughness: self.layer_parameter(&model.back, AttributeKey::Roughness),
            scale: self.parameter(
                model.probe.intensity.as_ref(),
                &[INTENSITY_PARAMETER],
                probe_tolerance,
            ),
            background: self.parameter(
                model.probe.background.as_ref(),
                &[BACKGROUND_PARAMETER],
                probe_tolerance,
            ),
            layers: model
                .layers
                .iter()
                .map(|layer| ReconciledLayer {
                    name: layer.display_name().to_string(),
                    thickness: self.layer_parameter(layer, AttributeKey::Thickness),
                    sld: self.layer_parameter(layer, AttributeKey::Sld),
                    isld: self.layer_parameter(layer, AttributeKey::Isld),
                    roughness: self.layer_parameter(layer, AttributeKey::Roughness),
                    layer_number: 0,
                })
                .collect(),
            chi2: model.chi2,
        }
    }

    fn layer_parameter(&self, layer: &RawLayerAttrs, key: AttributeKey) -> FitParameter {
        let fallback = parameter_label(layer.display_name(), key);
        self.parameter(
            layer.get(key),
            &[fallback.as_str()],
            self.tolerances.layer_relative_tolerance,
        )
    }

    fn parameter(
        &self,
        attribute: Option<&RawAttribute>,
        fallback_labels: &[&str],
        tolerance: f64,
    ) -> FitParameter {
        let Some(attribute) = attribute else {
            return self.finish(FitParameter::unreported());
        };

        let labels = attribute
            .label
            .as_deref()
            .into_iter()
            .chain(fallback_labels.iter().copied())
            .collect::<Vec<_>>();

        let parameter = match self.closest_row(&labels, attribute.value, tolerance) {
            Some(row) => FitParameter::new(row.value, row.error, attribute.fixed),
            None => FitParameter::new(attribute.value, 0.0, attribute.fixed),
        };
        self.finish(parameter)
    }

    /// Row within `tolerance` of `value` whose name starts with one of `labels`; the nearest wins.
    fn closest_row(&self, labels: &[&str], value: f64, tolerance: f64) -> Option<&'a ParsedParameter> {
        self.dream_rows
            .iter()
            .filter(|row| labels.iter().any(|label| names_parameter(&row.raw_name, label)))
            .filter_map(|row| {
                let comparison = compare_with_relative_tolerance(value, row.value, tolerance);
                if !comparison.passes {
                    debug!(
                        "row '{}' = {} rejected for value {} (deviation {:.3e})",
                        row.raw_name, row.value, value, comparison.deviation
                    );
                }
                comparison.passes.then_some((row, comparison.deviation))
            })
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(row, _)| row)
    }

    fn finish(&self, mut parameter: FitParameter) -> FitParameter {
        parameter.value = round_significant(parameter.value, self.significant_figures);
        parameter.error = round_significant(parameter.error, self.significant_figures);
        if self.pretty {
            parameter.display = Some(format_display(parameter.value, parameter.error));
        }
        parameter
    }
}

/// `raw_name` is `label` itself or `label` followed by more name tokens.
fn names_parameter(raw_name: &str, label: &str) -> bool {
    if label.is_empty() {
        return false;
    }
    raw_name
        .strip_prefix(label)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

pub fn reconcile(
    model: &RawModel,
    dream_rows: &[ParsedParameter],
    config: &IngestConfig,
    pretty: bool,
) -> ReflectivityModel {
    Reconciler::new(dream_rows, config, pretty).reconcile(model)
}
