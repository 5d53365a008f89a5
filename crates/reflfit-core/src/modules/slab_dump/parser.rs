use crate::common::constants::{
    BACKGROUND_PARAMETER, CHI2_LINE_PREFIX, INTENSITY_PARAMETER, OVERALL_CHI2_LINE_PREFIX,
    PARAMETER_BOUNDS_KEY, PARAMETER_CALL, PARAMETER_NAME_KEY, PROBE_SECTION, SAMPLE_SECTION,
    SUB_MODEL_MARKER,
};
use crate::domain::{
    AttributeKey, IngestError, IngestResult, RawAttribute, RawLayerAttrs, RawProbe,
};
use crate::modules::helpers::{
    is_index_token, parse_chi2_value, parse_numeric_token, split_parameter_label,
};
use tracing::debug;

/// `.<attribute> = Parameter(<value>, name='<label>', bounds=(<lo>,<hi>))`
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ParameterAssignment<'a> {
    pub(super) attribute: &'a str,
    pub(super) value: f64,
    pub(super) label: Option<&'a str>,
    pub(super) bounds: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
struct SlotEntry {
    key: AttributeKey,
    label: Option<String>,
    value: f64,
    bounds: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlabDumpModel {
    pub dataset_label: Option<String>,
    /// Engine order: back medium first, front medium last.
    pub stack: Vec<RawLayerAttrs>,
    pub probe: RawProbe,
    pub chi2: Option<f64>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlabDump {
    pub models: Vec<SlabDumpModel>,
    pub overall_chi2: Option<f64>,
}

#[derive(Debug, Default)]
struct ModelAccumulator {
    dataset_label: Option<String>,
    slots: Vec<Vec<SlotEntry>>,
    probe: RawProbe,
    chi2: Option<f64>,
    lines: Vec<String>,
}

impl ModelAccumulator {
    fn labelled(dataset_label: Option<String>) -> Self {
        Self {
            dataset_label,
            ..Self::default()
        }
    }

    fn has_content(&self) -> bool {
        !self.slots.is_empty() || self.probe.intensity.is_some() || self.probe.background.is_some()
    }

    fn push_entry(&mut self, entry: SlotEntry) {
        if self.slots.is_empty() {
            self.slots.push(Vec::new());
        }
        if let Some(slot) = self.slots.last_mut() {
            slot.push(entry);
        }
    }

    fn finish(self) -> SlabDumpModel {
        SlabDumpModel {
            dataset_label: self.dataset_label,
            stack: self.slots.into_iter().map(resolve_slot).collect(),
            probe: self.probe,
            chi2: self.chi2,
            source: self.lines.join("\n"),
        }
    }
}

/// Parses the attribute dump of one `MODEL_PARAMS` region.
///
/// `-- Model <n>` lines open a new sub-model labelled `dataset_names[n]`; a
/// dump without them is a single model labelled `fallback_label`. A sub-model
/// index the `SIMULTANEOUS` header has no label for is a shape mismatch.
pub fn parse_slab_dump(
    text: &str,
    dataset_names: &[String],
    fallback_label: Option<&str>,
    diagnostics: &mut Vec<IngestError>,
) -> IngestResult<SlabDump> {
    let mut dump = SlabDump::default();
    let mut current = ModelAccumulator::labelled(fallback_label.map(str::to_string));
    let mut in_probe = false;
    let mut in_sample = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with(OVERALL_CHI2_LINE_PREFIX) {
            dump.overall_chi2 = parse_chi2_value(trimmed);
            continue;
        }

        if trimmed.starts_with(CHI2_LINE_PREFIX) {
            in_probe = false;
            in_sample = false;
            current.chi2 = parse_chi2_value(trimmed);
            continue;
        }

        if let Some(model_index) = sub_model_index(trimmed) {
            let label = sub_model_label(dataset_names, model_index, line)?;
            let previous = std::mem::replace(&mut current, ModelAccumulator::labelled(label));
            if previous.has_content() {
                dump.models.push(previous.finish());
            }
            in_probe = false;
            in_sample = false;
            continue;
        }

        if line.starts_with(PROBE_SECTION) {
            in_probe = true;
            in_sample = false;
            current.lines.push(line.to_string());
            continue;
        }

        if line.starts_with(SAMPLE_SECTION) {
            in_probe = false;
            in_sample = true;
            current.lines.push(line.to_string());
            continue;
        }

        if !in_probe && !in_sample {
            continue;
        }
        current.lines.push(line.to_string());

        if in_sample && is_slot_header(trimmed) {
            current.slots.push(Vec::new());
            continue;
        }

        if !trimmed.contains(PARAMETER_CALL) {
            continue;
        }

        let Some(assignment) = parse_parameter_assignment(trimmed) else {
            debug!("skipping unparsable parameter assignment: {}", trimmed);
            diagnostics.push(IngestError::unparsable_row(
                "DUMP.PARAMETER_ASSIGNMENT",
                "parameter assignment does not match `.<attr> = Parameter(<value>, name='<label>')`",
                line,
            ));
            continue;
        };

        if in_probe {
            let attribute = RawAttribute::new(assignment.label.map(str::to_string), assignment.value)
                .with_bounds(assignment.bounds)
                .with_fixed(assignment.bounds.is_none());
            match assignment.attribute {
                INTENSITY_PARAMETER => current.probe.intensity = Some(attribute),
                BACKGROUND_PARAMETER => current.probe.background = Some(attribute),
                _ => {}
            }
            continue;
        }

        if let Some(key) = AttributeKey::from_engine_suffix(assignment.attribute) {
            current.push_entry(SlotEntry {
                key,
                label: assignment.label.map(str::to_string),
                value: assignment.value,
                bounds: assignment.bounds,
            });
        }
    }

    if current.has_content() {
        dump.models.push(current.finish());
    }

    Ok(dump)
}

fn sub_model_label(
    dataset_names: &[String],
    model_index: usize,
    line: &str,
) -> IngestResult<Option<String>> {
    if dataset_names.is_empty() {
        return Ok(None);
    }
    match dataset_names.get(model_index) {
        Some(name) => Ok(Some(name.clone())),
        None => Err(IngestError::shape_mismatch(
            "DUMP.DATASET_INDEX",
            format!(
                "sub-model {} has no dataset label; the SIMULTANEOUS header names {} dataset(s)",
                model_index,
                dataset_names.len()
            ),
            line,
        )),
    }
}

/// Second pass over one slot: elect the layer name, then build its attribute map.
///
/// Constraints can alias `rho`, `irho` or `interface` to another layer's
/// parameter, so the label of the slot's own `thickness` decides the name. The
/// first label of any attribute is the fallback.
fn resolve_slot(entries: Vec<SlotEntry>) -> RawLayerAttrs {
    let elected = entries
        .iter()
        .filter(|entry| entry.key == AttributeKey::Thickness)
        .find_map(|entry| entry.label.as_deref())
        .or_else(|| entries.iter().find_map(|entry| entry.label.as_deref()))
        .map(|label| split_parameter_label(label).0.to_string());

    let mut layer = RawLayerAttrs {
        name: elected,
        ..RawLayerAttrs::default()
    };
    for entry in entries {
        if layer.get(entry.key).is_some() {
            continue;
        }
        let attribute = RawAttribute::new(entry.label, entry.value)
            .with_bounds(entry.bounds)
            .with_fixed(entry.bounds.is_none());
        layer.insert(entry.key, attribute);
    }
    layer
}

pub(super) fn parse_parameter_assignment(line: &str) -> Option<ParameterAssignment<'_>> {
    let (target, call) = line.trim().split_once('=')?;
    let attribute = target.trim().strip_prefix('.')?;
    if attribute.is_empty()
        || !attribute
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '_')
    {
        return None;
    }

    let arguments = call.trim().strip_prefix(PARAMETER_CALL)?;
    let value_end = arguments.find([',', ')'])?;
    let value = parse_numeric_token(&arguments[..value_end])?;

    let label = arguments.find(PARAMETER_NAME_KEY).and_then(|start| {
        let rest = &arguments[start + PARAMETER_NAME_KEY.len()..];
        rest.find('\'').map(|end| &rest[..end])
    });

    let bounds = arguments.find(PARAMETER_BOUNDS_KEY).and_then(|start| {
        let rest = &arguments[start + PARAMETER_BOUNDS_KEY.len()..];
        let (low, high) = rest[..rest.find(')')?].split_once(',')?;
        Some((parse_numeric_token(low)?, parse_numeric_token(high)?))
    });

    Some(ParameterAssignment {
        attribute,
        value,
        label,
        bounds,
    })
}

fn sub_model_index(trimmed: &str) -> Option<usize> {
    let rest = trimmed.strip_prefix(SUB_MODEL_MARKER)?;
    let token = rest.split_whitespace().next()?;
    token.trim_end_matches(':').parse().ok()
}

fn is_slot_header(trimmed: &str) -> bool {
    trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(is_index_token)
}

#[cfg(test)]
mod tests {
    use super::{parse_parameter_assignment, parse_slab_dump, sub_model_index};
    use crate::domain::{AttributeKey, IngestErrorKind};

    const SINGLE_DUMP: &str = "\
.probe
  .background = Parameter(1e-07, name='background')
  .intensity = Parameter(1.0003, name='intensity', bounds=(0.9,1.1))
.sample
  .layers
    [0]
      .interface = Parameter(1.46935, name='Si interface', bounds=(1,5))
      .material
        .irho = Parameter(0, name='Si irho')
        .rho = Parameter(2.07, name='Si rho')
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .interface = Parameter(2.5, name='SiOx interface')
      .material
        .irho = Parameter(0, name='SiOx irho')
        .rho = Parameter(2.07, name='Si rho')
      .thickness = Parameter(15.2, name='SiOx thickness', bounds=(5,30))
    [2]
      .interface = Parameter(0, name='air interface')
      .material
        .irho = Parameter(0, name='air irho')
        .rho = Parameter(0, name='air rho')
      .thickness = Parameter(0, name='air thickness')
[chisq=108.1844(30), nllf=18012.7]
";

    #[test]
    fn assignment_line_yields_value_label_and_bounds() {
        let assignment =
            parse_parameter_assignment(".interface = Parameter(1.46935, name='Si interface', bounds=(1,5))")
                .expect("assignment should parse");
        assert_eq!(assignment.attribute, "interface");
        assert_eq!(assignment.value, 1.46935);
        assert_eq!(assignment.label, Some("Si interface"));
        assert_eq!(assignment.bounds, Some((1.0, 5.0)));

        let bare = parse_parameter_assignment(".rho = Parameter(2.07)").expect("bare value");
        assert_eq!(bare.label, None);
        assert_eq!(bare.bounds, None);

        assert!(parse_parameter_assignment(".rho = Parameter(abc, name='x')").is_none());
        assert!(parse_parameter_assignment("rho = Parameter(1, name='x')").is_none());
    }

    #[test]
    fn single_dump_builds_stack_probe_and_chi2() {
        let mut diagnostics = Vec::new();
        let dump = parse_slab_dump(SINGLE_DUMP, &[], None, &mut diagnostics)
            .expect("dump should parse");
        assert!(diagnostics.is_empty());
        assert_eq!(dump.models.len(), 1);
        assert_eq!(dump.overall_chi2, None);

        let model = &dump.models[0];
        assert_eq!(model.chi2, Some(108.1844));
        assert_eq!(model.dataset_label, None);
        let names = model
            .stack
            .iter()
            .map(|layer| layer.display_name())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Si", "SiOx", "air"]);

        let intensity = model.probe.intensity.as_ref().expect("intensity");
        assert_eq!(intensity.value, 1.0003);
        assert!(!intensity.fixed);
        assert!(model.probe.background.as_ref().expect("background").fixed);
    }

    #[test]
    fn aliased_rho_label_does_not_rename_the_layer() {
        let mut diagnostics = Vec::new();
        let dump = parse_slab_dump(SINGLE_DUMP, &[], None, &mut diagnostics)
            .expect("dump should parse");
        let oxide = &dump.models[0].stack[1];

        assert_eq!(oxide.name.as_deref(), Some("SiOx"));
        let rho = oxide.get(AttributeKey::Sld).expect("rho");
        assert_eq!(rho.label.as_deref(), Some("Si rho"));
        let thickness = oxide.get(AttributeKey::Thickness).expect("thickness");
        assert_eq!(thickness.value, 15.2);
        assert!(!thickness.fixed);
        assert_eq!(thickness.bounds, Some((5.0, 30.0)));
    }

    #[test]
    fn name_falls_back_to_first_label_without_thickness() {
        let text = "\
.sample
  .layers
    [0]
      .rho = Parameter(6.4, name='Cu rho')
      .interface = Parameter(3, name='Cu interface')
";
        let mut diagnostics = Vec::new();
        let dump = parse_slab_dump(text, &[], Some("only"), &mut diagnostics)
            .expect("dump should parse");
        assert_eq!(dump.models[0].stack[0].name.as_deref(), Some("Cu"));
        assert_eq!(dump.models[0].dataset_label.as_deref(), Some("only"));
    }

    #[test]
    fn sub_models_take_labels_from_dataset_names() {
        let text = "\
-- Model 0
.sample
  .layers
    [0]
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .thickness = Parameter(0, name='air thickness')
[chisq=1.5(1), nllf=10]
-- Model 1
.sample
  .layers
    [0]
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .thickness = Parameter(0, name='D2O thickness')
[chisq=2.5(1), nllf=20]
[overall chisq=2.0(1), nllf=30]
";
        let names = vec!["run-a".to_string(), "run-b".to_string()];
        let mut diagnostics = Vec::new();
        let dump =
            parse_slab_dump(text, &names, None, &mut diagnostics).expect("dump should parse");

        assert_eq!(dump.models.len(), 2);
        assert_eq!(dump.overall_chi2, Some(2.0));
        assert_eq!(dump.models[0].dataset_label.as_deref(), Some("run-a"));
        assert_eq!(dump.models[0].chi2, Some(1.5));
        assert_eq!(dump.models[1].dataset_label.as_deref(), Some("run-b"));
        assert_eq!(dump.models[1].chi2, Some(2.5));
        assert_eq!(dump.models[1].stack[1].display_name(), "D2O");
    }

    #[test]
    fn sub_model_beyond_the_header_labels_is_a_shape_mismatch() {
        let text = "\
-- Model 0
.sample
    [0]
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .thickness = Parameter(0, name='D2O thickness')
-- Model 1
.sample
    [0]
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .thickness = Parameter(0, name='H2O thickness')
-- Model 2
.sample
    [0]
      .thickness = Parameter(0, name='Si thickness')
    [1]
      .thickness = Parameter(0, name='CMSi thickness')
";
        let names = vec!["a".to_string(), "b".to_string()];
        let error = parse_slab_dump(text, &names, Some("a"), &mut Vec::new())
            .expect_err("third model has no dataset label");
        assert_eq!(error.kind(), IngestErrorKind::ShapeMismatch);
        assert_eq!(error.placeholder(), "DUMP.DATASET_INDEX");
        assert_eq!(error.fragment(), "-- Model 2");
    }

    #[test]
    fn unlabelled_run_keeps_sub_models_unlabelled() {
        let text = "\
-- Model 0
.sample
    [0]
      .thickness = Parameter(0, name='Si thickness')
-- Model 1
.sample
    [0]
      .thickness = Parameter(0, name='Si thickness')
";
        let dump = parse_slab_dump(text, &[], None, &mut Vec::new()).expect("dump should parse");
        assert_eq!(dump.models.len(), 2);
        assert!(dump.models.iter().all(|model| model.dataset_label.is_none()));
    }

    #[test]
    fn broken_assignment_is_reported_not_fatal() {
        let text = "\
.sample
    [0]
      .thickness = Parameter(??, name='Si thickness')
      .rho = Parameter(2.07, name='Si rho')
";
        let mut diagnostics = Vec::new();
        let dump = parse_slab_dump(text, &[], None, &mut diagnostics).expect("dump should parse");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].placeholder(), "DUMP.PARAMETER_ASSIGNMENT");
        assert_eq!(dump.models[0].stack[0].display_name(), "Si");
    }

    #[test]
    fn sub_model_marker_parses_index() {
        assert_eq!(sub_model_index("-- Model 3"), Some(3));
        assert_eq!(sub_model_index("-- Model 12: data_2.txt"), Some(12));
        assert_eq!(sub_model_index("-- Model x"), None);
        assert_eq!(sub_model_index(".sample"), None);
    }
}
