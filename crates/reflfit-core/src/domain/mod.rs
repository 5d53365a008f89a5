pub mod errors;

pub use errors::{IngestError, IngestErrorKind, IngestResult};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Refl,
    Sld,
    LegacyParams,
    BestValues,
    JsonModel,
}

impl BlockKind {
    pub const COUNT: usize = 5;
    pub const ALL: [BlockKind; Self::COUNT] = [
        Self::Refl,
        Self::Sld,
        Self::LegacyParams,
        Self::BestValues,
        Self::JsonModel,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refl => "REFL",
            Self::Sld => "SLD",
            Self::LegacyParams => "MODEL_PARAMS",
            Self::BestValues => "MODEL_BEST_VALUES",
            Self::JsonModel => "MODEL_JSON",
        }
    }

    pub const fn start_marker(self) -> &'static str {
        match self {
            Self::Refl => "REFL_START",
            Self::Sld => "SLD_START",
            Self::LegacyParams => "MODEL_PARAMS_START",
            Self::BestValues => "MODEL_BEST_VALUES_START",
            Self::JsonModel => "MODEL_JSON_START",
        }
    }

    pub const fn end_marker(self) -> &'static str {
        match self {
            Self::Refl => "REFL_END",
            Self::Sld => "SLD_END",
            Self::LegacyParams => "MODEL_PARAMS_END",
            Self::BestValues => "MODEL_BEST_VALUES_END",
            Self::JsonModel => "MODEL_JSON_END",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Refl => 0,
            Self::Sld => 1,
            Self::LegacyParams => 2,
            Self::BestValues => 3,
            Self::JsonModel => 4,
        }
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One tagged region of a fit log, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogBlock {
    pub kind: BlockKind,
    pub dataset_index: usize,
    pub dataset_label: Option<String>,
    pub text: String,
    pub source_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Json,
    SlabDump,
    ParameterTable,
}

impl ModelFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::SlabDump => "slab_dump",
            Self::ParameterTable => "parameter_table",
        }
    }
}

impl Display for ModelFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// A row of the DREAM uncertainty table, or of the best-value table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedParameter {
    pub raw_name: String,
    pub value: f64,
    pub error: f64,
}

impl ParsedParameter {
    pub fn new(raw_name: impl Into<String>, value: f64, error: f64) -> Self {
        Self {
            raw_name: raw_name.into(),
            value,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    Thickness,
    Sld,
    Isld,
    Roughness,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 4] = [Self::Thickness, Self::Sld, Self::Isld, Self::Roughness];

    /// Attribute name as the fitting engine spells it in labels and dumps.
    pub const fn engine_suffix(self) -> &'static str {
        match self {
            Self::Thickness => "thickness",
            Self::Sld => "rho",
            Self::Isld => "irho",
            Self::Roughness => "interface",
        }
    }

    pub fn from_engine_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.engine_suffix() == suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAttribute {
    pub label: Option<String>,
    pub value: f64,
    pub fixed: bool,
    pub bounds: Option<(f64, f64)>,
}

impl RawAttribute {
    pub fn new(label: Option<String>, value: f64) -> Self {
        Self {
            label,
            value,
            fixed: true,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Option<(f64, f64)>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }
}

/// Attributes of one physical slot of the stack, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawLayerAttrs {
    pub name: Option<String>,
    pub semi_infinite: bool,
    pub attributes: BTreeMap<AttributeKey, RawAttribute>,
}

impl RawLayerAttrs {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn get(&self, key: AttributeKey) -> Option<&RawAttribute> {
        self.attributes.get(&key)
    }

    pub fn insert(&mut self, key: AttributeKey, attribute: RawAttribute) {
        self.attributes.insert(key, attribute);
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawProbe {
    pub intensity: Option<RawAttribute>,
    pub background: Option<RawAttribute>,
}

/// One sub-model as parsed from the log, before reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawModel {
    pub dataset_label: Option<String>,
    pub back: RawLayerAttrs,
    pub front: RawLayerAttrs,
    /// Finite layers, nearest the front medium first.
    pub layers: Vec<RawLayerAttrs>,
    pub probe: RawProbe,
    pub chi2: Option<f64>,
    /// Log text the model was parsed from, quoted by shape errors.
    #[serde(skip)]
    pub source: String,
}

impl RawModel {
    /// Builds a model from a stack in engine order: back medium first, front medium last.
    pub fn from_engine_stack(
        dataset_label: Option<String>,
        mut stack: Vec<RawLayerAttrs>,
        probe: RawProbe,
        chi2: Option<f64>,
        source: &str,
    ) -> IngestResult<Self> {
        if stack.len() < 2 {
            return Err(IngestError::shape_mismatch(
                "MODEL.MISSING_MEDIA",
                format!(
                    "sample stack{} has {} entries; a front and a back medium are required",
                    label_suffix(dataset_label.as_deref()),
                    stack.len()
                ),
                source,
            ));
        }

        let mut back = stack.remove(0);
        let mut front = stack.pop().unwrap_or_default();
        back.semi_infinite = true;
        front.semi_infinite = true;
        stack.reverse();

        Ok(Self {
            dataset_label,
            back,
            front,
            layers: stack,
            probe,
            chi2,
            source: source.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitParameter {
    pub value: f64,
    pub error: f64,
    pub fixed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl FitParameter {
    pub fn new(value: f64, error: f64, fixed: bool) -> Self {
        Self {
            value,
            error,
            fixed,
            display: None,
        }
    }

    /// Placeholder for a parameter the log did not report.
    pub fn unreported() -> Self {
        Self::new(0.0, 0.0, true)
    }

    pub fn is_free(&self) -> bool {
        !self.fixed
    }
}

impl Default for FitParameter {
    fn default() -> Self {
        Self::unreported()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledLayer {
    pub name: String,
    pub thickness: FitParameter,
    pub sld: FitParameter,
    pub isld: FitParameter,
    pub roughness: FitParameter,
    /// 1-based, front to back; assigned during assembly.
    pub layer_number: usize,
}

impl ReconciledLayer {
    pub fn parameters(&self) -> [(AttributeKey, &FitParameter); 4] {
        [
            (AttributeKey::Thickness, &self.thickness),
            (AttributeKey::Sld, &self.sld),
            (AttributeKey::Isld, &self.isld),
            (AttributeKey::Roughness, &self.roughness),
        ]
    }

    pub fn has_free_parameter(&self) -> bool {
        self.parameters().iter().any(|(_, parameter)| parameter.is_free())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectivityModel {
    pub front_name: String,
    pub front_sld: FitParameter,
    pub back_name: String,
    pub back_sld: FitParameter,
    pub back_roughness: FitParameter,
    pub scale: FitParameter,
    pub background: FitParameter,
    pub layers: Vec<ReconciledLayer>,
    pub chi2: Option<f64>,
}

impl ReflectivityModel {
    /// Layers carrying at least one free parameter, front to back.
    pub fn free_layers(&self) -> Vec<&ReconciledLayer> {
        self.layers
            .iter()
            .filter(|layer| layer.has_free_parameter())
            .collect()
    }

    pub fn layer(&self, name: &str) -> Option<&ReconciledLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetFit {
    pub dataset_label: Option<String>,
    pub model: ReflectivityModel,
}

/// Result of a simultaneous fit: one model per dataset plus the combined statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitRun {
    pub models: Vec<DatasetFit>,
    pub chi2: Option<f64>,
}

impl FitRun {
    pub fn model_for(&self, dataset_label: &str) -> Option<&ReflectivityModel> {
        self.models
            .iter()
            .find(|fit| fit.dataset_label.as_deref() == Some(dataset_label))
            .map(|fit| &fit.model)
    }

    pub fn labels(&self) -> Vec<Option<&str>> {
        self.models
            .iter()
            .map(|fit| fit.dataset_label.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitOutcome {
    Single(ReflectivityModel),
    Simultaneous(FitRun),
}

impl FitOutcome {
    pub fn models(&self) -> Vec<&ReflectivityModel> {
        match self {
            Self::Single(model) => vec![model],
            Self::Simultaneous(run) => run.models.iter().map(|fit| &fit.model).collect(),
        }
    }

    pub fn single(&self) -> Option<&ReflectivityModel> {
        match self {
            Self::Single(model) => Some(model),
            Self::Simultaneous(_) => None,
        }
    }

    pub fn simultaneous(&self) -> Option<&FitRun> {
        match self {
            Self::Single(_) => None,
            Self::Simultaneous(run) => Some(run),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub format: ModelFormat,
    pub engine_version: Option<String>,
    pub outcome: FitOutcome,
    pub chi2: Option<f64>,
    /// Set when no chi-squared was found; the fit appears incomplete.
    pub incomplete: bool,
    pub diagnostics: Vec<IngestError>,
}

/// What the caller expects a model to look like, taken from its own model definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedShape {
    pub layer_count: Option<usize>,
    /// Finite layer names, front to back.
    pub layer_names: Vec<String>,
    pub front_name: Option<String>,
    pub back_name: Option<String>,
}

impl ExpectedShape {
    pub fn with_layer_count(layer_count: usize) -> Self {
        Self {
            layer_count: Some(layer_count),
            ..Self::default()
        }
    }

    pub fn with_layer_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            layer_names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn front(mut self, name: impl Into<String>) -> Self {
        self.front_name = Some(name.into());
        self
    }

    pub fn back(mut self, name: impl Into<String>) -> Self {
        self.back_name = Some(name.into());
        self
    }

    pub fn expected_layer_count(&self) -> Option<usize> {
        self.layer_count.or_else(|| {
            (!self.layer_names.is_empty()).then_some(self.layer_names.len())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShapeExpectation {
    #[default]
    Unchecked,
    Uniform(ExpectedShape),
    PerDataset(Vec<ExpectedShape>),
}

impl ShapeExpectation {
    pub fn for_dataset(&self, index: usize) -> Option<&ExpectedShape> {
        match self {
            Self::Unchecked => None,
            Self::Uniform(shape) => Some(shape),
            Self::PerDataset(shapes) => shapes.get(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest<'a> {
    pub log_text: &'a str,
    pub shape: ShapeExpectation,
    pub pretty: bool,
}

impl<'a> IngestRequest<'a> {
    pub fn new(log_text: &'a str) -> Self {
        Self {
            log_text,
            shape: ShapeExpectation::Unchecked,
            pretty: false,
        }
    }

    pub fn with_shape(mut self, shape: ExpectedShape) -> Self {
        self.shape = ShapeExpectation::Uniform(shape);
        self
    }

    pub fn with_dataset_shapes(mut self, shapes: Vec<ExpectedShape>) -> Self {
        self.shape = ShapeExpectation::PerDataset(shapes);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

pub(crate) fn label_suffix(dataset_label: Option<&str>) -> String {
    dataset_label
        .map(|label| format!(" for dataset '{label}'"))
        .unwrap_or_default()
}
