use serde::Deserialize;

/// Engine serialization of a fit problem: the sample stack plus the probe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonFitModel {
    pub sample: JsonSample,
    #[serde(default)]
    pub probe: JsonProbe,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonSample {
    /// Back medium first, front medium last.
    pub layers: Vec<JsonLayer>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct JsonLayer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thickness: Option<JsonParameter>,
    #[serde(default)]
    pub interface: Option<JsonParameter>,
    #[serde(default)]
    pub rho: Option<JsonParameter>,
    #[serde(default)]
    pub irho: Option<JsonParameter>,
    #[serde(default)]
    pub material: Option<JsonMaterial>,
}

impl JsonLayer {
    pub fn rho(&self) -> Option<&JsonParameter> {
        self.rho
            .as_ref()
            .or_else(|| self.material.as_ref().and_then(|material| material.rho.as_ref()))
    }

    pub fn irho(&self) -> Option<&JsonParameter> {
        self.irho
            .as_ref()
            .or_else(|| self.material.as_ref().and_then(|material| material.irho.as_ref()))
    }

    pub fn resolved_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.material.as_ref().and_then(|material| material.name.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct JsonMaterial {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rho: Option<JsonParameter>,
    #[serde(default)]
    pub irho: Option<JsonParameter>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct JsonProbe {
    #[serde(default)]
    pub intensity: Option<JsonParameter>,
    #[serde(default)]
    pub background: Option<JsonParameter>,
}

/// A parameter is either a full object or a bare number (a constant).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonParameter {
    Detailed(JsonParameterRecord),
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonParameterRecord {
    pub value: f64,
    #[serde(default = "fixed_by_default")]
    pub fixed: bool,
    #[serde(default)]
    pub name: Option<String>,
    /// Open ends are serialized as `null`.
    #[serde(default)]
    pub bounds: Option<[Option<f64>; 2]>,
}

fn fixed_by_default() -> bool {
    true
}

impl JsonParameter {
    pub fn value(&self) -> f64 {
        match self {
            Self::Detailed(record) => record.value,
            Self::Constant(value) => *value,
        }
    }

    pub fn fixed(&self) -> bool {
        match self {
            Self::Detailed(record) => record.fixed,
            Self::Constant(_) => true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Detailed(record) => record.name.as_deref(),
            Self::Constant(_) => None,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::Detailed(JsonParameterRecord {
                bounds: Some([Some(low), Some(high)]),
                ..
            }) => Some((*low, *high)),
            _ => None,
        }
    }
}
