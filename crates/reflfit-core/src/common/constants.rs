//! Line markers and keywords emitted by the fitting engine and its driver script.

pub const SIMULTANEOUS_MARKER: &str = "SIMULTANEOUS";
pub const ENGINE_VERSION_MARKER: &str = "REFL1D_VERSION";
pub const SUB_MODEL_MARKER: &str = "-- Model";

pub const CHI2_LINE_PREFIX: &str = "[chisq=";
pub const OVERALL_CHI2_LINE_PREFIX: &str = "[overall chisq=";
pub const CHI2_KEY: &str = "chisq=";

pub const PROBE_SECTION: &str = ".probe";
pub const SAMPLE_SECTION: &str = ".sample";
pub const PARAMETER_CALL: &str = "Parameter(";
pub const PARAMETER_NAME_KEY: &str = "name='";
pub const PARAMETER_BOUNDS_KEY: &str = "bounds=(";

pub const INTENSITY_PARAMETER: &str = "intensity";
pub const BACKGROUND_PARAMETER: &str = "background";
