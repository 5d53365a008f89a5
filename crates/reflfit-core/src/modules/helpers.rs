use crate::common::constants::{CHI2_KEY, CHI2_LINE_PREFIX, OVERALL_CHI2_LINE_PREFIX};
use crate::domain::AttributeKey;

/// Goodness-of-fit lines of a run: one `[chisq=` per model, in order, and the
/// `[overall chisq=` of a simultaneous fit.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Chi2Lines {
    pub(crate) per_model: Vec<f64>,
    pub(crate) overall: Option<f64>,
}

pub(crate) fn parse_numeric_token(token: &str) -> Option<f64> {
    let value = token.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

pub(crate) fn is_index_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}

/// Rest of the line after `marker`, if the line starts with it.
pub(crate) fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.trim().strip_prefix(marker)
}

/// Reads the number following `chisq=`, e.g. `[chisq=23.426(15), nllf=1850.62]`.
pub(crate) fn parse_chi2_value(line: &str) -> Option<f64> {
    let start = line.find(CHI2_KEY)? + CHI2_KEY.len();
    let digits = line[start..]
        .chars()
        .take_while(|character| character.is_ascii_digit() || *character == '.')
        .collect::<String>();
    parse_numeric_token(&digits)
}

pub(crate) fn scan_chi2_lines(text: &str) -> Chi2Lines {
    let mut lines = Chi2Lines::default();
    for line in text.lines().map(str::trim) {
        if line.starts_with(OVERALL_CHI2_LINE_PREFIX) {
            lines.overall = parse_chi2_value(line).or(lines.overall);
        } else if line.starts_with(CHI2_LINE_PREFIX) {
            lines.per_model.extend(parse_chi2_value(line));
        }
    }
    lines
}

/// Splits an engine label such as `SiOx thickness` into the layer part and the attribute.
pub(crate) fn split_parameter_label(label: &str) -> (&str, Option<AttributeKey>) {
    let label = label.trim();
    match label.rsplit_once(char::is_whitespace) {
        Some((name, suffix)) => match AttributeKey::from_engine_suffix(suffix) {
            Some(key) => (name.trim_end(), Some(key)),
            None => (label, None),
        },
        None => (label, None),
    }
}

pub(crate) fn parameter_label(layer_name: &str, key: AttributeKey) -> String {
    format!("{} {}", layer_name, key.engine_suffix()).trim().to_string()
}
