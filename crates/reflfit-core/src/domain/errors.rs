use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IngestResult<T> = Result<T, IngestError>;

const FRAGMENT_LIMIT: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestErrorKind {
    MalformedBlock,
    UnparsableRow,
    ShapeMismatch,
    MissingChi2,
    NoRecognizedFormat,
}

impl IngestErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedBlock => "MalformedBlock",
            Self::UnparsableRow => "UnparsableRow",
            Self::ShapeMismatch => "ShapeMismatch",
            Self::MissingChi2 => "MissingChi2",
            Self::NoRecognizedFormat => "NoRecognizedFormat",
        }
    }

    /// Fatal kinds abort ingestion; the rest are collected as diagnostics.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::ShapeMismatch | Self::NoRecognizedFormat)
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::NoRecognizedFormat => 3,
            Self::ShapeMismatch => 4,
            Self::MalformedBlock | Self::UnparsableRow | Self::MissingChi2 => 0,
        }
    }
}

impl Display for IngestErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestError {
    kind: IngestErrorKind,
    placeholder: &'static str,
    message: String,
    fragment: String,
}

impl IngestError {
    pub fn new(
        kind: IngestErrorKind,
        placeholder: &'static str,
        message: impl Into<String>,
        fragment: impl AsRef<str>,
    ) -> Self {
        Self {
            kind,
            placeholder,
            message: message.into(),
            fragment: clip_fragment(fragment.as_ref()),
        }
    }

    pub fn malformed_block(
        placeholder: &'static str,
        message: impl Into<String>,
        fragment: impl AsRef<str>,
    ) -> Self {
        Self::new(IngestErrorKind::MalformedBlock, placeholder, message, fragment)
    }

    pub fn unparsable_row(
        placeholder: &'static str,
        message: impl Into<String>,
        fragment: impl AsRef<str>,
    ) -> Self {
        Self::new(IngestErrorKind::UnparsableRow, placeholder, message, fragment)
    }

    pub fn shape_mismatch(
        placeholder: &'static str,
        message: impl Into<String>,
        fragment: impl AsRef<str>,
    ) -> Self {
        Self::new(IngestErrorKind::ShapeMismatch, placeholder, message, fragment)
    }

    pub fn missing_chi2(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(IngestErrorKind::MissingChi2, placeholder, message, "")
    }

    pub fn no_recognized_format(
        placeholder: &'static str,
        message: impl Into<String>,
        fragment: impl AsRef<str>,
    ) -> Self {
        Self::new(
            IngestErrorKind::NoRecognizedFormat,
            placeholder,
            message,
            fragment,
        )
    }

    pub const fn kind(&self) -> IngestErrorKind {
        self.kind
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub const fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    pub const fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.is_fatal() { "ERROR" } else { "WARNING" };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.kind, self.placeholder, self.message)?;
        if !self.fragment.is_empty() {
            write!(f, " near '{}'", self.fragment)?;
        }
        Ok(())
    }
}

impl Error for IngestError {}

fn clip_fragment(fragment: &str) -> String {
    let trimmed = fragment.trim();
    match trimmed.char_indices().nth(FRAGMENT_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{IngestError, IngestErrorKind};

    #[test]
    fn fatal_kinds_map_to_stable_exit_codes() {
        let cases = [
            (IngestErrorKind::MalformedBlock, false, 0),
            (IngestErrorKind::UnparsableRow, false, 0),
            (IngestErrorKind::ShapeMismatch, true, 4),
            (IngestErrorKind::MissingChi2, false, 0),
            (IngestErrorKind::NoRecognizedFormat, true, 3),
        ];

        for (kind, fatal, exit_code) in cases {
            assert_eq!(kind.is_fatal(), fatal, "{kind}");
            assert_eq!(kind.exit_code(), exit_code, "{kind}");
        }
    }

    #[test]
    fn diagnostic_line_reflects_severity() {
        let fatal = IngestError::shape_mismatch(
            "MODEL.SHAPE_MISMATCH",
            "expected 1 layer, found 3",
            "[1]\n  .thickness = Parameter(12, name='SiOx thickness')",
        );
        assert_eq!(
            fatal.diagnostic_line(),
            "ERROR: [MODEL.SHAPE_MISMATCH] expected 1 layer, found 3"
        );
        assert!(fatal.fragment().starts_with("[1]"));

        let warning = IngestError::missing_chi2("FIT.MISSING_CHI2", "no chi-squared in log");
        assert_eq!(
            warning.diagnostic_line(),
            "WARNING: [FIT.MISSING_CHI2] no chi-squared in log"
        );
        assert_eq!(warning.fragment(), "");
    }

    #[test]
    fn long_fragments_are_clipped() {
        let long_text = "x".repeat(1000);
        let error = IngestError::no_recognized_format("LOG.NO_FORMAT", "nothing found", &long_text);
        assert_eq!(error.fragment().len(), 243);
        assert!(error.fragment().ends_with("..."));
        assert!(error.to_string().contains("NoRecognizedFormat [LOG.NO_FORMAT]"));
    }
}
