//! The engine's parameter tables: the DREAM uncertainty table with its compact
//! `value(error)exponent` notation, and the plain best-value listing.

mod parser;

pub use parser::{decode_best_value_row, decode_row};

use crate::domain::{IngestError, ParsedParameter};
use parser::looks_like_row;
use tracing::debug;

/// Collects every decodable DREAM row in `text`; rows that look like table rows
/// but fail to decode are reported and skipped.
pub fn scan_dream_table(text: &str, diagnostics: &mut Vec<IngestError>) -> Vec<ParsedParameter> {
    let mut rows = Vec::new();
    for line in text.lines() {
        match decode_row(line) {
            Some(row) => rows.push(row),
            None if looks_like_row(line) => {
                debug!("skipping undecodable DREAM row: {}", line.trim());
                diagnostics.push(IngestError::unparsable_row(
                    "TABLE.DREAM_ROW",
                    "DREAM table row does not match the expected column layout",
                    line,
                ));
            }
            None => {}
        }
    }
    rows
}

pub fn scan_best_values(text: &str, diagnostics: &mut Vec<IngestError>) -> Vec<ParsedParameter> {
    let mut rows = Vec::new();
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        match decode_best_value_row(line) {
            Some(row) => rows.push(row),
            None => {
                debug!("skipping undecodable best-value row: {}", line.trim());
                diagnostics.push(IngestError::unparsable_row(
                    "TABLE.BEST_VALUE_ROW",
                    "best-value row is not '<name> <value>'",
                    line,
                ));
            }
        }
    }
    rows
}
