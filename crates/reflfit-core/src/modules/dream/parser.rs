use crate::domain::ParsedParameter;
use crate::modules::helpers::{is_index_token, parse_numeric_token};

/// Mean column of a DREAM row, `<mantissa>(<error digits>)<exponent>`, e.g. `0.91(91)e-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CompactNotation<'a> {
    pub(crate) mantissa: &'a str,
    pub(crate) error_digits: &'a str,
    pub(crate) exponent: i32,
}

impl<'a> CompactNotation<'a> {
    pub(crate) fn parse(token: &'a str) -> Option<Self> {
        let (mantissa, rest) = token.split_once('(')?;
        let (error_digits, exponent) = rest.split_once(')')?;

        let unsigned = mantissa.strip_prefix('-').unwrap_or(mantissa);
        let digit_count = unsigned.bytes().filter(u8::is_ascii_digit).count();
        let point_count = unsigned.bytes().filter(|byte| *byte == b'.').count();
        if digit_count == 0 || digit_count + point_count != unsigned.len() || point_count > 1 {
            return None;
        }
        if !is_index_token(error_digits) {
            return None;
        }

        let exponent = match exponent.strip_prefix(['e', 'E']).unwrap_or(exponent) {
            "" => 0,
            digits => digits.parse::<i32>().ok()?,
        };

        Some(Self {
            mantissa,
            error_digits,
            exponent,
        })
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        format!("{}e{}", self.mantissa, self.exponent).parse().ok()
    }

    /// Absolute error: the error digits are aligned with the trailing digits of
    /// the mantissa, leading positions are zero-filled and the decimal point
    /// stays where the mantissa had it.
    pub(crate) fn absolute_error(&self) -> Option<f64> {
        let unsigned = self.mantissa.strip_prefix('-').unwrap_or(self.mantissa);
        let error_digits = self.error_digits.as_bytes();
        let mantissa_digits = unsigned.bytes().filter(u8::is_ascii_digit).count();

        let padding = error_digits.len().saturating_sub(mantissa_digits);
        let offset = mantissa_digits + padding - error_digits.len();

        let mut aligned = String::with_capacity(unsigned.len() + padding);
        let mut position = 0;
        for character in std::iter::repeat_n('0', padding).chain(unsigned.chars()) {
            if character == '.' {
                aligned.push('.');
                continue;
            }
            if position < offset {
                aligned.push('0');
            } else {
                aligned.push(char::from(error_digits[position - offset]));
            }
            position += 1;
        }

        format!("{}e{}", aligned, self.exponent).parse().ok()
    }
}

/// Decodes one row of the DREAM table:
/// `<index> <name tokens> <mean>(<err>)<exp> <median> <best> [68% interval] [95% interval]`.
///
/// The reported value is the best-fit column, not the posterior mean.
pub fn decode_row(line: &str) -> Option<ParsedParameter> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < 6 || !is_index_token(tokens[0]) {
        return None;
    }

    // Rightmost mean column that still leaves median, best and an interval after it.
    let (position, notation, value) = (2..=tokens.len() - 4).rev().find_map(|position| {
        let notation = CompactNotation::parse(tokens[position])?;
        parse_numeric_token(tokens[position + 1])?;
        let value = parse_numeric_token(tokens[position + 2])?;
        Some((position, notation, value))
    })?;

    let error = notation.absolute_error()?;
    Some(ParsedParameter::new(tokens[1..position].join(" "), value, error))
}

/// Decodes a best-value row, `<name tokens> <value>`, with zero error.
pub fn decode_best_value_row(line: &str) -> Option<ParsedParameter> {
    let (name, value) = line.trim().rsplit_once(char::is_whitespace)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = parse_numeric_token(value)?;
    Some(ParsedParameter::new(name, value, 0.0))
}

/// A line shaped like a DREAM row (index first, parenthesised error) that may still fail to decode.
pub(crate) fn looks_like_row(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    tokens.next().is_some_and(is_index_token) && line.contains('(') && line.contains(')')
}
