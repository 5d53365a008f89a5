#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub deviation: f64,
    pub passes: bool,
}

/// An f64 carries at most 17 significant decimal digits.
pub const MAX_SIGNIFICANT_FIGURES: u32 = 17;

/// Rounds to `figures` significant digits through decimal formatting, so the
/// result is the double nearest to the printed value. `figures` is clamped to
/// `1..=MAX_SIGNIFICANT_FIGURES`.
pub fn round_significant(value: f64, figures: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let precision = figures.clamp(1, MAX_SIGNIFICANT_FIGURES) as usize - 1;
    format!("{value:.precision$e}").parse().unwrap_or(value)
}

/// Relative deviation of `candidate` from `reference`; absolute when the reference is zero.
pub fn relative_deviation(reference: f64, candidate: f64) -> f64 {
    if reference == 0.0 {
        candidate.abs()
    } else {
        ((candidate - reference) / reference).abs()
    }
}

pub fn compare_with_relative_tolerance(
    reference: f64,
    candidate: f64,
    tolerance: f64,
) -> ToleranceComparison {
    let deviation = relative_deviation(reference, candidate);
    ToleranceComparison {
        deviation,
        passes: deviation < tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_with_relative_tolerance, relative_deviation, round_significant};

    #[test]
    fn rounding_keeps_requested_significant_digits() {
        assert_eq!(round_significant(1.00030009, 6), 1.0003);
        assert_eq!(round_significant(1.00030009, 4), 1.0);
        assert_eq!(round_significant(0.000912345, 2), 0.00091);
        assert_eq!(round_significant(-2.07123, 3), -2.07);
        assert_eq!(round_significant(123456.0, 2), 120000.0);
        assert_eq!(round_significant(0.0, 4), 0.0);
        assert!(round_significant(f64::NAN, 4).is_nan());
    }

    #[test]
    fn zero_figures_behaves_like_one() {
        assert_eq!(round_significant(0.0347, 0), 0.03);
    }

    #[test]
    fn oversized_figures_keep_the_full_value() {
        assert_eq!(round_significant(1.00030009, u32::MAX), 1.00030009);
        assert_eq!(round_significant(-2.07123, 40), -2.07123);
    }

    #[test]
    fn deviation_is_absolute_for_zero_reference() {
        assert_eq!(relative_deviation(0.0, 0.0005), 0.0005);
        assert!((relative_deviation(2.0, 2.001) - 0.0005).abs() < 1.0e-12);
    }

    #[test]
    fn tolerance_comparison_is_strict() {
        assert!(compare_with_relative_tolerance(1.0, 1.0009, 1.0e-3).passes);
        assert!(!compare_with_relative_tolerance(1.0, 1.002, 1.0e-3).passes);
        assert!(compare_with_relative_tolerance(1.0, 1.009, 1.0e-2).passes);
    }
}
