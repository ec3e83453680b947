//! "Nice" axis ceilings for value axes.

/// Multipliers tried, in increasing order, against the decade of the maximum.
const MULTIPLIERS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// A value axis running from zero to a round ceiling, labelled at zero, half and full.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisScale {
    pub ceiling: f64,
    pub ticks: [f64; 3],
}

impl AxisScale {
    /// Position of `value` along the axis in `0.0..=1.0`.
    pub fn fraction(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        (value / self.ceiling).clamp(0.0, 1.0)
    }
}

/// Chooses an axis ceiling of the form `m × 10^k` with `m ∈ {1, 2, 2.5, 5, 10}`.
///
/// The ceiling is never below `max` and never above ten times `max`. A zero, negative or
/// non-finite maximum is treated as `1.0`.
pub fn nice_scale(max: f64) -> AxisScale {
    let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };

    let mut magnitude = 1.0_f64;
    while magnitude * 10.0 <= max {
        magnitude *= 10.0;
    }
    while magnitude > max {
        magnitude /= 10.0;
    }

    let ceiling = MULTIPLIERS
        .iter()
        .map(|multiplier| multiplier * magnitude)
        .find(|candidate| *candidate >= max)
        .unwrap_or(magnitude * 10.0);

    AxisScale {
        ceiling,
        ticks: [0.0, ceiling / 2.0, ceiling],
    }
}

/// [`nice_scale`] over the largest finite value of `values`.
pub fn scale_for<I>(values: I) -> AxisScale
where
    I: IntoIterator<Item = f64>,
{
    let max = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    nice_scale(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_round_ceilings() {
        assert_eq!(nice_scale(7.0).ceiling, 10.0);
        assert_eq!(nice_scale(10.0).ceiling, 10.0);
        assert_eq!(nice_scale(11.0).ceiling, 20.0);
        assert_eq!(nice_scale(23.0).ceiling, 25.0);
        assert_eq!(nice_scale(420.0).ceiling, 500.0);
        assert_eq!(nice_scale(5001.0).ceiling, 10000.0);
    }

    #[test]
    fn degenerate_maxima_default_to_one() {
        for max in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let scale = nice_scale(max);
            assert_eq!(scale.ceiling, 1.0);
            assert_eq!(scale.ticks, [0.0, 0.5, 1.0]);
        }
        assert_eq!(scale_for(Vec::new()).ceiling, 1.0);
    }

    #[test]
    fn fractions_below_one_stay_tight() {
        let scale = nice_scale(0.03);
        assert!((scale.ceiling - 0.05).abs() < 1e-12);
    }

    #[test]
    fn ceiling_brackets_the_maximum() {
        let mut value = 0.0013;
        while value < 5.0e7 {
            let ceiling = nice_scale(value).ceiling;
            assert!(ceiling >= value, "{} < {}", ceiling, value);
            assert!(ceiling <= value * 10.0, "{} > 10 × {}", ceiling, value);
            value *= 1.37;
        }
    }

    #[test]
    fn fraction_is_clamped() {
        let scale = nice_scale(80.0);
        assert_eq!(scale.fraction(50.0), 0.5);
        assert_eq!(scale.fraction(-4.0), 0.0);
        assert_eq!(scale.fraction(f64::NAN), 0.0);
    }
}
