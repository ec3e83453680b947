//! Chart layout algorithms.
//!
//! Every chart is split into a pure layout function returning geometry and a `draw_*` function
//! painting that geometry onto a [`crate::surface::Surface`]. Tests exercise the layout half.

pub mod bar;
pub mod pie;
pub mod sankey;

use std::cmp::Ordering;

/// Ordered `(category, value)` pairs belonging to one series key, e.g. one year of monthly totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Series {
    pub key: String,
    pub values: Vec<(String, f64)>,
}

impl Series {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, category: impl Into<String>, value: f64) -> Self {
        self.values.push((category.into(), value));
        self
    }

    /// Value for `category`, zero when missing. Negative and non-finite values read as zero.
    pub fn value(&self, category: &str) -> f64 {
        self.values
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, value)| sanitize(*value))
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().map(|(_, value)| sanitize(*value)).sum()
    }
}

/// Clamps a chart value to a finite, non-negative number.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Orders keys numerically when both parse as numbers, otherwise lexically.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_negative_values_read_as_zero() {
        let series = Series::new("2024").with_value("Jan", 12.0).with_value("Feb", -3.0);
        assert_eq!(series.value("Jan"), 12.0);
        assert_eq!(series.value("Feb"), 0.0);
        assert_eq!(series.value("Mar"), 0.0);
        assert_eq!(series.total(), 12.0);
    }

    #[test]
    fn keys_sort_numerically() {
        let mut keys = vec!["2024", "999", "FY23", "2023"];
        keys.sort_by(|a, b| compare_keys(a, b));
        assert_eq!(keys, vec!["999", "2023", "2024", "FY23"]);
    }
}
