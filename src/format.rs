//! Number and date formatting shared by pages, charts and tables.

use chrono::NaiveDate;

/// Formats `value` rounded to `decimals` with `,` thousands separators.
pub fn grouped(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + integer.len() / 3 + 1);
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// `12,345 kg`, switching to tonnes from 10 000 kg upwards.
pub fn weight(kg: f64) -> String {
    if kg.abs() >= 10_000.0 {
        format!("{} t", grouped(kg / 1000.0, 1))
    } else {
        format!("{} kg", grouped(kg, 0))
    }
}

pub fn percent(value: f64) -> String {
    format!("{}%", grouped(value, 1))
}

/// Short axis label: `0`, `250`, `2.5k`, `1.2M`.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1_000_000.0 {
        (value / 1_000_000.0, "M")
    } else if abs >= 1_000.0 {
        (value / 1_000.0, "k")
    } else {
        (value, "")
    };
    let text = if (scaled - scaled.round()).abs() < 1e-9 {
        format!("{:.0}", scaled)
    } else if scaled.abs() < 1.0 {
        format!("{:.2}", scaled)
    } else {
        format!("{:.1}", scaled)
    };
    format!("{}{}", text, suffix)
}

/// Renders an ISO date as `01 Jan 2024`; unparsable input is shown as given.
pub fn display_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d %b %Y").to_string(),
        Err(_) => trimmed.to_owned(),
    }
}

/// Lowercase ASCII slug with `_` separators, used in file names.
pub fn slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "report".to_owned()
    } else {
        slug.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(grouped(0.0, 0), "0");
        assert_eq!(grouped(999.0, 0), "999");
        assert_eq!(grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(grouped(-4200.0, 0), "-4,200");
        assert_eq!(grouped(-0.01, 0), "0");
        assert_eq!(grouped(f64::NAN, 1), "0.0");
    }

    #[test]
    fn weights_switch_to_tonnes() {
        assert_eq!(weight(950.4), "950 kg");
        assert_eq!(weight(12_340.0), "12.3 t");
        assert_eq!(percent(45.26), "45.3%");
    }

    #[test]
    fn compact_axis_labels() {
        assert_eq!(compact(0.0), "0");
        assert_eq!(compact(250.0), "250");
        assert_eq!(compact(2500.0), "2.5k");
        assert_eq!(compact(1_000_000.0), "1M");
        assert_eq!(compact(0.25), "0.25");
    }

    #[test]
    fn dates_and_slugs() {
        assert_eq!(display_date("2024-01-05"), "05 Jan 2024");
        assert_eq!(display_date("2024-03-31T23:59:59Z"), "31 Mar 2024");
        assert_eq!(display_date("last quarter"), "last quarter");
        assert_eq!(slug("North Depot / Site #2"), "north_depot_site_2");
        assert_eq!(slug("***"), "report");
    }
}
