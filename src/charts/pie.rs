//! Pie charts drawn with the surface's wedge primitive.

use std::f64::consts::TAU;

use crate::format;
use crate::primitives::legend_entry;
use crate::surface::{Color, FontSpec, Paint, Point, Rect, Surface};
use crate::text::fit_text;
use crate::theme::Theme;

use super::sanitize;

/// Width of the white stroke separating neighbouring slices.
pub const SLICE_GAP: f64 = 1.5;

const FALLBACK_COLOR: Color = Color::rgb(0xbd, 0xbd, 0xbd);

/// Start angle and sweep (radians, clockwise from twelve o'clock) of every slice.
///
/// Negative and non-finite values count as zero. When nothing is left a single full slice is
/// returned so that an empty circle still renders.
pub fn slice_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let mut values: Vec<f64> = values.iter().copied().map(sanitize).collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        values = vec![1.0];
    }
    let total: f64 = values.iter().sum();

    let mut start = 0.0;
    values
        .into_iter()
        .map(|value| {
            let sweep = value / total * TAU;
            let slice = (start, sweep);
            start += sweep;
            slice
        })
        .collect()
}

/// Draws a pie; `colors` is cycled when shorter than `values`.
pub fn draw_pie(surface: &mut dyn Surface, center: Point, radius: f64, values: &[f64], colors: &[Color]) {
    for (index, (start, sweep)) in slice_angles(values).into_iter().enumerate() {
        let color = if colors.is_empty() {
            FALLBACK_COLOR
        } else {
            colors[index % colors.len()]
        };
        let paint = Paint::fill(color).with_stroke(Color::WHITE, SLICE_GAP);
        surface.fill_wedge(center, radius, start, sweep, &paint);
    }
}

/// Pie on the left of `area` with a legend listing each item's share on the right.
pub fn draw_pie_with_legend(surface: &mut dyn Surface, theme: &Theme, area: Rect, items: &[(String, f64)]) {
    let radius = (area.height / 2.0).min(area.width * 0.22).max(0.0);
    let center = Point::new(area.x + radius, area.y + area.height / 2.0);
    let values: Vec<f64> = items.iter().map(|(_, value)| *value).collect();
    let colors: Vec<Color> = (0..items.len()).map(|index| theme.palette.categorical(index)).collect();
    draw_pie(surface, center, radius, &values, &colors);

    let total: f64 = values.iter().copied().map(sanitize).sum();
    let font = FontSpec::regular(theme.small_size);
    let row = font.line_height() + 3.0;
    let legend_x = area.x + radius * 2.0 + theme.gap;
    let legend_width = (area.right() - legend_x).max(0.0);
    let visible = ((area.height / row).floor() as usize).min(items.len());
    let mut y = area.y + (area.height - visible as f64 * row) / 2.0;
    for (index, (name, value)) in items.iter().take(visible).enumerate() {
        let share = if total > 0.0 {
            sanitize(*value) / total * 100.0
        } else {
            0.0
        };
        let label = fit_text(
            surface.metrics(),
            &format!("{} ({})", name, format::percent(share)),
            font,
            (legend_width - font.size - 4.0).max(0.0),
        );
        legend_entry(surface, theme, Point::new(legend_x, y), colors[index], &label);
        y += row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;
    use crate::surface::{Path, Size};

    #[test]
    fn slices_cover_the_full_circle() {
        let slices = slice_angles(&[1.0, 3.0, 0.0, -2.0]);
        assert_eq!(slices.len(), 4);
        assert!((slices[0].1 - TAU / 4.0).abs() < 1e-12);
        assert!((slices[1].0 - TAU / 4.0).abs() < 1e-12);
        assert_eq!(slices[2].1, 0.0);
        let swept: f64 = slices.iter().map(|(_, sweep)| sweep).sum();
        assert!((swept - TAU).abs() < 1e-12);
    }

    #[test]
    fn all_zero_input_renders_a_circle() {
        assert_eq!(slice_angles(&[0.0, 0.0]), vec![(0.0, TAU)]);
        assert_eq!(slice_angles(&[]), vec![(0.0, TAU)]);

        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let center = Point::new(100.0, 100.0);
        draw_pie(&mut surface, center, 40.0, &[0.0], &[]);
        let paths: Vec<_> = surface.pages()[0].paths().collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(*paths[0].0, Path::circle(center, 40.0));
        assert_eq!(paths[0].1.fill, Some(FALLBACK_COLOR));
    }

    #[test]
    fn colors_cycle() {
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let palette = [Color::BLACK, Color::WHITE];
        draw_pie(&mut surface, Point::new(0.0, 0.0), 10.0, &[1.0, 1.0, 1.0], &palette);
        let fills: Vec<_> = surface.pages()[0].paths().map(|(_, paint)| paint.fill).collect();
        assert_eq!(fills, vec![Some(Color::BLACK), Some(Color::WHITE), Some(Color::BLACK)]);
    }
}
