//! Grouped multi-series bars, horizontal top-N lists and current/previous comparison bars.

use crate::format;
use crate::primitives::{legend_entry, legend_entry_width};
use crate::scale::{scale_for, AxisScale};
use crate::surface::{Color, FontSpec, Paint, Point, Rect, Surface};
use crate::text::fit_text;
use crate::theme::Theme;

use super::{compare_keys, sanitize, Series};

/// Layout constants of the bar charts.
#[derive(Clone, Debug, PartialEq)]
pub struct BarChartStyle {
    /// Only the most recent `max_series` series are drawn.
    pub max_series: usize,
    /// Share of a category band occupied by its bar group.
    pub group_fill: f64,
    /// Horizontal gap between the bars of one group.
    pub inner_gap: f64,
    pub axis_width: f64,
    pub legend_height: f64,
    pub category_label_height: f64,
    pub legend_spacing: f64,
    /// Rows shown by [`draw_bar_list`].
    pub list_items: usize,
}

impl Default for BarChartStyle {
    fn default() -> Self {
        Self {
            max_series: 3,
            group_fill: 0.7,
            inner_gap: 2.0,
            axis_width: 34.0,
            legend_height: 16.0,
            category_label_height: 14.0,
            legend_spacing: 12.0,
            list_items: 8,
        }
    }
}

/// One bar of a grouped chart.
#[derive(Clone, Debug, PartialEq)]
pub struct BarRect {
    /// Index into [`GroupedBarLayout::series`].
    pub series: usize,
    pub value: f64,
    pub rect: Rect,
}

/// Horizontal band reserved for one category and the bars placed in it.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryBand {
    pub label: String,
    pub band: Rect,
    pub bars: Vec<BarRect>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupedBarLayout {
    pub plot: Rect,
    pub scale: AxisScale,
    /// Keys of the series drawn, oldest first.
    pub series: Vec<String>,
    pub categories: Vec<CategoryBand>,
}

/// Categories drawn: the allow-list when given, otherwise every category in order of first
/// appearance. Never empty.
fn resolve_categories(series: &[&Series], allow: Option<&[String]>) -> Vec<String> {
    let mut categories: Vec<String> = match allow {
        Some(allow) => allow.to_vec(),
        None => {
            let mut seen = Vec::new();
            for entry in series {
                for (category, _) in &entry.values {
                    if !seen.contains(category) {
                        seen.push(category.clone());
                    }
                }
            }
            seen
        }
    };
    if categories.is_empty() {
        categories.push(String::new());
    }
    categories
}

/// The most recent `max` series, oldest first.
pub fn recent_series(series: &[Series], max: usize) -> Vec<&Series> {
    let mut sorted: Vec<&Series> = series.iter().collect();
    sorted.sort_by(|a, b| compare_keys(&a.key, &b.key));
    let skip = sorted.len().saturating_sub(max.max(1));
    sorted.split_off(skip)
}

/// Computes bar geometry for `series` inside `plot`.
pub fn layout_grouped_bars(
    series: &[Series],
    allow: Option<&[String]>,
    plot: Rect,
    style: &BarChartStyle,
) -> GroupedBarLayout {
    let kept = recent_series(series, style.max_series);
    let categories = resolve_categories(&kept, allow);
    let scale = scale_for(
        kept.iter()
            .flat_map(|entry| categories.iter().map(move |category| entry.value(category))),
    );

    let band_width = plot.width / categories.len() as f64;
    let group_width = band_width * style.group_fill.clamp(0.05, 1.0);
    let count = kept.len().max(1) as f64;
    let mut gap = style.inner_gap.max(0.0);
    if gap * (count - 1.0) >= group_width * 0.5 {
        gap = 0.0;
    }
    let bar_width = (group_width - gap * (count - 1.0)) / count;

    let bands = categories
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let band = Rect::new(plot.x + index as f64 * band_width, plot.y, band_width, plot.height);
            let group_x = band.x + (band_width - group_width) / 2.0;
            let bars = kept
                .iter()
                .enumerate()
                .map(|(series_index, entry)| {
                    let value = entry.value(&label);
                    let height = scale.fraction(value) * plot.height;
                    BarRect {
                        series: series_index,
                        value,
                        rect: Rect::new(
                            group_x + series_index as f64 * (bar_width + gap),
                            plot.bottom() - height,
                            bar_width,
                            height,
                        ),
                    }
                })
                .collect();
            CategoryBand { label, band, bars }
        })
        .collect();

    GroupedBarLayout {
        plot,
        scale,
        series: kept.iter().map(|entry| entry.key.clone()).collect(),
        categories: bands,
    }
}

/// Left edges of legend entries packed right-to-left so that the last entry ends at `right`.
///
/// Returned in the order of `widths`.
pub fn legend_positions(widths: &[f64], right: f64, spacing: f64) -> Vec<f64> {
    let mut positions = vec![0.0; widths.len()];
    let mut cursor = right;
    for (index, width) in widths.iter().enumerate().rev() {
        cursor -= width;
        positions[index] = cursor;
        cursor -= spacing;
    }
    positions
}

fn series_color(theme: &Theme, index: usize, count: usize) -> Color {
    let offset = theme.palette.series.len().saturating_sub(count);
    theme.palette.series(offset + index)
}

/// Draws a grouped bar chart filling `area`: legend on top, value axis on the left and category
/// labels underneath.
pub fn draw_grouped_bar_chart(
    surface: &mut dyn Surface,
    theme: &Theme,
    area: Rect,
    series: &[Series],
    allow: Option<&[String]>,
    legend: bool,
) -> GroupedBarLayout {
    let style = &theme.bar_chart;
    let legend_band = if legend { style.legend_height } else { 0.0 };
    let plot = Rect::new(
        area.x + style.axis_width,
        area.y + legend_band + theme.small_size,
        (area.width - style.axis_width).max(0.0),
        (area.height - legend_band - theme.small_size - style.category_label_height).max(0.0),
    );
    let layout = layout_grouped_bars(series, allow, plot, style);
    let label_font = FontSpec::regular(theme.small_size);
    let palette = &theme.palette;

    for tick in layout.scale.ticks {
        let y = plot.bottom() - layout.scale.fraction(tick) * plot.height;
        surface.line(
            Point::new(plot.x, y),
            Point::new(plot.right(), y),
            palette.border,
            0.5,
        );
        let label = format::compact(tick);
        let width = surface.text_width(&label, label_font);
        surface.draw_text(
            &label,
            Point::new(plot.x - 4.0 - width, y + label_font.size * 0.35),
            label_font,
            palette.muted_text,
        );
    }

    let count = layout.series.len();
    for category in &layout.categories {
        for bar in &category.bars {
            if bar.rect.height > 0.0 {
                let radius = (bar.rect.width / 4.0).min(2.0);
                surface.rounded_rect(
                    bar.rect,
                    radius,
                    &Paint::fill(series_color(theme, bar.series, count)),
                );
            }
        }
        let label = fit_text(surface.metrics(), &category.label, label_font, category.band.width);
        let width = surface.text_width(&label, label_font);
        surface.draw_text(
            &label,
            Point::new(
                category.band.x + (category.band.width - width) / 2.0,
                plot.bottom() + label_font.line_height(),
            ),
            label_font,
            palette.text,
        );
    }

    if legend && count > 0 {
        let widths: Vec<f64> = layout
            .series
            .iter()
            .map(|key| legend_entry_width(&*surface, theme, key))
            .collect();
        let positions = legend_positions(&widths, area.right(), style.legend_spacing);
        for (index, (key, x)) in layout.series.iter().zip(positions).enumerate() {
            legend_entry(
                surface,
                theme,
                Point::new(x, area.y),
                series_color(theme, index, count),
                key,
            );
        }
    }

    layout
}

/// Horizontal bars for the largest items, labelled on the left and valued on the right.
pub fn draw_bar_list(
    surface: &mut dyn Surface,
    theme: &Theme,
    area: Rect,
    items: &[(String, f64)],
    color: Color,
    value_label: impl Fn(f64) -> String,
) {
    let mut ranked: Vec<(&str, f64)> = items
        .iter()
        .map(|(name, value)| (name.as_str(), sanitize(*value)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(theme.bar_chart.list_items.max(1));
    if ranked.is_empty() {
        return;
    }

    let font = FontSpec::regular(theme.small_size);
    let scale = scale_for(ranked.iter().map(|(_, value)| *value));
    let row_height = (area.height / ranked.len() as f64).min(font.line_height() * 2.2);
    let label_width = area.width * 0.32;
    let value_width = area.width * 0.18;
    let track_width = (area.width - label_width - value_width - 8.0).max(0.0);

    for (index, (name, value)) in ranked.iter().enumerate() {
        let top = area.y + index as f64 * row_height;
        let center = top + row_height / 2.0;
        let label = fit_text(surface.metrics(), name, font, label_width - 4.0);
        surface.draw_text(
            &label,
            Point::new(area.x, center + font.size * 0.35),
            font,
            theme.palette.text,
        );

        let bar_height = (row_height * 0.55).min(12.0);
        let track = Rect::new(area.x + label_width, center - bar_height / 2.0, track_width, bar_height);
        surface.rounded_rect(track, bar_height / 2.0, &Paint::fill(theme.palette.track));
        let filled = Rect::new(track.x, track.y, track.width * scale.fraction(*value), bar_height);
        if filled.width > 0.0 {
            surface.rounded_rect(filled, bar_height / 2.0, &Paint::fill(color));
        }

        let text = fit_text(surface.metrics(), &value_label(*value), font, value_width);
        let width = surface.text_width(&text, font);
        surface.draw_text(
            &text,
            Point::new(area.right() - width, center + font.size * 0.35),
            font,
            theme.palette.text,
        );
    }
}

/// One category of a current/previous comparison: the label sits in a centre column, the
/// previous value grows to the left of it and the current value to the right.
#[derive(Clone, Debug, PartialEq)]
pub struct DivergingRow {
    pub label: String,
    pub label_rect: Rect,
    pub previous: Rect,
    pub current: Rect,
}

/// Lays out comparison rows `(label, current, previous)` in `area` on one shared scale.
pub fn layout_diverging_bars(
    rows: &[(String, f64, f64)],
    area: Rect,
    label_width: f64,
) -> (AxisScale, Vec<DivergingRow>) {
    let scale = scale_for(
        rows.iter()
            .flat_map(|(_, current, previous)| [sanitize(*current), sanitize(*previous)]),
    );
    if rows.is_empty() {
        return (scale, Vec::new());
    }
    let label_width = label_width.min(area.width * 0.5);
    let half = (area.width - label_width) / 2.0;
    let center_left = area.x + half;
    let center_right = center_left + label_width;
    let row_height = area.height / rows.len() as f64;
    let bar_height = row_height * 0.6;

    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, (label, current, previous))| {
            let top = area.y + index as f64 * row_height + (row_height - bar_height) / 2.0;
            let previous_width = scale.fraction(*previous) * half;
            let current_width = scale.fraction(*current) * half;
            DivergingRow {
                label: label.clone(),
                label_rect: Rect::new(center_left, top, label_width, bar_height),
                previous: Rect::new(center_left - previous_width, top, previous_width, bar_height),
                current: Rect::new(center_right, top, current_width, bar_height),
            }
        })
        .collect();
    (scale, rows)
}

/// Draws a current/previous comparison with a heading row naming both periods.
pub fn draw_diverging_bars(
    surface: &mut dyn Surface,
    theme: &Theme,
    area: Rect,
    rows: &[(String, f64, f64)],
    labels: (&str, &str),
) {
    let font = FontSpec::regular(theme.small_size);
    let heading_font = FontSpec::bold(theme.body_size);
    let (current_label, previous_label) = labels;
    let label_width = (area.width * 0.2).clamp(60.0, 160.0);
    let body = Rect::new(
        area.x,
        area.y + heading_font.line_height() + 4.0,
        area.width,
        (area.height - heading_font.line_height() - 4.0).max(0.0),
    );
    let (_, layout) = layout_diverging_bars(rows, body, label_width);
    let palette = &theme.palette;
    let previous_color = palette.series(0);
    let current_color = palette.series(palette.series.len().saturating_sub(1));

    let baseline = area.y + heading_font.ascent();
    surface.draw_text(previous_label, Point::new(area.x, baseline), heading_font, previous_color);
    let width = surface.text_width(current_label, heading_font);
    surface.draw_text(
        current_label,
        Point::new(area.right() - width, baseline),
        heading_font,
        current_color,
    );

    for (row, (_, current, previous)) in layout.iter().zip(rows) {
        if row.previous.width > 0.0 {
            surface.fill_rect(row.previous, previous_color);
        }
        if row.current.width > 0.0 {
            surface.fill_rect(row.current, current_color);
        }
        let text_y = row.label_rect.center().y + font.size * 0.35;
        let label = fit_text(surface.metrics(), &row.label, font, row.label_rect.width - 6.0);
        let width = surface.text_width(&label, font);
        surface.draw_text(
            &label,
            Point::new(row.label_rect.center().x - width / 2.0, text_y),
            font,
            palette.text,
        );

        let previous_text = format::weight(sanitize(*previous));
        let previous_width = surface.text_width(&previous_text, font);
        let previous_x = (row.previous.x - previous_width - 4.0).max(area.x);
        surface.draw_text(&previous_text, Point::new(previous_x, text_y), font, palette.muted_text);
        let current_text = format::weight(sanitize(*current));
        let current_width = surface.text_width(&current_text, font);
        let current_x = (row.current.right() + 4.0).min(area.right() - current_width);
        surface.draw_text(&current_text, Point::new(current_x, text_y), font, palette.muted_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months() -> Vec<String> {
        ["Jan", "Feb", "Mar"].iter().map(|m| m.to_string()).collect()
    }

    fn year(key: &str, base: f64) -> Series {
        Series::new(key)
            .with_value("Jan", base)
            .with_value("Feb", base * 2.0)
            .with_value("Mar", base * 3.0)
            .with_value("Apr", base * 4.0)
    }

    #[test]
    fn keeps_the_most_recent_series() {
        let series = vec![year("2024", 1.0), year("2021", 1.0), year("2023", 1.0), year("2022", 1.0)];
        let layout = layout_grouped_bars(
            &series,
            None,
            Rect::new(0.0, 0.0, 400.0, 200.0),
            &BarChartStyle::default(),
        );
        assert_eq!(layout.series, vec!["2022", "2023", "2024"]);
        assert_eq!(layout.categories.len(), 4);
    }

    #[test]
    fn allow_list_clips_categories() {
        let series = vec![year("2024", 10.0)];
        let allow = months();
        let layout = layout_grouped_bars(
            &series,
            Some(&allow),
            Rect::new(0.0, 0.0, 300.0, 100.0),
            &BarChartStyle::default(),
        );
        let labels: Vec<&str> = layout.categories.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb", "Mar"]);
        // Shared scale only covers the drawn categories.
        assert_eq!(layout.scale.ceiling, 50.0);
    }

    #[test]
    fn bars_stay_inside_their_band_without_overlap() {
        let series = vec![year("2023", 7.0), year("2024", 9.0), year("2022", 3.0)];
        let plot = Rect::new(20.0, 10.0, 360.0, 180.0);
        let layout = layout_grouped_bars(&series, None, plot, &BarChartStyle::default());
        for category in &layout.categories {
            let bars = &category.bars;
            assert_eq!(bars.len(), 3);
            for bar in bars {
                assert!(bar.rect.x >= category.band.x - 1e-9);
                assert!(bar.rect.right() <= category.band.right() + 1e-9);
                assert!(bar.rect.y >= plot.y - 1e-9);
                assert!((bar.rect.bottom() - plot.bottom()).abs() < 1e-9);
            }
            for pair in bars.windows(2) {
                assert!(pair[0].rect.right() < pair[1].rect.x);
            }
        }
    }

    #[test]
    fn empty_input_degenerates_to_one_zero_category() {
        let layout = layout_grouped_bars(
            &[],
            None,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            &BarChartStyle::default(),
        );
        assert_eq!(layout.categories.len(), 1);
        assert!(layout.categories[0].bars.is_empty());
        assert_eq!(layout.scale.ceiling, 1.0);
    }

    #[test]
    fn legend_packs_right_to_left() {
        let positions = legend_positions(&[30.0, 50.0, 20.0], 200.0, 10.0);
        assert_eq!(positions, vec![80.0, 120.0, 180.0]);
    }

    #[test]
    fn diverging_bars_share_a_scale() {
        let rows = vec![
            ("Cardboard".to_string(), 80.0, 40.0),
            ("Glass".to_string(), 10.0, 20.0),
        ];
        let area = Rect::new(0.0, 0.0, 300.0, 100.0);
        let (scale, layout) = layout_diverging_bars(&rows, area, 100.0);
        assert_eq!(scale.ceiling, 100.0);
        assert_eq!(layout[0].current.width, 80.0);
        assert_eq!(layout[0].previous.width, 40.0);
        assert_eq!(layout[0].previous.right(), layout[0].label_rect.x);
        assert_eq!(layout[1].current.x, layout[1].label_rect.right());
    }
}
