use crate::charts::bar::{draw_diverging_bars, draw_grouped_bar_chart};
use crate::charts::Series;
use crate::context::RenderContext;
use crate::error::Result;
use crate::format;
use crate::payload::{Comparison, ReportPayload, Section, Trend};
use crate::primitives::placeholder;
use crate::richtext::{parse_or_plain, wrap_spans};
use crate::surface::FontSpec;
use crate::table::{draw_table, Cell, Column, Table};

const HEADING: &str = "Period Comparison";
const CATEGORIES_PER_PAGE: usize = 14;
/// Share of a trend page given to the chart; the totals table takes the rest.
const TREND_CHART_SHARE: f64 = 0.62;

fn comparison(payload: &ReportPayload) -> Option<&Comparison> {
    payload.comparison_data.as_ref().and_then(Section::ready)
}

pub(super) fn render_narrative(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(comparison) = comparison(payload) else {
        return Ok(());
    };
    let content = ctx.new_page(HEADING);
    let theme = ctx.theme();
    ctx.subheading(&format!(
        "{} compared with {}",
        comparison.current_label(),
        comparison.previous_label()
    ));

    let paragraphs: Vec<&str> = comparison
        .narrative
        .iter()
        .map(|paragraph| paragraph.trim())
        .filter(|paragraph| !paragraph.is_empty())
        .collect();
    if paragraphs.is_empty() {
        ctx.paragraph(
            "No narrative was provided for this period.",
            theme.palette.muted_text,
        );
        return Ok(());
    }

    let line_height = FontSpec::regular(theme.body_size).line_height();
    for paragraph in paragraphs {
        let spans = parse_or_plain(paragraph);
        let lines = wrap_spans(ctx.metrics(), &spans, theme.body_size, content.width).len();
        let height = lines as f64 * line_height;
        if height > ctx.remaining() && ctx.cursor() > ctx.content().y {
            ctx.new_page(HEADING);
        }
        ctx.rich_paragraph(&spans, content.width);
    }
    Ok(())
}

pub(super) fn render_charts(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(comparison) = comparison(payload) else {
        return Ok(());
    };
    let labels = (comparison.current_label(), comparison.previous_label());

    let rows: Vec<(String, f64, f64)> = comparison
        .categories
        .iter()
        .map(|category| (category.name.clone(), category.current, category.previous))
        .collect();
    if rows.is_empty() {
        let area = ctx.new_page(HEADING);
        let theme = ctx.theme();
        placeholder(
            ctx.surface(),
            theme,
            area,
            "No category comparison for this period.",
        );
    }
    for chunk in rows.chunks(CATEGORIES_PER_PAGE) {
        ctx.new_page(HEADING);
        ctx.subheading("Weight by category");
        let area = ctx.remaining_area();
        let theme = ctx.theme();
        draw_diverging_bars(ctx.surface(), theme, area, chunk, labels);
    }

    for trend in &comparison.trends {
        render_trend(ctx, trend);
    }
    Ok(())
}

fn trend_series(trend: &Trend) -> Vec<Series> {
    trend
        .series
        .iter()
        .map(|entry| {
            entry
                .values
                .iter()
                .fold(Series::new(entry.key.clone()), |series, point| {
                    series.with_value(point.month.clone(), point.value)
                })
        })
        .collect()
}

fn format_total(value: f64, unit: &str) -> String {
    match unit.trim() {
        "" | "kg" => format::weight(value),
        "%" => format::percent(value),
        unit => format!("{} {}", format::grouped(value, 1), unit),
    }
}

fn render_trend(ctx: &mut RenderContext<'_>, trend: &Trend) {
    let title = if trend.title.trim().is_empty() {
        "Monthly Trend"
    } else {
        trend.title.trim()
    };
    let content = ctx.new_page(title);
    let theme = ctx.theme();
    let series = trend_series(trend);
    let chart = ctx.take(content.height * TREND_CHART_SHARE);
    let layout = draw_grouped_bar_chart(
        ctx.surface(),
        theme,
        chart,
        &series,
        trend.months.as_deref(),
        true,
    );

    let months: Vec<&str> = layout
        .categories
        .iter()
        .map(|category| category.label.as_str())
        .collect();
    let mut table = Table::new(
        format!("{} totals", title),
        vec![
            Column::new("Series", 2.0),
            Column::new("Months", 1.0).right(),
            Column::new("Total", 1.4).right(),
            Column::new("Monthly average", 1.4).right(),
        ],
    );
    for key in &layout.series {
        let Some(entry) = series.iter().find(|entry| &entry.key == key) else {
            continue;
        };
        let total: f64 = months.iter().map(|month| entry.value(month)).sum();
        let count = months
            .iter()
            .filter(|month| entry.values.iter().any(|(name, _)| name == *month))
            .count();
        let average = if count > 0 { total / count as f64 } else { 0.0 };
        table.row(vec![
            Cell::text(key.as_str()),
            Cell::text(count.to_string()),
            Cell::text(format_total(total, &trend.unit)),
            Cell::text(format_total(average, &trend.unit)),
        ]);
    }
    draw_table(ctx, &table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{MonthlyValue, TrendSeries};

    #[test]
    fn totals_follow_the_unit() {
        assert_eq!(format_total(12_500.0, "kg"), "12.5 t");
        assert_eq!(format_total(42.0, "%"), "42.0%");
        assert_eq!(format_total(1234.0, "bins"), "1,234.0 bins");
    }

    #[test]
    fn trend_series_keep_their_months() {
        let trend = Trend {
            series: vec![TrendSeries {
                key: "2024".into(),
                values: vec![
                    MonthlyValue {
                        month: "Jan".into(),
                        value: 3.0,
                    },
                    MonthlyValue {
                        month: "Feb".into(),
                        value: 4.0,
                    },
                ],
            }],
            ..Default::default()
        };
        let series = trend_series(&trend);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value("Feb"), 4.0);
        assert_eq!(series[0].total(), 7.0);
    }
}
