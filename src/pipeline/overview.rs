use crate::charts::bar::{draw_bar_list, draw_grouped_bar_chart};
use crate::charts::Series;
use crate::context::RenderContext;
use crate::error::Result;
use crate::format;
use crate::payload::{BranchTrend, Overview, ReportPayload};
use crate::primitives::{panel, placeholder, progress_bar, stat_chip};
use crate::surface::{FontSpec, Point, Rect};
use crate::text::fit_text;

use super::section_or_message;

const HEADING: &str = "Overview";
const CHIP_HEIGHT: f64 = 58.0;
/// Small multiples on the overview page itself; the rest continue on grid pages.
const FIRST_PAGE_TRENDS: usize = 4;
const TRENDS_PER_PAGE: usize = 6;

pub(super) fn render(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(overview) = section_or_message(ctx, HEADING, &payload.overview_data) else {
        return Ok(());
    };
    ctx.new_page(HEADING);
    let theme = ctx.theme();
    let palette = &theme.palette;

    let chips = [
        ("Total waste", format::weight(overview.total_weight_kg), palette.primary),
        ("Recycled", format::weight(overview.recycled_weight_kg), palette.positive),
        ("Landfill", format::weight(overview.landfill_weight_kg), palette.negative),
        ("Collections", format::grouped(overview.total_collections, 0), palette.accent),
        ("CO2 saved", format::weight(overview.co2_saved_kg), palette.positive),
    ];
    let chip_row = ctx.take(CHIP_HEIGHT);
    for (rect, (label, value, accent)) in chip_row.columns(chips.len(), theme.gap).into_iter().zip(chips) {
        stat_chip(ctx.surface(), theme, rect, label, &value, accent);
    }

    let columns = ctx.remaining_area().columns(2, theme.gap * 1.5);
    let (left, right) = (columns[0], columns[1]);
    draw_indicators(ctx, overview, left);

    let first: Vec<&BranchTrend> = overview.branch_trends.iter().take(FIRST_PAGE_TRENDS).collect();
    draw_trend_grid(ctx, "Branch trends", &first, right, 2);

    for chunk in overview.branch_trends[first.len()..].chunks(TRENDS_PER_PAGE) {
        let area = ctx.new_page("Branch Trends");
        let trends: Vec<&BranchTrend> = chunk.iter().collect();
        draw_trend_grid(ctx, "", &trends, area, 3);
    }
    Ok(())
}

fn draw_indicators(ctx: &mut RenderContext<'_>, overview: &Overview, area: Rect) {
    let theme = ctx.theme();
    let palette = &theme.palette;
    let heading = FontSpec::bold(theme.subheading_size);
    let mut y = area.y;

    ctx.surface().draw_text(
        "Key indicators",
        Point::new(area.x, y + heading.ascent()),
        heading,
        palette.text,
    );
    y += heading.line_height() + 4.0;

    let share = |part: f64| {
        if overview.total_weight_kg > 0.0 {
            part / overview.total_weight_kg * 100.0
        } else {
            0.0
        }
    };
    let target = (overview.target_rate > 0.0).then_some(overview.target_rate);
    let diversion_color = if target.map_or(true, |target| overview.diversion_rate >= target) {
        palette.positive
    } else {
        palette.warning
    };
    let bars = [
        ("Diversion rate", overview.diversion_rate, target, diversion_color),
        ("Recycled share", share(overview.recycled_weight_kg), None, palette.accent),
        ("Landfill share", share(overview.landfill_weight_kg), None, palette.negative),
    ];
    for (label, value, target, color) in bars {
        progress_bar(ctx.surface(), theme, Rect::new(area.x, y, area.width, 24.0), label, value, target, color);
        y += 32.0;
    }

    y += theme.gap * 0.5;
    ctx.surface().draw_text(
        "Top materials",
        Point::new(area.x, y + heading.ascent()),
        heading,
        palette.text,
    );
    y += heading.line_height() + 4.0;

    let list_area = Rect::new(area.x, y, area.width, (area.bottom() - y).max(0.0));
    if overview.top_materials.is_empty() {
        placeholder(ctx.surface(), theme, list_area, "No material data for this period.");
        return;
    }
    let items: Vec<(String, f64)> = overview
        .top_materials
        .iter()
        .map(|material| (material.name.clone(), material.value))
        .collect();
    draw_bar_list(ctx.surface(), theme, list_area, &items, palette.accent, format::weight);
}

/// Draws one small bar chart per branch in a grid of `columns` columns.
fn draw_trend_grid(ctx: &mut RenderContext<'_>, heading: &str, trends: &[&BranchTrend], area: Rect, columns: usize) {
    let theme = ctx.theme();
    let mut area = area;
    if !heading.is_empty() {
        let font = FontSpec::bold(theme.subheading_size);
        ctx.surface().draw_text(
            heading,
            Point::new(area.x, area.y + font.ascent()),
            font,
            theme.palette.text,
        );
        area = area.split_top(font.line_height() + 4.0).1;
    }
    if trends.is_empty() {
        placeholder(ctx.surface(), theme, area, "No branch trends for this period.");
        return;
    }

    let rows = (trends.len() + columns - 1) / columns;
    let row_height = (area.height - theme.gap * (rows - 1) as f64) / rows as f64;
    let title_font = FontSpec::medium(theme.body_size);
    for (index, trend) in trends.iter().enumerate() {
        let (row, column) = (index / columns, index % columns);
        let band = Rect::new(area.x, area.y + row as f64 * (row_height + theme.gap), area.width, row_height);
        let cell = band.columns(columns, theme.gap)[column];
        panel(ctx.surface(), theme, cell);

        let inner = cell.inset(theme.panel_padding, theme.panel_padding * 0.6);
        let title = fit_text(ctx.metrics(), &trend.branch, title_font, inner.width);
        ctx.surface().draw_text(
            &title,
            Point::new(inner.x, inner.y + title_font.ascent()),
            title_font,
            theme.palette.text,
        );
        let chart = inner.split_top(title_font.line_height() + 2.0).1;
        let series = trend
            .monthly
            .iter()
            .fold(Series::new(trend.branch.clone()), |series, point| {
                series.with_value(point.month.clone(), point.value)
            });
        draw_grouped_bar_chart(ctx.surface(), theme, chart, &[series], None, false);
    }
}
