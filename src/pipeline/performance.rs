use crate::charts::bar::draw_grouped_bar_chart;
use crate::charts::pie::draw_pie_with_legend;
use crate::charts::Series;
use crate::context::RenderContext;
use crate::error::Result;
use crate::format;
use crate::payload::{BranchPerformance, ReportPayload};
use crate::primitives::{panel, placeholder, progress_bar, stat_chip};
use crate::surface::{Color, FontSpec, Paint, Point, Rect, TextMetrics};
use crate::table::{draw_table, Cell, Column, Table};
use crate::text::fit_text;
use crate::theme::{Palette, Theme};

use super::section_or_message;

const HEADING: &str = "Branch Performance";
const TABLE_HEADING: &str = "Performance Summary";
/// Points below target still counted as "at risk" rather than "behind".
const AT_RISK_MARGIN: f64 = 5.0;

/// The status shown for a branch: the upstream label, or one derived from its diversion rate.
pub(crate) fn status_label(branch: &BranchPerformance) -> String {
    let status = branch.status.trim();
    if !status.is_empty() {
        return status.to_owned();
    }
    if branch.target_rate <= 0.0 || branch.diversion_rate >= branch.target_rate {
        "On track".to_owned()
    } else if branch.diversion_rate >= branch.target_rate - AT_RISK_MARGIN {
        "At risk".to_owned()
    } else {
        "Behind".to_owned()
    }
}

pub(crate) fn status_color(palette: &Palette, status: &str) -> Color {
    let status = status.to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|word| status.contains(word));
    if matches(&["risk", "warn", "near", "watch"]) {
        palette.warning
    } else if matches(&["behind", "below", "off", "miss", "critical"]) {
        palette.negative
    } else if matches(&["track", "good", "above", "achiev"]) {
        palette.positive
    } else {
        palette.muted_text
    }
}

pub(super) fn render_pages(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    if section_or_message(ctx, HEADING, &payload.performance_data).is_none() {
        return Ok(());
    }
    for branch in payload.branches() {
        render_branch(ctx, branch);
    }
    Ok(())
}

fn render_branch(ctx: &mut RenderContext<'_>, branch: &BranchPerformance) {
    ctx.new_page(HEADING);
    let theme = ctx.theme();
    let palette = &theme.palette;
    let name = if branch.branch.trim().is_empty() {
        "Unnamed branch"
    } else {
        branch.branch.as_str()
    };

    let status = status_label(branch);
    let title_font = FontSpec::bold(theme.heading_size);
    let title_band = ctx.take(title_font.line_height());
    let badge_font = FontSpec::bold(theme.small_size);
    let badge_width = ctx.metrics().text_width(&status, badge_font) + 16.0;
    let title = fit_text(
        ctx.metrics(),
        name,
        title_font,
        (title_band.width - badge_width - theme.gap).max(0.0),
    );
    ctx.surface().draw_text(
        &title,
        Point::new(title_band.x, title_band.y + title_font.ascent()),
        title_font,
        palette.text,
    );
    let badge = Rect::new(
        title_band.right() - badge_width,
        title_band.y + (title_band.height - 16.0) / 2.0,
        badge_width,
        16.0,
    );
    draw_badge(ctx, theme, badge, &status);

    let chips = [
        ("Total waste", format::weight(branch.total_weight_kg), palette.primary),
        ("Recycled", format::weight(branch.recycled_weight_kg), palette.positive),
        ("Landfill", format::weight(branch.landfill_weight_kg), palette.negative),
        ("Collections", format::grouped(branch.collections, 0), palette.accent),
    ];
    let chip_row = ctx.take(54.0);
    for (rect, (label, value, accent)) in chip_row.columns(chips.len(), theme.gap).into_iter().zip(chips) {
        stat_chip(ctx.surface(), theme, rect, label, &value, accent);
    }

    let target = (branch.target_rate > 0.0).then_some(branch.target_rate);
    let bar = ctx.take(26.0);
    progress_bar(
        ctx.surface(),
        theme,
        bar,
        "Diversion rate vs target",
        branch.diversion_rate,
        target,
        status_color(palette, &status),
    );

    let columns = ctx.remaining_area().columns(2, theme.gap);
    let heading_font = FontSpec::bold(theme.subheading_size);
    for (column, heading) in columns.iter().zip(["Materials", "Monthly collections"]) {
        panel(ctx.surface(), theme, *column);
        let inner = column.inset(theme.panel_padding, theme.panel_padding);
        ctx.surface().draw_text(
            heading,
            Point::new(inner.x, inner.y + heading_font.ascent()),
            heading_font,
            palette.text,
        );
    }
    let body = |column: &Rect| {
        column
            .inset(theme.panel_padding, theme.panel_padding)
            .split_top(heading_font.line_height() + 6.0)
            .1
    };

    let materials: Vec<(String, f64)> = branch
        .materials
        .iter()
        .map(|material| (material.name.clone(), material.value))
        .collect();
    if materials.is_empty() {
        placeholder(ctx.surface(), theme, body(&columns[0]), "No material breakdown.");
    } else {
        draw_pie_with_legend(ctx.surface(), theme, body(&columns[0]), &materials);
    }

    if branch.monthly.is_empty() {
        placeholder(ctx.surface(), theme, body(&columns[1]), "No monthly data.");
    } else {
        let series = branch
            .monthly
            .iter()
            .fold(Series::new(name), |series, point| {
                series.with_value(point.month.clone(), point.value)
            });
        draw_grouped_bar_chart(ctx.surface(), theme, body(&columns[1]), &[series], None, false);
    }
}

fn draw_badge(ctx: &mut RenderContext<'_>, theme: &Theme, rect: Rect, status: &str) {
    let color = status_color(&theme.palette, status);
    ctx.surface().rounded_rect(
        rect,
        rect.height / 2.0,
        &Paint::fill(color.mix(Color::WHITE, 0.8)).with_stroke(color, 0.6),
    );
    let font = FontSpec::bold(theme.small_size);
    let text = fit_text(ctx.metrics(), status, font, rect.width - 8.0);
    let width = ctx.metrics().text_width(&text, font);
    ctx.surface().draw_text(
        &text,
        Point::new(rect.center().x - width / 2.0, rect.center().y + font.size * 0.35),
        font,
        color,
    );
}

pub(crate) fn performance_table(branches: &[BranchPerformance], palette: &Palette) -> Table {
    let mut table = Table::new(
        TABLE_HEADING,
        vec![
            Column::new("Branch", 2.2),
            Column::new("Total", 1.0).right(),
            Column::new("Recycled", 1.0).right(),
            Column::new("Landfill", 1.0).right(),
            Column::new("Diversion", 0.9).right(),
            Column::new("Target", 0.8).right(),
            Column::new("Collections", 1.0).right(),
            Column::new("Status", 1.1).center(),
        ],
    );
    for branch in branches {
        let status = status_label(branch);
        let target = if branch.target_rate > 0.0 {
            format::percent(branch.target_rate)
        } else {
            "-".to_owned()
        };
        table.row(vec![
            Cell::text(branch.branch.as_str()),
            Cell::text(format::weight(branch.total_weight_kg)),
            Cell::text(format::weight(branch.recycled_weight_kg)),
            Cell::text(format::weight(branch.landfill_weight_kg)),
            Cell::text(format::percent(branch.diversion_rate)),
            Cell::text(target),
            Cell::text(format::grouped(branch.collections, 0)),
            Cell::Badge {
                color: status_color(palette, &status),
                text: status,
            },
        ]);
    }
    table
}

pub(super) fn render_table(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let table = performance_table(payload.branches(), &ctx.theme().palette);
    ctx.new_page(TABLE_HEADING);
    draw_table(ctx, &table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(diversion: f64, target: f64, status: &str) -> BranchPerformance {
        BranchPerformance {
            branch: "North".into(),
            diversion_rate: diversion,
            target_rate: target,
            status: status.into(),
            ..Default::default()
        }
    }

    #[test]
    fn upstream_status_wins() {
        assert_eq!(status_label(&branch(10.0, 80.0, " Needs review ")), "Needs review");
    }

    #[test]
    fn status_is_derived_from_the_target() {
        assert_eq!(status_label(&branch(82.0, 80.0, "")), "On track");
        assert_eq!(status_label(&branch(77.0, 80.0, "")), "At risk");
        assert_eq!(status_label(&branch(60.0, 80.0, "")), "Behind");
        assert_eq!(status_label(&branch(0.0, 0.0, "")), "On track");
    }

    #[test]
    fn status_colors_follow_keywords() {
        let palette = Palette::default();
        assert_eq!(status_color(&palette, "On Track"), palette.positive);
        assert_eq!(status_color(&palette, "At risk"), palette.warning);
        assert_eq!(status_color(&palette, "Behind target"), palette.negative);
        assert_eq!(status_color(&palette, "n/a"), palette.muted_text);
    }

    #[test]
    fn table_has_one_row_per_branch() {
        let branches = vec![branch(82.0, 80.0, ""), branch(40.0, 80.0, "")];
        let table = performance_table(&branches, &Palette::default());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.columns.len(), 8);
    }
}
