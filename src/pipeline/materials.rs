use crate::charts::bar::draw_bar_list;
use crate::charts::pie::draw_pie_with_legend;
use crate::charts::sanitize;
use crate::context::RenderContext;
use crate::error::Result;
use crate::format;
use crate::payload::{MainMaterials, MaterialRecord, ReportPayload, Section, SubMaterials};
use crate::primitives::{panel, placeholder, stat_chip};
use crate::surface::{FontSpec, Point, Rect};
use crate::table::{draw_table, Cell, Column, Table};
use crate::text::fit_text;

use super::section_or_message;

const MAIN_HEADING: &str = "Main Materials";
const SUB_HEADING: &str = "Sub Materials";
/// Slices drawn before the remainder is folded into "Other".
const PIE_SLICES: usize = 7;
const GROUP_COLUMNS: usize = 3;
const GROUP_ROWS: usize = 2;

/// Records sorted by weight, heaviest first.
fn by_weight(records: &[MaterialRecord]) -> Vec<&MaterialRecord> {
    let mut sorted: Vec<&MaterialRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        sanitize(b.weight_kg)
            .partial_cmp(&sanitize(a.weight_kg))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}

/// Pie items: the `slices` heaviest materials plus an "Other" slice for the rest.
pub(crate) fn pie_items(records: &[MaterialRecord], slices: usize) -> Vec<(String, f64)> {
    let sorted = by_weight(records);
    let mut items: Vec<(String, f64)> = sorted
        .iter()
        .take(slices)
        .map(|record| (record.name.clone(), sanitize(record.weight_kg)))
        .collect();
    let other: f64 = sorted
        .iter()
        .skip(slices)
        .map(|record| sanitize(record.weight_kg))
        .sum();
    if other > 0.0 {
        items.push(("Other".to_owned(), other));
    }
    items
}

/// The record's share, computed from `total` when upstream left it empty.
pub(crate) fn share_of(record: &MaterialRecord, total: f64) -> f64 {
    if record.share > 0.0 || total <= 0.0 {
        record.share
    } else {
        sanitize(record.weight_kg) / total * 100.0
    }
}

fn total_weight(records: &[MaterialRecord]) -> f64 {
    records.iter().map(|record| sanitize(record.weight_kg)).sum()
}

fn destinations(record: &MaterialRecord) -> Cell {
    let items: Vec<String> = record
        .destinations
        .iter()
        .map(|destination| destination.trim())
        .filter(|destination| !destination.is_empty())
        .map(str::to_owned)
        .collect();
    if items.is_empty() {
        Cell::text("-")
    } else {
        Cell::List(items)
    }
}

pub(super) fn render_main_breakdown(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(main) = section_or_message(ctx, MAIN_HEADING, &payload.main_materials_data) else {
        return Ok(());
    };
    ctx.new_page(MAIN_HEADING);
    let theme = ctx.theme();
    let palette = &theme.palette;
    let total = if main.total_weight_kg > 0.0 {
        main.total_weight_kg
    } else {
        total_weight(&main.materials)
    };
    let heaviest = by_weight(&main.materials)
        .first()
        .map(|record| record.name.clone())
        .unwrap_or_else(|| "-".to_owned());

    let chips = [
        ("Total weight", format::weight(total), palette.primary),
        ("Materials", main.materials.len().to_string(), palette.accent),
        ("Largest stream", heaviest, palette.positive),
    ];
    let chip_row = ctx.take(54.0);
    for (rect, (label, value, accent)) in chip_row.columns(chips.len(), theme.gap).into_iter().zip(chips) {
        stat_chip(ctx.surface(), theme, rect, label, &value, accent);
    }

    let columns = ctx.remaining_area().columns(2, theme.gap);
    let heading_font = FontSpec::bold(theme.subheading_size);
    let mut bodies = Vec::with_capacity(2);
    for (column, heading) in columns.iter().zip(["Share by material", "Heaviest materials"]) {
        panel(ctx.surface(), theme, *column);
        let inner = column.inset(theme.panel_padding, theme.panel_padding);
        ctx.surface().draw_text(
            heading,
            Point::new(inner.x, inner.y + heading_font.ascent()),
            heading_font,
            palette.text,
        );
        bodies.push(inner.split_top(heading_font.line_height() + 6.0).1);
    }

    if main.materials.is_empty() {
        for body in bodies {
            placeholder(ctx.surface(), theme, body, "No materials recorded for this period.");
        }
        return Ok(());
    }
    draw_pie_with_legend(ctx.surface(), theme, bodies[0], &pie_items(&main.materials, PIE_SLICES));
    let items: Vec<(String, f64)> = main
        .materials
        .iter()
        .map(|record| (record.name.clone(), record.weight_kg))
        .collect();
    draw_bar_list(ctx.surface(), theme, bodies[1], &items, palette.accent, format::weight);
    Ok(())
}

pub(crate) fn main_table(main: &MainMaterials) -> Table {
    let total = if main.total_weight_kg > 0.0 {
        main.total_weight_kg
    } else {
        total_weight(&main.materials)
    };
    let mut table = Table::new(
        "Main Materials Detail",
        vec![
            Column::new("Material", 2.0),
            Column::new("Weight", 1.0).right(),
            Column::new("Share", 0.8).right(),
            Column::new("Collections", 1.0).right(),
            Column::new("Destinations", 2.4),
        ],
    );
    for record in by_weight(&main.materials) {
        table.row(vec![
            Cell::text(record.name.as_str()),
            Cell::text(format::weight(record.weight_kg)),
            Cell::text(format::percent(share_of(record, total))),
            Cell::text(format::grouped(record.collections, 0)),
            destinations(record),
        ]);
    }
    table
}

pub(super) fn render_main_table(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(main) = payload.main_materials_data.as_ref().and_then(Section::ready) else {
        return Ok(());
    };
    let table = main_table(main);
    ctx.new_page(&table.title);
    draw_table(ctx, &table);
    Ok(())
}

pub(super) fn render_sub_breakdown(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(sub) = section_or_message(ctx, SUB_HEADING, &payload.sub_materials_data) else {
        return Ok(());
    };
    let groups: Vec<_> = sub.groups.iter().filter(|group| !group.items.is_empty()).collect();
    if groups.is_empty() {
        let area = ctx.new_page(SUB_HEADING);
        let theme = ctx.theme();
        placeholder(ctx.surface(), theme, area, "No sub-material breakdown for this period.");
        return Ok(());
    }

    for page in groups.chunks(GROUP_COLUMNS * GROUP_ROWS) {
        let area = ctx.new_page(SUB_HEADING);
        let theme = ctx.theme();
        let row_height = (area.height - theme.gap * (GROUP_ROWS - 1) as f64) / GROUP_ROWS as f64;
        let title_font = FontSpec::bold(theme.body_size);
        for (index, group) in page.iter().enumerate() {
            let band = Rect::new(
                area.x,
                area.y + (index / GROUP_COLUMNS) as f64 * (row_height + theme.gap),
                area.width,
                row_height,
            );
            let cell = band.columns(GROUP_COLUMNS, theme.gap)[index % GROUP_COLUMNS];
            panel(ctx.surface(), theme, cell);
            let inner = cell.inset(theme.panel_padding, theme.panel_padding);

            let total = total_weight(&group.items);
            let title = fit_text(
                ctx.metrics(),
                &format!("{} ({})", group.main_material, format::weight(total)),
                title_font,
                inner.width,
            );
            ctx.surface().draw_text(
                &title,
                Point::new(inner.x, inner.y + title_font.ascent()),
                title_font,
                theme.palette.text,
            );
            let items: Vec<(String, f64)> = group
                .items
                .iter()
                .map(|record| (record.name.clone(), record.weight_kg))
                .collect();
            let color = theme.palette.categorical(index);
            let list = inner.split_top(title_font.line_height() + 4.0).1;
            draw_bar_list(ctx.surface(), theme, list, &items, color, format::weight);
        }
    }
    Ok(())
}

/// Sub-material rows under one group header per main material.
pub(crate) fn sub_table(sub: &SubMaterials) -> Table {
    let mut table = Table::new(
        "Sub Materials Detail",
        vec![
            Column::new("Material", 2.0),
            Column::new("Weight", 1.0).right(),
            Column::new("Share", 0.8).right(),
            Column::new("Destinations", 2.4),
        ],
    );
    for group in &sub.groups {
        let total = total_weight(&group.items);
        let label = if group.main_material.trim().is_empty() {
            "Unassigned"
        } else {
            group.main_material.trim()
        };
        table.group(label);
        for record in by_weight(&group.items) {
            table.row(vec![
                Cell::text(record.name.as_str()),
                Cell::text(format::weight(record.weight_kg)),
                Cell::text(format::percent(share_of(record, total))),
                destinations(record),
            ]);
        }
    }
    table
}

pub(super) fn render_sub_table(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let Some(sub) = payload.sub_materials_data.as_ref().and_then(Section::ready) else {
        return Ok(());
    };
    let table = sub_table(sub);
    ctx.new_page(&table.title);
    draw_table(ctx, &table);
    Ok(())
}
