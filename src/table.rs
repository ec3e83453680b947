//! Paginated tables with variable row heights and group headers.
//!
//! Rendering is two-phase. [`plan_rows`] assigns rows to pages from their measured heights
//! without touching a surface, then [`draw_table`] replays the plan. Planning obeys three rules:
//!
//! - A group header is only placed when the data row following it fits on the same page, so a
//!   page never ends with a header. A header without any data rows is dropped.
//! - When a group continues on a new page, that page starts with a continuation header.
//! - A data row is always placed on a page that holds no data rows yet, even if it overflows,
//!   so every iteration consumes a row and planning terminates.

use log::debug;

use crate::context::RenderContext;
use crate::surface::{Color, FontSpec, Paint, Point, Rect, TextMetrics};
use crate::text::{fit_text, wrap_text};

/// Suffix appended to a group label repeated at the top of a page.
pub const CONTINUED_SUFFIX: &str = " (continued)";

/// Layout constants of tables.
#[derive(Clone, Debug, PartialEq)]
pub struct TableStyle {
    pub font_size: f64,
    pub header_height: f64,
    pub group_header_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub badge_height: f64,
    /// Vertical space between the items of a list cell.
    pub list_gap: f64,
    pub radius: f64,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 8.5,
            header_height: 22.0,
            group_header_height: 20.0,
            padding_x: 6.0,
            padding_y: 5.0,
            badge_height: 14.0,
            list_gap: 3.0,
            radius: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub title: String,
    /// Relative width; columns share the table width in proportion.
    pub weight: f64,
    pub align: Align,
}

impl Column {
    pub fn new(title: impl Into<String>, weight: f64) -> Self {
        Self {
            title: title.into(),
            weight,
            align: Align::Left,
        }
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    /// Single-line coloured pill, truncated with an ellipsis when too long.
    Badge { text: String, color: Color },
    /// Items stacked vertically, each wrapped on its own.
    List(Vec<String>),
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text(text.into())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableRow {
    GroupHeader(String),
    Data(Vec<Cell>),
}

impl TableRow {
    pub fn kind(&self) -> RowKind {
        match self {
            TableRow::GroupHeader(_) => RowKind::GroupHeader,
            TableRow::Data(_) => RowKind::Data,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    GroupHeader,
    Data,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    /// Heading of the pages the table continues onto.
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn group(&mut self, label: impl Into<String>) {
        self.rows.push(TableRow::GroupHeader(label.into()));
    }

    pub fn row(&mut self, cells: Vec<Cell>) {
        self.rows.push(TableRow::Data(cells));
    }

    pub fn kinds(&self) -> Vec<RowKind> {
        self.rows.iter().map(TableRow::kind).collect()
    }
}

/// A row placed on a planned page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedRow {
    /// Index into the table's rows.
    pub row: usize,
    pub height: f64,
    /// Repeated group header opening a page.
    pub continued: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlannedPage {
    pub rows: Vec<PlannedRow>,
}

impl PlannedPage {
    fn holds_data(&self, kinds: &[RowKind]) -> bool {
        self.rows
            .iter()
            .any(|planned| kinds[planned.row] == RowKind::Data)
    }

    pub fn height(&self) -> f64 {
        self.rows.iter().map(|planned| planned.height).sum()
    }
}

/// Row-to-page assignment of one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TablePlan {
    pub pages: Vec<PlannedPage>,
}

impl TablePlan {
    /// Index of the page each source row landed on; `None` for dropped rows.
    pub fn assignment(&self, rows: usize) -> Vec<Option<usize>> {
        let mut pages = vec![None; rows];
        for (page, planned) in self.pages.iter().enumerate() {
            for row in planned.rows.iter().filter(|row| !row.continued) {
                pages[row.row] = Some(page);
            }
        }
        pages
    }
}

/// Assigns rows to pages.
///
/// `first_available` is the room for rows on the first page, `page_available` the room on every
/// following page. A table without rows still yields one (header-only) page.
pub fn plan_rows(
    kinds: &[RowKind],
    heights: &[f64],
    first_available: f64,
    page_available: f64,
) -> TablePlan {
    let mut pages = Vec::new();
    let mut page = PlannedPage::default();
    let mut used = 0.0;
    let mut available = first_available;
    let mut group: Option<usize> = None;
    let mut index = 0;

    while index < kinds.len() {
        let height = heights[index];
        match kinds[index] {
            RowKind::GroupHeader => {
                let follower = kinds
                    .get(index + 1)
                    .filter(|kind| **kind == RowKind::Data)
                    .map(|_| heights[index + 1]);
                let Some(follower) = follower else {
                    debug!("Dropping group header {} without data rows", index);
                    group = None;
                    index += 1;
                    continue;
                };
                if used + height + follower <= available || page.rows.is_empty() {
                    page.rows.push(PlannedRow {
                        row: index,
                        height,
                        continued: false,
                    });
                    used += height;
                    group = Some(index);
                    index += 1;
                } else {
                    pages.push(std::mem::take(&mut page));
                    used = 0.0;
                    available = page_available;
                }
            }
            RowKind::Data => {
                if used + height <= available || !page.holds_data(kinds) {
                    page.rows.push(PlannedRow {
                        row: index,
                        height,
                        continued: false,
                    });
                    used += height;
                    index += 1;
                } else {
                    pages.push(std::mem::take(&mut page));
                    used = 0.0;
                    available = page_available;
                    if let Some(header) = group {
                        page.rows.push(PlannedRow {
                            row: header,
                            height: heights[header],
                            continued: true,
                        });
                        used = heights[header];
                    }
                }
            }
        }
    }

    if !page.rows.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    TablePlan { pages }
}

/// Column widths proportional to their weights, filling `total`.
pub fn column_widths(columns: &[Column], total: f64) -> Vec<f64> {
    let weights: Vec<f64> = columns
        .iter()
        .map(|column| {
            if column.weight.is_finite() && column.weight > 0.0 {
                column.weight
            } else {
                1.0
            }
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|weight| weight / sum * total).collect()
}

fn cell_height(metrics: &dyn TextMetrics, cell: &Cell, width: f64, style: &TableStyle) -> f64 {
    let font = FontSpec::regular(style.font_size);
    let inner = (width - 2.0 * style.padding_x).max(1.0);
    match cell {
        Cell::Text(text) => wrap_text(metrics, text, font, inner).len().max(1) as f64 * font.line_height(),
        Cell::Badge { .. } => style.badge_height,
        Cell::List(items) => {
            if items.is_empty() {
                return font.line_height();
            }
            let lines: usize = items
                .iter()
                .map(|item| wrap_text(metrics, item, font, inner).len().max(1))
                .sum();
            lines as f64 * font.line_height() + style.list_gap * (items.len() - 1) as f64
        }
    }
}

/// Height of every row of `table` when laid out at `widths`.
pub fn measure_rows(metrics: &dyn TextMetrics, table: &Table, widths: &[f64], style: &TableStyle) -> Vec<f64> {
    table
        .rows
        .iter()
        .map(|row| match row {
            TableRow::GroupHeader(_) => style.group_header_height,
            TableRow::Data(cells) => {
                let tallest = cells
                    .iter()
                    .zip(widths)
                    .map(|(cell, width)| cell_height(metrics, cell, *width, style))
                    .fold(FontSpec::regular(style.font_size).line_height(), f64::max);
                tallest + 2.0 * style.padding_y
            }
        })
        .collect()
}

/// Measures and plans `table` for a given width and page geometry.
pub fn plan_table(
    metrics: &dyn TextMetrics,
    table: &Table,
    width: f64,
    style: &TableStyle,
    first_available: f64,
    page_available: f64,
) -> TablePlan {
    let widths = column_widths(&table.columns, width);
    let heights = measure_rows(metrics, table, &widths, style);
    plan_rows(&table.kinds(), &heights, first_available, page_available)
}

fn aligned_x(align: Align, cell: Rect, text_width: f64, padding: f64) -> f64 {
    match align {
        Align::Left => cell.x + padding,
        Align::Center => cell.x + (cell.width - text_width) / 2.0,
        Align::Right => cell.right() - padding - text_width,
    }
}

/// Draws `table` starting at the cursor, continuing on new pages titled after the table.
///
/// Returns the plan that was drawn.
pub fn draw_table(ctx: &mut RenderContext<'_>, table: &Table) -> TablePlan {
    let theme = ctx.theme();
    let style = &theme.table;
    if ctx.page_count() == 0 {
        ctx.new_page(&table.title);
    }

    let content = ctx.content();
    let widths = column_widths(&table.columns, content.width);
    let heights = measure_rows(ctx.metrics(), table, &widths, style);
    let kinds = table.kinds();
    let first_available = ctx.remaining() - style.header_height;
    let page_available = content.height - style.header_height;
    let mut plan = plan_rows(&kinds, &heights, first_available, page_available);
    // Rows forced onto a partly used page overflow it; start on a fresh page instead.
    if first_available < page_available
        && plan
            .pages
            .first()
            .map_or(false, |page| page.height() > first_available)
    {
        ctx.new_page(&table.title);
        plan = plan_rows(&kinds, &heights, page_available, page_available);
    }
    debug!("Table '{}' spans {} page(s)", table.title, plan.pages.len());

    for (page_index, page) in plan.pages.iter().enumerate() {
        if page_index > 0 {
            ctx.new_page(&table.title);
        }
        let top = ctx.cursor();
        let block = Rect::new(content.x, top, content.width, style.header_height + page.height());
        draw_header_row(ctx, table, &widths, top);

        let mut y = top + style.header_height;
        let mut zebra = false;
        for planned in &page.rows {
            let rect = Rect::new(content.x, y, content.width, planned.height);
            match &table.rows[planned.row] {
                TableRow::GroupHeader(label) => {
                    let label = if planned.continued {
                        format!("{}{}", label, CONTINUED_SUFFIX)
                    } else {
                        label.clone()
                    };
                    draw_group_row(ctx, rect, &label);
                    zebra = false;
                }
                TableRow::Data(cells) => {
                    draw_data_row(ctx, table, &widths, rect, cells, zebra);
                    zebra = !zebra;
                }
            }
            y += planned.height;
        }

        let outline = Paint::stroke(theme.palette.border, 0.6);
        ctx.surface().rounded_rect(block, style.radius, &outline);
        ctx.advance(block.height + theme.gap);
    }
    plan
}

fn draw_header_row(ctx: &mut RenderContext<'_>, table: &Table, widths: &[f64], top: f64) {
    let theme = ctx.theme();
    let style = &theme.table;
    let content = ctx.content();
    let font = FontSpec::bold(style.font_size);
    let band = Rect::new(content.x, top, content.width, style.header_height);
    ctx.surface()
        .rounded_rect(band, style.radius, &Paint::fill(theme.palette.primary));

    let mut x = content.x;
    for (column, width) in table.columns.iter().zip(widths) {
        let cell = Rect::new(x, top, *width, style.header_height);
        let title = fit_text(ctx.metrics(), &column.title, font, width - 2.0 * style.padding_x);
        let text_width = ctx.text_width(&title, font);
        let baseline = cell.center().y + font.size * 0.35;
        ctx.surface().draw_text(
            &title,
            Point::new(aligned_x(column.align, cell, text_width, style.padding_x), baseline),
            font,
            Color::WHITE,
        );
        x += width;
    }
}

fn draw_group_row(ctx: &mut RenderContext<'_>, rect: Rect, label: &str) {
    let theme = ctx.theme();
    let style = &theme.table;
    let font = FontSpec::bold(style.font_size);
    let fill = theme.palette.accent.mix(Color::WHITE, 0.8);
    ctx.surface().fill_rect(rect, fill);
    let label = fit_text(ctx.metrics(), label, font, rect.width - 2.0 * style.padding_x);
    ctx.surface().draw_text(
        &label,
        Point::new(rect.x + style.padding_x, rect.center().y + font.size * 0.35),
        font,
        theme.palette.primary,
    );
}

fn draw_data_row(
    ctx: &mut RenderContext<'_>,
    table: &Table,
    widths: &[f64],
    rect: Rect,
    cells: &[Cell],
    zebra: bool,
) {
    let theme = ctx.theme();
    let style = &theme.table;
    let font = FontSpec::regular(style.font_size);
    if zebra {
        ctx.surface().fill_rect(rect, theme.palette.panel);
    }

    let mut x = rect.x;
    for ((cell, column), width) in cells.iter().zip(&table.columns).zip(widths) {
        let area = Rect::new(x, rect.y, *width, rect.height);
        let inner = (width - 2.0 * style.padding_x).max(1.0);
        let mut y = rect.y + style.padding_y;
        match cell {
            Cell::Text(text) => {
                for line in wrap_text(ctx.metrics(), text, font, inner) {
                    let text_width = ctx.text_width(&line, font);
                    ctx.surface().draw_text(
                        &line,
                        Point::new(aligned_x(column.align, area, text_width, style.padding_x), y + font.ascent()),
                        font,
                        theme.palette.text,
                    );
                    y += font.line_height();
                }
            }
            Cell::Badge { text, color } => {
                let badge_font = FontSpec::medium(style.font_size - 0.5);
                let label = fit_text(ctx.metrics(), text, badge_font, inner - 8.0);
                let badge_width = (ctx.text_width(&label, badge_font) + 8.0).min(inner);
                let badge = Rect::new(
                    aligned_x(column.align, area, badge_width, style.padding_x),
                    y,
                    badge_width,
                    style.badge_height,
                );
                ctx.surface()
                    .rounded_rect(badge, style.badge_height / 2.0, &Paint::fill(*color));
                ctx.surface().draw_text(
                    &label,
                    Point::new(badge.x + 4.0, badge.center().y + badge_font.size * 0.35),
                    badge_font,
                    Color::WHITE,
                );
            }
            Cell::List(items) => {
                for item in items {
                    for line in wrap_text(ctx.metrics(), item, font, inner) {
                        ctx.surface().draw_text(
                            &line,
                            Point::new(area.x + style.padding_x, y + font.ascent()),
                            font,
                            theme.palette.text,
                        );
                        y += font.line_height();
                    }
                    y += style.list_gap;
                }
            }
        }
        x += width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(kinds: &mut Vec<RowKind>, members: usize) {
        kinds.push(RowKind::GroupHeader);
        kinds.extend(std::iter::repeat(RowKind::Data).take(members));
    }

    fn assert_no_orphans(plan: &TablePlan, kinds: &[RowKind]) {
        for page in &plan.pages {
            if let Some(last) = page.rows.last() {
                assert_eq!(kinds[last.row], RowKind::Data, "page ends with a header: {:?}", page);
            }
        }
    }

    #[test]
    fn rows_fill_pages_in_order() {
        let kinds = vec![RowKind::Data; 25];
        let heights = vec![1.0; 25];
        let plan = plan_rows(&kinds, &heights, 5.0, 10.0);
        let sizes: Vec<usize> = plan.pages.iter().map(|page| page.rows.len()).collect();
        assert_eq!(sizes, vec![5, 10, 10]);
    }

    #[test]
    fn header_moves_with_its_first_member() {
        let mut kinds = Vec::new();
        group_with(&mut kinds, 8);
        group_with(&mut kinds, 3);
        let heights = vec![1.0; kinds.len()];
        let plan = plan_rows(&kinds, &heights, 10.0, 10.0);
        assert_no_orphans(&plan, &kinds);
        // Header 9 would be the tenth row with no room for its member.
        assert_eq!(plan.pages[0].rows.len(), 9);
        assert_eq!(plan.pages[1].rows[0].row, 9);
        assert!(!plan.pages[1].rows[0].continued);
    }

    #[test]
    fn continued_groups_repeat_their_header() {
        let mut kinds = Vec::new();
        group_with(&mut kinds, 14);
        let heights = vec![1.0; kinds.len()];
        let plan = plan_rows(&kinds, &heights, 10.0, 10.0);
        assert_eq!(plan.pages.len(), 2);
        let first = plan.pages[1].rows[0];
        assert_eq!(first.row, 0);
        assert!(first.continued);
        assert_eq!(plan.assignment(kinds.len())[0], Some(0));
    }

    #[test]
    fn headers_without_members_are_dropped() {
        let kinds = vec![
            RowKind::GroupHeader,
            RowKind::GroupHeader,
            RowKind::Data,
            RowKind::GroupHeader,
        ];
        let heights = vec![1.0; 4];
        let plan = plan_rows(&kinds, &heights, 10.0, 10.0);
        assert_eq!(plan.assignment(4), vec![None, Some(0), Some(0), None]);
    }

    #[test]
    fn oversized_rows_are_forced_onto_their_own_page() {
        let kinds = vec![RowKind::Data, RowKind::Data, RowKind::Data];
        let heights = vec![2.0, 50.0, 2.0];
        let plan = plan_rows(&kinds, &heights, 10.0, 10.0);
        assert_eq!(plan.assignment(3), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn empty_tables_still_get_a_page() {
        let plan = plan_rows(&[], &[], 10.0, 10.0);
        assert_eq!(plan.pages.len(), 1);
        assert!(plan.pages[0].rows.is_empty());

        let plan = plan_rows(&[RowKind::GroupHeader], &[1.0], 10.0, 10.0);
        assert_eq!(plan.pages.len(), 1);
    }

    #[test]
    fn no_room_on_first_page_still_progresses() {
        let mut kinds = Vec::new();
        group_with(&mut kinds, 2);
        let heights = vec![1.0; kinds.len()];
        let plan = plan_rows(&kinds, &heights, -5.0, 10.0);
        assert_no_orphans(&plan, &kinds);
        assert_eq!(plan.pages.len(), 2);
        assert_eq!(plan.pages[0].rows.len(), 2);
        assert!(plan.pages[1].rows[0].continued);
        assert!(plan.assignment(kinds.len()).iter().all(Option::is_some));
    }

    #[test]
    fn column_widths_are_proportional() {
        let columns = vec![Column::new("Material", 2.0), Column::new("Weight", 1.0).right(), Column::new("x", 0.0)];
        let widths = column_widths(&columns, 400.0);
        assert_eq!(widths, vec![200.0, 100.0, 100.0]);
    }
}
