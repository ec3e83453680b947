//! Page geometry, decoration and the cursor threaded through every rendering step.

use image::DynamicImage;
use log::debug;

use crate::richtext::{self, Span};
use crate::surface::{Color, FontSpec, Point, Rect, Size, Surface, TextMetrics};
use crate::text::{fit_text, wrap_text};
use crate::theme::Theme;

/// Page margins in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub const fn trbl(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn all(value: f64) -> Self {
        Self::trbl(value, value, value, value)
    }

    pub const fn vh(vertical: f64, horizontal: f64) -> Self {
        Self::trbl(vertical, horizontal, vertical, horizontal)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::vh(28.0, 36.0)
    }
}

impl From<f64> for Margins {
    fn from(value: f64) -> Self {
        Self::all(value)
    }
}

impl From<(f64, f64)> for Margins {
    fn from((vertical, horizontal): (f64, f64)) -> Self {
        Self::vh(vertical, horizontal)
    }
}

impl From<(f64, f64, f64, f64)> for Margins {
    fn from((top, right, bottom, left): (f64, f64, f64, f64)) -> Self {
        Self::trbl(top, right, bottom, left)
    }
}

/// Identifying text repeated in page headers and footers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub location: String,
    /// Display form of the reporting period, e.g. `01 Jan 2024 - 31 Mar 2024`.
    pub period: String,
}

/// Draws the header band and footer of content pages and reports the area left for content.
#[derive(Clone, Debug)]
pub struct PageDecorator {
    margins: Margins,
    info: DocumentInfo,
}

impl PageDecorator {
    pub fn new(margins: Margins, info: DocumentInfo) -> Self {
        Self { margins, info }
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// The page inside the margins.
    pub fn frame(&self, page: Size) -> Rect {
        Rect::new(
            self.margins.left,
            self.margins.top,
            (page.width - self.margins.left - self.margins.right).max(0.0),
            (page.height - self.margins.top - self.margins.bottom).max(0.0),
        )
    }

    /// Content area of a decorated page.
    pub fn content_area(&self, page: Size, theme: &Theme) -> Rect {
        let frame = self.frame(page);
        let top = theme.header_height + theme.gap;
        let bottom = theme.footer_height;
        Rect::new(
            frame.x,
            frame.y + top,
            frame.width,
            (frame.height - top - bottom).max(0.0),
        )
    }

    /// Decorates the current page and returns its content area.
    pub fn decorate(
        &self,
        surface: &mut dyn Surface,
        theme: &Theme,
        page_number: usize,
        heading: &str,
    ) -> Rect {
        let page = surface.page_size();
        let frame = self.frame(page);
        let palette = &theme.palette;

        // Header: section heading on the left, location and period on the right.
        let heading_font = FontSpec::bold(theme.heading_size);
        let meta_font = FontSpec::regular(theme.small_size);
        let meta_width = frame.width * 0.35;
        let location = fit_text(surface.metrics(), &self.info.location, meta_font, meta_width);
        let period = fit_text(surface.metrics(), &self.info.period, meta_font, meta_width);
        let heading = fit_text(
            surface.metrics(),
            heading,
            heading_font,
            frame.width - meta_width - theme.gap,
        );

        let baseline = frame.y + theme.header_height * 0.5 + heading_font.size * 0.35;
        surface.draw_text(&heading, Point::new(frame.x, baseline), heading_font, palette.primary);
        let location_width = surface.text_width(&location, meta_font);
        let period_width = surface.text_width(&period, meta_font);
        surface.draw_text(
            &location,
            Point::new(frame.right() - location_width, baseline - meta_font.line_height()),
            meta_font,
            palette.text,
        );
        surface.draw_text(
            &period,
            Point::new(frame.right() - period_width, baseline),
            meta_font,
            palette.muted_text,
        );
        let rule_y = frame.y + theme.header_height;
        surface.fill_rect(Rect::new(frame.x, rule_y - 2.0, frame.width, 2.0), palette.accent);

        // Footer: title, location and period on the left, page number on the right.
        let footer_font = FontSpec::regular(theme.small_size);
        let footer_baseline = frame.bottom() - footer_font.size * 0.25;
        surface.line(
            Point::new(frame.x, frame.bottom() - theme.footer_height + 6.0),
            Point::new(frame.right(), frame.bottom() - theme.footer_height + 6.0),
            palette.border,
            0.5,
        );
        let footer_left = fit_text(
            surface.metrics(),
            &format!(
                "{} | {} | {}",
                self.info.title, self.info.location, self.info.period
            ),
            footer_font,
            frame.width * 0.7,
        );
        surface.draw_text(
            &footer_left,
            Point::new(frame.x, footer_baseline),
            footer_font,
            palette.muted_text,
        );
        let page_label = format!("Page {}", page_number);
        let page_label_width = surface.text_width(&page_label, footer_font);
        surface.draw_text(
            &page_label,
            Point::new(frame.right() - page_label_width, footer_baseline),
            footer_font,
            palette.muted_text,
        );

        self.content_area(page, theme)
    }
}

/// Mutable rendering state handed to every step: the surface, the theme and a vertical cursor
/// into the current page's content area.
pub struct RenderContext<'a> {
    surface: &'a mut dyn Surface,
    theme: &'a Theme,
    decorator: PageDecorator,
    cover_image: Option<&'a DynamicImage>,
    content: Rect,
    cursor: f64,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        theme: &'a Theme,
        decorator: PageDecorator,
        cover_image: Option<&'a DynamicImage>,
    ) -> Self {
        let content = decorator.content_area(surface.page_size(), theme);
        Self {
            surface,
            theme,
            decorator,
            cover_image,
            content,
            cursor: content.y,
        }
    }

    pub fn surface(&mut self) -> &mut dyn Surface {
        &mut *self.surface
    }

    pub fn metrics(&self) -> &dyn TextMetrics {
        self.surface.metrics()
    }

    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub fn info(&self) -> &DocumentInfo {
        self.decorator.info()
    }

    pub fn cover_image(&self) -> Option<&'a DynamicImage> {
        self.cover_image
    }

    pub fn page_size(&self) -> Size {
        self.surface.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.surface.page_count()
    }

    /// The page inside the margins, ignoring header and footer.
    pub fn frame(&self) -> Rect {
        self.decorator.frame(self.page_size())
    }

    /// Starts a decorated page titled `heading` and returns its content area.
    pub fn new_page(&mut self, heading: &str) -> Rect {
        self.surface.begin_page();
        let page_number = self.surface.page_count();
        debug!("Page {}: {}", page_number, heading);
        self.content = self
            .decorator
            .decorate(&mut *self.surface, self.theme, page_number, heading);
        self.cursor = self.content.y;
        self.content
    }

    /// Starts an undecorated page and returns the full frame.
    pub fn new_bare_page(&mut self) -> Rect {
        self.surface.begin_page();
        self.content = self.frame();
        self.cursor = self.content.y;
        self.content
    }

    /// Content area of the current page.
    pub fn content(&self) -> Rect {
        self.content
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn advance(&mut self, dy: f64) {
        self.cursor = (self.cursor + dy).min(self.content.bottom());
    }

    /// Vertical space left below the cursor.
    pub fn remaining(&self) -> f64 {
        (self.content.bottom() - self.cursor).max(0.0)
    }

    /// The content area below the cursor.
    pub fn remaining_area(&self) -> Rect {
        Rect::new(self.content.x, self.cursor, self.content.width, self.remaining())
    }

    /// Takes a band of `height` below the cursor and moves the cursor past it plus a gap.
    pub fn take(&mut self, height: f64) -> Rect {
        let rect = Rect::new(self.content.x, self.cursor, self.content.width, height);
        self.advance(height + self.theme.gap);
        rect
    }

    /// Draws a subheading at the cursor.
    pub fn subheading(&mut self, text: &str) {
        let font = FontSpec::bold(self.theme.subheading_size);
        let text = fit_text(self.metrics(), text, font, self.content.width);
        let baseline = self.cursor + font.ascent();
        let color = self.theme.palette.text;
        self.surface
            .draw_text(&text, Point::new(self.content.x, baseline), font, color);
        self.advance(font.line_height() + self.theme.gap * 0.5);
    }

    /// Draws a wrapped plain paragraph at the cursor.
    pub fn paragraph(&mut self, text: &str, color: Color) {
        let font = FontSpec::regular(self.theme.body_size);
        let lines = wrap_text(self.metrics(), text, font, self.content.width);
        for line in lines {
            let baseline = self.cursor + font.ascent();
            self.surface
                .draw_text(&line, Point::new(self.content.x, baseline), font, color);
            self.advance(font.line_height());
        }
        self.advance(self.theme.gap * 0.5);
    }

    /// Draws a paragraph of narrative markup at the cursor.
    pub fn rich_paragraph(&mut self, spans: &[Span], width: f64) {
        let size = self.theme.body_size;
        let lines = richtext::wrap_spans(self.metrics(), spans, size, width);
        let default_color = self.theme.palette.text;
        for line in lines {
            let baseline = self.cursor + FontSpec::regular(size).ascent();
            for run in &line.runs {
                self.surface.draw_text(
                    &run.text,
                    Point::new(self.content.x + run.x, baseline),
                    FontSpec::new(run.weight, size),
                    run.color.unwrap_or(default_color),
                );
            }
            self.advance(FontSpec::regular(size).line_height());
        }
        self.advance(self.theme.gap * 0.5);
    }
}

impl TextMetrics for RenderContext<'_> {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        self.surface.text_width(text, font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Waste Report".into(),
            location: "North Depot".into(),
            period: "01 Jan 2024 - 31 Mar 2024".into(),
        }
    }

    #[test]
    fn margins_convert_like_tuples() {
        assert_eq!(Margins::from(10.0), Margins::all(10.0));
        assert_eq!(Margins::from((5.0, 8.0)), Margins::trbl(5.0, 8.0, 5.0, 8.0));
    }

    #[test]
    fn decorated_pages_carry_footer() {
        let theme = Theme::default();
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let mut ctx = RenderContext::new(
            &mut surface,
            &theme,
            PageDecorator::new(Margins::default(), info()),
            None,
        );
        let first = ctx.new_page("Overview");
        ctx.advance(100.0);
        let second = ctx.new_page("Performance");
        assert_eq!(first, second);
        assert_eq!(ctx.cursor(), second.y);
        assert_eq!(ctx.page_count(), 2);
        drop(ctx);

        assert!(surface.pages()[0].contains_text("Page 1"));
        assert!(surface.pages()[1].contains_text("Page 2"));
        assert!(surface.pages()[1].contains_text("North Depot"));
    }

    #[test]
    fn cursor_never_leaves_the_page() {
        let theme = Theme::default();
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let mut ctx = RenderContext::new(
            &mut surface,
            &theme,
            PageDecorator::new(Margins::default(), info()),
            None,
        );
        let content = ctx.new_page("Overview");
        ctx.advance(10_000.0);
        assert_eq!(ctx.cursor(), content.bottom());
        assert_eq!(ctx.remaining(), 0.0);
    }
}
