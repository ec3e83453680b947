//! Reusable layout atoms: panels, stat chips, progress bars and placeholders.

use crate::context::RenderContext;
use crate::surface::{Color, FontSpec, Paint, Point, Rect, Surface};
use crate::text::{fit_text, wrap_text};
use crate::theme::Theme;

/// Rounded panel with the theme's background and border.
pub fn panel(surface: &mut dyn Surface, theme: &Theme, rect: Rect) {
    let paint = Paint::fill(theme.palette.panel).with_stroke(theme.palette.border, 0.6);
    surface.rounded_rect(rect, theme.panel_radius, &paint);
}

/// Panel showing a small caption above a large value, with a coloured accent strip.
pub fn stat_chip(
    surface: &mut dyn Surface,
    theme: &Theme,
    rect: Rect,
    label: &str,
    value: &str,
    accent: Color,
) {
    panel(surface, theme, rect);
    let strip = Rect::new(rect.x, rect.y + theme.panel_radius, 3.0, rect.height - 2.0 * theme.panel_radius);
    surface.fill_rect(strip, accent);

    let inner = rect.inset(theme.panel_padding, theme.panel_padding);
    let label_font = FontSpec::regular(theme.small_size);
    let value_font = FontSpec::bold((rect.height * 0.32).clamp(10.0, 22.0));
    let label = fit_text(surface.metrics(), label, label_font, inner.width);
    let value = fit_text(surface.metrics(), value, value_font, inner.width);

    surface.draw_text(
        &label,
        Point::new(inner.x, inner.y + label_font.ascent()),
        label_font,
        theme.palette.muted_text,
    );
    surface.draw_text(
        &value,
        Point::new(inner.x, inner.bottom() - value_font.size * 0.2),
        value_font,
        theme.palette.text,
    );
}

/// Labelled horizontal progress bar for a percentage, with an optional target marker.
///
/// The label and formatted value sit on a line above the track; `value` and `target` are
/// percentages and are clamped to the track.
pub fn progress_bar(
    surface: &mut dyn Surface,
    theme: &Theme,
    rect: Rect,
    label: &str,
    value: f64,
    target: Option<f64>,
    color: Color,
) {
    let font = FontSpec::medium(theme.small_size);
    let value_text = crate::format::percent(value);
    let value_width = surface.text_width(&value_text, font);
    let label = fit_text(
        surface.metrics(),
        label,
        font,
        (rect.width - value_width - 6.0).max(0.0),
    );
    let baseline = rect.y + font.ascent();
    surface.draw_text(&label, Point::new(rect.x, baseline), font, theme.palette.text);
    surface.draw_text(
        &value_text,
        Point::new(rect.right() - value_width, baseline),
        font,
        theme.palette.text,
    );

    let track_top = rect.y + font.line_height() + 2.0;
    let track_height = (rect.bottom() - track_top).clamp(3.0, 10.0);
    let track = Rect::new(rect.x, track_top, rect.width, track_height);
    surface.rounded_rect(track, track_height / 2.0, &Paint::fill(theme.palette.track));

    let fraction = if value.is_finite() {
        (value / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if fraction > 0.0 {
        let filled = Rect::new(track.x, track.y, track.width * fraction, track.height);
        surface.rounded_rect(filled, track_height / 2.0, &Paint::fill(color));
    }

    if let Some(target) = target.filter(|target| target.is_finite()) {
        let x = track.x + track.width * (target / 100.0).clamp(0.0, 1.0);
        surface.line(
            Point::new(x, track.y - 2.0),
            Point::new(x, track.bottom() + 2.0),
            theme.palette.text,
            1.0,
        );
    }
}

/// Muted panel with a centred, wrapped message.
pub fn placeholder(surface: &mut dyn Surface, theme: &Theme, rect: Rect, message: &str) {
    let paint = Paint::fill(theme.palette.panel).with_stroke(theme.palette.border, 0.6);
    surface.rounded_rect(rect, theme.panel_radius, &paint);
    centered_lines(surface, rect, message, FontSpec::medium(theme.body_size), theme.palette.muted_text);
}

/// Draws `text` wrapped to `rect` and centred both ways.
pub fn centered_lines(surface: &mut dyn Surface, rect: Rect, text: &str, font: FontSpec, color: Color) {
    let max_width = (rect.width - 16.0).max(font.size);
    let lines = wrap_text(surface.metrics(), text, font, max_width);
    let block = lines.len() as f64 * font.line_height();
    let mut top = rect.y + (rect.height - block) / 2.0;
    for line in lines {
        let width = surface.text_width(&line, font);
        let x = rect.x + (rect.width - width) / 2.0;
        surface.draw_text(&line, Point::new(x, top + font.ascent()), font, color);
        top += font.line_height();
    }
}

/// A page holding nothing but a centred message panel.
pub fn message_page(ctx: &mut RenderContext<'_>, heading: &str, message: &str) {
    let content = ctx.new_page(heading);
    let theme = ctx.theme();
    let width = (content.width * 0.6).max(120.0);
    let height = 120.0_f64.min(content.height);
    let rect = Rect::new(
        content.x + (content.width - width) / 2.0,
        content.y + (content.height - height) / 2.0,
        width,
        height,
    );
    placeholder(ctx.surface(), theme, rect, message);
}

/// Colour swatch followed by a label; returns the horizontal space used.
pub fn legend_entry(
    surface: &mut dyn Surface,
    theme: &Theme,
    origin: Point,
    color: Color,
    label: &str,
) -> f64 {
    let font = FontSpec::regular(theme.small_size);
    let swatch = font.size;
    surface.rounded_rect(
        Rect::new(origin.x, origin.y, swatch, swatch),
        2.0,
        &Paint::fill(color),
    );
    surface.draw_text(
        label,
        Point::new(origin.x + swatch + 4.0, origin.y + swatch * 0.85),
        font,
        theme.palette.text,
    );
    legend_entry_width(surface, theme, label)
}

pub fn legend_entry_width(surface: &dyn Surface, theme: &Theme, label: &str) -> f64 {
    let font = FontSpec::regular(theme.small_size);
    font.size + 4.0 + surface.text_width(label, font)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{DrawOp, RecordingSurface};
    use crate::surface::{Size, TextMetrics};

    #[test]
    fn progress_fill_is_clamped_to_the_track() {
        let theme = Theme::default();
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let rect = Rect::new(10.0, 10.0, 200.0, 24.0);
        progress_bar(&mut surface, &theme, rect, "Diversion", 140.0, Some(60.0), theme.palette.accent);

        let page = &surface.pages()[0];
        assert!(page.contains_text("140.0%"));
        let fills: Vec<_> = page.paths().filter(|(_, paint)| paint.fill.is_some()).collect();
        assert_eq!(fills.len(), 2);
        let (track, _) = fills[0];
        let (filled, _) = fills[1];
        assert_eq!(track, filled);
    }

    #[test]
    fn placeholder_centres_its_message() {
        let theme = Theme::default();
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let rect = Rect::new(0.0, 0.0, 400.0, 100.0);
        placeholder(&mut surface, &theme, rect, "No flows available");

        let text = surface.pages()[0]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, baseline, font, .. } => Some((text.clone(), *baseline, *font)),
                _ => None,
            })
            .expect("message drawn");
        assert_eq!(text.0, "No flows available");
        let width = surface.text_width(&text.0, text.2);
        assert!((text.1.x + width / 2.0 - 200.0).abs() < 1e-6);
    }
}
