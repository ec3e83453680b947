use crate::context::RenderContext;
use crate::error::Result;
use crate::payload::ReportPayload;
use crate::surface::{Color, FontSpec, Paint, Point, Rect};
use crate::text::wrap_text;

pub(super) fn render(ctx: &mut RenderContext<'_>, payload: &ReportPayload) -> Result<()> {
    let frame = ctx.new_bare_page();
    let theme = ctx.theme();
    let palette = &theme.palette;

    // Right half: cover image, or a tinted block standing in for it.
    let image_area = Rect::new(
        frame.x + frame.width * 0.55,
        frame.y,
        frame.width * 0.45,
        frame.height,
    );
    match ctx.cover_image() {
        Some(image) => ctx.surface().draw_image(image, image_area),
        None => {
            let tint = palette.accent.mix(Color::WHITE, 0.75);
            ctx.surface()
                .rounded_rect(image_area, theme.panel_radius * 2.0, &Paint::fill(tint));
            ctx.surface().circle(
                image_area.center(),
                image_area.width.min(image_area.height) * 0.25,
                &Paint::fill(palette.accent.mix(Color::WHITE, 0.5)),
            );
        }
    }

    let text_width = frame.width * 0.5;
    let mut y = frame.y + frame.height * 0.28;
    ctx.surface()
        .fill_rect(Rect::new(frame.x, y - 18.0, 48.0, 4.0), palette.accent);

    let title_font = FontSpec::bold(theme.title_size);
    for line in wrap_text(ctx.metrics(), payload.title(), title_font, text_width) {
        y += title_font.line_height();
        ctx.surface()
            .draw_text(&line, Point::new(frame.x, y), title_font, palette.primary);
    }

    y += theme.gap * 2.0;
    let location_font = FontSpec::medium(theme.heading_size);
    for line in wrap_text(ctx.metrics(), &payload.location, location_font, text_width) {
        y += location_font.line_height();
        ctx.surface()
            .draw_text(&line, Point::new(frame.x, y), location_font, palette.text);
    }

    let body = FontSpec::regular(theme.subheading_size);
    y += body.line_height() + theme.gap;
    ctx.surface().draw_text(
        &format!("Reporting period: {}", payload.period()),
        Point::new(frame.x, y),
        body,
        palette.muted_text,
    );

    let users = payload.users.display();
    if !users.is_empty() {
        let lines = wrap_text(
            ctx.metrics(),
            &format!("Prepared for: {}", users),
            body,
            text_width,
        );
        for line in lines {
            y += body.line_height();
            ctx.surface()
                .draw_text(&line, Point::new(frame.x, y), body, palette.muted_text);
        }
    }
    Ok(())
}
