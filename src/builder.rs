//! Report construction: a builder collecting configuration and the reusable renderer it yields.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::DynamicImage;
use log::{debug, info, warn};

use crate::context::{DocumentInfo, Margins, PageDecorator, RenderContext};
use crate::error::Result;
use crate::fonts::{FontResolver, ResolvedFonts};
use crate::format::slug;
use crate::payload::ReportPayload;
use crate::pipeline::{self, Step};
use crate::surface::pdf::PdfSurface;
use crate::surface::recording::RecordingSurface;
use crate::surface::{Size, Surface};
use crate::theme::Theme;

/// Environment variable naming a cover image used when none is configured.
pub const COVER_IMAGE_ENV: &str = "WASTE_REPORT_COVER_IMAGE";

enum CoverSource {
    Path(PathBuf),
    Image(DynamicImage),
}

/// Builder for [`ReportRenderer`] instances pre-configured with the crate defaults.
#[derive(Default)]
pub struct ReportBuilder {
    page_size: Option<Size>,
    margins: Option<Margins>,
    font_resolver: Option<FontResolver>,
    fonts: Option<ResolvedFonts>,
    cover: Option<CoverSource>,
    theme: Option<Theme>,
    steps: Option<Vec<Step>>,
}

impl ReportBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size in points. Defaults to A4 landscape.
    pub fn with_page_size(mut self, size: Size) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Replaces the font lookup strategies.
    pub fn with_font_resolver(mut self, resolver: FontResolver) -> Self {
        self.font_resolver = Some(resolver);
        self
    }

    /// Uses already resolved fonts and skips lookup entirely.
    pub fn with_fonts(mut self, fonts: ResolvedFonts) -> Self {
        self.fonts = Some(fonts);
        self
    }

    /// Loads the cover image from `path` when the renderer is built.
    pub fn with_cover_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover = Some(CoverSource::Path(path.into()));
        self
    }

    pub fn with_cover_image_data(mut self, image: DynamicImage) -> Self {
        self.cover = Some(CoverSource::Image(image));
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Replaces the page-producing steps; see [`pipeline::standard_steps`].
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Resolves fonts and the cover image and returns the renderer.
    ///
    /// Missing fonts and unreadable images degrade to the builtin faces and the drawn
    /// placeholder, so building never fails.
    pub fn build(self) -> ReportRenderer {
        let fonts = match self.fonts {
            Some(fonts) => fonts,
            None => self.font_resolver.unwrap_or_default().resolve(),
        };
        info!("Rendering with {}", fonts.describe());

        let cover_image = match self.cover {
            Some(CoverSource::Image(image)) => Some(image),
            Some(CoverSource::Path(path)) => load_cover(&path),
            None => std::env::var_os(COVER_IMAGE_ENV)
                .filter(|value| !value.is_empty())
                .and_then(|value| load_cover(Path::new(&value))),
        };

        ReportRenderer {
            page_size: self.page_size.unwrap_or_else(Size::a4_landscape),
            margins: self.margins.unwrap_or_default(),
            fonts,
            cover_image,
            theme: self.theme.unwrap_or_default(),
            steps: self.steps.unwrap_or_else(pipeline::standard_steps),
        }
    }
}

fn load_cover(path: &Path) -> Option<DynamicImage> {
    match decode_image_from_path(path) {
        Ok(image) => {
            debug!("Loaded cover image {}", path.display());
            Some(image)
        }
        Err(err) => {
            warn!(
                "Cover image {} unavailable, drawing a placeholder: {}",
                path.display(),
                err
            );
            None
        }
    }
}

/// Decodes an image file, guessing the format from its contents.
pub fn decode_image_from_path(path: &Path) -> Result<DynamicImage> {
    Ok(image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?)
}

/// A finished document.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    /// Suggested file name, see [`suggested_filename`].
    pub filename: String,
    pub page_count: usize,
}

impl RenderedReport {
    /// Writes the document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// `waste_report_<location>_<YYYYMMDD_HHMMSS>.pdf`.
pub fn suggested_filename(payload: &ReportPayload, timestamp: DateTime<Utc>) -> String {
    format!(
        "waste_report_{}_{}.pdf",
        slug(&payload.location),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Renders payloads with a fixed configuration.
///
/// Every call draws onto its own surface; nothing is carried over between renders.
pub struct ReportRenderer {
    page_size: Size,
    margins: Margins,
    fonts: ResolvedFonts,
    cover_image: Option<DynamicImage>,
    theme: Theme,
    steps: Vec<Step>,
}

impl ReportRenderer {
    pub fn fonts(&self) -> &ResolvedFonts {
        &self.fonts
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn decorator(&self, payload: &ReportPayload) -> PageDecorator {
        PageDecorator::new(
            self.margins,
            DocumentInfo {
                title: payload.title().to_owned(),
                location: payload.location.trim().to_owned(),
                period: payload.period(),
            },
        )
    }

    fn run_on(&self, surface: &mut dyn Surface, payload: &ReportPayload) -> Result<()> {
        let mut ctx = RenderContext::new(
            surface,
            &self.theme,
            self.decorator(payload),
            self.cover_image.as_ref(),
        );
        pipeline::run(&mut ctx, payload, &self.steps)
    }

    /// Renders `payload` to a PDF named after the current time.
    pub fn render(&self, payload: &ReportPayload) -> Result<RenderedReport> {
        self.render_at(payload, Utc::now())
    }

    /// Renders `payload`, naming the result after `timestamp`.
    pub fn render_at(&self, payload: &ReportPayload, timestamp: DateTime<Utc>) -> Result<RenderedReport> {
        let mut surface = PdfSurface::new(payload.title(), self.page_size, &self.fonts)?;
        self.run_on(&mut surface, payload)?;
        let page_count = surface.page_count();
        let bytes = surface.into_bytes()?;
        info!(
            "Rendered report for '{}': {} page(s), {} bytes",
            payload.location,
            page_count,
            bytes.len()
        );
        Ok(RenderedReport {
            bytes,
            filename: suggested_filename(payload, timestamp),
            page_count,
        })
    }

    /// Parses a JSON payload and renders it.
    pub fn render_json(&self, json: &str) -> Result<RenderedReport> {
        let payload = ReportPayload::from_json(json)?;
        self.render(&payload)
    }

    /// Renders `payload` into `writer`; returns the page count.
    pub fn render_to<W: Write>(&self, payload: &ReportPayload, writer: &mut W) -> Result<usize> {
        let report = self.render(payload)?;
        writer.write_all(&report.bytes)?;
        Ok(report.page_count)
    }

    /// Lays out `payload` on a recording surface without producing a PDF.
    pub fn dry_run(&self, payload: &ReportPayload) -> Result<RecordingSurface> {
        let mut surface = RecordingSurface::with_metrics(self.page_size, self.fonts.metrics());
        self.run_on(&mut surface, payload)?;
        Ok(surface)
    }
}

/// Renders a JSON payload with the default configuration.
pub fn render_json(json: &str) -> Result<RenderedReport> {
    ReportBuilder::new().build().render_json(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload() -> ReportPayload {
        ReportPayload::from_json(
            r#"{"users": ["ops@example.com"], "location": "North Depot",
                "date_from": "2024-01-01", "date_to": "2024-03-31"}"#,
        )
        .unwrap()
    }

    fn renderer() -> ReportRenderer {
        ReportBuilder::new()
            .with_font_resolver(FontResolver::builtin_only())
            .build()
    }

    #[test]
    fn filename_carries_location_and_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2024, 4, 2, 9, 5, 7).unwrap();
        assert_eq!(
            suggested_filename(&payload(), timestamp),
            "waste_report_north_depot_20240402_090507.pdf"
        );
    }

    #[test]
    fn missing_cover_image_falls_back_to_placeholder() {
        let renderer = ReportBuilder::new()
            .with_font_resolver(FontResolver::builtin_only())
            .with_cover_image("/__waste_report_missing_cover__.png")
            .build();
        assert!(renderer.cover_image.is_none());
        let recorded = renderer.dry_run(&payload()).unwrap();
        assert_eq!(recorded.pages().len(), 1);
    }

    #[test]
    fn identity_only_payload_renders_the_cover() {
        let recorded = renderer().dry_run(&payload()).unwrap();
        assert_eq!(recorded.pages().len(), 1);
        assert!(recorded.pages()[0].contains_text("Waste Management Report"));
        assert!(recorded.pages()[0].contains_text("North Depot"));
    }

    #[test]
    fn custom_steps_replace_the_pipeline() {
        let renderer = ReportBuilder::new()
            .with_font_resolver(FontResolver::builtin_only())
            .with_steps(Vec::new())
            .build();
        assert!(renderer.dry_run(&payload()).unwrap().pages().is_empty());
    }
}
