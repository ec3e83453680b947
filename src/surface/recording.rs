//! A surface that records primitives instead of producing a document.
//!
//! Used by tests to inspect layout output and by [`crate::builder::ReportRenderer::dry_run`] to
//! plan a report without paying for PDF serialization.

use crate::fonts::FontMetrics;

use super::{Color, FontSpec, Paint, Path, Point, Rect, Size, Surface, TextMetrics};

/// A single recorded primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Path {
        path: Path,
        paint: Paint,
    },
    Text {
        text: String,
        baseline: Point,
        font: FontSpec,
        color: Color,
    },
    Image {
        frame: Rect,
    },
}

/// Primitives recorded on one page, in drawing order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordedPage {
    pub ops: Vec<DrawOp>,
}

impl RecordedPage {
    /// Text runs on the page in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }

    pub fn paths(&self) -> impl Iterator<Item = (&Path, &Paint)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Path { path, paint } => Some((path, paint)),
            _ => None,
        })
    }
}

/// In-memory [`Surface`] implementation.
pub struct RecordingSurface {
    size: Size,
    pages: Vec<RecordedPage>,
    metrics: FontMetrics,
}

impl RecordingSurface {
    /// Creates a recorder measuring text with the builtin Helvetica metrics.
    pub fn new(size: Size) -> Self {
        Self::with_metrics(size, FontMetrics::Builtin)
    }

    pub fn with_metrics(size: Size, metrics: FontMetrics) -> Self {
        Self {
            size,
            pages: Vec::new(),
            metrics,
        }
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    /// Indices of the pages containing `needle` in any text run.
    pub fn pages_containing(&self, needle: &str) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.contains_text(needle))
            .map(|(index, _)| index)
            .collect()
    }

    fn current(&mut self) -> &mut RecordedPage {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl TextMetrics for RecordingSurface {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        self.metrics.text_width(text, font)
    }
}

impl Surface for RecordingSurface {
    fn metrics(&self) -> &dyn TextMetrics {
        &self.metrics
    }

    fn page_size(&self) -> Size {
        self.size
    }

    fn begin_page(&mut self) {
        self.pages.push(RecordedPage::default());
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.current().ops.push(DrawOp::Path {
            path: path.clone(),
            paint: *paint,
        });
    }

    fn draw_text(&mut self, text: &str, baseline: Point, font: FontSpec, color: Color) {
        self.current().ops.push(DrawOp::Text {
            text: text.to_owned(),
            baseline,
            font,
            color,
        });
    }

    fn draw_image(&mut self, _image: &image::DynamicImage, frame: Rect) {
        self.current().ops.push(DrawOp::Image { frame });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_without_a_page_opens_one() {
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK);
        assert_eq!(surface.page_count(), 1);

        surface.begin_page();
        surface.draw_text("Hello", Point::new(5.0, 5.0), FontSpec::regular(10.0), Color::BLACK);
        assert_eq!(surface.page_count(), 2);
        assert_eq!(surface.pages_containing("Hello"), vec![1]);
        assert_eq!(surface.pages()[0].paths().count(), 1);
    }
}
