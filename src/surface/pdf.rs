//! PDF backend built on `printpdf`.

use std::io::{BufWriter, Cursor, Write};

use image::GenericImageView;
use log::warn;
use printpdf::{
    BuiltinFont, CustomPdfConformance, IndirectFontRef, Line, Mm, PdfConformance, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rgb,
};

use crate::error::{ReportError, Result};
use crate::fonts::{FontMetrics, ResolvedFonts};

use super::{
    Color, FontSpec, FontWeight, Paint, Path, Point, Rect, Segment, Size, Surface, TextMetrics,
};

const MM_PER_PT: f64 = 25.4 / 72.0;
const IMAGE_DPI: f64 = 300.0;

struct PdfFonts {
    regular: IndirectFontRef,
    medium: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfFonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Medium => &self.medium,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// A [`Surface`] writing into a `printpdf` document.
///
/// The backend has no alpha state, so translucent fills are composited against the white page.
pub struct PdfSurface {
    document: PdfDocumentReference,
    layer: Option<PdfLayerReference>,
    size: Size,
    pages: usize,
    fonts: PdfFonts,
    metrics: FontMetrics,
}

impl PdfSurface {
    /// Creates an empty document; pages are added through [`Surface::begin_page`].
    pub fn new(title: &str, size: Size, fonts: &ResolvedFonts) -> Result<Self> {
        let document = PdfDocument::empty(title).with_conformance(PdfConformance::Custom(
            CustomPdfConformance {
                requires_icc_profile: false,
                requires_xmp_metadata: false,
                ..Default::default()
            },
        ));

        let fonts_refs = match fonts {
            ResolvedFonts::TrueType(set) => {
                let embed = |weight: FontWeight| {
                    document
                        .add_external_font(set.bytes(weight))
                        .map_err(|err| ReportError::Pdf(err.to_string()))
                };
                PdfFonts {
                    regular: embed(FontWeight::Regular)?,
                    medium: embed(FontWeight::Medium)?,
                    bold: embed(FontWeight::Bold)?,
                }
            }
            ResolvedFonts::Builtin => {
                let builtin = |font: BuiltinFont| {
                    document
                        .add_builtin_font(font)
                        .map_err(|err| ReportError::Pdf(err.to_string()))
                };
                PdfFonts {
                    regular: builtin(BuiltinFont::Helvetica)?,
                    medium: builtin(BuiltinFont::HelveticaBold)?,
                    bold: builtin(BuiltinFont::HelveticaBold)?,
                }
            }
        };

        Ok(Self {
            document,
            layer: None,
            size,
            pages: 0,
            fonts: fonts_refs,
            metrics: fonts.metrics(),
        })
    }

    /// Serializes the document.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if self.layer.is_none() {
            self.add_page();
        }
        let mut buffer = Vec::new();
        {
            let mut writer = BufWriter::new(Cursor::new(&mut buffer));
            self.document
                .save(&mut writer)
                .map_err(|err| ReportError::Pdf(err.to_string()))?;
            writer.flush()?;
        }
        Ok(buffer)
    }

    fn add_page(&mut self) -> PdfLayerReference {
        let (page, layer) = self.document.add_page(
            Mm(self.size.width * MM_PER_PT),
            Mm(self.size.height * MM_PER_PT),
            "Layer 1",
        );
        let layer = self.document.get_page(page).get_layer(layer);
        self.layer = Some(layer.clone());
        self.pages += 1;
        layer
    }

    fn layer(&mut self) -> PdfLayerReference {
        match self.layer.clone() {
            Some(layer) => layer,
            None => self.add_page(),
        }
    }

    /// Converts a top-left based point into PDF page coordinates.
    fn to_mm(&self, point: Point) -> (Mm, Mm) {
        (
            Mm(point.x * MM_PER_PT),
            Mm((self.size.height - point.y) * MM_PER_PT),
        )
    }

    fn point(&self, point: Point) -> printpdf::Point {
        let (x, y) = self.to_mm(point);
        printpdf::Point::new(x, y)
    }
}

fn pdf_color(color: Color) -> printpdf::Color {
    let (r, g, b) = color.to_unit();
    printpdf::Color::Rgb(Rgb::new(r, g, b, None))
}

impl TextMetrics for PdfSurface {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        self.metrics.text_width(text, font)
    }
}

impl Surface for PdfSurface {
    fn metrics(&self) -> &dyn TextMetrics {
        &self.metrics
    }

    fn page_size(&self) -> Size {
        self.size
    }

    fn begin_page(&mut self) {
        self.add_page();
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        if paint.fill.is_none() && paint.stroke.is_none() {
            return;
        }

        // printpdf reads a cubic curve wherever two consecutive points carry the flag.
        let mut points = vec![(self.point(path.start), false)];
        for segment in &path.segments {
            match *segment {
                Segment::LineTo(end) => points.push((self.point(end), false)),
                Segment::CubicTo(c1, c2, end) => {
                    if let Some(last) = points.last_mut() {
                        last.1 = true;
                    }
                    points.push((self.point(c1), true));
                    points.push((self.point(c2), false));
                    points.push((self.point(end), false));
                }
            }
        }

        let layer = self.layer();
        if let Some(fill) = paint.fill {
            layer.set_fill_color(pdf_color(fill.mix(Color::WHITE, 1.0 - paint.fill_opacity)));
        }
        if let Some((stroke, width)) = paint.stroke {
            layer.set_outline_color(pdf_color(stroke));
            layer.set_outline_thickness(width);
        }
        layer.add_shape(Line {
            points,
            is_closed: path.closed,
            has_fill: paint.fill.is_some(),
            has_stroke: paint.stroke.is_some(),
            is_clipping_path: false,
        });
    }

    fn draw_text(&mut self, text: &str, baseline: Point, font: FontSpec, color: Color) {
        if text.trim().is_empty() {
            return;
        }
        let (x, y) = self.to_mm(baseline);
        let layer = self.layer();
        layer.set_fill_color(pdf_color(color));
        layer.use_text(text, font.size, x, y, self.fonts.get(font.weight));
    }

    fn draw_image(&mut self, image: &image::DynamicImage, frame: Rect) {
        let (px_width, px_height) = image.dimensions();
        if px_width == 0 || px_height == 0 {
            warn!("Skipping empty image");
            return;
        }
        let natural_width = px_width as f64 / IMAGE_DPI * 72.0;
        let natural_height = px_height as f64 / IMAGE_DPI * 72.0;
        let (x, y) = self.to_mm(Point::new(frame.x, frame.bottom()));
        let layer = self.layer();

        let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
        printpdf::Image::from_dynamic_image(&rgb).add_to_layer(
            layer,
            Some(x),
            Some(y),
            None,
            Some(frame.width / natural_width),
            Some(frame.height / natural_height),
            Some(IMAGE_DPI),
        );
    }
}
