//! Abstract 2D drawing surface targeted by every layout routine.
//!
//! Coordinates are PostScript points with the origin in the top-left corner of the page and the
//! y axis growing downwards. Backends convert to their own coordinate system. Layout code only
//! ever talks to [`Surface`], which keeps it independent of the output format: the PDF backend
//! in [`pdf`] produces the final document while [`recording`] captures primitives for tests and
//! dry runs.

use std::f64::consts::{FRAC_PI_2, TAU};

pub mod pdf;
pub mod recording;

/// Cubic Bezier control distance approximating a quarter circle of radius 1.
const KAPPA: f64 = 0.552_284_749_8;

/// A point on the page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A4 in landscape orientation (11.69 × 8.27 in).
    pub const fn a4_landscape() -> Self {
        Self::new(841.89, 595.28)
    }
}

/// Axis-aligned rectangle, `(x, y)` being the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks the rectangle by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(
            self.x + dx,
            self.y + dy,
            (self.width - 2.0 * dx).max(0.0),
            (self.height - 2.0 * dy).max(0.0),
        )
    }

    /// Splits off a band of `height` from the top; returns `(top, rest)`.
    pub fn split_top(&self, height: f64) -> (Rect, Rect) {
        let height = height.clamp(0.0, self.height);
        (
            Rect::new(self.x, self.y, self.width, height),
            Rect::new(self.x, self.y + height, self.width, self.height - height),
        )
    }

    /// Splits the rectangle into `count` equal columns separated by `gap`.
    pub fn columns(&self, count: usize, gap: f64) -> Vec<Rect> {
        if count == 0 {
            return Vec::new();
        }
        let width = ((self.width - gap * (count - 1) as f64) / count as f64).max(0.0);
        (0..count)
            .map(|index| {
                Rect::new(
                    self.x + index as f64 * (width + gap),
                    self.y,
                    width,
                    self.height,
                )
            })
            .collect()
    }
}

/// 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Linear interpolation towards `other`; `t = 0` keeps `self`, `t = 1` yields `other`.
    pub fn mix(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::rgb(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

/// The three font weights a report uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    Regular,
    Medium,
    Bold,
}

/// Weight and size (in points) of a run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub size: f64,
}

impl FontSpec {
    pub const fn new(weight: FontWeight, size: f64) -> Self {
        Self { weight, size }
    }

    pub const fn regular(size: f64) -> Self {
        Self::new(FontWeight::Regular, size)
    }

    pub const fn medium(size: f64) -> Self {
        Self::new(FontWeight::Medium, size)
    }

    pub const fn bold(size: f64) -> Self {
        Self::new(FontWeight::Bold, size)
    }

    /// Vertical advance between two consecutive lines.
    pub fn line_height(&self) -> f64 {
        self.size * 1.25
    }

    /// Distance from the top of a line box to its baseline.
    pub fn ascent(&self) -> f64 {
        self.size * 0.95
    }
}

/// A segment of a [`Path`], continuing from the previous end point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    LineTo(Point),
    CubicTo(Point, Point, Point),
}

/// A single subpath made of straight and cubic Bezier segments.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Path {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            segments: Vec::new(),
            closed: false,
        }
    }

    pub fn line_to(mut self, point: Point) -> Self {
        self.segments.push(Segment::LineTo(point));
        self
    }

    pub fn cubic_to(mut self, c1: Point, c2: Point, end: Point) -> Self {
        self.segments.push(Segment::CubicTo(c1, c2, end));
        self
    }

    pub fn close(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn rect(rect: Rect) -> Self {
        Path::new(Point::new(rect.x, rect.y))
            .line_to(Point::new(rect.right(), rect.y))
            .line_to(Point::new(rect.right(), rect.bottom()))
            .line_to(Point::new(rect.x, rect.bottom()))
            .close()
    }

    pub fn rounded_rect(rect: Rect, radius: f64) -> Self {
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);
        if r <= 0.0 {
            return Path::rect(rect);
        }
        let k = r * KAPPA;
        let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
        Path::new(Point::new(left + r, top))
            .line_to(Point::new(right - r, top))
            .cubic_to(
                Point::new(right - r + k, top),
                Point::new(right, top + r - k),
                Point::new(right, top + r),
            )
            .line_to(Point::new(right, bottom - r))
            .cubic_to(
                Point::new(right, bottom - r + k),
                Point::new(right - r + k, bottom),
                Point::new(right - r, bottom),
            )
            .line_to(Point::new(left + r, bottom))
            .cubic_to(
                Point::new(left + r - k, bottom),
                Point::new(left, bottom - r + k),
                Point::new(left, bottom - r),
            )
            .line_to(Point::new(left, top + r))
            .cubic_to(
                Point::new(left, top + r - k),
                Point::new(left + r - k, top),
                Point::new(left + r, top),
            )
            .close()
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        let mut path = Path::new(polar(center, radius, 0.0));
        path.push_arc(center, radius, 0.0, TAU);
        path.close()
    }

    /// Pie wedge starting at `start` radians (0 = twelve o'clock) sweeping clockwise.
    ///
    /// A full sweep produces a plain circle without the radial edges.
    pub fn wedge(center: Point, radius: f64, start: f64, sweep: f64) -> Self {
        if sweep >= TAU - 1e-9 {
            return Path::circle(center, radius);
        }
        let mut path = Path::new(center).line_to(polar(center, radius, start));
        path.push_arc(center, radius, start, sweep);
        path.close()
    }

    fn push_arc(&mut self, center: Point, radius: f64, start: f64, sweep: f64) {
        let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / pieces as f64;
        let k = 4.0 / 3.0 * (step / 4.0).tan() * radius;
        for piece in 0..pieces {
            let a0 = start + step * piece as f64;
            let a1 = a0 + step;
            let p0 = polar(center, radius, a0);
            let p1 = polar(center, radius, a1);
            // Tangent of (sin a, -cos a) is (cos a, sin a).
            let c1 = Point::new(p0.x + k * a0.cos(), p0.y + k * a0.sin());
            let c2 = Point::new(p1.x - k * a1.cos(), p1.y - k * a1.sin());
            self.segments.push(Segment::CubicTo(c1, c2, p1));
        }
    }

    /// End point of the last segment.
    pub fn end(&self) -> Point {
        match self.segments.last() {
            Some(Segment::LineTo(point)) | Some(Segment::CubicTo(_, _, point)) => *point,
            None => self.start,
        }
    }
}

/// Point on a circle; angle 0 points up and angles grow clockwise.
pub fn polar(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(
        center.x + radius * angle.sin(),
        center.y - radius * angle.cos(),
    )
}

/// Fill and stroke settings for a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub fill: Option<Color>,
    pub fill_opacity: f64,
    pub stroke: Option<(Color, f64)>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            fill_opacity: 1.0,
            stroke: None,
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            fill: None,
            fill_opacity: 1.0,
            stroke: Some((color, width)),
        }
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some((color, width));
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Text width queries shared by surfaces and layout code.
pub trait TextMetrics {
    /// Advance width of `text` in points.
    fn text_width(&self, text: &str, font: FontSpec) -> f64;
}

/// A paged vector canvas.
///
/// Drawing before the first [`Surface::begin_page`] call opens a page implicitly.
pub trait Surface: TextMetrics {
    /// The metrics this surface measures text with, for layout passes run before drawing.
    fn metrics(&self) -> &dyn TextMetrics;

    fn page_size(&self) -> Size;

    /// Advances to a fresh page.
    fn begin_page(&mut self);

    fn page_count(&self) -> usize;

    fn draw_path(&mut self, path: &Path, paint: &Paint);

    /// Places a single line of text with its baseline starting at `baseline`.
    fn draw_text(&mut self, text: &str, baseline: Point, font: FontSpec, color: Color);

    /// Places a raster image stretched to `frame`.
    fn draw_image(&mut self, image: &image::DynamicImage, frame: Rect);

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.draw_path(&Path::rect(rect), &Paint::fill(color));
    }

    fn rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint) {
        self.draw_path(&Path::rounded_rect(rect, radius), paint);
    }

    fn circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        self.draw_path(&Path::circle(center, radius), paint);
    }

    fn line(&mut self, from: Point, to: Point, color: Color, width: f64) {
        self.draw_path(&Path::new(from).line_to(to), &Paint::stroke(color, width));
    }

    fn fill_wedge(&mut self, center: Point, radius: f64, start: f64, sweep: f64, paint: &Paint) {
        if sweep <= 0.0 {
            return;
        }
        self.draw_path(&Path::wedge(center, radius, start, sweep), paint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::from_hex("#1a2B3c"), Some(Color::rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(Color::from_hex("1a2b3c"), Some(Color::rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(Color::from_hex("#12FG34"), None);
        assert_eq!(Color::from_hex("#123"), None);
    }

    #[test]
    fn mixing_towards_white_lightens() {
        let base = Color::rgb(0, 100, 200);
        assert_eq!(base.mix(Color::WHITE, 0.0), base);
        assert_eq!(base.mix(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(base.mix(Color::WHITE, 0.5), Color::rgb(128, 178, 228));
    }

    #[test]
    fn wedge_arc_ends_on_circle() {
        let center = Point::new(100.0, 100.0);
        let path = Path::wedge(center, 50.0, 0.0, FRAC_PI_2);
        let end = path.end();
        assert!((end.x - 150.0).abs() < 1e-9);
        assert!((end.y - 100.0).abs() < 1e-9);
        assert!(path.closed);
    }

    #[test]
    fn full_sweep_wedge_is_a_circle() {
        let center = Point::new(0.0, 0.0);
        let wedge = Path::wedge(center, 10.0, 0.3, TAU);
        assert_eq!(wedge, Path::circle(center, 10.0));
        assert_eq!(wedge.segments.len(), 4);
    }

    #[test]
    fn columns_share_width_evenly() {
        let columns = Rect::new(0.0, 0.0, 320.0, 10.0).columns(3, 10.0);
        assert_eq!(columns.len(), 3);
        assert!((columns[0].width - 100.0).abs() < 1e-9);
        assert!((columns[2].x - 220.0).abs() < 1e-9);
    }
}
