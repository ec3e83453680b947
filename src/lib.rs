//! Deterministic rendering of waste-management analytics reports.
//!
//! A [`ReportPayload`] goes in, a multi-page PDF comes out. Rendering is one synchronous pass
//! over an ordered list of page-producing [`pipeline::Step`]s that draw onto an abstract
//! [`surface::Surface`] through a [`context::RenderContext`].
//!
//! ```no_run
//! use waste_report::ReportBuilder;
//!
//! let json = std::fs::read_to_string("payload.json")?;
//! let report = ReportBuilder::new().build().render_json(&json)?;
//! report.save(&report.filename)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod charts;
pub mod context;
pub mod error;
pub mod fonts;
pub mod format;
pub mod payload;
pub mod pipeline;
pub mod primitives;
pub mod richtext;
pub mod scale;
pub mod surface;
pub mod table;
pub mod text;
pub mod theme;

pub use builder::{render_json, suggested_filename, RenderedReport, ReportBuilder, ReportRenderer};
pub use error::{ReportError, Result};
pub use fonts::{FontResolver, FontSource, ResolvedFonts};
pub use payload::ReportPayload;
pub use theme::Theme;
