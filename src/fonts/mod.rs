//! Font lookup and text measurement.
//!
//! Reports use three weights of one TrueType family. A [`FontResolver`] walks an ordered list of
//! [`FontSource`] strategies and picks the first directory holding all three files. When nothing
//! matches, rendering continues with the builtin Helvetica faces; resolution itself never fails.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use genpdf::fonts::{Font, FontCache, FontData, FontFamily};
use log::{debug, warn};

use crate::error::{ReportError, Result};
use crate::surface::{FontSpec, FontWeight, TextMetrics};

pub mod helvetica;

/// Name of the default font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the report fonts.
pub const FONTS_DIR_ENV: &str = "WASTE_REPORT_FONTS_DIR";

const WEIGHT_FILES: [(FontWeight, &str); 3] = [
    (FontWeight::Regular, "Regular"),
    (FontWeight::Medium, "Medium"),
    (FontWeight::Bold, "Bold"),
];

/// Size used for TrueType measurements; widths scale linearly from it.
const REFERENCE_SIZE: u8 = 100;
const PT_PER_MM: f64 = 72.0 / 25.4;

/// One strategy for locating the font directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// Directory named by an environment variable; skipped when unset or empty.
    EnvDirectory(String),
    /// A fixed directory.
    Directory(PathBuf),
    /// Directory relative to the running executable.
    ExecutableRelative(PathBuf),
    /// Directory relative to this crate's manifest (development checkouts).
    ManifestRelative(PathBuf),
}

impl FontSource {
    fn directory(&self) -> Option<PathBuf> {
        match self {
            FontSource::EnvDirectory(var) => env::var_os(var).and_then(|value| {
                let path = PathBuf::from(value);
                if path.as_os_str().is_empty() {
                    None
                } else {
                    Some(path)
                }
            }),
            FontSource::Directory(path) => Some(path.clone()),
            FontSource::ExecutableRelative(subdir) => env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(subdir))),
            FontSource::ManifestRelative(subdir) => {
                Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(subdir))
            }
        }
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::EnvDirectory(var) => write!(f, "${}", var),
            FontSource::Directory(path) => write!(f, "{}", path.display()),
            FontSource::ExecutableRelative(subdir) => write!(f, "<exe>/{}", subdir.display()),
            FontSource::ManifestRelative(subdir) => write!(f, "<crate>/{}", subdir.display()),
        }
    }
}

/// Ordered font lookup.
#[derive(Clone, Debug)]
pub struct FontResolver {
    family: String,
    sources: Vec<FontSource>,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY_NAME.to_owned(),
            sources: vec![
                FontSource::EnvDirectory(FONTS_DIR_ENV.to_owned()),
                FontSource::ExecutableRelative(PathBuf::from("assets/fonts")),
                FontSource::ManifestRelative(PathBuf::from("assets/fonts")),
                FontSource::Directory(PathBuf::from("/opt/fonts")),
            ],
        }
    }
}

impl FontResolver {
    /// Creates a resolver with the default family and search order.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that skips every lookup and always yields the builtin faces.
    pub fn builtin_only() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY_NAME.to_owned(),
            sources: Vec::new(),
        }
    }

    /// Sets the family name used to build file names (`<Family>-Regular.ttf`, ...).
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Appends a lookup strategy after the existing ones.
    pub fn with_source(mut self, source: FontSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Replaces the lookup strategies.
    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = FontSource>,
    {
        self.sources = sources.into_iter().collect();
        self
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn sources(&self) -> &[FontSource] {
        &self.sources
    }

    /// Walks the strategies in order; falls back to the builtin faces when none matches.
    pub fn resolve(&self) -> ResolvedFonts {
        let mut attempts = Vec::new();

        for source in &self.sources {
            let Some(directory) = source.directory() else {
                attempts.push(format!("{} (not set)", source));
                continue;
            };

            let paths: Vec<(FontWeight, PathBuf)> = WEIGHT_FILES
                .iter()
                .map(|(weight, suffix)| {
                    (*weight, directory.join(format!("{}-{}.ttf", self.family, suffix)))
                })
                .collect();
            let missing: Vec<String> = paths
                .iter()
                .filter(|(_, path)| !path.is_file())
                .map(|(_, path)| path.file_name().unwrap_or_default().to_string_lossy().into_owned())
                .collect();
            if !missing.is_empty() {
                attempts.push(format!(
                    "{} (missing [{}])",
                    directory.display(),
                    missing.join(", ")
                ));
                continue;
            }

            match load_font_set(&self.family, &paths) {
                Ok(set) => {
                    debug!("Using '{}' fonts from {}", self.family, directory.display());
                    return ResolvedFonts::TrueType(set);
                }
                Err(err) => attempts.push(format!("{} ({})", directory.display(), err)),
            }
        }

        if !self.sources.is_empty() {
            warn!(
                "Report fonts '{}' unavailable; falling back to builtin Helvetica. Checked: {}",
                self.family,
                attempts.join(", ")
            );
        }
        ResolvedFonts::Builtin
    }
}

fn load_font_set(family: &str, paths: &[(FontWeight, PathBuf)]) -> Result<FontSet> {
    let mut bytes = Vec::with_capacity(paths.len());
    for (_, path) in paths {
        bytes.push(std::fs::read(path)?);
    }
    let mut bytes = bytes.into_iter();
    match (bytes.next(), bytes.next(), bytes.next()) {
        (Some(regular), Some(medium), Some(bold)) => {
            FontSet::from_bytes(family, regular, medium, bold)
        }
        _ => Err(ReportError::Font(format!(
            "expected three font files for '{}'",
            family
        ))),
    }
}

/// Raw TrueType data for the three weights together with their metrics.
#[derive(Clone)]
pub struct FontSet {
    family: String,
    regular: Arc<[u8]>,
    medium: Arc<[u8]>,
    bold: Arc<[u8]>,
    metrics: Arc<TrueTypeMetrics>,
}

impl FontSet {
    /// Builds a font set from in-memory TrueType files.
    pub fn from_bytes(
        family: impl Into<String>,
        regular: Vec<u8>,
        medium: Vec<u8>,
        bold: Vec<u8>,
    ) -> Result<Self> {
        let family = family.into();
        let parse = |data: &[u8], weight: &str| {
            FontData::new(data.to_vec(), None).map_err(|err| {
                ReportError::Font(format!("failed to parse {} {} font: {}", family, weight, err))
            })
        };
        let regular_data = parse(&regular, "regular")?;
        let medium_data = parse(&medium, "medium")?;
        let bold_data = parse(&bold, "bold")?;

        // genpdf families have four slots; the medium weight lives in the italic one.
        let cache = FontCache::new(FontFamily {
            regular: regular_data,
            bold: bold_data.clone(),
            italic: medium_data,
            bold_italic: bold_data,
        });
        let fonts = cache.default_font_family();

        Ok(Self {
            family,
            regular: regular.into(),
            medium: medium.into(),
            bold: bold.into(),
            metrics: Arc::new(TrueTypeMetrics { cache, fonts }),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// TrueType file contents for `weight`.
    pub fn bytes(&self, weight: FontWeight) -> &[u8] {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Medium => &self.medium,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSet")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// Glyph metrics of a loaded TrueType family.
pub struct TrueTypeMetrics {
    cache: FontCache,
    fonts: FontFamily<Font>,
}

impl TrueTypeMetrics {
    fn font(&self, weight: FontWeight) -> Font {
        match weight {
            FontWeight::Regular => self.fonts.regular,
            FontWeight::Medium => self.fonts.italic,
            FontWeight::Bold => self.fonts.bold,
        }
    }
}

impl TextMetrics for TrueTypeMetrics {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        let width: printpdf::Mm = self
            .font(font.weight)
            .str_width(&self.cache, text, REFERENCE_SIZE)
            .into();
        width.0 * PT_PER_MM * font.size / REFERENCE_SIZE as f64
    }
}

/// Outcome of font resolution.
#[derive(Clone, Debug)]
pub enum ResolvedFonts {
    TrueType(FontSet),
    Builtin,
}

impl ResolvedFonts {
    pub fn is_builtin(&self) -> bool {
        matches!(self, ResolvedFonts::Builtin)
    }

    /// Measurement service matching the faces that will be drawn.
    pub fn metrics(&self) -> FontMetrics {
        match self {
            ResolvedFonts::TrueType(set) => FontMetrics::TrueType(Arc::clone(&set.metrics)),
            ResolvedFonts::Builtin => FontMetrics::Builtin,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ResolvedFonts::TrueType(set) => format!("TrueType family '{}'", set.family),
            ResolvedFonts::Builtin => "builtin Helvetica".to_owned(),
        }
    }
}

/// Text measurement backed either by TrueType metrics or the builtin Helvetica tables.
#[derive(Clone)]
pub enum FontMetrics {
    Builtin,
    TrueType(Arc<TrueTypeMetrics>),
}

impl TextMetrics for FontMetrics {
    fn text_width(&self, text: &str, font: FontSpec) -> f64 {
        match self {
            // The builtin family has no medium face; medium is drawn bold.
            FontMetrics::Builtin => {
                helvetica::text_width(text, font.weight != FontWeight::Regular, font.size)
            }
            FontMetrics::TrueType(metrics) => metrics.text_width(text, font),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_only_resolver_skips_lookup() {
        let resolved = FontResolver::builtin_only().resolve();
        assert!(resolved.is_builtin());
        assert_eq!(resolved.describe(), "builtin Helvetica");
    }

    #[test]
    fn missing_directories_fall_back_to_builtin() {
        let resolver = FontResolver::new().with_sources([
            FontSource::Directory(PathBuf::from("/__waste_report_missing_fonts__")),
            FontSource::EnvDirectory("__WASTE_REPORT_UNSET_VARIABLE__".to_owned()),
        ]);
        assert!(resolver.resolve().is_builtin());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let err = FontSet::from_bytes("Broken", vec![0; 8], vec![0; 8], vec![0; 8]).unwrap_err();
        assert!(matches!(err, ReportError::Font(_)));
    }

    #[test]
    fn builtin_medium_measures_like_bold() {
        let metrics = FontMetrics::Builtin;
        let medium = metrics.text_width("Recycling", FontSpec::medium(12.0));
        let bold = metrics.text_width("Recycling", FontSpec::bold(12.0));
        let regular = metrics.text_width("Recycling", FontSpec::regular(12.0));
        assert_eq!(medium, bold);
        assert!(regular < bold);
    }
}
