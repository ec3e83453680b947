//! Text measurement and greedy word wrapping.

use std::str::SplitWhitespace;

use crate::surface::{FontSpec, TextMetrics};

/// Suffix appended by [`fit_text`] when it has to shorten a string.
pub const ELLIPSIS: &str = "...";

/// Lines of a wrapped string, produced lazily.
///
/// Whole words are packed greedily; a word wider than the limit on its own is emitted alone and
/// untruncated. The iterator is `Clone`, so a layout pass can measure a block and later replay
/// the same lines for drawing.
#[derive(Clone)]
pub struct WrappedLines<'a> {
    words: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    metrics: &'a dyn TextMetrics,
    font: FontSpec,
    max_width: f64,
}

impl<'a> Iterator for WrappedLines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let first = self.pending.take().or_else(|| self.words.next())?;
        let mut line = first.to_owned();
        for word in self.words.by_ref() {
            let candidate = format!("{} {}", line, word);
            if self.metrics.text_width(&candidate, self.font) <= self.max_width {
                line = candidate;
            } else {
                self.pending = Some(word);
                break;
            }
        }
        Some(line)
    }
}

/// Wraps `text` into lines no wider than `max_width` (except for single over-wide words).
pub fn wrap_lines<'a>(
    metrics: &'a dyn TextMetrics,
    text: &'a str,
    font: FontSpec,
    max_width: f64,
) -> WrappedLines<'a> {
    WrappedLines {
        words: text.split_whitespace(),
        pending: None,
        metrics,
        font,
        max_width,
    }
}

/// Collecting shorthand for [`wrap_lines`].
pub fn wrap_text(metrics: &dyn TextMetrics, text: &str, font: FontSpec, max_width: f64) -> Vec<String> {
    wrap_lines(metrics, text, font, max_width).collect()
}

/// Height of `text` once wrapped; an empty string still occupies one line.
pub fn wrapped_height(metrics: &dyn TextMetrics, text: &str, font: FontSpec, max_width: f64) -> f64 {
    let lines = wrap_lines(metrics, text, font, max_width).count().max(1);
    lines as f64 * font.line_height()
}

/// Shortens `text` one character at a time until it fits `max_width` with [`ELLIPSIS`] appended.
///
/// Text that already fits is returned unchanged. If not even the ellipsis fits, the ellipsis is
/// returned anyway so the caller still shows that something was cut.
pub fn fit_text(metrics: &dyn TextMetrics, text: &str, font: FontSpec, max_width: f64) -> String {
    if metrics.text_width(text, font) <= max_width {
        return text.to_owned();
    }
    let mut kept: Vec<char> = text.chars().collect();
    while !kept.is_empty() {
        kept.pop();
        let candidate = format!("{}{}", kept.iter().collect::<String>().trim_end(), ELLIPSIS);
        if metrics.text_width(&candidate, font) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontMetrics;

    /// Every character is exactly one point wide.
    struct Monospace;

    impl TextMetrics for Monospace {
        fn text_width(&self, text: &str, _font: FontSpec) -> f64 {
            text.chars().count() as f64
        }
    }

    const FONT: FontSpec = FontSpec::regular(10.0);

    #[test]
    fn packs_words_greedily() {
        let lines = wrap_text(&Monospace, "the quick brown fox jumps", FONT, 10.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn over_wide_word_is_emitted_alone() {
        let lines = wrap_text(&Monospace, "a polyethylene b", FONT, 5.0);
        assert_eq!(lines, vec!["a", "polyethylene", "b"]);
    }

    #[test]
    fn whitespace_is_normalized() {
        let lines = wrap_text(&Monospace, "  mixed \n\t paper   ", FONT, 40.0);
        assert_eq!(lines, vec!["mixed paper"]);
        assert!(wrap_text(&Monospace, "   ", FONT, 40.0).is_empty());
        assert_eq!(wrapped_height(&Monospace, "", FONT, 40.0), FONT.line_height());
    }

    #[test]
    fn wrapping_is_restartable() {
        let lines = wrap_lines(&Monospace, "one two three four", FONT, 8.0);
        let replay = lines.clone();
        assert_eq!(lines.count(), 3);
        assert_eq!(replay.collect::<Vec<_>>(), vec!["one two", "three", "four"]);
    }

    #[test]
    fn fit_keeps_short_text() {
        assert_eq!(fit_text(&Monospace, "On track", FONT, 20.0), "On track");
    }

    #[test]
    fn fit_truncates_with_ellipsis() {
        let fitted = fit_text(&Monospace, "Needs attention", FONT, 10.0);
        assert_eq!(fitted, "Needs a...");
        assert!(Monospace.text_width(&fitted, FONT) <= 10.0);
        assert_eq!(fit_text(&Monospace, "Landfill", FONT, 1.0), ELLIPSIS);
    }

    #[test]
    fn real_metrics_respect_the_limit() {
        let metrics = FontMetrics::Builtin;
        let text = "Mixed dry recyclables collected from the northern distribution centre";
        for width in [60.0, 90.0, 150.0, 400.0] {
            for line in wrap_lines(&metrics, text, FONT, width) {
                assert!(metrics.text_width(&line, FONT) <= width || !line.contains(' '));
            }
        }
    }
}
