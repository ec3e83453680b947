//! Styled text spans for narrative paragraphs.
//!
//! Upstream narrative strings may carry a small markdown-like markup:
//!
//! - `**bold**` for bold text
//! - `*emphasis*` for medium-weight text
//! - `[color=#RRGGBB]{text}` for coloured text
//!
//! [`parse_markup`] validates strictly and reports the byte offset of the first problem;
//! [`parse_or_plain`] is the lenient entry point used while rendering, where a markup error only
//! costs the styling. [`wrap_spans`] breaks spans into lines with the same greedy rule as
//! [`crate::text::wrap_lines`], measuring every word in its own weight.

use std::fmt;

use crate::surface::{Color, FontSpec, FontWeight, TextMetrics};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    text: String,
    weight: FontWeight,
    color: Option<Color>,
}

impl Span {
    /// Creates a new regular-weight span.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            weight: FontWeight::Regular,
            color: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn bold(self) -> Self {
        self.with_weight(FontWeight::Bold)
    }

    pub fn emphasized(self) -> Self {
        self.with_weight(FontWeight::Medium)
    }

    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Parse errors produced by [`parse_markup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    index: usize,
    message: String,
}

impl ParseError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }

    /// Byte index in the original input string where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.index)
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Copy, Debug)]
struct StyleState {
    weight: FontWeight,
    color: Option<Color>,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            weight: FontWeight::Regular,
            color: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Bold,
    Emphasis,
    Color,
}

impl Marker {
    fn closing_token(self) -> &'static str {
        match self {
            Marker::Bold => "**",
            Marker::Emphasis => "*",
            Marker::Color => "}",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Marker::Bold => "bold span",
            Marker::Emphasis => "emphasis span",
            Marker::Color => "color span",
        }
    }
}

/// Parses narrative markup into spans.
pub fn parse_markup(input: &str) -> Result<Vec<Span>, ParseError> {
    let (spans, _) = parse_inner(input, 0, StyleState::default(), None)?;
    Ok(spans)
}

/// Parses markup, degrading to a single plain span when the markup is malformed.
pub fn parse_or_plain(input: &str) -> Vec<Span> {
    parse_markup(input).unwrap_or_else(|err| {
        log::debug!("Rendering narrative without markup: {}", err);
        vec![Span::new(input)]
    })
}

fn parse_inner(
    input: &str,
    mut index: usize,
    state: StyleState,
    closing_marker: Option<Marker>,
) -> Result<(Vec<Span>, usize), ParseError> {
    let mut spans = Vec::new();
    let mut buffer = String::new();

    while index < input.len() {
        let rest = &input[index..];

        if let Some(marker) = closing_marker {
            if rest.starts_with(marker.closing_token()) {
                flush_buffer(&mut buffer, &mut spans, state);
                return Ok((spans, index + marker.closing_token().len()));
            }
        }

        let nested = if rest.starts_with("**") {
            Some((2, FontWeight::Bold, None, Marker::Bold))
        } else if rest.starts_with('*') {
            Some((1, FontWeight::Medium, None, Marker::Emphasis))
        } else if rest.starts_with("[color=") {
            let (color, after) = parse_color_directive(input, index)?;
            Some((after - index, state.weight, Some(color), Marker::Color))
        } else {
            None
        };

        if let Some((skip, weight, color, marker)) = nested {
            flush_buffer(&mut buffer, &mut spans, state);
            let nested_state = StyleState {
                weight: weight.max(state.weight),
                color: color.or(state.color),
            };
            let (inner, new_index) = parse_inner(input, index + skip, nested_state, Some(marker))?;
            spans.extend(inner);
            index = new_index;
            continue;
        }

        if rest.starts_with('}') {
            return Err(ParseError::new(
                index,
                "unexpected closing token `}` without matching opening `[color=...]`",
            ));
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        buffer.push(ch);
        index += ch.len_utf8();
    }

    if let Some(marker) = closing_marker {
        Err(ParseError::new(
            index,
            format!("unterminated {}", marker.description()),
        ))
    } else {
        flush_buffer(&mut buffer, &mut spans, state);
        Ok((spans, index))
    }
}

fn flush_buffer(buffer: &mut String, spans: &mut Vec<Span>, state: StyleState) {
    if buffer.is_empty() {
        return;
    }
    spans.push(Span {
        text: std::mem::take(buffer),
        weight: state.weight,
        color: state.color,
    });
}

fn parse_color_directive(input: &str, index: usize) -> Result<(Color, usize), ParseError> {
    const PREFIX: &str = "[color=";
    let hex_start = index + PREFIX.len();
    let hex_end = hex_start + 7;
    let Some(hex) = input.get(hex_start..hex_end) else {
        return Err(ParseError::new(
            hex_start,
            "incomplete color specification; expected `#RRGGBB`",
        ));
    };
    let Some(color) = Color::from_hex(hex).filter(|_| hex.starts_with('#')) else {
        return Err(ParseError::new(
            hex_start,
            "invalid RGB specification; expected `#` and six hexadecimal digits",
        ));
    };
    if !input[hex_end..].starts_with("]{") {
        return Err(ParseError::new(
            hex_end,
            "expected `]{` after the color value",
        ));
    }
    Ok((color, hex_end + 2))
}

/// A run of uniformly styled text placed on a line.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedRun {
    pub text: String,
    /// Offset from the start of the line.
    pub x: f64,
    pub weight: FontWeight,
    pub color: Option<Color>,
}

/// One wrapped line of styled text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichLine {
    pub runs: Vec<PlacedRun>,
    pub width: f64,
}

#[derive(Clone, Debug)]
struct Piece {
    text: String,
    weight: FontWeight,
    color: Option<Color>,
}

#[derive(Clone, Debug, Default)]
struct Word {
    pieces: Vec<Piece>,
}

fn split_words(spans: &[Span]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::default();
    for span in spans {
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !current.pieces.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                continue;
            }
            match current.pieces.last_mut() {
                Some(piece) if piece.weight == span.weight && piece.color == span.color => {
                    piece.text.push(ch)
                }
                _ => current.pieces.push(Piece {
                    text: ch.to_string(),
                    weight: span.weight,
                    color: span.color,
                }),
            }
        }
    }
    if !current.pieces.is_empty() {
        words.push(current);
    }
    words
}

/// Wraps styled spans into lines of at most `max_width` points.
pub fn wrap_spans(metrics: &dyn TextMetrics, spans: &[Span], size: f64, max_width: f64) -> Vec<RichLine> {
    let space = metrics.text_width(" ", FontSpec::regular(size));
    let word_width = |word: &Word| -> f64 {
        word.pieces
            .iter()
            .map(|piece| metrics.text_width(&piece.text, FontSpec::new(piece.weight, size)))
            .sum()
    };

    let mut lines = Vec::new();
    let mut line = RichLine::default();
    for word in split_words(spans) {
        let width = word_width(&word);
        let gap = if line.runs.is_empty() { 0.0 } else { space };
        if !line.runs.is_empty() && line.width + gap + width > max_width {
            lines.push(std::mem::take(&mut line));
        }
        let gap = if line.runs.is_empty() { 0.0 } else { space };

        let mut x = line.width + gap;
        for (index, piece) in word.pieces.into_iter().enumerate() {
            let piece_width = metrics.text_width(&piece.text, FontSpec::new(piece.weight, size));
            match line.runs.last_mut() {
                Some(run) if run.weight == piece.weight && run.color == piece.color => {
                    if index == 0 {
                        run.text.push(' ');
                    }
                    run.text.push_str(&piece.text);
                }
                _ => line.runs.push(PlacedRun {
                    text: piece.text,
                    x,
                    weight: piece.weight,
                    color: piece.color,
                }),
            }
            x += piece_width;
        }
        line.width = x;
    }
    if !line.runs.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontMetrics;

    #[test]
    fn parse_plain_text() {
        let spans = parse_markup("Diversion improved").expect("parse succeeds");
        assert_eq!(spans, vec![Span::new("Diversion improved")]);
    }

    #[test]
    fn parse_nested_styles() {
        let spans = parse_markup("Recycling rose **by *12%***!").expect("parse succeeds");
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].text(), "Recycling rose ");
        assert_eq!(spans[1].text(), "by ");
        assert_eq!(spans[1].weight(), FontWeight::Bold);
        assert_eq!(spans[2].text(), "12%");
        assert_eq!(spans[2].weight(), FontWeight::Bold);
        assert_eq!(spans[3].text(), "!");
        assert_eq!(spans[3].weight(), FontWeight::Regular);
    }

    #[test]
    fn parse_color_directive() {
        let spans = parse_markup("[color=#c0392b]{Landfill} grew").expect("parse succeeds");
        assert_eq!(spans[0].text(), "Landfill");
        assert_eq!(spans[0].color(), Some(Color::rgb(0xc0, 0x39, 0x2b)));
        assert_eq!(spans[1].text(), " grew");
        assert_eq!(spans[1].color(), None);
    }

    #[test]
    fn errors_carry_positions() {
        let err = parse_markup("**oops").unwrap_err();
        assert!(err.message().contains("unterminated bold"));
        assert_eq!(err.index(), 6);

        let err = parse_markup("[color=#12FG34]{x}").unwrap_err();
        assert!(err.message().contains("invalid RGB"));

        let err = parse_markup("stray }").unwrap_err();
        assert_eq!(err.index(), 6);
    }

    #[test]
    fn lenient_parse_keeps_text() {
        assert_eq!(parse_or_plain("**half"), vec![Span::new("**half")]);
    }

    #[test]
    fn wraps_mixed_weights() {
        let metrics = FontMetrics::Builtin;
        let spans = parse_markup("Total waste fell by **8.4%** compared with last year").unwrap();
        let lines = wrap_spans(&metrics, &spans, 10.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 120.0 + 1e-9);
        }
        let bold: Vec<&PlacedRun> = lines
            .iter()
            .flat_map(|line| line.runs.iter())
            .filter(|run| run.weight == FontWeight::Bold)
            .collect();
        assert_eq!(bold.len(), 1);
        assert_eq!(bold[0].text, "8.4%");

        let rejoined: Vec<String> = lines
            .iter()
            .map(|line| line.runs.iter().map(|run| run.text.as_str()).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(
            rejoined.join(" "),
            "Total waste fell by 8.4% compared with last year"
        );
    }
}
