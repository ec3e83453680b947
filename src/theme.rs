//! Colours, type sizes and spacing used across the report.

use crate::charts::bar::BarChartStyle;
use crate::charts::sankey::SankeyStyle;
use crate::surface::Color;
use crate::table::TableStyle;

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub accent: Color,
    pub text: Color,
    pub muted_text: Color,
    pub border: Color,
    pub panel: Color,
    pub track: Color,
    pub positive: Color,
    pub warning: Color,
    pub negative: Color,
    /// Series colours for grouped bars, oldest series first.
    pub series: Vec<Color>,
    /// Categorical colours for pies, Sankey nodes and legends; cycled when exhausted.
    pub categorical: Vec<Color>,
}

impl Palette {
    /// Categorical colour for `index`, cycling the palette.
    pub fn categorical(&self, index: usize) -> Color {
        cycle(&self.categorical, index, self.accent)
    }

    pub fn series(&self, index: usize) -> Color {
        cycle(&self.series, index, self.primary)
    }
}

fn cycle(colors: &[Color], index: usize, fallback: Color) -> Color {
    if colors.is_empty() {
        fallback
    } else {
        colors[index % colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::rgb(0x1b, 0x5e, 0x20),
            accent: Color::rgb(0x43, 0xa0, 0x47),
            text: Color::rgb(0x21, 0x21, 0x21),
            muted_text: Color::rgb(0x61, 0x61, 0x61),
            border: Color::rgb(0xd0, 0xd7, 0xde),
            panel: Color::rgb(0xf5, 0xf7, 0xf6),
            track: Color::rgb(0xe4, 0xe9, 0xe6),
            positive: Color::rgb(0x2e, 0x7d, 0x32),
            warning: Color::rgb(0xef, 0x6c, 0x00),
            negative: Color::rgb(0xc6, 0x28, 0x28),
            series: vec![
                Color::rgb(0xa5, 0xd6, 0xa7),
                Color::rgb(0x66, 0xbb, 0x6a),
                Color::rgb(0x2e, 0x7d, 0x32),
                Color::rgb(0x1b, 0x5e, 0x20),
            ],
            categorical: vec![
                Color::rgb(0x2e, 0x7d, 0x32),
                Color::rgb(0x02, 0x77, 0xbd),
                Color::rgb(0xf9, 0xa8, 0x25),
                Color::rgb(0x6a, 0x1b, 0x9a),
                Color::rgb(0x00, 0x83, 0x8f),
                Color::rgb(0xef, 0x6c, 0x00),
                Color::rgb(0x8d, 0x6e, 0x63),
                Color::rgb(0xad, 0x14, 0x57),
                Color::rgb(0x55, 0x8b, 0x2f),
                Color::rgb(0x45, 0x5a, 0x64),
            ],
        }
    }
}

/// Visual configuration of a report.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub palette: Palette,
    pub title_size: f64,
    pub heading_size: f64,
    pub subheading_size: f64,
    pub body_size: f64,
    pub small_size: f64,
    pub panel_radius: f64,
    pub panel_padding: f64,
    /// Default spacing between blocks on a page.
    pub gap: f64,
    pub header_height: f64,
    pub footer_height: f64,
    pub bar_chart: BarChartStyle,
    pub sankey: SankeyStyle,
    pub table: TableStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            title_size: 30.0,
            heading_size: 18.0,
            subheading_size: 12.0,
            body_size: 10.0,
            small_size: 8.0,
            panel_radius: 6.0,
            panel_padding: 10.0,
            gap: 12.0,
            header_height: 44.0,
            footer_height: 24.0,
            bar_chart: BarChartStyle::default(),
            sankey: SankeyStyle::default(),
            table: TableStyle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_cycle() {
        let palette = Palette::default();
        let count = palette.categorical.len();
        assert_eq!(palette.categorical(0), palette.categorical(count));
        assert_ne!(palette.categorical(0), palette.categorical(1));

        let empty = Palette {
            series: Vec::new(),
            ..Palette::default()
        };
        assert_eq!(empty.series(5), empty.primary);
    }
}
