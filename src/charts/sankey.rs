//! Two-column Sankey diagrams: sources on the left, targets on the right.
//!
//! Layout runs in four passes:
//!
//! 1. Per-node totals and a single vertical scale so that the taller stack (nodes plus gaps)
//!    fits the available height.
//! 2. Targets are ranked by a [`TargetOrdering`]; sources are ranked by the weighted average rank
//!    of the targets they feed (barycenter), ties going to the heavier source.
//! 3. Each column is stacked top to bottom and the shorter column is centred against the taller.
//! 4. Ribbons consume a running offset on both of their nodes, visiting each source's flows in
//!    target rank order, so band heights add up to the node heights exactly.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::format;
use crate::primitives::placeholder;
use crate::surface::{Color, FontSpec, Paint, Path, Point, Rect, Surface};
use crate::text::fit_text;
use crate::theme::Theme;

/// Message shown instead of a diagram when there is nothing to draw.
pub const NO_FLOWS_MESSAGE: &str = "No waste flows available for this period.";

/// A weighted edge from a source to a target.
#[derive(Clone, Debug, PartialEq)]
pub struct Flow {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl Flow {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// Drops flows with a non-positive or non-finite weight and merges repeated source/target pairs.
///
/// Pairs keep the position of their first occurrence.
pub fn normalize_flows(flows: &[Flow]) -> Vec<Flow> {
    let mut merged: Vec<Flow> = Vec::new();
    for flow in flows {
        if !(flow.weight.is_finite() && flow.weight > 0.0) {
            continue;
        }
        match merged
            .iter_mut()
            .find(|known| known.source == flow.source && known.target == flow.target)
        {
            Some(known) => known.weight += flow.weight,
            None => merged.push(flow.clone()),
        }
    }
    merged
}

/// Vertical order of the target column.
pub trait TargetOrdering {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Alphabetical order with the least desirable destinations (landfill by default) pushed last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeastDesirableLast {
    markers: Vec<String>,
}

impl LeastDesirableLast {
    /// Targets whose name contains any of `markers` (case-insensitively) sort last.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|marker| marker.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn is_least_desirable(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.markers.iter().any(|marker| name.contains(marker.as_str()))
    }
}

impl Default for LeastDesirableLast {
    fn default() -> Self {
        Self::new(["landfill"])
    }
}

impl TargetOrdering for LeastDesirableLast {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.is_least_desirable(a)
            .cmp(&self.is_least_desirable(b))
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
            .then_with(|| a.cmp(b))
    }
}

/// Layout constants of the Sankey diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct SankeyStyle {
    pub node_width: f64,
    pub node_gap: f64,
    /// Horizontal distance of both Bezier control points from their ribbon end, as a share of
    /// the span between the columns.
    pub curvature: f64,
    pub ribbon_opacity: f64,
    /// Room reserved on each side for node labels.
    pub label_width: f64,
}

impl Default for SankeyStyle {
    fn default() -> Self {
        Self {
            node_width: 12.0,
            node_gap: 8.0,
            curvature: 0.4,
            ribbon_opacity: 0.45,
            label_width: 140.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SankeyNode {
    pub label: String,
    pub total: f64,
    pub rect: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ribbon {
    /// Index into [`SankeyLayout::sources`].
    pub source: usize,
    /// Index into [`SankeyLayout::targets`].
    pub target: usize,
    pub weight: f64,
    /// Vertical extent where the ribbon leaves its source.
    pub source_span: (f64, f64),
    /// Vertical extent where the ribbon enters its target.
    pub target_span: (f64, f64),
    pub path: Path,
}

impl Ribbon {
    pub fn height(&self) -> f64 {
        self.source_span.1 - self.source_span.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SankeyLayout {
    /// Sources in drawing order, top to bottom.
    pub sources: Vec<SankeyNode>,
    /// Targets in drawing order, top to bottom.
    pub targets: Vec<SankeyNode>,
    pub ribbons: Vec<Ribbon>,
    /// Points per unit of weight.
    pub scale: f64,
}

fn totals_by(flows: &[Flow], key: impl Fn(&Flow) -> &str) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for flow in flows {
        match totals.iter_mut().find(|(name, _)| name.as_str() == key(flow)) {
            Some((_, total)) => *total += flow.weight,
            None => totals.push((key(flow).to_owned(), flow.weight)),
        }
    }
    totals
}

fn stack(nodes: Vec<(String, f64)>, x: f64, top: f64, width: f64, scale: f64, gap: f64) -> Vec<SankeyNode> {
    let mut y = top;
    nodes
        .into_iter()
        .map(|(label, total)| {
            let height = total * scale;
            let node = SankeyNode {
                label,
                total,
                rect: Rect::new(x, y, width, height),
            };
            y += height + gap;
            node
        })
        .collect()
}

fn stack_height(nodes: &[(String, f64)], scale: f64, gap: f64) -> f64 {
    let weight: f64 = nodes.iter().map(|(_, total)| total).sum();
    weight * scale + gap * nodes.len().saturating_sub(1) as f64
}

fn ribbon_path(x0: f64, source: (f64, f64), x1: f64, target: (f64, f64), curvature: f64) -> Path {
    let reach = (x1 - x0) * curvature;
    Path::new(Point::new(x0, source.0))
        .cubic_to(
            Point::new(x0 + reach, source.0),
            Point::new(x1 - reach, target.0),
            Point::new(x1, target.0),
        )
        .line_to(Point::new(x1, target.1))
        .cubic_to(
            Point::new(x1 - reach, target.1),
            Point::new(x0 + reach, source.1),
            Point::new(x0, source.1),
        )
        .close()
}

/// Lays out `flows` inside `area`; source nodes hug the left edge and target nodes the right.
///
/// Flows are normalized first. Returns `None` when no positive flow remains.
pub fn layout_sankey(
    flows: &[Flow],
    area: Rect,
    style: &SankeyStyle,
    ordering: &dyn TargetOrdering,
) -> Option<SankeyLayout> {
    let flows = normalize_flows(flows);
    if flows.is_empty() {
        return None;
    }

    let mut targets = totals_by(&flows, |flow| flow.target.as_str());
    targets.sort_by(|a, b| ordering.compare(&a.0, &b.0));
    let target_rank: HashMap<&str, usize> = targets
        .iter()
        .enumerate()
        .map(|(rank, (name, _))| (name.as_str(), rank))
        .collect();

    let mut sources: Vec<(String, f64, f64)> = totals_by(&flows, |flow| flow.source.as_str())
        .into_iter()
        .map(|(name, total)| {
            let weighted: f64 = flows
                .iter()
                .filter(|flow| flow.source == name)
                .map(|flow| flow.weight * target_rank[flow.target.as_str()] as f64)
                .sum();
            (name, total, weighted / total)
        })
        .collect();
    sources.sort_by(|a, b| {
        a.2.partial_cmp(&b.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
            .then_with(|| a.0.cmp(&b.0))
    });
    let sources: Vec<(String, f64)> = sources.into_iter().map(|(name, total, _)| (name, total)).collect();

    let total: f64 = flows.iter().map(|flow| flow.weight).sum();
    let busiest = sources.len().max(targets.len());
    let gap_count = busiest.saturating_sub(1) as f64;
    let gap = if gap_count > 0.0 {
        style.node_gap.min(area.height * 0.3 / gap_count)
    } else {
        0.0
    }
    .max(0.0);
    let scale = ((area.height - gap * gap_count) / total).max(0.0);

    let source_top = area.y + (area.height - stack_height(&sources, scale, gap)) / 2.0;
    let target_top = area.y + (area.height - stack_height(&targets, scale, gap)) / 2.0;
    let node_width = style.node_width.min(area.width / 4.0);
    let source_nodes = stack(sources, area.x, source_top, node_width, scale, gap);
    let target_nodes = stack(targets, area.right() - node_width, target_top, node_width, scale, gap);

    let target_index: HashMap<&str, usize> = target_nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.label.as_str(), index))
        .collect();

    let mut source_offset: Vec<f64> = source_nodes.iter().map(|node| node.rect.y).collect();
    let mut target_offset: Vec<f64> = target_nodes.iter().map(|node| node.rect.y).collect();
    let x0 = area.x + node_width;
    let x1 = area.right() - node_width;

    let mut ribbons = Vec::with_capacity(flows.len());
    for (source, node) in source_nodes.iter().enumerate() {
        let mut outgoing: Vec<&Flow> = flows.iter().filter(|flow| flow.source == node.label).collect();
        outgoing.sort_by_key(|flow| target_index[flow.target.as_str()]);
        for flow in outgoing {
            let target = target_index[flow.target.as_str()];
            let height = flow.weight * scale;
            let source_span = (source_offset[source], source_offset[source] + height);
            let target_span = (target_offset[target], target_offset[target] + height);
            source_offset[source] = source_span.1;
            target_offset[target] = target_span.1;
            ribbons.push(Ribbon {
                source,
                target,
                weight: flow.weight,
                source_span,
                target_span,
                path: ribbon_path(x0, source_span, x1, target_span, style.curvature),
            });
        }
    }

    Some(SankeyLayout {
        sources: source_nodes,
        targets: target_nodes,
        ribbons,
        scale,
    })
}

/// Draws the diagram, or a placeholder panel when fewer than two flows are available.
///
/// Returns whether a diagram was drawn.
pub fn draw_sankey(
    surface: &mut dyn Surface,
    theme: &Theme,
    area: Rect,
    flows: &[Flow],
    ordering: &dyn TargetOrdering,
) -> bool {
    let style = &theme.sankey;
    let label_width = style.label_width.min(area.width * 0.3);
    let diagram = Rect::new(
        area.x + label_width,
        area.y,
        (area.width - 2.0 * label_width).max(0.0),
        area.height,
    );
    let layout = if normalize_flows(flows).len() > 1 {
        layout_sankey(flows, diagram, style, ordering)
    } else {
        None
    };
    let Some(layout) = layout else {
        placeholder(surface, theme, area, NO_FLOWS_MESSAGE);
        return false;
    };

    let target_colors: Vec<Color> = (0..layout.targets.len())
        .map(|index| theme.palette.categorical(index))
        .collect();

    for ribbon in &layout.ribbons {
        let paint = Paint::fill(target_colors[ribbon.target]).with_opacity(style.ribbon_opacity);
        surface.draw_path(&ribbon.path, &paint);
    }

    let font = FontSpec::regular(theme.small_size);
    for node in &layout.sources {
        surface.fill_rect(node.rect, theme.palette.primary);
        let label = fit_text(
            surface.metrics(),
            &format!("{} ({})", node.label, format::weight(node.total)),
            font,
            label_width - 6.0,
        );
        let width = surface.text_width(&label, font);
        surface.draw_text(
            &label,
            Point::new(node.rect.x - 6.0 - width, node.rect.center().y + font.size * 0.35),
            font,
            theme.palette.text,
        );
    }
    for (node, color) in layout.targets.iter().zip(&target_colors) {
        surface.fill_rect(node.rect, *color);
        let label = fit_text(
            surface.metrics(),
            &format!("{} ({})", node.label, format::weight(node.total)),
            font,
            label_width - 6.0,
        );
        surface.draw_text(
            &label,
            Point::new(node.rect.right() + 6.0, node.rect.center().y + font.size * 0.35),
            font,
            theme.palette.text,
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::RecordingSurface;
    use crate::surface::Size;

    const AREA: Rect = Rect::new(0.0, 0.0, 400.0, 300.0);

    fn flows() -> Vec<Flow> {
        vec![
            Flow::new("General waste", "Landfill", 120.0),
            Flow::new("Cardboard", "Recycling", 300.0),
            Flow::new("General waste", "Energy recovery", 80.0),
            Flow::new("Food", "Composting", 90.0),
            Flow::new("Cardboard", "Energy recovery", 20.0),
        ]
    }

    fn layout() -> SankeyLayout {
        layout_sankey(&flows(), AREA, &SankeyStyle::default(), &LeastDesirableLast::default())
            .expect("flows present")
    }

    #[test]
    fn landfill_sorts_last() {
        let layout = layout();
        let labels: Vec<&str> = layout.targets.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Composting", "Energy recovery", "Recycling", "Landfill"]);
    }

    #[test]
    fn sources_follow_their_targets() {
        // Food feeds rank 0, Cardboard mostly rank 2, General waste ranks 1 and 3.
        let layout = layout();
        let labels: Vec<&str> = layout.sources.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Food", "Cardboard", "General waste"]);
    }

    #[test]
    fn ribbons_conserve_node_heights() {
        let layout = layout();
        for (index, node) in layout.sources.iter().enumerate() {
            let leaving: f64 = layout
                .ribbons
                .iter()
                .filter(|ribbon| ribbon.source == index)
                .map(Ribbon::height)
                .sum();
            assert!((leaving - node.rect.height).abs() < 1e-6);
        }
        for (index, node) in layout.targets.iter().enumerate() {
            let arriving: f64 = layout
                .ribbons
                .iter()
                .filter(|ribbon| ribbon.target == index)
                .map(|ribbon| ribbon.target_span.1 - ribbon.target_span.0)
                .sum();
            assert!((arriving - node.rect.height).abs() < 1e-6);
        }
    }

    #[test]
    fn taller_stack_fits_and_shorter_is_centred() {
        let layout = layout();
        let targets = &layout.targets;
        let first = targets[0].rect.y;
        let last = targets[targets.len() - 1].rect.bottom();
        assert!(first >= AREA.y - 1e-6);
        assert!((last - AREA.bottom()).abs() < 1e-6);

        let sources = &layout.sources;
        let top_gap = sources[0].rect.y - AREA.y;
        let bottom_gap = AREA.bottom() - sources[sources.len() - 1].rect.bottom();
        assert!((top_gap - bottom_gap).abs() < 1e-6);
    }

    #[test]
    fn ribbon_control_points_sit_at_forty_percent() {
        let layout = layout();
        let ribbon = &layout.ribbons[0];
        match ribbon.path.segments[0] {
            crate::surface::Segment::CubicTo(c1, c2, end) => {
                let x0 = ribbon.path.start.x;
                let span = end.x - x0;
                assert!((c1.x - (x0 + span * 0.4)).abs() < 1e-9);
                assert!((c2.x - (end.x - span * 0.4)).abs() < 1e-9);
            }
            other => panic!("unexpected segment {:?}", other),
        }
    }

    #[test]
    fn duplicates_merge_and_empty_weights_drop() {
        let merged = normalize_flows(&[
            Flow::new("A", "X", 1.0),
            Flow::new("A", "X", 2.0),
            Flow::new("B", "X", 0.0),
            Flow::new("B", "Y", f64::NAN),
        ]);
        assert_eq!(merged, vec![Flow::new("A", "X", 3.0)]);
        assert!(layout_sankey(&[], AREA, &SankeyStyle::default(), &LeastDesirableLast::default()).is_none());
    }

    #[test]
    fn single_flow_draws_the_placeholder() {
        let theme = Theme::default();
        let mut surface = RecordingSurface::new(Size::a4_landscape());
        let drawn = draw_sankey(
            &mut surface,
            &theme,
            AREA,
            &[Flow::new("Cardboard", "Recycling", 5.0)],
            &LeastDesirableLast::default(),
        );
        assert!(!drawn);
        assert!(surface.pages()[0].contains_text("No waste flows"));
    }
}
