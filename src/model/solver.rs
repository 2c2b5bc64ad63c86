//! Pure read pass from the edge/panel graph to absolute geometry.
//!
//! Panels reference edges, not each other, so the solver reconstructs
//! adjacency by grouping the panels that share an edge id on complementary
//! sides. Malformed graphs are always surfaced as errors, never silently
//! corrected: a graph that fails here means an earlier mutation had a bug.

use indexmap::IndexMap;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{EPSILON, Orientation, Point, Rect, Span, approx_eq};
use crate::model::graph::{EdgeId, LayoutGraph, Neighbor, PanelId};

/// A solved edge: an absolute line segment in container coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub orientation: Orientation,
    /// Absolute coordinate on the divided axis (x for a vertical edge).
    pub position: f64,
    /// Absolute extent along the edge, clipped to the union of the extents
    /// of the panels that reference it.
    pub span: Span,
}

/// Absolute rectangles and edge segments for one solve pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolvedLayout {
    width: f64,
    height: f64,
    rects: IndexMap<PanelId, Rect>,
    segments: IndexMap<EdgeId, Segment>,
}

impl SolvedLayout {
    pub fn rect(&self, panel: PanelId) -> Option<Rect> {
        self.rects.get(&panel).copied()
    }

    pub fn segment(&self, edge: EdgeId) -> Option<Segment> {
        self.segments.get(&edge).copied()
    }

    pub fn rects(&self) -> impl Iterator<Item = (PanelId, Rect)> + '_ {
        self.rects.iter().map(|(&id, &rect)| (id, rect))
    }

    pub fn segments(&self) -> impl Iterator<Item = (EdgeId, Segment)> + '_ {
        self.segments.iter().map(|(&id, &seg)| (id, seg))
    }

    /// Hit-test in container coordinates. A point on a shared edge belongs
    /// to the panel that starts there (the right/bottom side).
    pub fn panel_at(&self, point: Point) -> Option<PanelId> {
        let inside = |lo: f64, hi: f64, limit: f64, v: f64| {
            v >= lo - EPSILON && (v < hi - EPSILON || (approx_eq(hi, limit) && v <= hi + EPSILON))
        };
        self.rects
            .iter()
            .find(|(_, r)| {
                let max = r.max();
                inside(r.origin.x, max.x, self.width, point.x)
                    && inside(r.origin.y, max.y, self.height, point.y)
            })
            .map(|(&id, _)| id)
    }
}

/// One side of an edge during adjacency reconstruction: the normalized
/// extents of the panels referencing it from there.
#[derive(Default)]
struct Sides {
    low: Vec<Span>,
    high: Vec<Span>,
}

pub(crate) fn solve(graph: &LayoutGraph) -> Result<SolvedLayout, LayoutError> {
    let malformed = |reason: String| LayoutError::MalformedGraph { reason };

    let (width, height) = (graph.width(), graph.height());
    if !(width > 0.0 && height > 0.0) {
        return Err(malformed(format!("container {width}x{height} has no area")));
    }

    let position = |reference: Neighbor,
                    expected: Orientation,
                    boundary: f64|
     -> Result<f64, LayoutError> {
        let Neighbor::Edge(id) = reference else {
            return Ok(boundary);
        };
        let edge = graph
            .edge(id)
            .ok_or_else(|| malformed(format!("panel references missing edge {id:?}")))?;
        if edge.orientation != expected {
            return Err(malformed(format!("edge {id:?} referenced from the wrong side")));
        }
        Ok(edge.position)
    };

    let mut rects = IndexMap::new();
    let mut sides: FxHashMap<EdgeId, Sides> = FxHashMap::default();
    let mut covered = 0.0;
    for (id, panel) in graph.panels() {
        let h = Span::new(
            position(panel.left, Orientation::Vertical, 0.0)?,
            position(panel.right, Orientation::Vertical, 1.0)?,
        );
        let v = Span::new(
            position(panel.top, Orientation::Horizontal, 0.0)?,
            position(panel.bottom, Orientation::Horizontal, 1.0)?,
        );
        if h.is_empty() || v.is_empty() {
            return Err(malformed(format!("panel {id:?} has a degenerate extent")));
        }
        covered += h.len() * v.len();
        rects.insert(id, Rect::new(h.lo * width, v.lo * height, h.len() * width, v.len() * height));

        // A panel is on the low side of its right/bottom edges and on the
        // high side of its left/top edges.
        for (reference, perpendicular, on_low) in [
            (panel.left, v, false),
            (panel.right, v, true),
            (panel.top, h, false),
            (panel.bottom, h, true),
        ] {
            if let Neighbor::Edge(edge) = reference {
                let entry = sides.entry(edge).or_default();
                if on_low {
                    entry.low.push(perpendicular);
                } else {
                    entry.high.push(perpendicular);
                }
            }
        }
    }

    if !approx_eq(covered, 1.0) {
        return Err(malformed(format!(
            "panels cover {covered:.6} of the container (gap or overlap)"
        )));
    }

    let mut segments = IndexMap::new();
    for (id, edge) in graph.edges() {
        let Some(Sides { low, high }) = sides.remove(&id) else {
            return Err(malformed(format!("edge {id:?} is referenced by no panel")));
        };
        if low.is_empty() || high.is_empty() {
            return Err(malformed(format!("edge {id:?} is referenced from one side only")));
        }
        let low = merge_spans(id, low)?;
        let high = merge_spans(id, high)?;
        if low.len() != high.len() || low.iter().zip(&high).any(|(a, b)| !a.approx_eq(*b)) {
            return Err(malformed(format!(
                "the two sides of edge {id:?} do not cover the same extent"
            )));
        }

        let hull = Span::new(low[0].lo, low[low.len() - 1].hi);
        let (position, span) = match edge.orientation {
            Orientation::Vertical => (edge.position * width, hull.scaled(height)),
            Orientation::Horizontal => (edge.position * height, hull.scaled(width)),
        };
        segments.insert(
            id,
            Segment {
                orientation: edge.orientation,
                position,
                span,
            },
        );
    }

    Ok(SolvedLayout {
        width,
        height,
        rects,
        segments,
    })
}

/// Collapses one side's extents into maximal disjoint pieces, rejecting
/// overlaps: two panels on the same side of an edge may never share extent.
fn merge_spans(edge: EdgeId, spans: Vec<Span>) -> Result<Vec<Span>, LayoutError> {
    let mut merged: Vec<Span> = Vec::new();
    for span in spans.into_iter().sorted_by(|a, b| a.lo.total_cmp(&b.lo)) {
        match merged.last_mut() {
            Some(last) if span.lo < last.hi - EPSILON => {
                return Err(LayoutError::MalformedGraph {
                    reason: format!("overlapping panels on one side of edge {edge:?}"),
                });
            }
            Some(last) if span.lo <= last.hi + EPSILON => last.hi = span.hi,
            _ => merged.push(span),
        }
    }
    Ok(merged)
}
