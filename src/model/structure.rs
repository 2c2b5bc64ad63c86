//! Structural mutations: split, close, and edge resize.
//!
//! Every operation validates its preconditions before touching the arenas,
//! so a reported error always leaves the graph exactly as it was.

use tracing::debug;

use crate::config::Settings;
use crate::error::LayoutError;
use crate::geometry::{Direction, EPSILON, Orientation, Span, approx_eq};
use crate::model::graph::{Edge, EdgeId, LayoutGraph, Neighbor, PanelId};
use crate::model::tabs::{ContentSelector, Tab};

impl LayoutGraph {
    /// Absolute length of the axis that edges of `orientation` divide.
    fn axis_len(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.width(),
            Orientation::Horizontal => self.height(),
        }
    }

    /// The configured minimum panel extent as a fraction of the axis.
    fn min_fraction(&self, orientation: Orientation, settings: &Settings) -> f64 {
        let axis = self.axis_len(orientation);
        if axis > 0.0 { settings.min_panel_extent / axis } else { 0.0 }
    }

    /// Splits a panel with a new edge at `ratio` of its extent, putting a new
    /// panel with the given initial content on the far (right/bottom) side.
    /// Returns the new panel's id. Both halves must end up with content, so
    /// the panel being split needs at least one tab of its own.
    pub fn split(
        &mut self,
        id: PanelId,
        orientation: Orientation,
        ratio: f64,
        content: Option<ContentSelector>,
        settings: &Settings,
    ) -> Result<PanelId, LayoutError> {
        let panel = self.try_panel(id)?;
        let Some(content) = content else {
            return Err(LayoutError::EmptyPanelNotAllowed);
        };
        if panel.tabs.is_empty() {
            // Splitting would strand an empty panel on the near side.
            return Err(LayoutError::EmptyPanelNotAllowed);
        }
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(LayoutError::InvalidRatio { ratio });
        }
        let span = self.span_along(panel, orientation);
        let position = span.lo + ratio * span.len();
        let min = self.min_fraction(orientation, settings);
        if position - span.lo < min - EPSILON || span.hi - position < min - EPSILON {
            return Err(LayoutError::InvalidRatio { ratio });
        }

        self.checked_mutation(settings, "split", move |graph| {
            let edge = graph.edges.insert(Edge { orientation, position });
            let source = &mut graph.panels[id];
            let mut new_panel = source.clone();
            match orientation {
                Orientation::Vertical => {
                    new_panel.left = Neighbor::Edge(edge);
                    source.right = Neighbor::Edge(edge);
                }
                Orientation::Horizontal => {
                    new_panel.top = Neighbor::Edge(edge);
                    source.bottom = Neighbor::Edge(edge);
                }
            }
            new_panel.tabs = vec![Tab::new(content)];
            new_panel.active = 0;
            let new_id = graph.panels.insert(new_panel);
            debug!(?id, ?new_id, ?orientation, ratio, "split panel");
            Ok(new_id)
        })
    }

    /// Removes a panel, extending the panels across one of its edges over
    /// its area, and returns the panel that took the space. Closing the last
    /// panel collapses the layout to a single empty full-area panel instead
    /// of an empty graph.
    pub fn close(&mut self, id: PanelId, settings: &Settings) -> Result<PanelId, LayoutError> {
        self.try_panel(id)?;
        if self.panel_count() == 1 {
            return self.checked_mutation(settings, "close", |graph| {
                let panel = &mut graph.panels[id];
                panel.tabs.clear();
                panel.active = 0;
                debug!(?id, "closed the last panel; layout collapsed to vacuum");
                Ok(id)
            });
        }
        self.checked_mutation(settings, "close", |graph| graph.absorb(id))
    }

    fn absorb(&mut self, id: PanelId) -> Result<PanelId, LayoutError> {
        for direction in [Direction::Left, Direction::Right, Direction::Up, Direction::Down] {
            let Some(absorbers) = self.absorbers(id, direction) else {
                continue;
            };
            debug!(?id, ?direction, count = absorbers.len(), "absorbing closed panel");
            self.absorb_through(id, direction, &absorbers);
            return Ok(absorbers[0]);
        }
        Err(LayoutError::InvariantViolation {
            rule: "no neighboring panels can absorb the closed panel",
        })
    }

    /// The far-side panels of the edge in `direction`, in edge order, if
    /// their extents exactly tile this panel's perpendicular extent.
    fn absorbers(&self, id: PanelId, direction: Direction) -> Option<Vec<PanelId>> {
        let panel = self.panel(id).expect("absorbers of a live panel");
        let edge = panel.neighbor(direction).edge()?;
        let across = direction.edge_orientation();
        let target = self.span_across(panel, across);

        let mut candidates: Vec<(Span, PanelId)> = self
            .panels()
            .filter(|&(other, _)| other != id)
            .filter(|(_, p)| p.neighbor(direction.opposite()) == Neighbor::Edge(edge))
            .map(|(pid, p)| (self.span_across(p, across), pid))
            .filter(|(span, _)| target.contains(*span))
            .collect();
        candidates.sort_by(|a, b| a.0.lo.total_cmp(&b.0.lo));

        let mut cursor = target.lo;
        for (span, _) in &candidates {
            if !approx_eq(span.lo, cursor) {
                return None;
            }
            cursor = span.hi;
        }
        approx_eq(cursor, target.hi)
            .then(|| candidates.into_iter().map(|(_, pid)| pid).collect())
    }

    fn absorb_through(&mut self, id: PanelId, direction: Direction, absorbers: &[PanelId]) {
        let panel = self.panels[id].clone();
        let opposite = direction.opposite();
        let far = panel.neighbor(opposite);
        for &absorber in absorbers {
            self.panels[absorber].set_neighbor(opposite, far);
        }

        // The absorbers' outermost flank edges take over the closed panel's
        // flank references; collinear duplicates are merged into one edge.
        let (near_flank, far_flank) = match direction.edge_orientation() {
            Orientation::Vertical => (Direction::Up, Direction::Down),
            Orientation::Horizontal => (Direction::Left, Direction::Right),
        };
        let first = absorbers[0];
        let last = *absorbers.last().expect("at least one absorber");
        self.merge_collinear(panel.neighbor(near_flank), self.panels[first].neighbor(near_flank));
        self.merge_collinear(panel.neighbor(far_flank), self.panels[last].neighbor(far_flank));

        self.panels.remove(id);
        let shared = panel.neighbor(direction).edge().expect("absorbed through an edge");
        if !self.panels.values().any(|p| p.references(shared)) {
            self.edges.remove(shared);
        }
    }

    /// Rewires every reference to `retired` onto `surviving` and deletes the
    /// retired edge. Both must sit at the same position; the absorber tiling
    /// check guarantees that.
    fn merge_collinear(&mut self, retired: Neighbor, surviving: Neighbor) {
        let (Neighbor::Edge(retired), Neighbor::Edge(surviving)) = (retired, surviving) else {
            return;
        };
        if retired == surviving {
            return;
        }
        for panel in self.panels.values_mut() {
            for direction in [Direction::Left, Direction::Right, Direction::Up, Direction::Down] {
                if panel.neighbor(direction) == Neighbor::Edge(retired) {
                    panel.set_neighbor(direction, Neighbor::Edge(surviving));
                }
            }
        }
        self.edges.remove(retired);
    }

    /// Moves an edge to the tightest feasible position no further than
    /// `position`, keeping every touching panel at or above the configured
    /// minimum extent. Returns the position actually applied.
    ///
    /// Positions are absolute fractions of the container, so no other edge
    /// moves with this one: the feasibility window over the touching panels
    /// is the entire cascade, and applying the same target twice applies the
    /// same clamp twice.
    pub fn resize_edge(
        &mut self,
        id: EdgeId,
        position: f64,
        settings: &Settings,
    ) -> Result<f64, LayoutError> {
        let edge = *self.edge(id).ok_or(LayoutError::EdgeNotFound)?;
        let target = if position.is_finite() { position } else { edge.position };

        let min = self.min_fraction(edge.orientation, settings);
        let mut feasible = Span::new(0.0, 1.0);
        for (panel, on_low) in self.edge_sharers(id) {
            let span = self.span_along(self.panel(panel).expect("sharer exists"), edge.orientation);
            if on_low {
                // The panel below/left of the edge keeps its minimum.
                feasible.lo = feasible.lo.max(span.lo + min);
            } else {
                feasible.hi = feasible.hi.min(span.hi - min);
            }
        }
        if feasible.lo > feasible.hi + EPSILON {
            // Every touching panel is already at its minimum; stay put.
            debug!(?id, "resize has no feasible range; keeping current position");
            return Ok(edge.position);
        }

        let clamped = target.clamp(feasible.lo, feasible.hi);
        self.checked_mutation(settings, "resize_edge", |graph| {
            graph.edges[id].position = clamped;
            debug!(?id, requested = position, applied = clamped, "resized edge");
            Ok(clamped)
        })
    }
}
