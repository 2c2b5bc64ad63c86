use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use static_assertions::assert_impl_all;
use tracing::warn;

use crate::config::Settings;
use crate::error::LayoutError;
use crate::geometry::{Direction, Orientation, Point, Span};
use crate::model::solver::{self, SolvedLayout};
use crate::model::tabs::Tab;

slotmap::new_key_type! {
    pub struct EdgeId;
    pub struct PanelId;
}

/// Identity of one live graph. Drag payloads carry it so a drop can tell
/// whether source and target belong to the same instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        InstanceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A movable splitter line.
///
/// `position` is a fraction of the container along the axis the edge divides
/// (a vertical edge sits at `x = position * width`). The edge's extent along
/// the other axis is not stored; it is derived from the panels that reference
/// the edge, which is what lets an edge stop at a T-junction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub orientation: Orientation,
    pub position: f64,
}

/// One side of a panel: either the container boundary or a splitter edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighbor {
    Boundary,
    Edge(EdgeId),
}

impl Neighbor {
    pub fn edge(self) -> Option<EdgeId> {
        match self {
            Neighbor::Boundary => None,
            Neighbor::Edge(id) => Some(id),
        }
    }
}

/// A leaf region of the subdivision, hosting an ordered list of tabs.
///
/// The tab list may only be empty while this is the sole panel of its graph;
/// any mutation that empties a panel in a larger layout must close it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Panel {
    pub left: Neighbor,
    pub right: Neighbor,
    pub top: Neighbor,
    pub bottom: Neighbor,
    pub(crate) tabs: Vec<Tab>,
    pub(crate) active: usize,
}

impl Panel {
    /// The single full-area panel of a fresh or fully-collapsed layout.
    pub(crate) fn vacuum() -> Self {
        Panel {
            left: Neighbor::Boundary,
            right: Neighbor::Boundary,
            top: Neighbor::Boundary,
            bottom: Neighbor::Boundary,
            tabs: Vec::new(),
            active: 0,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn neighbor(&self, direction: Direction) -> Neighbor {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.top,
            Direction::Down => self.bottom,
        }
    }

    pub(crate) fn set_neighbor(&mut self, direction: Direction, neighbor: Neighbor) {
        match direction {
            Direction::Left => self.left = neighbor,
            Direction::Right => self.right = neighbor,
            Direction::Up => self.top = neighbor,
            Direction::Down => self.bottom = neighbor,
        }
    }

    pub(crate) fn references(&self, edge: EdgeId) -> bool {
        [self.left, self.right, self.top, self.bottom].contains(&Neighbor::Edge(edge))
    }
}

/// The authoritative edge/panel arenas plus the container size.
///
/// All cross-references between edges and panels are id lookups into the two
/// arenas, never ownership pointers, so shared edges and serialization stay
/// trivial.
// Deliberately not `Clone`; a copy would share the instance id. Duplicate a
// layout by round-tripping it through a descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) panels: SlotMap<PanelId, Panel>,
    width: f64,
    height: f64,
    #[serde(skip, default = "InstanceId::fresh")]
    instance: InstanceId,
}

assert_impl_all!(LayoutGraph: Send, Sync);

impl LayoutGraph {
    /// A layout with a single empty panel filling the whole area.
    pub fn new(width: f64, height: f64) -> Self {
        let mut graph = Self::bare(width, height);
        graph.panels.insert(Panel::vacuum());
        graph
    }

    /// An arena with no panels at all; only deserialization may observe this
    /// state, and only until it has inserted every record.
    pub(crate) fn bare(width: f64, height: f64) -> Self {
        LayoutGraph {
            edges: SlotMap::with_key(),
            panels: SlotMap::with_key(),
            width,
            height,
            instance: InstanceId::fresh(),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn panels(&self) -> impl Iterator<Item = (PanelId, &Panel)> {
        self.panels.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn try_panel(&self, id: PanelId) -> Result<&Panel, LayoutError> {
        self.panels.get(id).ok_or(LayoutError::PanelNotFound)
    }

    /// Normalized horizontal extent of a panel, from its left/right references.
    pub fn h_span(&self, panel: &Panel) -> Span {
        Span::new(self.ref_position(panel.left, 0.0), self.ref_position(panel.right, 1.0))
    }

    /// Normalized vertical extent of a panel, from its top/bottom references.
    pub fn v_span(&self, panel: &Panel) -> Span {
        Span::new(self.ref_position(panel.top, 0.0), self.ref_position(panel.bottom, 1.0))
    }

    /// Extent along the axis divided by edges of `orientation`.
    pub(crate) fn span_along(&self, panel: &Panel, orientation: Orientation) -> Span {
        match orientation {
            Orientation::Vertical => self.h_span(panel),
            Orientation::Horizontal => self.v_span(panel),
        }
    }

    /// Extent along the axis an edge of `orientation` runs in.
    pub(crate) fn span_across(&self, panel: &Panel, orientation: Orientation) -> Span {
        match orientation {
            Orientation::Vertical => self.v_span(panel),
            Orientation::Horizontal => self.h_span(panel),
        }
    }

    fn ref_position(&self, neighbor: Neighbor, boundary: f64) -> f64 {
        match neighbor {
            Neighbor::Boundary => boundary,
            Neighbor::Edge(id) => self.edges[id].position,
        }
    }

    /// The panels on the far side of the edge the panel references in the
    /// given direction, ordered along the edge. Empty at the boundary.
    pub fn neighbors(&self, id: PanelId, direction: Direction) -> Result<Vec<PanelId>, LayoutError> {
        let panel = self.try_panel(id)?;
        let Neighbor::Edge(edge) = panel.neighbor(direction) else {
            return Ok(Vec::new());
        };
        let across = direction.edge_orientation();
        let mut found: Vec<(f64, PanelId)> = self
            .panels
            .iter()
            .filter(|&(other, _)| other != id)
            .filter(|(_, p)| p.neighbor(direction.opposite()) == Neighbor::Edge(edge))
            .map(|(other, p)| (self.span_across(p, across).lo, other))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    /// Every panel referencing the edge from either side, as
    /// `(panel, is_on_low_side)`. The low side is left of a vertical edge and
    /// above a horizontal one.
    pub(crate) fn edge_sharers(&self, edge: EdgeId) -> Vec<(PanelId, bool)> {
        let orientation = self.edges[edge].orientation;
        let (low, high) = match orientation {
            Orientation::Vertical => (Direction::Right, Direction::Left),
            Orientation::Horizontal => (Direction::Down, Direction::Up),
        };
        let mut sharers = Vec::new();
        for (id, panel) in &self.panels {
            if panel.neighbor(low) == Neighbor::Edge(edge) {
                sharers.push((id, true));
            } else if panel.neighbor(high) == Neighbor::Edge(edge) {
                sharers.push((id, false));
            }
        }
        sharers
    }

    pub fn solve(&self) -> Result<SolvedLayout, LayoutError> {
        solver::solve(self)
    }

    /// Hit-test a point in container coordinates against the solved layout.
    pub fn panel_at(&self, point: Point) -> Option<PanelId> {
        self.solve().ok()?.panel_at(point)
    }

    /// Validates every graph consistency rule, naming the first one broken.
    ///
    /// Mutations run this defensively (see [`Self::checked_mutation`]); tests
    /// call it directly.
    pub fn check_invariants(&self) -> Result<(), LayoutError> {
        let violation = |rule| Err(LayoutError::InvariantViolation { rule });

        for (_, panel) in &self.panels {
            for (direction, reference) in [
                (Direction::Left, panel.left),
                (Direction::Right, panel.right),
                (Direction::Up, panel.top),
                (Direction::Down, panel.bottom),
            ] {
                let Neighbor::Edge(edge) = reference else { continue };
                let Some(edge) = self.edges.get(edge) else {
                    return violation("panel references an edge that is not in the graph");
                };
                if edge.orientation != direction.edge_orientation() {
                    return violation("panel references an edge from the wrong side");
                }
            }

            if panel.tabs.is_empty() {
                if self.panels.len() > 1 {
                    return violation("empty panel in a multi-panel layout");
                }
            } else if panel.active >= panel.tabs.len() {
                return violation("active tab index out of range");
            }
        }

        for (id, _) in &self.edges {
            let sharers = self.edge_sharers(id);
            if sharers.is_empty() {
                return violation("edge is referenced by no panel");
            }
            let low = sharers.iter().any(|&(_, on_low)| on_low);
            let high = sharers.iter().any(|&(_, on_low)| !on_low);
            if !(low && high) {
                return violation("dangling edge referenced from one side only");
            }
        }

        if self.solve().is_err() {
            return violation("panel rectangles must tile the container");
        }
        Ok(())
    }

    /// Runs a mutation, then re-validates the graph and rolls the mutation
    /// back if it broke an invariant. Validation runs in debug builds and
    /// whenever [`Settings::validate_after_mutation`] is set.
    pub(crate) fn checked_mutation<T>(
        &mut self,
        settings: &Settings,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, LayoutError>,
    ) -> Result<T, LayoutError> {
        let check = cfg!(debug_assertions) || settings.validate_after_mutation;
        let snapshot = check.then(|| (self.edges.clone(), self.panels.clone()));
        let restore = |graph: &mut Self, snapshot: Option<_>| {
            if let Some((edges, panels)) = snapshot {
                graph.edges = edges;
                graph.panels = panels;
            }
        };
        match f(self) {
            Ok(out) => {
                if check {
                    if let Err(err) = self.check_invariants() {
                        warn!(op, %err, "mutation broke layout invariants; rolling back");
                        restore(self, snapshot);
                        return Err(err);
                    }
                }
                Ok(out)
            }
            Err(err) => {
                restore(self, snapshot);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::{ContentSelector, TabPosition};

    fn settings() -> Settings {
        Settings::default()
    }

    fn selector(name: &str) -> ContentSelector {
        ContentSelector::from(name)
    }

    /// The first panel, seeded with a tab so it can be split.
    fn seeded_root(graph: &mut LayoutGraph) -> PanelId {
        let id = graph.panels().next().unwrap().0;
        graph.add_tab(id, selector("a"), TabPosition::Last, true).unwrap();
        id
    }

    #[test]
    fn new_graph_is_a_single_boundary_panel() {
        let graph = LayoutGraph::new(800.0, 600.0);
        assert_eq!(graph.panel_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        let (_, panel) = graph.panels().next().unwrap();
        assert_eq!(panel.left, Neighbor::Boundary);
        assert_eq!(panel.right, Neighbor::Boundary);
        assert!(panel.tabs().is_empty());
        graph.check_invariants().unwrap();
    }

    #[test]
    fn instances_are_unique() {
        let a = LayoutGraph::new(100.0, 100.0);
        let b = LayoutGraph::new(100.0, 100.0);
        assert_ne!(a.instance(), b.instance());
    }

    #[test]
    fn neighbors_walks_the_shared_edge() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let root = seeded_root(&mut graph);
        let right = graph
            .split(root, Orientation::Vertical, 0.5, Some(selector("b")), &settings())
            .unwrap();
        // Split the right panel horizontally so the center edge has two
        // sharers on its far side.
        let bottom = graph
            .split(right, Orientation::Horizontal, 0.5, Some(selector("c")), &settings())
            .unwrap();

        let mut across = graph.neighbors(root, Direction::Right).unwrap();
        across.sort();
        let mut expected = vec![right, bottom];
        expected.sort();
        assert_eq!(across, expected);
        assert_eq!(graph.neighbors(root, Direction::Left).unwrap(), vec![]);
        assert_eq!(graph.neighbors(right, Direction::Left).unwrap(), vec![root]);
    }

    #[test]
    fn check_invariants_reports_dangling_edges() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let root = seeded_root(&mut graph);
        let right = graph
            .split(root, Orientation::Vertical, 0.5, Some(selector("b")), &settings())
            .unwrap();
        // Detach one side by hand; the shared edge is now dangling.
        graph.panels[right].left = Neighbor::Boundary;
        assert_eq!(
            graph.check_invariants(),
            Err(LayoutError::InvariantViolation {
                rule: "dangling edge referenced from one side only"
            })
        );
    }

    #[test]
    fn check_invariants_reports_bad_active_index() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let (root, _) = graph.panels().next().unwrap();
        graph.panels[root].tabs.push(Tab::new(selector("a")));
        graph.panels[root].active = 3;
        assert_eq!(
            graph.check_invariants(),
            Err(LayoutError::InvariantViolation {
                rule: "active tab index out of range"
            })
        );
    }

    #[test]
    fn check_invariants_reports_empty_panel_in_multi_panel_layout() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let root = seeded_root(&mut graph);
        let right = graph
            .split(root, Orientation::Vertical, 0.5, Some(selector("b")), &settings())
            .unwrap();
        graph.panels[right].tabs.clear();
        assert_eq!(
            graph.check_invariants(),
            Err(LayoutError::InvariantViolation {
                rule: "empty panel in a multi-panel layout"
            })
        );
    }
}
