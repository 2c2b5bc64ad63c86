// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The flat, storage-friendly snapshot of a layout.
//!
//! A descriptor is plain data with dense integer ids; the live graph is
//! reconstructed from it on load and is the sole mutable copy afterwards.
//! Loading validates everything and never partially constructs a graph.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::Orientation;
use crate::model::graph::{Edge, EdgeId, LayoutGraph, Neighbor, Panel};
use crate::model::tabs::{ContentSelector, Tab};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub width: f64,
    pub height: f64,
    pub edges: Vec<EdgeRecord>,
    pub panels: Vec<PanelRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: u32,
    pub orientation: Orientation,
    pub position: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    pub left: NeighborRecord,
    pub right: NeighborRecord,
    pub top: NeighborRecord,
    pub bottom: NeighborRecord,
    pub tabs: Vec<ContentSelector>,
    pub active: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborRecord {
    Boundary,
    Edge(u32),
}

impl LayoutDescriptor {
    /// Flattens a live graph into a snapshot. Always succeeds for a graph
    /// whose invariants hold.
    pub fn capture(graph: &LayoutGraph) -> Self {
        let ids: FxHashMap<EdgeId, u32> =
            graph.edges().enumerate().map(|(i, (id, _))| (id, i as u32)).collect();
        let record = |reference: Neighbor| match reference {
            Neighbor::Boundary => NeighborRecord::Boundary,
            Neighbor::Edge(edge) => NeighborRecord::Edge(ids[&edge]),
        };
        LayoutDescriptor {
            width: graph.width(),
            height: graph.height(),
            edges: graph
                .edges()
                .map(|(id, edge)| EdgeRecord {
                    id: ids[&id],
                    orientation: edge.orientation,
                    position: edge.position,
                })
                .collect(),
            panels: graph
                .panels()
                .map(|(_, panel)| PanelRecord {
                    left: record(panel.left),
                    right: record(panel.right),
                    top: record(panel.top),
                    bottom: record(panel.bottom),
                    tabs: panel.tabs().iter().map(|tab| tab.selector.clone()).collect(),
                    active: panel.active(),
                })
                .collect(),
        }
    }

    /// Reconstructs an independent live graph, validating every record. No
    /// graph is produced unless the whole descriptor checks out.
    pub fn instantiate(&self) -> Result<LayoutGraph, LayoutError> {
        let malformed =
            |reason: String| LayoutError::MalformedDescriptor { reason };

        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(malformed(format!(
                "container {}x{} has no area",
                self.width, self.height
            )));
        }
        if self.panels.is_empty() {
            return Err(malformed("a layout needs at least one panel".into()));
        }

        let mut graph = LayoutGraph::bare(self.width, self.height);
        let mut ids: FxHashMap<u32, EdgeId> = FxHashMap::default();
        for record in &self.edges {
            if !record.position.is_finite()
                || record.position <= 0.0
                || record.position >= 1.0
            {
                return Err(malformed(format!(
                    "edge {} at position {} is outside the container",
                    record.id, record.position
                )));
            }
            let edge = graph.edges.insert(Edge {
                orientation: record.orientation,
                position: record.position,
            });
            if ids.insert(record.id, edge).is_some() {
                return Err(malformed(format!("duplicate edge id {}", record.id)));
            }
        }

        let resolve = |reference: NeighborRecord| -> Result<Neighbor, LayoutError> {
            match reference {
                NeighborRecord::Boundary => Ok(Neighbor::Boundary),
                NeighborRecord::Edge(id) => ids
                    .get(&id)
                    .map(|&edge| Neighbor::Edge(edge))
                    .ok_or_else(|| malformed(format!("panel references unknown edge {id}"))),
            }
        };
        for record in &self.panels {
            if !record.tabs.is_empty() && record.active >= record.tabs.len() {
                return Err(malformed(format!(
                    "active tab {} out of range for {} tabs",
                    record.active,
                    record.tabs.len()
                )));
            }
            graph.panels.insert(Panel {
                left: resolve(record.left)?,
                right: resolve(record.right)?,
                top: resolve(record.top)?,
                bottom: resolve(record.bottom)?,
                tabs: record.tabs.iter().cloned().map(Tab::new).collect(),
                active: record.active,
            });
        }

        graph
            .check_invariants()
            .map_err(|err| malformed(err.to_string()))?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::config::Settings;
    use crate::model::TabPosition;

    fn selector(name: &str) -> ContentSelector {
        ContentSelector::from(name)
    }

    fn sample_graph() -> LayoutGraph {
        let settings = Settings::default();
        let mut graph = LayoutGraph::new(1200.0, 800.0);
        let a = graph.panels().next().unwrap().0;
        graph.add_tab(a, selector("editor"), TabPosition::Last, true).unwrap();
        graph.add_tab(a, selector("terminal"), TabPosition::Last, false).unwrap();
        let b = graph
            .split(a, Orientation::Vertical, 0.6, Some(selector("outline")), &settings)
            .unwrap();
        let _c = graph
            .split(b, Orientation::Horizontal, 0.5, Some(selector("log")), &settings)
            .unwrap();
        graph
    }

    #[test]
    fn round_trip_preserves_structure_and_geometry() {
        let graph = sample_graph();
        let descriptor = LayoutDescriptor::capture(&graph);
        let restored = descriptor.instantiate().unwrap();

        assert_eq!(restored.panel_count(), graph.panel_count());
        assert_eq!(restored.edge_count(), graph.edge_count());
        assert_ne!(restored.instance(), graph.instance());

        let before: Vec<_> = graph.solve().unwrap().rects().map(|(_, r)| r).collect();
        let after: Vec<_> = restored.solve().unwrap().rects().map(|(_, r)| r).collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert!(b.approx_eq(a), "{b:?} vs {a:?}");
        }

        let tabs = |g: &LayoutGraph| -> Vec<(Vec<String>, usize)> {
            g.panels()
                .map(|(_, p)| {
                    (p.tabs().iter().map(|t| t.selector.0.clone()).collect(), p.active())
                })
                .collect()
        };
        assert_eq!(tabs(&graph), tabs(&restored));
    }

    #[test]
    fn round_trip_survives_serialization() {
        let descriptor = LayoutDescriptor::capture(&sample_graph());
        let text = ron::to_string(&descriptor).unwrap();
        let parsed: LayoutDescriptor = ron::from_str(&text).unwrap();
        assert_eq!(parsed, descriptor);
        parsed.instantiate().unwrap();
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        let descriptor = LayoutDescriptor {
            width: 100.0,
            height: 100.0,
            edges: vec![],
            panels: vec![],
        };
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn unknown_edge_references_are_rejected() {
        let descriptor = LayoutDescriptor {
            width: 100.0,
            height: 100.0,
            edges: vec![],
            panels: vec![PanelRecord {
                left: NeighborRecord::Boundary,
                right: NeighborRecord::Edge(7),
                top: NeighborRecord::Boundary,
                bottom: NeighborRecord::Boundary,
                tabs: vec![selector("a")],
                active: 0,
            }],
        };
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn out_of_range_positions_and_actives_are_rejected() {
        let mut descriptor = LayoutDescriptor::capture(&sample_graph());
        descriptor.edges[0].position = 1.4;
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));

        let mut descriptor = LayoutDescriptor::capture(&sample_graph());
        descriptor.panels[0].active = 99;
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn non_tiling_descriptors_are_rejected() {
        let mut descriptor = LayoutDescriptor::capture(&sample_graph());
        // Detach one panel from its shared edge; the result no longer tiles.
        descriptor.panels[1].left = NeighborRecord::Boundary;
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn duplicate_edge_ids_are_rejected() {
        let mut descriptor = LayoutDescriptor::capture(&sample_graph());
        let clone = descriptor.edges[0];
        descriptor.edges.push(clone);
        assert!(matches!(
            descriptor.instantiate(),
            Err(LayoutError::MalformedDescriptor { .. })
        ));
    }
}
