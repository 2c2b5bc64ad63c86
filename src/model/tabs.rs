//! Per-panel ordered tab lists and active-tab tracking.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::LayoutError;
use crate::model::graph::{LayoutGraph, PanelId};

/// User-supplied key identifying a tab's content. The engine never
/// interprets it; the host's resolve callback turns it into renderable
/// metadata. Plain data, so it serializes and crosses instances freely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSelector(pub String);

impl From<&str> for ContentSelector {
    fn from(key: &str) -> Self {
        ContentSelector(key.to_owned())
    }
}

impl From<String> for ContentSelector {
    fn from(key: String) -> Self {
        ContentSelector(key)
    }
}

impl fmt::Display for ContentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One content entry in a panel's ordered tab list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub selector: ContentSelector,
}

impl Tab {
    pub fn new(selector: ContentSelector) -> Self {
        Tab { selector }
    }
}

/// Where a new tab lands relative to the panel's current tabs. `Prev` and
/// `Next` are adjacent to the currently active tab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabPosition {
    First,
    Last,
    Prev,
    Next,
}

impl LayoutGraph {
    /// Inserts a tab and returns its index. The first tab of an empty panel
    /// always becomes active; otherwise `switch_to` decides.
    pub fn add_tab(
        &mut self,
        id: PanelId,
        selector: ContentSelector,
        position: TabPosition,
        switch_to: bool,
    ) -> Result<usize, LayoutError> {
        let panel = self.panels.get_mut(id).ok_or(LayoutError::PanelNotFound)?;
        let index = match position {
            TabPosition::First => 0,
            TabPosition::Last => panel.tabs.len(),
            TabPosition::Prev => panel.active.min(panel.tabs.len()),
            TabPosition::Next => (panel.active + 1).min(panel.tabs.len()),
        };
        panel.tabs.insert(index, Tab::new(selector));
        if panel.tabs.len() == 1 || switch_to {
            panel.active = index;
        } else if index <= panel.active {
            // The active tab shifted right; follow it.
            panel.active += 1;
        }
        Ok(index)
    }

    /// Removes a tab. If it was active, the tab that shifts into its index
    /// becomes active (the new last tab when the removed one was last). A
    /// panel emptied by this is closed.
    pub fn close_tab(
        &mut self,
        id: PanelId,
        index: usize,
        settings: &Settings,
    ) -> Result<(), LayoutError> {
        let panel = self.panels.get_mut(id).ok_or(LayoutError::PanelNotFound)?;
        if index >= panel.tabs.len() {
            return Err(LayoutError::IndexOutOfRange {
                index,
                len: panel.tabs.len(),
            });
        }
        panel.tabs.remove(index);
        if panel.tabs.is_empty() {
            debug!(?id, "closed the last tab; closing its panel");
            return self.close(id, settings).map(drop);
        }
        if index < panel.active {
            panel.active -= 1;
        } else if index == panel.active {
            panel.active = index.min(panel.tabs.len() - 1);
        }
        Ok(())
    }

    pub fn set_active(&mut self, id: PanelId, index: usize) -> Result<(), LayoutError> {
        let panel = self.panels.get_mut(id).ok_or(LayoutError::PanelNotFound)?;
        if index >= panel.tabs.len() {
            return Err(LayoutError::IndexOutOfRange {
                index,
                len: panel.tabs.len(),
            });
        }
        panel.active = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::geometry::Orientation;

    fn selector(name: &str) -> ContentSelector {
        ContentSelector::from(name)
    }

    fn panel_with_tabs(graph: &mut LayoutGraph, names: &[&str]) -> PanelId {
        let id = graph.panels().next().unwrap().0;
        for name in names {
            graph.add_tab(id, selector(name), TabPosition::Last, false).unwrap();
        }
        id
    }

    fn tab_names(graph: &LayoutGraph, id: PanelId) -> Vec<String> {
        graph.panel(id).unwrap().tabs().iter().map(|t| t.selector.0.clone()).collect()
    }

    #[test]
    fn insertion_positions_are_relative_to_the_active_tab() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b", "c"]);
        graph.set_active(id, 1).unwrap();

        graph.add_tab(id, selector("first"), TabPosition::First, false).unwrap();
        graph.add_tab(id, selector("prev"), TabPosition::Prev, false).unwrap();
        graph.add_tab(id, selector("next"), TabPosition::Next, false).unwrap();
        graph.add_tab(id, selector("last"), TabPosition::Last, false).unwrap();

        assert_eq!(
            tab_names(&graph, id),
            vec!["first", "a", "prev", "b", "next", "c", "last"]
        );
        // Never switched, so "b" is still active.
        assert_eq!(graph.panel(id).unwrap().active(), 3);
    }

    #[test]
    fn switch_to_activates_the_inserted_tab() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b"]);
        let index = graph.add_tab(id, selector("c"), TabPosition::First, true).unwrap();
        assert_eq!(index, 0);
        assert_eq!(graph.panel(id).unwrap().active(), 0);
    }

    #[test]
    fn the_first_tab_of_an_empty_panel_is_always_active() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = graph.panels().next().unwrap().0;
        graph.add_tab(id, selector("a"), TabPosition::Last, false).unwrap();
        assert_eq!(graph.panel(id).unwrap().active(), 0);
    }

    #[test]
    fn closing_the_active_last_tab_selects_the_new_last() {
        let settings = Settings::default();
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b", "c"]);
        graph.set_active(id, 2).unwrap();

        graph.close_tab(id, 2, &settings).unwrap();
        assert_eq!(tab_names(&graph, id), vec!["a", "b"]);
        assert_eq!(graph.panel(id).unwrap().active(), 1);
    }

    #[test]
    fn closing_the_active_middle_tab_prefers_the_following_tab() {
        let settings = Settings::default();
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b", "c"]);
        graph.set_active(id, 1).unwrap();

        graph.close_tab(id, 1, &settings).unwrap();
        // "c" shifted into index 1 and inherited the activation.
        assert_eq!(graph.panel(id).unwrap().active(), 1);
        assert_eq!(tab_names(&graph, id), vec!["a", "c"]);
    }

    #[test]
    fn closing_a_tab_before_the_active_one_keeps_it_active() {
        let settings = Settings::default();
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b", "c"]);
        graph.set_active(id, 2).unwrap();

        graph.close_tab(id, 0, &settings).unwrap();
        assert_eq!(graph.panel(id).unwrap().active(), 1);
        assert_eq!(tab_names(&graph, id), vec!["b", "c"]);
    }

    #[test]
    fn emptying_a_panel_closes_it() {
        let settings = Settings::default();
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let left = panel_with_tabs(&mut graph, &["a"]);
        let right = graph
            .split(left, Orientation::Vertical, 0.5, Some(selector("b")), &settings)
            .unwrap();

        graph.close_tab(right, 0, &settings).unwrap();
        assert!(graph.panel(right).is_none());
        assert_eq!(graph.panel_count(), 1);
        graph.check_invariants().unwrap();
    }

    #[test]
    fn set_active_rejects_out_of_range_indices() {
        let mut graph = LayoutGraph::new(1000.0, 1000.0);
        let id = panel_with_tabs(&mut graph, &["a", "b"]);
        assert_eq!(
            graph.set_active(id, 2),
            Err(LayoutError::IndexOutOfRange { index: 2, len: 2 })
        );
    }
}
