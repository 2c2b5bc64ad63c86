// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The drag-and-drop reconciler: turns a committed drop gesture into one of
//! five tab-editing strategies.
//!
//! The session itself is ephemeral state owned by the engine; it never
//! touches the graph until commit, so cancellation at any point is a no-op
//! rather than a rollback.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::LayoutError;
use crate::geometry::Point;
use crate::model::{ContentSelector, InstanceId, LayoutGraph, PanelId, Tab, TabPosition};

bitflags! {
    /// Modifier keys held during a gesture, as reported by the host.
    /// Serde impls come from the bitflags serde feature.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// What the host observed about the gesture that ended a drag. The engine
/// forwards it verbatim to the caller's classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureInfo {
    pub pointer: Point,
    pub modifiers: Modifiers,
}

/// The five drop strategies a classifier can pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropMode {
    /// Source and target tabs exchange panels; no tab is created or lost.
    Swap,
    /// The source tab replaces the target tab, leaving its old panel.
    Move,
    /// A fresh entry for the source's selector replaces the target tab.
    Copy,
    /// The source tab leaves its panel and joins the target as a new tab.
    MoveNewTab,
    /// A fresh entry for the source's selector joins the target as a new tab.
    CopyNewTab,
}

impl DropMode {
    /// The copy-semantics fallback for drops across graph instances, where
    /// ownership of a tab cannot transfer and only its selector is portable.
    /// The removal half of the move modes is dropped, so a cross-instance
    /// move lands as a fresh tab and the source graph is never touched.
    pub fn cross_instance(self) -> DropMode {
        use DropMode::*;
        match self {
            Swap | Copy => Copy,
            Move | MoveNewTab | CopyNewTab => CopyNewTab,
        }
    }
}

/// Portable identity of a dragged tab. The host may carry it to any engine;
/// a receiving engine with a different instance id copies instead of moving.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub instance: InstanceId,
    pub panel: PanelId,
    pub tab: usize,
    pub selector: ContentSelector,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DragState {
    Armed,
    Tracking,
}

#[derive(Clone, Debug)]
pub(crate) struct DragSession {
    pub payload: DragPayload,
    pub state: DragState,
    pub hover: Option<PanelId>,
}

/// What a committed drop did, for the host's repaint and focus handling.
#[derive(Clone, Debug, PartialEq)]
pub struct DropEffect {
    /// The mode actually applied, after any cross-instance fallback.
    pub mode: DropMode,
    pub target: PanelId,
    /// Index of the affected tab in the target panel.
    pub tab: usize,
    /// Whether removing the source tab emptied and closed its panel.
    pub source_panel_closed: bool,
}

pub(crate) fn perform_drop(
    graph: &mut LayoutGraph,
    payload: &DragPayload,
    requested: DropMode,
    target: PanelId,
    position: TabPosition,
    settings: &Settings,
) -> Result<DropEffect, LayoutError> {
    let same_instance = payload.instance == graph.instance();
    let mode = if same_instance {
        let source = graph.try_panel(payload.panel)?;
        if payload.tab >= source.tabs().len() {
            return Err(LayoutError::IndexOutOfRange {
                index: payload.tab,
                len: source.tabs().len(),
            });
        }
        requested
    } else {
        requested.cross_instance()
    };
    graph.try_panel(target)?;
    debug!(?mode, ?target, source = ?payload.panel, "committing drop");

    graph.checked_mutation(settings, "drop", |graph| {
        let tab = match mode {
            DropMode::Swap => {
                let theirs = graph.panels[target].active;
                if graph.panels[target].tabs.is_empty() {
                    // Nothing to exchange; the dropped selector just lands.
                    graph.add_tab(target, payload.selector.clone(), position, true)?
                } else if payload.panel == target && payload.tab == theirs {
                    theirs
                } else {
                    let mine = graph.panels[payload.panel].tabs[payload.tab].selector.clone();
                    let swapped = std::mem::replace(
                        &mut graph.panels[target].tabs[theirs].selector,
                        mine,
                    );
                    graph.panels[payload.panel].tabs[payload.tab].selector = swapped;
                    theirs
                }
            }
            DropMode::Move => {
                let landed = replace_active(graph, target, payload.selector.clone(), position)?;
                if payload.panel != target || payload.tab != landed {
                    graph.close_tab(payload.panel, payload.tab, settings)?;
                }
                landed
            }
            DropMode::Copy => replace_active(graph, target, payload.selector.clone(), position)?,
            DropMode::MoveNewTab => {
                let landed = graph.add_tab(target, payload.selector.clone(), position, true)?;
                let mut source_tab = payload.tab;
                if payload.panel == target && landed <= source_tab {
                    source_tab += 1;
                }
                graph.close_tab(payload.panel, source_tab, settings)?;
                landed
            }
            DropMode::CopyNewTab => {
                graph.add_tab(target, payload.selector.clone(), position, true)?
            }
        };
        Ok(DropEffect {
            mode,
            target,
            tab,
            source_panel_closed: same_instance && graph.panel(payload.panel).is_none(),
        })
    })
}

/// Replaces the target panel's active tab with a fresh entry. An empty
/// target has no tab to replace, so the entry is inserted instead.
fn replace_active(
    graph: &mut LayoutGraph,
    target: PanelId,
    selector: ContentSelector,
    position: TabPosition,
) -> Result<usize, LayoutError> {
    let panel = &mut graph.panels[target];
    if panel.tabs.is_empty() {
        return graph.add_tab(target, selector, position, true);
    }
    let active = panel.active;
    panel.tabs[active] = Tab::new(selector);
    Ok(active)
}
