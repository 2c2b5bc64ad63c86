// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Defines the host-facing [`LayoutEngine`].
//!
//! The engine owns one live [`LayoutGraph`], the settings it was created
//! with, and the at-most-one drag session per graph. Every entry point runs
//! synchronously inside the host event that triggered it; there is nothing to
//! lock because a single logical actor drives each engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::drag::{
    DragPayload, DragSession, DragState, DropEffect, DropMode, GestureInfo, perform_drop,
};
use crate::error::LayoutError;
use crate::geometry::{Corner, Orientation, Point};
use crate::model::{
    ContentSelector, EdgeId, LayoutDescriptor, LayoutGraph, PanelId, SolvedLayout, TabPosition,
};

/// The command surface, mirroring the direct methods. Commands are plain
/// serializable data so a keybinding table or an IPC boundary can carry them
/// unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Split {
        panel: PanelId,
        orientation: Orientation,
        ratio: f64,
        content: ContentSelector,
    },
    Close {
        panel: PanelId,
    },
    ResizeEdge {
        edge: EdgeId,
        position: f64,
    },
    AddTab {
        panel: PanelId,
        content: ContentSelector,
        position: TabPosition,
        switch_to: bool,
    },
    CloseTab {
        panel: PanelId,
        index: usize,
    },
    SetActive {
        panel: PanelId,
        index: usize,
    },
}

/// What the host should do after a successful command.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResponse {
    /// The graph changed; recompute geometry and repaint.
    pub relayout: bool,
    /// Panel that should take input focus, if any.
    pub focus: Option<PanelId>,
}

pub struct LayoutEngine {
    graph: LayoutGraph,
    settings: Settings,
    drag: Option<DragSession>,
}

impl LayoutEngine {
    pub fn new(width: f64, height: f64, settings: Settings) -> Self {
        LayoutEngine {
            graph: LayoutGraph::new(width, height),
            settings,
            drag: None,
        }
    }

    /// Reconstructs an engine from a snapshot, validating it fully first.
    pub fn load(
        descriptor: &LayoutDescriptor,
        settings: Settings,
    ) -> Result<Self, LayoutError> {
        Ok(LayoutEngine {
            graph: descriptor.instantiate()?,
            settings,
            drag: None,
        })
    }

    /// Like [`Self::load`], but a malformed snapshot degrades to an empty
    /// default layout instead of failing.
    pub fn load_or_default(
        descriptor: &LayoutDescriptor,
        width: f64,
        height: f64,
        settings: Settings,
    ) -> Self {
        match Self::load(descriptor, settings.clone()) {
            Ok(engine) => engine,
            Err(err) => {
                warn!(%err, "discarding malformed layout snapshot");
                Self::new(width, height, settings)
            }
        }
    }

    pub fn save(&self) -> LayoutDescriptor {
        LayoutDescriptor::capture(&self.graph)
    }

    pub fn graph(&self) -> &LayoutGraph {
        &self.graph
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Absolute rectangles and edge segments for the current graph.
    pub fn layout(&self) -> Result<SolvedLayout, LayoutError> {
        self.graph.solve()
    }

    pub fn panel_at(&self, point: Point) -> Option<PanelId> {
        self.graph.panel_at(point)
    }

    /// The panel under the point and which of its quadrants the point is in;
    /// hosts use this to preview where a drop would land.
    pub fn corner_at(&self, point: Point) -> Option<(PanelId, Corner)> {
        let solved = self.graph.solve().ok()?;
        let panel = solved.panel_at(point)?;
        Some((panel, solved.rect(panel)?.corner_of(point)))
    }

    pub fn handle_command(
        &mut self,
        command: LayoutCommand,
    ) -> Result<CommandResponse, LayoutError> {
        debug!(?command);
        match command {
            LayoutCommand::Split {
                panel,
                orientation,
                ratio,
                content,
            } => {
                let new_panel = self.split(panel, orientation, ratio, content)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: Some(new_panel),
                })
            }
            LayoutCommand::Close { panel } => {
                let absorber = self.close(panel)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: Some(absorber),
                })
            }
            LayoutCommand::ResizeEdge { edge, position } => {
                self.resize_edge(edge, position)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: None,
                })
            }
            LayoutCommand::AddTab {
                panel,
                content,
                position,
                switch_to,
            } => {
                self.add_tab(panel, content, position, switch_to)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: switch_to.then_some(panel),
                })
            }
            LayoutCommand::CloseTab { panel, index } => {
                self.close_tab(panel, index)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: self.graph.panel(panel).is_some().then_some(panel),
                })
            }
            LayoutCommand::SetActive { panel, index } => {
                self.set_active(panel, index)?;
                Ok(CommandResponse {
                    relayout: true,
                    focus: Some(panel),
                })
            }
        }
    }

    pub fn split(
        &mut self,
        panel: PanelId,
        orientation: Orientation,
        ratio: f64,
        content: ContentSelector,
    ) -> Result<PanelId, LayoutError> {
        self.graph.split(panel, orientation, ratio, Some(content), &self.settings)
    }

    pub fn close(&mut self, panel: PanelId) -> Result<PanelId, LayoutError> {
        self.graph.close(panel, &self.settings)
    }

    pub fn resize_edge(&mut self, edge: EdgeId, position: f64) -> Result<f64, LayoutError> {
        self.graph.resize_edge(edge, position, &self.settings)
    }

    pub fn add_tab(
        &mut self,
        panel: PanelId,
        content: ContentSelector,
        position: TabPosition,
        switch_to: bool,
    ) -> Result<usize, LayoutError> {
        self.graph.add_tab(panel, content, position, switch_to)
    }

    pub fn close_tab(&mut self, panel: PanelId, index: usize) -> Result<(), LayoutError> {
        self.graph.close_tab(panel, index, &self.settings)
    }

    pub fn set_active(&mut self, panel: PanelId, index: usize) -> Result<(), LayoutError> {
        self.graph.set_active(panel, index)
    }

    /// Resolves every tab of a panel through the host's resolve callback, in
    /// tab order. The engine never looks inside the results.
    pub fn resolve_content<D>(
        &self,
        panel: PanelId,
        mut resolve: impl FnMut(&ContentSelector) -> D,
    ) -> Result<Vec<D>, LayoutError> {
        Ok(self
            .graph
            .try_panel(panel)?
            .tabs()
            .iter()
            .map(|tab| resolve(&tab.selector))
            .collect())
    }

    /// Arms a drag session on a tab. At most one session exists per engine;
    /// arming during another session is rejected.
    pub fn begin_drag(&mut self, panel: PanelId, tab: usize) -> Result<(), LayoutError> {
        if self.drag.is_some() {
            return Err(LayoutError::DragInProgress);
        }
        let source = self.graph.try_panel(panel)?;
        let Some(entry) = source.tabs().get(tab) else {
            return Err(LayoutError::IndexOutOfRange {
                index: tab,
                len: source.tabs().len(),
            });
        };
        self.drag = Some(DragSession {
            payload: DragPayload {
                instance: self.graph.instance(),
                panel,
                tab,
                selector: entry.selector.clone(),
            },
            state: DragState::Armed,
            hover: None,
        });
        debug!(?panel, tab, "drag armed");
        Ok(())
    }

    /// Tracks a pointer move, returning the current hover target. Purely
    /// advisory; nothing mutates until commit.
    pub fn update_drag(&mut self, pointer: Point) -> Result<Option<PanelId>, LayoutError> {
        let hover = self.graph.panel_at(pointer);
        let session = self.drag.as_mut().ok_or(LayoutError::NoDragSession)?;
        session.state = DragState::Tracking;
        session.hover = hover;
        Ok(hover)
    }

    /// The portable identity of the dragged tab, for carrying a drag to
    /// another engine.
    pub fn drag_payload(&self) -> Option<&DragPayload> {
        self.drag.as_ref().map(|session| &session.payload)
    }

    /// Discards the session without touching the graph. Safe to call at any
    /// time.
    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            debug!("drag cancelled");
        }
    }

    /// Commits the session at its current hover target. The caller-supplied
    /// classifier maps the terminating gesture to a drop mode. A release
    /// over no target is a cancellation, not an error: `Ok(None)`.
    pub fn commit_drag(
        &mut self,
        gesture: GestureInfo,
        classify: impl FnOnce(&GestureInfo) -> DropMode,
        position: TabPosition,
    ) -> Result<Option<DropEffect>, LayoutError> {
        let session = self.drag.take().ok_or(LayoutError::NoDragSession)?;
        let target = match (session.state, session.hover) {
            (DragState::Tracking, Some(target)) => target,
            _ => {
                debug!("drag released over no target; treating as cancellation");
                return Ok(None);
            }
        };
        let mode = classify(&gesture);
        perform_drop(
            &mut self.graph,
            &session.payload,
            mode,
            target,
            position,
            &self.settings,
        )
        .map(Some)
    }

    /// Applies a drop directly, typically with a payload from another
    /// engine. A payload from a different graph instance is coerced to copy
    /// semantics and its source graph is never touched.
    pub fn accept_drop(
        &mut self,
        payload: &DragPayload,
        mode: DropMode,
        target: PanelId,
        position: TabPosition,
    ) -> Result<DropEffect, LayoutError> {
        perform_drop(&mut self.graph, payload, mode, target, position, &self.settings)
    }
}
