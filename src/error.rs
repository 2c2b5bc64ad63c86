// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Everything a layout operation can fail with.
///
/// `InvariantViolation` always indicates a defect: the offending mutation is
/// rolled back and the previous graph stays in place. The argument errors
/// (`InvalidRatio`, `IndexOutOfRange`, `PanelNotFound`, `EdgeNotFound`,
/// `EmptyPanelNotAllowed`) are reported before any mutation happens. The
/// malformed-input errors are recoverable by falling back to a default
/// layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("layout invariant violated: {rule}")]
    InvariantViolation { rule: &'static str },

    #[error("split ratio {ratio} is not feasible for this panel")]
    InvalidRatio { ratio: f64 },

    #[error("tab index {index} out of range for panel with {len} tabs")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no panel with the given id")]
    PanelNotFound,

    #[error("no edge with the given id")]
    EdgeNotFound,

    #[error("a new panel requires initial content")]
    EmptyPanelNotAllowed,

    #[error("a drag session is already active for this layout")]
    DragInProgress,

    #[error("no drag session is active")]
    NoDragSession,

    #[error("descriptor does not describe a tileable layout: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("graph does not describe a tileable layout: {reason}")]
    MalformedGraph { reason: String },
}
