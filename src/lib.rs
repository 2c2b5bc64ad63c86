// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A tiling, resizable, tab-capable panel layout engine.
//!
//! The [`model`] module owns the edge/panel graph and all layout logic; the
//! [`engine`] module puts the host-facing command surface and the
//! drag-and-drop reconciler on top of it. Rendering, gesture capture, and
//! content resolution stay on the host's side of the boundary.

pub mod config;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod log;
pub mod model;
