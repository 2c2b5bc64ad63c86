// Copyright The Tessera Authors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::Stderr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_tree::time::UtcDateTime;

/// Installs a hierarchical stderr subscriber filtered by `RUST_LOG`. Hosts
/// that already run their own subscriber should compose [`tree_layer`]
/// instead of calling this.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(tree_layer().with_filter(EnvFilter::from_default_env()))
        .init();
}

pub fn tree_layer() -> tracing_tree::HierarchicalLayer<fn() -> Stderr, UtcDateTime> {
    tracing_tree::HierarchicalLayer::default()
        .with_indent_amount(2)
        .with_indent_lines(true)
        .with_deferred_spans(true)
        .with_span_retrace(true)
        .with_targets(true)
        .with_timer(UtcDateTime::default())
}
