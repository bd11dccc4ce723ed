//! Chart rendering.
//!
//! The renderer sits behind a stable `report → image set` interface:
//! [`render_all`] reads nothing but the report and writes the chart files.
//! Swapping the drawing technique must not touch the collector or
//! aggregator.

pub mod charts;
pub mod svg;

pub use charts::{render_all, RenderOptions};
