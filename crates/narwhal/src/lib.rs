#![forbid(unsafe_code)]

//! Headless incremental constraint layout solver.
//!
//! `narwhal` is used by `shoal-layout` as a tick-driven layout engine: callers seed it with
//! center-positioned rectangles, links and alignment constraints, then advance it one small
//! [`Layout::tick`] at a time (typically once per animation frame). Node positions are plain
//! mutable fields, so a caller can pin a node by overwriting `x`/`y` between ticks.
//!
//! The force model (clipped springs, grid-bucketed repulsion, gravity, displacement cooling and
//! overlap separation) follows the CoSE/FCoSE spring embedder, reshaped for continuous use.

pub mod algo;
pub mod error;
pub mod graph;

pub use algo::{Layout, LayoutOptions, LinkDistance, TickPasses, TickStats};
pub use error::{Error, Result};
pub use graph::{AlignmentConstraint, AlignmentOffset, Axis, Link, Node};
