#![forbid(unsafe_code)]

//! Live graph layout for a collection of host entities.
//!
//! [`GraphLayout`] is a [`shoal_core::Lifecycle`]: every membership or attribute change
//! re-projects the members into a graph ([`project`]) and re-seeds the [`SimulationDriver`].
//! While running, each host frame runs one solver tick and [`write_back`] moves the entities,
//! leaving anything the user is dragging alone.

pub mod collection;
pub mod driver;
pub mod error;
pub mod projection;
pub mod settings;
pub mod writeback;

pub use collection::{GraphLayout, GraphLayoutCollection, SimulationControl};
pub use driver::{RotatedGapDistance, SimulationDriver};
pub use error::{Error, Result};
pub use projection::{LayoutEdge, LayoutNode, Projection, project};
pub use settings::{
    AttributePredicate, ConstraintAxis, ConstraintRule, LayoutSettings, RuleScope,
    WriteBackSettings, default_rules,
};
pub use writeback::{WriteBackStats, write_back};
