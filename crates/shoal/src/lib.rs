#![forbid(unsafe_code)]

//! `shoal` keeps a live set of canvas shapes laid out as a graph.
//!
//! Shapes join a collection; the collection projects them into nodes, links and alignment
//! constraints, runs a force-directed simulation one tick per host animation frame and writes the
//! resulting positions back, leaving shapes the user is dragging where the user puts them.
//!
//! # Features
//!
//! - `layout` (default): the graph-layout collection (`shoal::layout`)

pub use shoal_core::*;

#[cfg(feature = "layout")]
pub mod layout {
    pub use narwhal;
    pub use shoal_layout::{
        AttributePredicate, ConstraintAxis, ConstraintRule, Error, GraphLayout,
        GraphLayoutCollection, LayoutSettings, Projection, Result, RuleScope, SimulationControl,
        SimulationDriver, WriteBackSettings, WriteBackStats, default_rules,
    };

    use shoal_core::{Collection, CollectionRegistry, Host, ShoalConfig};

    /// Builds an idle graph-layout collection from `config`.
    pub fn create_collection<H: Host>(
        id: impl Into<String>,
        config: &ShoalConfig,
    ) -> Result<GraphLayoutCollection<H>> {
        let layout = GraphLayout::from_config(config)?;
        Ok(Collection::new(id, layout))
    }

    /// [`create_collection`] and register it, so that host notifications and frames reach it.
    pub fn register_collection<H: Host + 'static>(
        registry: &mut CollectionRegistry<H>,
        id: impl Into<String>,
        config: &ShoalConfig,
    ) -> Result<()> {
        let collection = create_collection(id, config)?;
        registry.register(collection)?;
        Ok(())
    }
}
