use crate::driver::SimulationDriver;
use crate::settings::WriteBackSettings;
use rustc_hash::FxHashSet;
use shoal_core::geometry::{anchor_of, center_of};
use shoal_core::{EntityId, Host, Point};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBackStats {
    /// Entities whose position was written.
    pub written: usize,
    /// Selected entities whose node was pinned to the live position instead.
    pub pinned: usize,
    /// Nodes without a live entity or geometry this tick.
    pub skipped: usize,
}

/// Reconciles the solver's node positions with the live document after a step.
///
/// Every node picks up the entity's current size and rotation. Selected entities are never
/// written: their node is moved to the live position and held fixed for the next step. All
/// other nodes have their center converted back to an anchor and written to the host.
pub fn write_back<H: Host>(
    host: &mut H,
    driver: &mut SimulationDriver,
    settings: &WriteBackSettings,
) -> WriteBackStats {
    let selected: FxHashSet<EntityId> = host.selected_ids().into_iter().collect();
    let transition = settings.transition();
    let mut stats = WriteBackStats::default();

    for (id, node) in driver.entries_mut() {
        let (Some(entity), Some(size)) = (host.entity(id), host.geometry(id)) else {
            stats.skipped += 1;
            continue;
        };
        node.width = size.width;
        node.height = size.height;
        node.rotation = Some(entity.rotation);

        if selected.contains(id) {
            let center = center_of(Point::new(entity.x, entity.y), size, entity.rotation);
            node.x = center.x;
            node.y = center.y;
            node.fixed = true;
            stats.pinned += 1;
            continue;
        }

        node.fixed = false;
        let anchor = anchor_of(Point::new(node.x, node.y), size, entity.rotation);
        if !(anchor.x.is_finite() && anchor.y.is_finite()) {
            stats.skipped += 1;
            continue;
        }
        host.set_position(id, anchor, transition);
        stats.written += 1;
    }

    stats
}
