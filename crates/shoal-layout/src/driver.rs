//! Owns the solver and keeps it in step with the latest projection.

use crate::error::Result;
use crate::projection::{LayoutNode, Projection};
use crate::settings::LayoutSettings;
use narwhal::{Layout, Link, Node, TickPasses, TickStats};
use shoal_core::EntityId;
use std::sync::Arc;

/// Ideal link length: center distance minus the edge-to-edge gap plus a fixed travel distance.
///
/// Gaps are measured per axis between the rotated bounding boxes. Without rotation data the
/// solver's constant link distance applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedGapDistance {
    pub travel: f64,
}

impl narwhal::LinkDistance for RotatedGapDistance {
    fn distance(&self, source: &Node, target: &Node) -> Option<f64> {
        source.rotation?;
        target.rotation?;
        let (sw, sh) = source.extent();
        let (tw, th) = target.extent();
        let dx = (target.x - source.x).abs();
        let dy = (target.y - source.y).abs();
        let horizontal_gap = (dx - (sw + tw) / 2.0).max(0.0);
        let vertical_gap = (dy - (sh + th) / 2.0).max(0.0);
        Some(dx.hypot(dy) - horizontal_gap.hypot(vertical_gap) + self.travel)
    }
}

fn solver_node(n: &LayoutNode) -> Node {
    Node::new(n.x, n.y, n.width, n.height).with_rotation(n.rotation)
}

fn solver_links(projection: &Projection) -> Vec<Link> {
    projection
        .edges
        .iter()
        .map(|e| Link::new(e.source, e.target))
        .collect()
}

pub struct SimulationDriver {
    layout: Layout,
    ids: Vec<EntityId>,
    passes: TickPasses,
    last_tick: TickStats,
}

impl std::fmt::Debug for SimulationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationDriver")
            .field("layout", &self.layout)
            .field("nodes", &self.ids.len())
            .field("passes", &self.passes)
            .finish()
    }
}

impl SimulationDriver {
    pub fn new(settings: &LayoutSettings) -> Self {
        let layout = Layout::new(settings.solver_options()).with_link_distance(Arc::new(
            RotatedGapDistance {
                travel: settings.link_distance,
            },
        ));
        Self {
            layout,
            ids: Vec::new(),
            passes: settings.passes,
            last_tick: TickStats::default(),
        }
    }

    /// Replaces every solver input with `projection`, discarding momentum.
    ///
    /// On error the previous inputs stay in place.
    pub fn rebuild(&mut self, projection: &Projection) -> Result<()> {
        let nodes = projection.nodes.iter().map(solver_node).collect();
        self.layout.set_graph(
            nodes,
            solver_links(projection),
            projection.constraints.clone(),
        )?;
        self.ids = projection.node_ids().cloned().collect();
        self.last_tick = TickStats::default();
        tracing::debug!(
            nodes = self.ids.len(),
            links = projection.edges.len(),
            constraints = projection.constraints.len(),
            "simulation rebuilt"
        );
        Ok(())
    }

    /// Like [`Self::rebuild`], but keeps positions and cooling when the node sequence is the
    /// same as the one currently simulated.
    pub fn refresh(&mut self, projection: &Projection) -> Result<()> {
        if !self.ids.iter().eq(projection.node_ids()) {
            return self.rebuild(projection);
        }
        self.layout
            .replace_structure(solver_links(projection), projection.constraints.clone())?;
        for (node, fresh) in self.layout.nodes_mut().iter_mut().zip(&projection.nodes) {
            node.width = fresh.width;
            node.height = fresh.height;
            node.rotation = Some(fresh.rotation);
        }
        tracing::debug!(nodes = self.ids.len(), "simulation refreshed in place");
        Ok(())
    }

    /// Runs one low-iteration tick and returns the updated nodes, indexed like [`Self::ids`].
    pub fn step(&mut self) -> &[Node] {
        self.last_tick = self.layout.tick(self.passes);
        self.layout.nodes()
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn nodes(&self) -> &[Node] {
        self.layout.nodes()
    }

    /// Node slots paired with their entity ids. Writing `x`/`y` pins the node for the next step.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut Node)> {
        self.ids.iter().zip(self.layout.nodes_mut().iter_mut())
    }

    pub fn last_tick(&self) -> TickStats {
        self.last_tick
    }

    /// Ticks since the last rebuild.
    pub fn ticks(&self) -> u64 {
        self.layout.ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal::LinkDistance;

    #[test]
    fn gap_distance_keeps_boxes_travel_apart() {
        let d = RotatedGapDistance { travel: 100.0 };
        // Side by side: 50 apart center to center, 40 of which is the boxes themselves.
        let a = Node::new(0.0, 0.0, 40.0, 40.0).with_rotation(0.0);
        let b = Node::new(50.0, 0.0, 40.0, 40.0).with_rotation(0.0);
        let ideal = d.distance(&a, &b).unwrap();
        assert!((ideal - 140.0).abs() < 1e-9, "{ideal}");
    }

    #[test]
    fn gap_distance_uses_rotated_extents() {
        let d = RotatedGapDistance { travel: 0.0 };
        let a = Node::new(0.0, 0.0, 100.0, 10.0).with_rotation(std::f64::consts::FRAC_PI_2);
        let b = Node::new(200.0, 0.0, 10.0, 10.0).with_rotation(0.0);
        // Rotated `a` is 10 wide, so the horizontal gap is 200 - 10 = 190.
        let ideal = d.distance(&a, &b).unwrap();
        assert!((ideal - 10.0).abs() < 1e-9, "{ideal}");
    }

    #[test]
    fn gap_distance_needs_rotation_data() {
        let d = RotatedGapDistance { travel: 100.0 };
        let a = Node::new(0.0, 0.0, 10.0, 10.0);
        let b = Node::new(50.0, 0.0, 10.0, 10.0).with_rotation(0.0);
        assert_eq!(d.distance(&a, &b), None);
    }
}
