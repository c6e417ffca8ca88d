//! Membership snapshot -> layout primitives.

use crate::settings::{ConstraintRule, RuleScope};
use indexmap::IndexSet;
use narwhal::{AlignmentConstraint, AlignmentOffset};
use rustc_hash::FxHashMap;
use shoal_core::geometry::center_of;
use shoal_core::{EntityId, EntityKind, Host, Members, Point};

/// A node member, positioned by its center.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// A link between two node indices of the same [`Projection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEdge {
    pub id: EntityId,
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub constraints: Vec<AlignmentConstraint>,
    index: FxHashMap<EntityId, usize>,
}

impl Projection {
    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &EntityId) -> Option<&LayoutNode> {
        self.nodes.get(self.index_of(id)?)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.nodes.iter().map(|n| &n.id)
    }
}

/// Builds the graph for `members`.
///
/// Membership and attributes come from `members`; position, rotation and size come from the
/// host when it still knows the entity. Nodes the host cannot measure are left out, and so is
/// every edge that does not connect two distinct projected nodes. Each rule contributes at most one constraint.
pub fn project<H: Host>(host: &H, members: &Members, rules: &[ConstraintRule]) -> Projection {
    let mut out = Projection::default();

    for (id, entity) in members {
        if !entity.is_node() {
            continue;
        }
        let Some(size) = host.geometry(id) else {
            tracing::trace!(%id, "no geometry, leaving node out");
            continue;
        };
        // Positions come from the live entity: the store only tracks content changes.
        let live = host.entity(id);
        let placed = live.as_ref().unwrap_or(entity);
        let center = center_of(Point::new(placed.x, placed.y), size, placed.rotation);
        out.index.insert(id.clone(), out.nodes.len());
        out.nodes.push(LayoutNode {
            id: id.clone(),
            x: center.x,
            y: center.y,
            width: size.width,
            height: size.height,
            rotation: placed.rotation,
        });
    }

    let mut groups: Vec<IndexSet<usize>> = vec![IndexSet::new(); rules.len()];

    for (id, entity) in members {
        let EntityKind::Edge(binding) = &entity.kind else {
            continue;
        };
        let resolve = |end: &Option<EntityId>| end.as_ref().and_then(|e| out.index_of(e));
        let (Some(source), Some(target)) = (resolve(&binding.start), resolve(&binding.end)) else {
            continue;
        };
        if source == target {
            continue;
        }

        let mut aligning = false;
        for (rule, group) in rules.iter().zip(groups.iter_mut()) {
            if rule.scope == RuleScope::Edges && rule.predicate.matches(entity) {
                group.insert(source);
                group.insert(target);
                aligning = true;
            }
        }
        if !aligning {
            out.edges.push(LayoutEdge {
                id: id.clone(),
                source,
                target,
            });
        }
    }

    for (rule, group) in rules.iter().zip(groups.iter_mut()) {
        if rule.scope != RuleScope::Nodes {
            continue;
        }
        for (idx, node) in out.nodes.iter().enumerate() {
            let matched = members
                .get(&node.id)
                .is_some_and(|e| rule.predicate.matches(e));
            if matched {
                group.insert(idx);
            }
        }
    }

    out.constraints = rules
        .iter()
        .zip(groups)
        .filter(|(_, group)| !group.is_empty())
        .map(|(rule, group)| AlignmentConstraint {
            axis: rule.axis.into(),
            offsets: group
                .into_iter()
                .map(|node| AlignmentOffset { node, offset: 0.0 })
                .collect(),
        })
        .collect();

    out
}
