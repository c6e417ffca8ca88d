use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Host-assigned entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The two ends of an edge-like entity. Unbound ends are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub start: Option<EntityId>,
    pub end: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntityKind {
    Node,
    Edge(Binding),
}

/// Snapshot of a host entity.
///
/// `x`/`y` is the anchor: the top-left corner of the unrotated shape. Rotation (radians) pivots
/// about the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

impl Entity {
    pub fn node(id: impl Into<EntityId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Node,
            x,
            y,
            rotation: 0.0,
            attributes: IndexMap::new(),
        }
    }

    pub fn edge(
        id: impl Into<EntityId>,
        start: Option<impl Into<EntityId>>,
        end: Option<impl Into<EntityId>>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: EntityKind::Edge(Binding {
                start: start.map(Into::into),
                end: end.map(Into::into),
            }),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn is_node(&self) -> bool {
        matches!(self.kind, EntityKind::Node)
    }

    pub fn binding(&self) -> Option<&Binding> {
        match &self.kind {
            EntityKind::Edge(b) => Some(b),
            EntityKind::Node => None,
        }
    }

    /// Whether `other` differs in anything the layout derives structure from.
    ///
    /// Position and rotation are ignored: the engine's own position writes must not come back
    /// as attribute updates.
    pub fn content_differs(&self, other: &Entity) -> bool {
        self.kind != other.kind || self.attributes != other.attributes
    }
}

/// Measured size of an entity, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_are_not_content_changes() {
        let a = Entity::node("a", 0.0, 0.0).with_attribute("color", "red");
        let mut moved = a.clone();
        moved.x = 40.0;
        moved.rotation = 1.0;
        assert!(!a.content_differs(&moved));

        let recolored = a.clone().with_attribute("color", "blue");
        assert!(a.content_differs(&recolored));
    }

    #[test]
    fn rebinding_is_a_content_change() {
        let e = Entity::edge("e", Some("a"), Some("b"));
        let rebound = Entity::edge("e", Some("a"), Some("c"));
        assert!(e.content_differs(&rebound));
        assert_eq!(e.binding().and_then(|b| b.end.as_ref()).map(EntityId::as_str), Some("b"));
    }

    #[test]
    fn entity_kind_serializes_tagged() {
        let e = Entity::edge("e", Some("a"), None::<&str>);
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["kind"]["type"], "edge");
        assert_eq!(v["kind"]["start"], "a");
        assert!(v["kind"]["end"].is_null());
    }
}
