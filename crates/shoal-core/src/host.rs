use crate::entity::{Entity, EntityId, Geometry};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle for one scheduled animation frame, issued by [`Host::request_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    #[default]
    EaseInQuad,
}

impl Easing {
    /// Maps linear progress `t` in `[0, 1]` onto the eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
        }
    }
}

/// Animation hint for a position write. Hosts without animation support may ignore it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub duration: Duration,
    pub easing: Easing,
}

/// A notification the host hands to [`crate::CollectionRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostChange {
    Updated { prev: Entity, next: Entity },
    Deleted { prev: Entity },
}

/// The canvas/editor a collection reads from and writes positions to.
pub trait Host {
    fn entity(&self, id: &EntityId) -> Option<Entity>;

    /// Measured size of the entity, or `None` when the host cannot report one.
    fn geometry(&self, id: &EntityId) -> Option<Geometry>;

    /// Entities the user is currently manipulating.
    fn selected_ids(&self) -> Vec<EntityId>;

    /// Every entity on the active page/surface.
    fn surface_entities(&self) -> Vec<Entity>;

    /// Moves the entity's anchor. `transition` requests an animated move.
    fn set_position(&mut self, id: &EntityId, anchor: Point, transition: Option<Transition>);

    fn select_none(&mut self);

    /// Schedules a frame; the host later calls back with the returned token.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancels a pending frame. Unknown or already-delivered tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_in_quad_starts_slow() {
        assert_eq!(Easing::EaseInQuad.apply(0.5), 0.25);
        assert_eq!(Easing::Linear.apply(0.5), 0.5);
        assert_eq!(Easing::EaseInQuad.apply(2.0), 1.0);
    }

    #[test]
    fn easing_names_follow_config_spelling() {
        let e: Easing = serde_json::from_str("\"easeInQuad\"").unwrap();
        assert_eq!(e, Easing::EaseInQuad);
        let e: Easing = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(e, Easing::Linear);
    }
}
