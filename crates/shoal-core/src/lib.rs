#![forbid(unsafe_code)]

//! Entity model, host interface and live membership collections (headless).
//!
//! The crate owns nothing visual. A host (canvas editor, test double, ...) implements [`Host`];
//! collections keep a membership set of host entities and hand lifecycle notifications to a
//! [`Lifecycle`] implementation. [`CollectionRegistry`] routes host change/delete notifications
//! and animation frames to the collections that care about them.

pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod host;
pub mod membership;
pub mod memory;
pub mod router;

pub use collection::{Collection, Lifecycle, SubscriptionId};
pub use config::ShoalConfig;
pub use entity::{Binding, Entity, EntityId, EntityKind, Geometry};
pub use error::{Error, Result};
pub use geometry::Point;
pub use host::{Easing, FrameToken, Host, HostChange, Transition};
pub use membership::{MembershipEvent, MembershipStore, Members};
pub use memory::{MemoryDocument, PositionWrite};
pub use router::{AnyCollection, CollectionRegistry};
