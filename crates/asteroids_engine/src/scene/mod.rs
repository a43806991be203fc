//! Game entities
//!
//! The entity set is closed: [`EntityKind`] is an enum over the base entity
//! and the player, asteroid and bullet variants, and the registry dispatches
//! on it each frame.

pub mod asteroid;
pub mod bullet;
pub mod entity;
pub mod player;

pub use asteroid::{AsteroidSettings, AsteroidState};
pub use bullet::{BulletSettings, BulletState};
pub use entity::{Body, Entity, EntityEvent, EntityKind, EntityType, UpdateContext};
pub use player::{PlayerSettings, PlayerState};
