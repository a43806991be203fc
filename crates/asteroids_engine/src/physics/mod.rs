//! Physics module for collision detection
//!
//! The simulation is planar: every collider is a circle on the XZ plane and
//! overlap is a pure boolean test with no response or impulse model.

pub mod collider;
pub mod collision;

pub use collider::Collider;
pub use collision::{
    check_for_collision,
    find_overlapping_pairs,
    CollisionBody,
    CollisionPair,
    CollisionPolicy,
};
