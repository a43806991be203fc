//! Circle-overlap detection
//!
//! Detection runs in two steps: [`find_overlapping_pairs`] walks a read-only
//! snapshot of bodies and reports every overlapping pair; the caller then
//! resolves the pairs according to a [`CollisionPolicy`]. Nothing is removed
//! while pairs are being collected.

use crate::foundation::math::{planar_distance, Vec3};
use crate::physics::Collider;
use serde::{Deserialize, Serialize};

/// Anything that owns a collider at a world position
pub trait CollisionBody {
    /// The body's collider
    fn collider(&self) -> &Collider;

    /// World-space center of the collider
    fn collision_center(&self) -> Vec3;
}

/// Two bodies found overlapping in the same frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair<K> {
    /// Body that comes first in the snapshot order
    pub first: K,
    /// Body that comes second in the snapshot order
    pub second: K,
}

/// How a frame's collision pairs are turned into game outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Only the first pair with a consequence is applied; the rest are dropped
    FirstMatch,
    /// Every pair is applied in snapshot order, skipping pairs whose bodies
    /// were already removed earlier in the same frame
    #[default]
    ResolveAll,
}

/// Circle overlap test between two bodies
///
/// Returns `true` iff `a` and `b` are distinct, both colliders are enabled
/// with a positive radius, and the planar distance between their centers is
/// less than the sum of the radii.
pub fn check_for_collision<T: CollisionBody + ?Sized>(a: &T, b: &T) -> bool {
    if std::ptr::addr_eq(a, b) {
        return false;
    }

    let (collider_a, collider_b) = (a.collider(), b.collider());
    if !collider_a.is_active() || !collider_b.is_active() {
        return false;
    }

    let distance = planar_distance(&a.collision_center(), &b.collision_center());
    distance < collider_a.radius() + collider_b.radius()
}

/// Collect every overlapping pair from a snapshot of keyed bodies
///
/// Each unordered pair is tested once; pairs come out in snapshot order.
pub fn find_overlapping_pairs<K: Copy, T: CollisionBody>(bodies: &[(K, &T)]) -> Vec<CollisionPair<K>> {
    let mut pairs = Vec::new();

    for (i, (key_a, body_a)) in bodies.iter().enumerate() {
        for (key_b, body_b) in &bodies[i + 1..] {
            if check_for_collision(*body_a, *body_b) {
                pairs.push(CollisionPair {
                    first: *key_a,
                    second: *key_b,
                });
            }
        }
    }

    pairs
}
