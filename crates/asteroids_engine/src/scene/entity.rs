//! Entity transform state and per-frame dispatch
//!
//! [`Body`] holds the kinematic state every entity shares. Its world matrix
//! is cached: every position, rotation or scale mutation marks it dirty, and
//! only [`Entity::update`] recomputes it and clears the flag. Readers between
//! a mutation and the next update see the previous frame's matrix.

use crate::assets::handles::{MaterialKey, MeshKey};
use crate::foundation::math::{compose_world_matrix, rotation_from_euler, Mat4, Vec3, FORWARD};
use crate::input::InputSource;
use crate::physics::{Collider, CollisionBody};
use crate::render::camera::Camera;
use crate::render::material::MaterialBindings;
use crate::render::mesh::Mesh;
use crate::render::particles::Emitter;
use crate::render::shader::ShaderProgram;
use crate::render::device::GraphicsDevice;
use crate::scene::asteroid::AsteroidState;
use crate::scene::bullet::BulletState;
use crate::scene::player::PlayerState;
use serde::{Deserialize, Serialize};

/// Variant tag used when asking the registry for a new entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    /// Static scenery
    #[default]
    Base,
    /// The player ship
    Player,
    /// A drifting asteroid
    Asteroid,
    /// A projectile fired by the player
    Bullet,
}

/// Shared transform and motion state
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    velocity: Vec3,
    direction: Vec3,
    max_speed: f32,
    world_matrix: Mat4,
    world_dirty: bool,
    collider: Collider,
}

impl Body {
    /// Body at the origin with unit scale, facing [`FORWARD`]
    ///
    /// Starts dirty so the first update produces its world matrix.
    pub fn new(collider: Collider) -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            velocity: Vec3::zeros(),
            direction: FORWARD,
            max_speed: 0.0,
            world_matrix: Mat4::identity(),
            world_dirty: true,
            collider,
        }
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Euler rotation in radians (pitch, yaw, roll)
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Non-uniform scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Velocity in world units per second
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Unit direction of travel
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Top speed
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// World matrix as of the last update
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    /// Whether the world matrix is stale
    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty
    }

    /// Collider
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// Mutable collider
    pub fn collider_mut(&mut self) -> &mut Collider {
        &mut self.collider
    }

    /// Teleport
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.world_dirty = true;
    }

    /// Replace the Euler rotation
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.world_dirty = true;
    }

    /// Replace the scale
    ///
    /// The collider radius is multiplied by `max(scale.x, scale.z)`, relative
    /// to whatever radius it has at the time of the call.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.collider.scale_radius(scale.x.max(scale.z));
        self.world_dirty = true;
    }

    /// Replace the velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Replace the direction; it is normalized, and a zero vector is ignored
    pub fn set_direction(&mut self, direction: Vec3) {
        if let Some(unit) = direction.try_normalize(f32::EPSILON) {
            self.direction = unit;
        }
    }

    /// Replace the top speed
    pub fn set_max_speed(&mut self, max_speed: f32) {
        self.max_speed = max_speed;
    }

    /// Move by `offset` expressed in the frame of the `orientation` Euler angles
    pub fn move_along(&mut self, orientation: &Vec3, offset: &Vec3) {
        self.position += rotation_from_euler(orientation) * offset;
        self.world_dirty = true;
    }

    /// Move by `offset` expressed in this body's local frame
    pub fn move_forward(&mut self, offset: &Vec3) {
        let orientation = self.rotation;
        self.move_along(&orientation, offset);
    }

    /// Add `delta` to the Euler rotation
    pub fn rotate_by(&mut self, delta: &Vec3) {
        self.rotation += delta;
        self.world_dirty = true;
    }

    /// Advance the position by `velocity * dt`
    pub fn integrate_velocity(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.world_dirty = true;
    }

    /// Local forward axis rotated into world space
    pub fn facing(&self) -> Vec3 {
        rotation_from_euler(&self.rotation) * FORWARD
    }

    pub(crate) fn refresh_world_matrix(&mut self) {
        if self.world_dirty {
            self.world_matrix = compose_world_matrix(&self.position, &self.rotation, &self.scale);
            self.world_dirty = false;
        }
    }
}

/// Variant-specific state
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Static scenery; only its transform is maintained
    Base,
    /// The player ship
    Player(PlayerState),
    /// A drifting asteroid
    Asteroid(AsteroidState),
    /// A projectile
    Bullet(BulletState),
}

impl EntityKind {
    /// Tag of this variant
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Base => EntityType::Base,
            Self::Player(_) => EntityType::Player,
            Self::Asteroid(_) => EntityType::Asteroid,
            Self::Bullet(_) => EntityType::Bullet,
        }
    }
}

/// What an entity asks of the registry after its update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    /// Nothing
    Idle,
    /// Spawn a bullet from this entity
    Fire,
    /// Remove this entity
    Expired,
}

/// Per-frame inputs to [`Entity::update`]
pub struct UpdateContext<'a> {
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Seconds since the simulation started
    pub total_time: f32,
    /// Keyboard poll
    pub input: &'a dyn InputSource,
    /// Exhaust emitter of the player, when one is registered
    pub exhaust: Option<&'a mut Emitter>,
}

/// A game object: shared body, variant state, and the registry keys of the
/// mesh and material it is drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: String,
    body: Body,
    kind: EntityKind,
    mesh: MeshKey,
    material: MaterialKey,
}

impl Entity {
    /// Create an entity whose collider starts as a copy of `collider`
    pub fn new(name: &str, kind: EntityKind, mesh: MeshKey, material: MaterialKey, collider: Collider) -> Self {
        Self {
            name: name.to_string(),
            body: Body::new(collider),
            kind,
            mesh,
            material,
        }
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant tag
    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// Shared body
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable shared body
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Variant state
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Mutable variant state
    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    /// Mesh key
    pub fn mesh(&self) -> MeshKey {
        self.mesh
    }

    /// Material key
    pub fn material(&self) -> MaterialKey {
        self.material
    }

    /// Advance one frame and refresh the world matrix if it is dirty
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>) -> EntityEvent {
        let event = match &mut self.kind {
            EntityKind::Base => EntityEvent::Idle,
            EntityKind::Player(player) => player.update(&mut self.body, ctx),
            EntityKind::Asteroid(asteroid) => asteroid.update(&mut self.body, ctx.delta_time),
            EntityKind::Bullet(bullet) => bullet.update(&mut self.body, ctx.delta_time),
        };

        self.body.refresh_world_matrix();
        event
    }

    /// Stage transforms and textures on the material's shaders and draw the mesh
    pub fn draw(
        &self,
        device: &mut dyn GraphicsDevice,
        mesh: &Mesh,
        vertex_shader: &mut dyn ShaderProgram,
        pixel_shader: &mut dyn ShaderProgram,
        bindings: &MaterialBindings,
        camera: &Camera,
    ) {
        vertex_shader.set_matrix4x4("view", &camera.view_matrix());
        vertex_shader.set_matrix4x4("projection", &camera.projection_matrix());
        vertex_shader.set_matrix4x4("world", self.body.world_matrix());
        bindings.apply(pixel_shader);

        vertex_shader.copy_all_buffer_data(device);
        pixel_shader.copy_all_buffer_data(device);
        vertex_shader.set_shader(device);
        pixel_shader.set_shader(device);

        mesh.draw(device);
    }
}

impl CollisionBody for Entity {
    fn collider(&self) -> &Collider {
        &self.body.collider
    }

    fn collision_center(&self) -> Vec3 {
        self.body.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants;
    use crate::input::NoInput;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn base_entity(radius: f32) -> Entity {
        let mesh = SlotMap::<MeshKey, ()>::with_key().insert(());
        let material = SlotMap::<MaterialKey, ()>::with_key().insert(());
        Entity::new("Rock", EntityKind::Base, mesh, material, Collider::new(radius))
    }

    fn step(entity: &mut Entity, dt: f32) -> EntityEvent {
        let mut ctx = UpdateContext {
            delta_time: dt,
            total_time: 0.0,
            input: &NoInput,
            exhaust: None,
        };
        entity.update(&mut ctx)
    }

    #[test]
    fn test_update_recomputes_world_once_and_clears_dirty() {
        let mut entity = base_entity(1.0);
        let position = Vec3::new(4.0, 0.0, -3.0);
        let rotation = Vec3::new(0.0, constants::PI / 3.0, 0.0);
        let scale = Vec3::new(2.0, 1.0, 0.5);

        entity.body_mut().set_position(position);
        entity.body_mut().set_rotation(rotation);
        entity.body_mut().set_scale(scale);
        assert!(entity.body().is_world_dirty());
        assert_relative_eq!(*entity.body().world_matrix(), Mat4::identity());

        step(&mut entity, 0.016);
        assert!(!entity.body().is_world_dirty());
        assert_relative_eq!(
            *entity.body().world_matrix(),
            compose_world_matrix(&position, &rotation, &scale),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_world_matrix_order_is_scale_rotate_translate() {
        let mut entity = base_entity(1.0);
        entity.body_mut().set_scale(Vec3::new(2.0, 2.0, 2.0));
        entity.body_mut().set_rotation(Vec3::new(0.0, constants::PI / 2.0, 0.0));
        entity.body_mut().set_position(Vec3::new(10.0, 0.0, 0.0));
        step(&mut entity, 0.0);

        // local +Z scaled to 2, yawed onto +X, then translated
        let world = entity.body().world_matrix().transform_point(&nalgebra::Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(world.coords, Vec3::new(12.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_set_scale_multiplies_radius_by_planar_max() {
        let mut entity = base_entity(1.5);
        entity.body_mut().set_scale(Vec3::new(2.0, 9.0, 3.0));
        assert_relative_eq!(entity.body().collider().radius(), 4.5);
    }

    #[test]
    fn test_repeated_set_scale_composes() {
        let mut entity = base_entity(1.0);
        entity.body_mut().set_scale(Vec3::new(2.0, 1.0, 2.0));
        entity.body_mut().set_scale(Vec3::new(0.5, 1.0, 0.25));
        assert_relative_eq!(entity.body().collider().radius(), 1.0);
    }

    #[test]
    fn test_move_forward_uses_local_frame() {
        let mut entity = base_entity(1.0);
        entity.body_mut().rotate_by(&Vec3::new(0.0, constants::PI / 2.0, 0.0));
        entity.body_mut().move_forward(&Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(entity.body().position(), Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert!(entity.body().is_world_dirty());
    }

    #[test]
    fn test_direction_is_normalized() {
        let mut entity = base_entity(1.0);
        entity.body_mut().set_direction(Vec3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(entity.body().direction().norm(), 1.0);
        entity.body_mut().set_direction(Vec3::zeros());
        assert_relative_eq!(entity.body().direction(), Vec3::new(0.6, 0.0, 0.8));
    }

    #[test]
    fn test_base_entity_stays_put() {
        let mut entity = base_entity(1.0);
        assert_eq!(step(&mut entity, 1.0), EntityEvent::Idle);
        assert_relative_eq!(entity.body().position(), Vec3::zeros());
        assert_eq!(entity.entity_type(), EntityType::Base);
    }
}
