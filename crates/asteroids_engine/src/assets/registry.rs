//! Resource registry
//!
//! The single owner of every named resource and every entity. Each resource
//! kind lives in its own slotmap arena next to a name index and a reference
//! count per entry:
//!
//! - `create_*` / `load_*` registers a resource under a fresh name with a
//!   count of zero. Composite resources (materials, emitters, entities) look
//!   their dependencies up by name and take one reference on each.
//! - `get_*` returns a resource and takes one reference on it.
//! - `remove_*` refuses while the count is non-zero; otherwise it destroys
//!   the resource and drops the references it held on its dependencies.
//!
//! The only teardown order in which every removal succeeds is entities,
//! emitters, materials, then meshes, shaders, textures and samplers;
//! [`ResourceRegistry::clear`] follows it.
//!
//! # Frame protocol
//!
//! [`ResourceRegistry::update_entities`] updates every entity in spawn order,
//! spawns the bullets the player asked for, collects every overlapping pair
//! over a read-only snapshot, and only then resolves the pairs according to
//! the configured [`CollisionPolicy`]. Nothing is removed while pairs are
//! being collected.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap};

use crate::assets::handles::{
    EmitterKey, EntityKey, MaterialKey, MeshKey, PixelShaderKey, SamplerKey, TextureKey,
    VertexShaderKey,
};
use crate::assets::loader::{AssetError, AssetLoader};
use crate::foundation::math::{Vec3, FORWARD};
use crate::input::InputSource;
use crate::physics::{find_overlapping_pairs, CollisionPolicy};
use crate::render::camera::Camera;
use crate::render::device::{GraphicsDevice, RenderError, SamplerDesc, SamplerState, TextureView};
use crate::render::lighting::DirectionalLight;
use crate::render::material::{Material, MaterialBindings};
use crate::render::mesh::{Mesh, Vertex};
use crate::render::particles::{Emitter, EmitterSettings};
use crate::render::shader::{ShaderProgram, UniformValue};
use crate::scene::{
    AsteroidSettings, AsteroidState, BulletSettings, BulletState, Entity, EntityEvent, EntityKind,
    EntityType, PlayerSettings, PlayerState, UpdateContext,
};

/// Kinds of resource the registry owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Mesh
    Mesh,
    /// Material
    Material,
    /// Vertex shader
    VertexShader,
    /// Pixel shader
    PixelShader,
    /// Texture (shader-resource view)
    Texture,
    /// Sampler state
    Sampler,
    /// Particle emitter
    Emitter,
    /// Entity
    Entity,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::VertexShader => "vertex shader",
            Self::PixelShader => "pixel shader",
            Self::Texture => "texture",
            Self::Sampler => "sampler",
            Self::Emitter => "emitter",
            Self::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Registry errors
///
/// These are setup errors: they come from naming mistakes while a scene is
/// being built and are not expected mid-simulation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No resource of this kind under this name
    #[error("{kind} '{name}' does not exist")]
    NotFound {
        /// Resource kind
        kind: ResourceKind,
        /// Requested name
        name: String,
    },

    /// Removal refused because something still holds a reference
    #[error("{kind} '{name}' is still referenced {count} time(s) and cannot be removed")]
    StillReferenced {
        /// Resource kind
        kind: ResourceKind,
        /// Resource name
        name: String,
        /// Outstanding references
        count: u32,
    },

    /// A composite resource names a dependency that is not registered
    #[error("{kind} '{name}' needs {dependency_kind} '{dependency}', which does not exist")]
    DependencyMissing {
        /// Kind of the resource being created
        kind: ResourceKind,
        /// Name of the resource being created
        name: String,
        /// Kind of the missing dependency
        dependency_kind: ResourceKind,
        /// Name of the missing dependency
        dependency: String,
    },

    /// The name is already taken
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// Resource kind
        kind: ResourceKind,
        /// Name in use
        name: String,
    },

    /// Device failure while creating a resource
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Loader failure while creating a resource
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Registry result type
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Variant tuning and collision behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Player ship tuning
    pub player: PlayerSettings,
    /// Asteroid tuning
    pub asteroid: AsteroidSettings,
    /// Bullet tuning
    pub bullet: BulletSettings,
    /// How collision pairs are resolved each frame
    pub collision_policy: CollisionPolicy,
    /// Seed for asteroid placement; `None` seeds from entropy
    pub seed: Option<u64>,
}

struct Entry<T> {
    name: String,
    value: T,
    refs: u32,
}

/// One arena of named, reference-counted resources
struct Table<K: Key, T> {
    kind: ResourceKind,
    entries: SlotMap<K, Entry<T>>,
    names: HashMap<String, K>,
}

impl<K: Key, T> Table<K, T> {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: SlotMap::with_key(),
            names: HashMap::new(),
        }
    }

    fn ensure_vacant(&self, name: &str) -> RegistryResult<()> {
        if self.names.contains_key(name) {
            return Err(RegistryError::AlreadyExists {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, value: T) -> RegistryResult<K> {
        self.ensure_vacant(name)?;
        let key = self.entries.insert(Entry {
            name: name.to_string(),
            value,
            refs: 0,
        });
        self.names.insert(name.to_string(), key);
        log::debug!("Created {} '{}'", self.kind, name);
        Ok(key)
    }

    fn lookup(&self, name: &str) -> RegistryResult<K> {
        self.names.get(name).copied().ok_or_else(|| RegistryError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    fn require(&self, owner: ResourceKind, owner_name: &str, name: &str) -> RegistryResult<K> {
        self.names.get(name).copied().ok_or_else(|| RegistryError::DependencyMissing {
            kind: owner,
            name: owner_name.to_string(),
            dependency_kind: self.kind,
            dependency: name.to_string(),
        })
    }

    fn retain(&mut self, key: K) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refs += 1;
        }
    }

    fn release(&mut self, key: K) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refs = entry.refs.saturating_sub(1);
        }
    }

    fn acquire(&mut self, name: &str) -> RegistryResult<K> {
        let key = self.lookup(name)?;
        self.retain(key);
        Ok(key)
    }

    fn remove(&mut self, name: &str) -> RegistryResult<T> {
        let key = self.lookup(name)?;
        let refs = self.entries.get(key).map_or(0, |entry| entry.refs);
        if refs != 0 {
            log::warn!("Refusing to remove {} '{}': {} reference(s) left", self.kind, name, refs);
            return Err(RegistryError::StillReferenced {
                kind: self.kind,
                name: name.to_string(),
                count: refs,
            });
        }

        self.names.remove(name);
        let entry = self.entries.remove(key).ok_or_else(|| RegistryError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })?;
        log::debug!("Removed {} '{}'", self.kind, name);
        Ok(entry.value)
    }

    fn get(&self, key: K) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    fn by_name(&self, name: &str) -> Option<&T> {
        self.names.get(name).and_then(|&key| self.get(key))
    }

    fn name_of(&self, key: K) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.name.as_str())
    }

    fn ref_count(&self, name: &str) -> Option<u32> {
        self.names
            .get(name)
            .and_then(|&key| self.entries.get(key))
            .map(|entry| entry.refs)
    }

    fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        self.entries.values().map(|entry| entry.name.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A key held by `owner` no longer resolves
fn dangling(kind: ResourceKind, owner: &str) -> RegistryError {
    RegistryError::NotFound {
        kind,
        name: format!("<{} of '{}'>", kind, owner),
    }
}

enum Outcome {
    Destroy { bullet: EntityKey, asteroid: EntityKey },
    GameOver,
}

/// Owner of every mesh, material, shader, texture, sampler, emitter and entity
pub struct ResourceRegistry {
    settings: RegistrySettings,

    meshes: Table<MeshKey, Mesh>,
    materials: Table<MaterialKey, Material>,
    vertex_shaders: Table<VertexShaderKey, Box<dyn ShaderProgram>>,
    pixel_shaders: Table<PixelShaderKey, Box<dyn ShaderProgram>>,
    textures: Table<TextureKey, TextureView>,
    samplers: Table<SamplerKey, SamplerState>,
    emitters: Table<EmitterKey, Emitter>,
    entities: Table<EntityKey, Entity>,

    spawn_order: Vec<EntityKey>,
    player: Option<EntityKey>,
    exhaust: Option<EmitterKey>,
    explosion: Option<EmitterKey>,
    bullets_spawned: u64,
    rng: StdRng,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("meshes", &self.meshes.len())
            .field("materials", &self.materials.len())
            .field("vertex_shaders", &self.vertex_shaders.len())
            .field("pixel_shaders", &self.pixel_shaders.len())
            .field("textures", &self.textures.len())
            .field("samplers", &self.samplers.len())
            .field("emitters", &self.emitters.len())
            .field("entities", &self.entities.len())
            .finish()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new(settings: RegistrySettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            settings,
            meshes: Table::new(ResourceKind::Mesh),
            materials: Table::new(ResourceKind::Material),
            vertex_shaders: Table::new(ResourceKind::VertexShader),
            pixel_shaders: Table::new(ResourceKind::PixelShader),
            textures: Table::new(ResourceKind::Texture),
            samplers: Table::new(ResourceKind::Sampler),
            emitters: Table::new(ResourceKind::Emitter),
            entities: Table::new(ResourceKind::Entity),
            spawn_order: Vec::new(),
            player: None,
            exhaust: None,
            explosion: None,
            bullets_spawned: 0,
            rng,
        }
    }

    /// Settings in use
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Change how collision pairs are resolved
    pub fn set_collision_policy(&mut self, policy: CollisionPolicy) {
        self.settings.collision_policy = policy;
    }

    // ---------------------------------------------------------------
    // Leaf resources
    // ---------------------------------------------------------------

    /// Upload geometry and register it as a mesh
    pub fn create_mesh(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> RegistryResult<MeshKey> {
        self.meshes.ensure_vacant(name)?;
        let mesh = Mesh::from_geometry(device, vertices, indices)?;
        self.meshes.insert(name, mesh)
    }

    /// Load a model file and register it as a mesh
    pub fn load_mesh(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        loader: &mut dyn AssetLoader,
        path: &str,
    ) -> RegistryResult<MeshKey> {
        self.meshes.ensure_vacant(name)?;
        let mesh = loader.load_mesh(device, path)?;
        self.meshes.insert(name, mesh)
    }

    /// Register an already compiled vertex shader
    pub fn create_vertex_shader(&mut self, name: &str, shader: Box<dyn ShaderProgram>) -> RegistryResult<VertexShaderKey> {
        self.vertex_shaders.insert(name, shader)
    }

    /// Load and register a vertex shader
    pub fn load_vertex_shader(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        loader: &mut dyn AssetLoader,
        path: &str,
    ) -> RegistryResult<VertexShaderKey> {
        self.vertex_shaders.ensure_vacant(name)?;
        let shader = loader.load_vertex_shader(device, path)?;
        self.vertex_shaders.insert(name, shader)
    }

    /// Register an already compiled pixel shader
    pub fn create_pixel_shader(&mut self, name: &str, shader: Box<dyn ShaderProgram>) -> RegistryResult<PixelShaderKey> {
        self.pixel_shaders.insert(name, shader)
    }

    /// Load and register a pixel shader
    pub fn load_pixel_shader(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        loader: &mut dyn AssetLoader,
        path: &str,
    ) -> RegistryResult<PixelShaderKey> {
        self.pixel_shaders.ensure_vacant(name)?;
        let shader = loader.load_pixel_shader(device, path)?;
        self.pixel_shaders.insert(name, shader)
    }

    /// Upload RGBA8 pixels and register the texture view
    pub fn create_texture(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RegistryResult<TextureKey> {
        self.textures.ensure_vacant(name)?;
        let view = device.create_texture(width, height, pixels)?;
        self.textures.insert(name, view)
    }

    /// Load an image file and register the texture view
    pub fn load_texture(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        loader: &mut dyn AssetLoader,
        path: &str,
    ) -> RegistryResult<TextureKey> {
        self.textures.ensure_vacant(name)?;
        let view = loader.load_texture(device, path)?;
        self.textures.insert(name, view)
    }

    /// Create and register a sampler state
    pub fn create_sampler(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        desc: &SamplerDesc,
    ) -> RegistryResult<SamplerKey> {
        self.samplers.ensure_vacant(name)?;
        let sampler = device.create_sampler(desc)?;
        self.samplers.insert(name, sampler)
    }

    // ---------------------------------------------------------------
    // Composite resources
    // ---------------------------------------------------------------

    /// Create a material from registered shaders, texture and sampler
    pub fn create_material(
        &mut self,
        name: &str,
        vertex_shader: &str,
        pixel_shader: &str,
        texture: &str,
        sampler: &str,
    ) -> RegistryResult<MaterialKey> {
        self.build_material(name, vertex_shader, pixel_shader, texture, None, sampler)
    }

    /// Create a material that also binds a normal map
    pub fn create_material_with_normal(
        &mut self,
        name: &str,
        vertex_shader: &str,
        pixel_shader: &str,
        texture: &str,
        normal_map: &str,
        sampler: &str,
    ) -> RegistryResult<MaterialKey> {
        self.build_material(name, vertex_shader, pixel_shader, texture, Some(normal_map), sampler)
    }

    fn build_material(
        &mut self,
        name: &str,
        vertex_shader: &str,
        pixel_shader: &str,
        texture: &str,
        normal_map: Option<&str>,
        sampler: &str,
    ) -> RegistryResult<MaterialKey> {
        const KIND: ResourceKind = ResourceKind::Material;
        self.materials.ensure_vacant(name)?;

        // validate everything before taking any reference
        let material = Material {
            vertex_shader: self.vertex_shaders.require(KIND, name, vertex_shader)?,
            pixel_shader: self.pixel_shaders.require(KIND, name, pixel_shader)?,
            base_color: self.textures.require(KIND, name, texture)?,
            normal_map: normal_map
                .map(|normal| self.textures.require(KIND, name, normal))
                .transpose()?,
            sampler: self.samplers.require(KIND, name, sampler)?,
            uniforms: Vec::new(),
        };

        self.vertex_shaders.retain(material.vertex_shader);
        self.pixel_shaders.retain(material.pixel_shader);
        self.textures.retain(material.base_color);
        if let Some(normal) = material.normal_map {
            self.textures.retain(normal);
        }
        self.samplers.retain(material.sampler);

        self.materials.insert(name, material)
    }

    /// Set a named pixel shader uniform pushed whenever the material is drawn
    pub fn set_material_uniform(&mut self, material: &str, uniform: &str, value: UniformValue) -> RegistryResult<()> {
        let key = self.materials.lookup(material)?;
        if let Some(material) = self.materials.get_mut(key) {
            material.set_uniform(uniform, value);
        }
        Ok(())
    }

    /// Create a particle emitter drawn with registered shaders and texture
    pub fn create_emitter(
        &mut self,
        name: &str,
        device: &mut dyn GraphicsDevice,
        settings: &EmitterSettings,
        vertex_shader: &str,
        pixel_shader: &str,
        texture: &str,
    ) -> RegistryResult<EmitterKey> {
        const KIND: ResourceKind = ResourceKind::Emitter;
        self.emitters.ensure_vacant(name)?;

        let vs = self.vertex_shaders.require(KIND, name, vertex_shader)?;
        let ps = self.pixel_shaders.require(KIND, name, pixel_shader)?;
        let tex = self.textures.require(KIND, name, texture)?;

        let emitter = Emitter::new(device, settings, vs, ps, tex)?;
        self.vertex_shaders.retain(vs);
        self.pixel_shaders.retain(ps);
        self.textures.retain(tex);

        self.emitters.insert(name, emitter)
    }

    /// Use the named emitter as the player's exhaust
    ///
    /// Takes a reference on the emitter until [`Self::detach_effect_emitters`].
    pub fn set_exhaust_emitter(&mut self, name: &str) -> RegistryResult<()> {
        let key = self.emitters.acquire(name)?;
        if let Some(previous) = self.exhaust.replace(key) {
            self.emitters.release(previous);
        }
        Ok(())
    }

    /// Use the named emitter for bullet impacts
    ///
    /// Takes a reference on the emitter until [`Self::detach_effect_emitters`].
    pub fn set_explosion_emitter(&mut self, name: &str) -> RegistryResult<()> {
        let key = self.emitters.acquire(name)?;
        if let Some(previous) = self.explosion.replace(key) {
            self.emitters.release(previous);
        }
        Ok(())
    }

    /// Drop the exhaust and explosion emitter references
    pub fn detach_effect_emitters(&mut self) {
        if let Some(key) = self.exhaust.take() {
            self.emitters.release(key);
        }
        if let Some(key) = self.explosion.take() {
            self.emitters.release(key);
        }
    }

    // ---------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------

    /// Create an entity of the given variant
    ///
    /// Asteroids are placed in the spawn ring. Bullets copy the current
    /// player's position, pushed forward along its facing, and its direction;
    /// with no player they start at the origin heading along +Z. A player
    /// becomes the registry's player and receives the exhaust emitter.
    pub fn create_entity(
        &mut self,
        name: &str,
        mesh: &str,
        material: &str,
        entity_type: EntityType,
    ) -> RegistryResult<EntityKey> {
        const KIND: ResourceKind = ResourceKind::Entity;
        self.entities.ensure_vacant(name)?;
        let mesh_key = self.meshes.require(KIND, name, mesh)?;
        let material_key = self.materials.require(KIND, name, material)?;

        let collider = self.meshes.get(mesh_key).map(Mesh::collider).unwrap_or_default();
        let mut entity = Entity::new(name, EntityKind::Base, mesh_key, material_key, collider);

        let kind = match entity_type {
            EntityType::Base => EntityKind::Base,
            EntityType::Player => EntityKind::Player(PlayerState::new(self.settings.player.clone())),
            EntityType::Asteroid => EntityKind::Asteroid(AsteroidState::spawn(
                entity.body_mut(),
                &self.settings.asteroid,
                &mut self.rng,
            )),
            EntityType::Bullet => {
                let (origin, direction) = self
                    .player
                    .and_then(|key| self.entities.get(key))
                    .map_or((Vec3::zeros(), FORWARD), |player| {
                        (player.body().position(), player.body().direction())
                    });
                let settings = &self.settings.bullet;
                BulletState::launch(entity.body_mut(), &origin, &direction, settings);
                entity.body_mut().set_scale(Vec3::repeat(settings.scale));
                EntityKind::Bullet(BulletState::new(settings.lifetime))
            }
        };
        *entity.kind_mut() = kind;

        self.meshes.retain(mesh_key);
        self.materials.retain(material_key);
        let key = self.entities.insert(name, entity)?;
        self.spawn_order.push(key);

        if entity_type == EntityType::Player {
            if let Some(previous) = self.player.replace(key) {
                log::warn!(
                    "Player '{}' replaces '{}'",
                    name,
                    self.entities.name_of(previous).unwrap_or("<removed>")
                );
            }
        }

        Ok(key)
    }

    /// Look up an entity
    pub fn get_entity(&self, name: &str) -> RegistryResult<&Entity> {
        let key = self.entities.lookup(name)?;
        self.entities.get(key).ok_or_else(|| dangling(ResourceKind::Entity, name))
    }

    /// Look up an entity for mutation
    pub fn get_entity_mut(&mut self, name: &str) -> RegistryResult<&mut Entity> {
        let key = self.entities.lookup(name)?;
        match self.entities.get_mut(key) {
            Some(entity) => Ok(entity),
            None => Err(RegistryError::NotFound {
                kind: ResourceKind::Entity,
                name: name.to_string(),
            }),
        }
    }

    /// Destroy an entity and drop its mesh and material references
    pub fn remove_entity(&mut self, name: &str) -> RegistryResult<()> {
        let key = self.entities.lookup(name)?;
        let entity = self.entities.remove(name)?;
        self.forget_entity(key, &entity);
        Ok(())
    }

    fn remove_entity_by_key(&mut self, key: EntityKey) {
        let Some(name) = self.entities.name_of(key).map(str::to_string) else {
            return;
        };
        if let Err(e) = self.remove_entity(&name) {
            log::warn!("Failed to remove entity '{}': {}", name, e);
        }
    }

    fn forget_entity(&mut self, key: EntityKey, entity: &Entity) {
        self.meshes.release(entity.mesh());
        self.materials.release(entity.material());
        self.spawn_order.retain(|&k| k != key);
        if self.player == Some(key) {
            self.player = None;
        }
    }

    /// Destroy every entity
    pub fn remove_all_entities(&mut self) {
        for key in std::mem::take(&mut self.spawn_order) {
            self.remove_entity_by_key(key);
        }
        self.player = None;
    }

    /// Entity names in spawn order
    pub fn entity_names(&self) -> Vec<String> {
        self.spawn_order
            .iter()
            .filter_map(|&key| self.entities.name_of(key).map(str::to_string))
            .collect()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live entities of one variant
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.entities
            .entries
            .values()
            .filter(|entry| entry.value.entity_type() == entity_type)
            .count()
    }

    /// The player entity, if one exists
    pub fn player(&self) -> Option<&Entity> {
        self.player.and_then(|key| self.entities.get(key))
    }

    // ---------------------------------------------------------------
    // Counted lookups
    // ---------------------------------------------------------------

    /// Look up a mesh and take a reference on it
    pub fn get_mesh(&mut self, name: &str) -> RegistryResult<&Mesh> {
        let key = self.meshes.acquire(name)?;
        self.meshes.get(key).ok_or_else(|| dangling(ResourceKind::Mesh, name))
    }

    /// Look up a material and take a reference on it
    pub fn get_material(&mut self, name: &str) -> RegistryResult<&Material> {
        let key = self.materials.acquire(name)?;
        self.materials.get(key).ok_or_else(|| dangling(ResourceKind::Material, name))
    }

    /// Look up a vertex shader and take a reference on it
    pub fn get_vertex_shader(&mut self, name: &str) -> RegistryResult<&mut dyn ShaderProgram> {
        let key = self.vertex_shaders.acquire(name)?;
        match self.vertex_shaders.get_mut(key) {
            Some(shader) => Ok(shader.as_mut()),
            None => Err(RegistryError::NotFound {
                kind: ResourceKind::VertexShader,
                name: name.to_string(),
            }),
        }
    }

    /// Look up a pixel shader and take a reference on it
    pub fn get_pixel_shader(&mut self, name: &str) -> RegistryResult<&mut dyn ShaderProgram> {
        let key = self.pixel_shaders.acquire(name)?;
        match self.pixel_shaders.get_mut(key) {
            Some(shader) => Ok(shader.as_mut()),
            None => Err(RegistryError::NotFound {
                kind: ResourceKind::PixelShader,
                name: name.to_string(),
            }),
        }
    }

    /// Look up a texture view and take a reference on it
    pub fn get_texture(&mut self, name: &str) -> RegistryResult<TextureView> {
        let key = self.textures.acquire(name)?;
        self.textures.get(key).copied().ok_or_else(|| dangling(ResourceKind::Texture, name))
    }

    /// Look up a sampler and take a reference on it
    pub fn get_sampler(&mut self, name: &str) -> RegistryResult<SamplerState> {
        let key = self.samplers.acquire(name)?;
        self.samplers.get(key).copied().ok_or_else(|| dangling(ResourceKind::Sampler, name))
    }

    /// Look up an emitter and take a reference on it
    pub fn get_emitter(&mut self, name: &str) -> RegistryResult<&mut Emitter> {
        let key = self.emitters.acquire(name)?;
        match self.emitters.get_mut(key) {
            Some(emitter) => Ok(emitter),
            None => Err(RegistryError::NotFound {
                kind: ResourceKind::Emitter,
                name: name.to_string(),
            }),
        }
    }

    /// Give back a reference taken with one of the `get_*` lookups
    pub fn release(&mut self, kind: ResourceKind, name: &str) -> RegistryResult<()> {
        match kind {
            ResourceKind::Mesh => self.meshes.lookup(name).map(|k| self.meshes.release(k)),
            ResourceKind::Material => self.materials.lookup(name).map(|k| self.materials.release(k)),
            ResourceKind::VertexShader => self.vertex_shaders.lookup(name).map(|k| self.vertex_shaders.release(k)),
            ResourceKind::PixelShader => self.pixel_shaders.lookup(name).map(|k| self.pixel_shaders.release(k)),
            ResourceKind::Texture => self.textures.lookup(name).map(|k| self.textures.release(k)),
            ResourceKind::Sampler => self.samplers.lookup(name).map(|k| self.samplers.release(k)),
            ResourceKind::Emitter => self.emitters.lookup(name).map(|k| self.emitters.release(k)),
            ResourceKind::Entity => self.entities.lookup(name).map(|_| ()),
        }
    }

    /// Emitter by name, without taking a reference
    pub fn emitter(&self, name: &str) -> Option<&Emitter> {
        self.emitters.by_name(name)
    }

    /// Mesh by name, without taking a reference
    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.by_name(name)
    }

    /// Material by name, without taking a reference
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.by_name(name)
    }

    /// Current reference count of a resource
    pub fn ref_count(&self, kind: ResourceKind, name: &str) -> Option<u32> {
        match kind {
            ResourceKind::Mesh => self.meshes.ref_count(name),
            ResourceKind::Material => self.materials.ref_count(name),
            ResourceKind::VertexShader => self.vertex_shaders.ref_count(name),
            ResourceKind::PixelShader => self.pixel_shaders.ref_count(name),
            ResourceKind::Texture => self.textures.ref_count(name),
            ResourceKind::Sampler => self.samplers.ref_count(name),
            ResourceKind::Emitter => self.emitters.ref_count(name),
            ResourceKind::Entity => self.entities.ref_count(name),
        }
    }

    /// Whether a resource of this kind is registered under `name`
    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        match kind {
            ResourceKind::Mesh => self.meshes.contains(name),
            ResourceKind::Material => self.materials.contains(name),
            ResourceKind::VertexShader => self.vertex_shaders.contains(name),
            ResourceKind::PixelShader => self.pixel_shaders.contains(name),
            ResourceKind::Texture => self.textures.contains(name),
            ResourceKind::Sampler => self.samplers.contains(name),
            ResourceKind::Emitter => self.emitters.contains(name),
            ResourceKind::Entity => self.entities.contains(name),
        }
    }

    /// Whether nothing at all is registered
    pub fn is_empty(&self) -> bool {
        self.meshes.len()
            + self.materials.len()
            + self.vertex_shaders.len()
            + self.pixel_shaders.len()
            + self.textures.len()
            + self.samplers.len()
            + self.emitters.len()
            + self.entities.len()
            == 0
    }

    // ---------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------

    /// Destroy an unreferenced mesh
    pub fn remove_mesh(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> RegistryResult<()> {
        self.meshes.remove(name)?.release(device);
        Ok(())
    }

    /// Destroy an unreferenced material and drop its dependency references
    pub fn remove_material(&mut self, name: &str) -> RegistryResult<()> {
        let material = self.materials.remove(name)?;
        self.vertex_shaders.release(material.vertex_shader);
        self.pixel_shaders.release(material.pixel_shader);
        self.textures.release(material.base_color);
        if let Some(normal) = material.normal_map {
            self.textures.release(normal);
        }
        self.samplers.release(material.sampler);
        Ok(())
    }

    /// Destroy an unreferenced vertex shader
    pub fn remove_vertex_shader(&mut self, name: &str) -> RegistryResult<()> {
        self.vertex_shaders.remove(name).map(drop)
    }

    /// Destroy an unreferenced pixel shader
    pub fn remove_pixel_shader(&mut self, name: &str) -> RegistryResult<()> {
        self.pixel_shaders.remove(name).map(drop)
    }

    /// Destroy an unreferenced texture
    pub fn remove_texture(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> RegistryResult<()> {
        let view = self.textures.remove(name)?;
        device.release_texture(view);
        Ok(())
    }

    /// Destroy an unreferenced sampler
    pub fn remove_sampler(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> RegistryResult<()> {
        let sampler = self.samplers.remove(name)?;
        device.release_sampler(sampler);
        Ok(())
    }

    /// Destroy an unreferenced emitter and drop its dependency references
    pub fn remove_emitter(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> RegistryResult<()> {
        let emitter = self.emitters.remove(name)?;
        self.vertex_shaders.release(emitter.vertex_shader());
        self.pixel_shaders.release(emitter.pixel_shader());
        self.textures.release(emitter.texture());
        emitter.release(device);
        Ok(())
    }

    /// Destroy everything, dependents before dependencies
    ///
    /// Stops at the first resource that something outside the registry still
    /// holds a reference to.
    pub fn clear(&mut self, device: &mut dyn GraphicsDevice) -> RegistryResult<()> {
        self.detach_effect_emitters();
        self.remove_all_entities();

        for name in self.emitters.names() {
            self.remove_emitter(&name, device)?;
        }
        for name in self.materials.names() {
            self.remove_material(&name)?;
        }
        for name in self.meshes.names() {
            self.remove_mesh(&name, device)?;
        }
        for name in self.vertex_shaders.names() {
            self.remove_vertex_shader(&name)?;
        }
        for name in self.pixel_shaders.names() {
            self.remove_pixel_shader(&name)?;
        }
        for name in self.textures.names() {
            self.remove_texture(&name, device)?;
        }
        for name in self.samplers.names() {
            self.remove_sampler(&name, device)?;
        }

        log::info!("Resource registry cleared");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Frame
    // ---------------------------------------------------------------

    /// Advance every entity one step and resolve collisions
    ///
    /// Returns `true` when the player touched an asteroid. Bullet–asteroid
    /// pairs destroy both entities and trigger the explosion emitter at the
    /// asteroid. Expired bullets are removed last.
    pub fn update_entities(&mut self, delta_time: f32, total_time: f32, input: &dyn InputSource) -> bool {
        let mut fired = Vec::new();
        let mut expired = HashSet::new();

        for key in self.spawn_order.clone() {
            let Some(entity) = self.entities.get_mut(key) else {
                continue;
            };
            let exhaust = match (self.exhaust, entity.entity_type()) {
                (Some(emitter), EntityType::Player) => self.emitters.get_mut(emitter),
                _ => None,
            };
            let mut ctx = UpdateContext {
                delta_time,
                total_time,
                input,
                exhaust,
            };

            match entity.update(&mut ctx) {
                EntityEvent::Idle => {}
                EntityEvent::Fire => fired.push(key),
                EntityEvent::Expired => {
                    expired.insert(key);
                }
            }
        }

        for _shooter in fired {
            self.spawn_bullet(total_time, input);
        }

        let game_over = self.resolve_collisions(&expired);

        for key in expired {
            self.remove_entity_by_key(key);
        }

        game_over
    }

    fn spawn_bullet(&mut self, total_time: f32, input: &dyn InputSource) {
        let mut name = format!("Bullet_{}", self.bullets_spawned);
        while self.entities.contains(&name) {
            self.bullets_spawned += 1;
            name = format!("Bullet_{}", self.bullets_spawned);
        }
        self.bullets_spawned += 1;

        let (mesh, material) = (self.settings.bullet.mesh.clone(), self.settings.bullet.material.clone());
        match self.create_entity(&name, &mesh, &material, EntityType::Bullet) {
            Ok(key) => {
                // zero-length step so the bullet is drawn where it spawned
                if let Some(bullet) = self.entities.get_mut(key) {
                    bullet.update(&mut UpdateContext {
                        delta_time: 0.0,
                        total_time,
                        input,
                        exhaust: None,
                    });
                }
            }
            Err(e) => log::warn!("Could not spawn bullet: {}", e),
        }
    }

    fn resolve_collisions(&mut self, excluded: &HashSet<EntityKey>) -> bool {
        let snapshot: Vec<(EntityKey, &Entity)> = self
            .spawn_order
            .iter()
            .filter(|key| !excluded.contains(key))
            .filter_map(|&key| self.entities.get(key).map(|entity| (key, entity)))
            .collect();
        let pairs = find_overlapping_pairs(&snapshot);

        let type_of = |key: EntityKey| self.entities.get(key).map(Entity::entity_type);
        let mut outcomes = Vec::new();
        let mut doomed = HashSet::new();

        for pair in pairs {
            if doomed.contains(&pair.first) || doomed.contains(&pair.second) {
                continue;
            }

            let outcome = match (type_of(pair.first), type_of(pair.second)) {
                (Some(EntityType::Bullet), Some(EntityType::Asteroid)) => Outcome::Destroy {
                    bullet: pair.first,
                    asteroid: pair.second,
                },
                (Some(EntityType::Asteroid), Some(EntityType::Bullet)) => Outcome::Destroy {
                    bullet: pair.second,
                    asteroid: pair.first,
                },
                (Some(EntityType::Player), Some(EntityType::Asteroid))
                | (Some(EntityType::Asteroid), Some(EntityType::Player)) => Outcome::GameOver,
                _ => continue,
            };

            if let Outcome::Destroy { bullet, asteroid } = outcome {
                doomed.insert(bullet);
                doomed.insert(asteroid);
            }
            outcomes.push(outcome);

            if self.settings.collision_policy == CollisionPolicy::FirstMatch {
                break;
            }
        }

        let mut game_over = false;
        for outcome in outcomes {
            match outcome {
                Outcome::GameOver => {
                    log::info!("Player hit an asteroid");
                    game_over = true;
                }
                Outcome::Destroy { bullet, asteroid } => {
                    let impact = self.entities.get(asteroid).map(|entity| entity.body().position());
                    log::info!(
                        "'{}' destroyed '{}'",
                        self.entities.name_of(bullet).unwrap_or("?"),
                        self.entities.name_of(asteroid).unwrap_or("?")
                    );
                    if let (Some(position), Some(emitter)) =
                        (impact, self.explosion.and_then(|key| self.emitters.get_mut(key)))
                    {
                        emitter.explode(position);
                    }
                    self.remove_entity_by_key(bullet);
                    self.remove_entity_by_key(asteroid);
                }
            }
        }

        game_over
    }

    /// Advance every emitter
    pub fn update_emitters(&mut self, delta_time: f32) {
        for entry in self.emitters.entries.values_mut() {
            entry.value.update(delta_time);
        }
    }

    /// Draw every entity with the given lights
    pub fn draw_entities(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &Camera,
        lights: &[DirectionalLight],
    ) -> RegistryResult<()> {
        let light_bytes: &[u8] = bytemuck::cast_slice(lights);

        for &key in &self.spawn_order {
            let Some(entity) = self.entities.get(key) else {
                continue;
            };
            let owner = entity.name();
            let mesh = self
                .meshes
                .get(entity.mesh())
                .ok_or_else(|| dangling(ResourceKind::Mesh, owner))?;
            let material = self
                .materials
                .get(entity.material())
                .ok_or_else(|| dangling(ResourceKind::Material, owner))?;
            let bindings = MaterialBindings {
                base_color: self
                    .textures
                    .get(material.base_color)
                    .copied()
                    .ok_or_else(|| dangling(ResourceKind::Texture, owner))?,
                normal_map: material.normal_map.and_then(|normal| self.textures.get(normal).copied()),
                sampler: self
                    .samplers
                    .get(material.sampler)
                    .copied()
                    .ok_or_else(|| dangling(ResourceKind::Sampler, owner))?,
            };
            let vertex_shader = self
                .vertex_shaders
                .get_mut(material.vertex_shader)
                .ok_or_else(|| dangling(ResourceKind::VertexShader, owner))?;
            let pixel_shader = self
                .pixel_shaders
                .get_mut(material.pixel_shader)
                .ok_or_else(|| dangling(ResourceKind::PixelShader, owner))?;

            pixel_shader.set_data("lights", light_bytes);
            for (name, value) in &material.uniforms {
                value.apply(pixel_shader.as_mut(), name);
            }

            entity.draw(device, mesh, vertex_shader.as_mut(), pixel_shader.as_mut(), &bindings, camera);
        }

        Ok(())
    }

    /// Draw every emitter that has living particles
    pub fn draw_emitters(&mut self, device: &mut dyn GraphicsDevice, camera: &Camera) -> RegistryResult<()> {
        for entry in self.emitters.entries.values_mut() {
            let emitter = &mut entry.value;
            let owner = entry.name.as_str();

            let texture = self
                .textures
                .get(emitter.texture())
                .copied()
                .ok_or_else(|| dangling(ResourceKind::Texture, owner))?;
            let vertex_shader = self
                .vertex_shaders
                .get_mut(emitter.vertex_shader())
                .ok_or_else(|| dangling(ResourceKind::VertexShader, owner))?;
            let pixel_shader = self
                .pixel_shaders
                .get_mut(emitter.pixel_shader())
                .ok_or_else(|| dangling(ResourceKind::PixelShader, owner))?;

            emitter.draw(device, vertex_shader.as_mut(), pixel_shader.as_mut(), texture, camera)?;
        }
        Ok(())
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        if !self.is_empty() {
            log::warn!("Resource registry dropped without clear(); GPU resources were not released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, KeyboardState, NoInput};
    use crate::render::headless::{HeadlessDevice, HeadlessShader};
    use crate::render::mesh::sphere_geometry;
    use approx::assert_relative_eq;

    fn stocked(device: &mut HeadlessDevice) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new(RegistrySettings {
            seed: Some(7),
            ..RegistrySettings::default()
        });
        let (vertices, indices) = sphere_geometry(8, 16);
        registry.create_mesh("Sphere_Mesh", device, &vertices, &indices).unwrap();
        registry.create_vertex_shader("VS", Box::new(HeadlessShader::new("vs"))).unwrap();
        registry.create_pixel_shader("PS", Box::new(HeadlessShader::new("ps"))).unwrap();
        registry.create_texture("Snow", device, 1, 1, &[255; 4]).unwrap();
        registry.create_sampler("Sampler", device, &SamplerDesc::default()).unwrap();
        registry.create_material("Snow_Material", "VS", "PS", "Snow", "Sampler").unwrap();
        registry
    }

    fn place(registry: &mut ResourceRegistry, name: &str, position: Vec3) {
        let body = registry.get_entity_mut(name).unwrap().body_mut();
        body.set_position(position);
        body.set_velocity(Vec3::zeros());
    }

    #[test]
    fn test_material_holds_references_on_its_dependencies() {
        let mut device = HeadlessDevice::new();
        let registry = stocked(&mut device);

        for (kind, name) in [
            (ResourceKind::VertexShader, "VS"),
            (ResourceKind::PixelShader, "PS"),
            (ResourceKind::Texture, "Snow"),
            (ResourceKind::Sampler, "Sampler"),
        ] {
            assert_eq!(registry.ref_count(kind, name), Some(1), "{kind} {name}");
        }
        assert_eq!(registry.ref_count(ResourceKind::Material, "Snow_Material"), Some(0));
    }

    #[test]
    fn test_failed_material_takes_no_references() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);

        let err = registry.create_material("Broken", "VS", "PS", "Missing", "Sampler").unwrap_err();
        assert_eq!(
            err,
            RegistryError::DependencyMissing {
                kind: ResourceKind::Material,
                name: "Broken".to_string(),
                dependency_kind: ResourceKind::Texture,
                dependency: "Missing".to_string(),
            }
        );
        assert!(!registry.contains(ResourceKind::Material, "Broken"));
        assert_eq!(registry.ref_count(ResourceKind::VertexShader, "VS"), Some(1));
    }

    #[test]
    fn test_duplicate_names_are_rejected_before_device_work() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        let textures = device.live_texture_count();

        let err = registry.create_texture("Snow", &mut device, 1, 1, &[0; 4]).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { kind: ResourceKind::Texture, .. }));
        assert_eq!(device.live_texture_count(), textures);
    }

    #[test]
    fn test_get_counts_and_release_gives_back() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);

        registry.get_mesh("Sphere_Mesh").unwrap();
        assert_eq!(registry.ref_count(ResourceKind::Mesh, "Sphere_Mesh"), Some(1));
        assert!(matches!(
            registry.remove_mesh("Sphere_Mesh", &mut device),
            Err(RegistryError::StillReferenced { count: 1, .. })
        ));

        registry.release(ResourceKind::Mesh, "Sphere_Mesh").unwrap();
        registry.remove_mesh("Sphere_Mesh", &mut device).unwrap();
        assert!(matches!(
            registry.get_mesh("Sphere_Mesh"),
            Err(RegistryError::NotFound { kind: ResourceKind::Mesh, .. })
        ));
    }

    #[test]
    fn test_bullet_spawns_ahead_of_player() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry
            .create_entity("Player", "Sphere_Mesh", "Snow_Material", EntityType::Player)
            .unwrap();
        place(&mut registry, "Player", Vec3::new(2.0, 0.0, 0.0));

        registry
            .create_entity("Shot", "Sphere_Mesh", "Snow_Material", EntityType::Bullet)
            .unwrap();
        let bullet = registry.get_entity("Shot").unwrap().body();
        assert_relative_eq!(bullet.position(), Vec3::new(2.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(bullet.direction(), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(bullet.collider().radius(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_fire_spawns_named_bullet() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry
            .create_entity("Player", "Sphere_Mesh", "Snow_Material", EntityType::Player)
            .unwrap();

        let mut keyboard = KeyboardState::new();
        keyboard.handle_key(KeyCode::Space, true);
        assert!(!registry.update_entities(0.016, 0.016, &keyboard));

        assert_eq!(registry.entity_names(), vec!["Player".to_string(), "Bullet_0".to_string()]);
        let bullet = registry.get_entity("Bullet_0").unwrap();
        assert!(!bullet.body().is_world_dirty());
        assert_eq!(registry.ref_count(ResourceKind::Mesh, "Sphere_Mesh"), Some(2));
    }

    #[test]
    fn test_expired_bullets_are_removed() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry
            .create_entity("Shot", "Sphere_Mesh", "Snow_Material", EntityType::Bullet)
            .unwrap();

        assert!(!registry.update_entities(1.0, 1.0, &NoInput));
        assert!(registry.contains(ResourceKind::Entity, "Shot"));
        assert!(!registry.update_entities(2.5, 3.5, &NoInput));
        assert!(!registry.contains(ResourceKind::Entity, "Shot"));
        assert_eq!(registry.ref_count(ResourceKind::Material, "Snow_Material"), Some(0));
    }

    #[test]
    fn test_first_match_resolves_one_pair_per_frame() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry.set_collision_policy(CollisionPolicy::FirstMatch);

        for (name, kind, x) in [
            ("Rock_A", EntityType::Asteroid, 0.0),
            ("Shot_A", EntityType::Bullet, 0.0),
            ("Rock_B", EntityType::Asteroid, 50.0),
            ("Shot_B", EntityType::Bullet, 50.0),
        ] {
            registry.create_entity(name, "Sphere_Mesh", "Snow_Material", kind).unwrap();
            place(&mut registry, name, Vec3::new(x, 0.0, 0.0));
        }

        assert!(!registry.update_entities(0.0, 0.0, &NoInput));
        assert_eq!(registry.entity_names(), vec!["Rock_B".to_string(), "Shot_B".to_string()]);

        assert!(!registry.update_entities(0.0, 0.0, &NoInput));
        assert_eq!(registry.entity_count(), 0);
    }

    #[test]
    fn test_resolve_all_keeps_going_after_game_over() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);

        for (name, kind, x) in [
            ("Player", EntityType::Player, 0.0),
            ("Rock_A", EntityType::Asteroid, 0.5),
            ("Rock_B", EntityType::Asteroid, 40.0),
            ("Shot", EntityType::Bullet, 40.0),
        ] {
            registry.create_entity(name, "Sphere_Mesh", "Snow_Material", kind).unwrap();
            place(&mut registry, name, Vec3::new(x, 0.0, 0.0));
        }

        assert!(registry.update_entities(0.0, 0.0, &NoInput));
        assert_eq!(registry.entity_names(), vec!["Player".to_string(), "Rock_A".to_string()]);
    }

    #[test]
    fn test_removing_player_clears_player_slot() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry
            .create_entity("Player", "Sphere_Mesh", "Snow_Material", EntityType::Player)
            .unwrap();
        assert!(registry.player().is_some());

        registry.remove_entity("Player").unwrap();
        assert!(registry.player().is_none());
        assert_eq!(registry.count_of(EntityType::Player), 0);
    }

    #[test]
    fn test_draw_entities_pushes_lights_and_transforms() {
        let mut device = HeadlessDevice::new();
        let mut registry = ResourceRegistry::new(RegistrySettings::default());
        let vs = HeadlessShader::new("vs");
        let ps = HeadlessShader::new("ps");
        let (vs_record, ps_record) = (vs.record(), ps.record());

        let (vertices, indices) = sphere_geometry(4, 4);
        registry.create_mesh("Mesh", &mut device, &vertices, &indices).unwrap();
        registry.create_vertex_shader("VS", Box::new(vs)).unwrap();
        registry.create_pixel_shader("PS", Box::new(ps)).unwrap();
        registry.create_texture("Tex", &mut device, 1, 1, &[0; 4]).unwrap();
        registry.create_sampler("Samp", &mut device, &SamplerDesc::default()).unwrap();
        registry.create_material("Mat", "VS", "PS", "Tex", "Samp").unwrap();
        registry
            .set_material_uniform("Mat", "roughness", UniformValue::Float(0.5))
            .unwrap();
        registry.create_entity("Thing", "Mesh", "Mat", EntityType::Base).unwrap();

        let lights = DirectionalLight::default_rig();
        registry.draw_entities(&mut device, &Camera::default(), &lights).unwrap();

        assert_eq!(device.draw_calls().len(), 1);
        assert_eq!(device.draw_calls()[0].index_count, 4 * 4 * 6);
        assert_eq!(ps_record.borrow().data("lights").map(<[u8]>::len), Some(48 * 4));
        assert_eq!(ps_record.borrow().float("roughness"), Some(0.5));
        assert!(vs_record.borrow().matrix("world").is_some());
    }

    #[test]
    fn test_clear_releases_every_gpu_resource() {
        let mut device = HeadlessDevice::new();
        let mut registry = stocked(&mut device);
        registry
            .create_emitter("Exhaust", &mut device, &EmitterSettings::default(), "VS", "PS", "Snow")
            .unwrap();
        registry.set_exhaust_emitter("Exhaust").unwrap();
        registry
            .create_entity("Player", "Sphere_Mesh", "Snow_Material", EntityType::Player)
            .unwrap();

        assert!(matches!(
            registry.remove_emitter("Exhaust", &mut device),
            Err(RegistryError::StillReferenced { .. })
        ));

        registry.clear(&mut device).unwrap();
        assert!(registry.is_empty());
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_texture_count(), 0);
        assert_eq!(device.live_sampler_count(), 0);
    }
}
