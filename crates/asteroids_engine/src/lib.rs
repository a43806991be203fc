//! # Asteroids Engine
//!
//! The core of a small 3D Asteroids game: a name-keyed resource registry
//! that owns every mesh, material, shader, texture, sampler, particle emitter
//! and entity; per-variant entity behavior for the player ship, asteroids and
//! bullets; planar circle collisions; and a ring-buffer particle emitter.
//!
//! Drawing goes through the [`render::GraphicsDevice`] and
//! [`render::ShaderProgram`] traits. [`render::headless`] implements both
//! without a GPU so the whole update and draw loop runs in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use asteroids_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut device = HeadlessDevice::new();
//!     let mut loader = HeadlessLoader::new();
//!     let mut registry = ResourceRegistry::default();
//!
//!     registry.load_mesh("Sphere_Mesh", &mut device, &mut loader, "Models/sphere.obj")?;
//!     registry.load_vertex_shader("VS", &mut device, &mut loader, "VertexShader.cso")?;
//!     registry.load_pixel_shader("PS", &mut device, &mut loader, "PixelShader.cso")?;
//!     registry.load_texture("Rock", &mut device, &mut loader, "Textures/rock.png")?;
//!     registry.create_sampler("Sampler", &mut device, &SamplerDesc::default())?;
//!     registry.create_material("Rock_Material", "VS", "PS", "Rock", "Sampler")?;
//!     registry.create_entity("Player", "Sphere_Mesh", "Rock_Material", EntityType::Player)?;
//!
//!     let game_over = registry.update_entities(1.0 / 60.0, 1.0 / 60.0, &NoInput);
//!     registry.draw_entities(&mut device, &Camera::default(), &DirectionalLight::default_rig())?;
//!     registry.clear(&mut device)?;
//!     assert!(!game_over);
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod config;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetLoader, RegistryError, RegistrySettings, ResourceKind, ResourceRegistry},
        config::{Config, ConfigError},
        foundation::{
            math::{Mat4, Vec3, Vec4},
            time::{Stopwatch, Timer},
        },
        input::{InputSource, KeyCode, KeyboardState, NoInput},
        physics::{Collider, CollisionPolicy},
        render::{
            Camera, DirectionalLight, Emitter, EmitterSettings, GraphicsDevice, HeadlessDevice,
            HeadlessLoader, HeadlessShader, SamplerDesc, ShaderProgram, UniformValue,
        },
        scene::{Entity, EntityType},
    };
}
