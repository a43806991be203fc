//! Rendering collaborators and draw-side data
//!
//! Everything the simulation needs to draw itself without knowing which
//! graphics API sits underneath: device and shader traits, meshes, materials,
//! lights, the camera, particle emitters and a headless backend.

pub mod camera;
pub mod device;
pub mod headless;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod particles;
pub mod shader;

pub use camera::Camera;
pub use device::{
    BlendMode, BufferDesc, BufferHandle, BufferKind, DepthMode, GraphicsDevice, RenderError,
    SamplerDesc, SamplerState, TextureView,
};
pub use headless::{HeadlessDevice, HeadlessLoader, HeadlessShader};
pub use lighting::DirectionalLight;
pub use material::{Material, MaterialBindings};
pub use mesh::{Mesh, Vertex};
pub use particles::{Emitter, EmitterSettings};
pub use shader::{ShaderProgram, UniformValue};
