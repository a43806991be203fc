//! Named resources and their lifetimes
//!
//! [`ResourceRegistry`] owns every mesh, material, shader, texture, sampler,
//! emitter and entity by name. Resources are stored in slotmap arenas and
//! referenced through the typed keys in [`handles`]; the registry counts
//! references and refuses to destroy anything still in use.

pub mod handles;
pub mod loader;
pub mod registry;

pub use handles::{
    EmitterKey, EntityKey, MaterialKey, MeshKey, PixelShaderKey, SamplerKey, TextureKey,
    VertexShaderKey,
};
pub use loader::{AssetError, AssetLoader};
pub use registry::{RegistryError, RegistrySettings, ResourceKind, ResourceRegistry};
