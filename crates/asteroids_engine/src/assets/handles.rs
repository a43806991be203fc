//! Typed arena keys
//!
//! Names are resolved to these keys once, when a resource is created or
//! looked up; hot paths only touch keys.

use slotmap::new_key_type;

new_key_type! {
    /// Key of a mesh in the registry
    pub struct MeshKey;
    /// Key of a material in the registry
    pub struct MaterialKey;
    /// Key of a vertex shader in the registry
    pub struct VertexShaderKey;
    /// Key of a pixel shader in the registry
    pub struct PixelShaderKey;
    /// Key of a texture view in the registry
    pub struct TextureKey;
    /// Key of a sampler state in the registry
    pub struct SamplerKey;
    /// Key of a particle emitter in the registry
    pub struct EmitterKey;
    /// Key of an entity in the registry
    pub struct EntityKey;
}
