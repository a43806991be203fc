//! Materials
//!
//! A material names the shaders and textures an entity is drawn with. It
//! stores typed registry keys; the registry resolves them into bindable
//! handles once per draw.

use crate::assets::handles::{PixelShaderKey, SamplerKey, TextureKey, VertexShaderKey};
use crate::render::device::{SamplerState, TextureView};
use crate::render::shader::{ShaderProgram, UniformValue};

/// Shader pair, textures and extra uniforms for drawing an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Vertex shader
    pub vertex_shader: VertexShaderKey,
    /// Pixel shader
    pub pixel_shader: PixelShaderKey,
    /// Base color texture
    pub base_color: TextureKey,
    /// Optional tangent-space normal map
    pub normal_map: Option<TextureKey>,
    /// Sampler used for every texture of the material
    pub sampler: SamplerKey,
    /// Extra named uniforms pushed to the pixel shader before each draw
    pub uniforms: Vec<(String, UniformValue)>,
}

impl Material {
    /// Set (or replace) a named pixel shader uniform
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match self.uniforms.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }
}

/// Device handles a material resolves to at draw time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialBindings {
    /// Base color texture view
    pub base_color: TextureView,
    /// Normal map texture view, if any
    pub normal_map: Option<TextureView>,
    /// Sampler state
    pub sampler: SamplerState,
}

impl MaterialBindings {
    /// Bind the textures and sampler on a pixel shader
    pub fn apply(&self, pixel_shader: &mut dyn ShaderProgram) {
        pixel_shader.set_sampler_state("samplerState", self.sampler);
        pixel_shader.set_shader_resource_view("textureBaseColor", self.base_color);
        if let Some(normal_map) = self.normal_map {
            pixel_shader.set_shader_resource_view("textureNormal", normal_map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_set_uniform_replaces_existing() {
        let mut vs = SlotMap::<VertexShaderKey, ()>::with_key();
        let mut ps = SlotMap::<PixelShaderKey, ()>::with_key();
        let mut textures = SlotMap::<TextureKey, ()>::with_key();
        let mut samplers = SlotMap::<SamplerKey, ()>::with_key();

        let mut material = Material {
            vertex_shader: vs.insert(()),
            pixel_shader: ps.insert(()),
            base_color: textures.insert(()),
            normal_map: None,
            sampler: samplers.insert(()),
            uniforms: Vec::new(),
        };

        material.set_uniform("roomCount", UniformValue::Float(4.0));
        material.set_uniform("tint", UniformValue::Float3([1.0, 0.5, 0.0]));
        material.set_uniform("roomCount", UniformValue::Float(8.0));

        assert_eq!(material.uniforms.len(), 2);
        assert_eq!(material.uniforms[0], ("roomCount".to_string(), UniformValue::Float(8.0)));
    }
}
