//! Shader wrapper collaborator
//!
//! Shaders are opaque named-parameter uniform sinks. Setters return `false`
//! when the shader has no parameter of that name, mirroring how a reflection
//! based constant-buffer wrapper behaves; callers treat that as a no-op.

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::device::{GraphicsDevice, SamplerState, TextureView};
use serde::{Deserialize, Serialize};

/// Compiled shader stage with named parameters
pub trait ShaderProgram {
    /// Stage a 4x4 matrix
    fn set_matrix4x4(&mut self, name: &str, value: &Mat4) -> bool;

    /// Stage a float
    fn set_float(&mut self, name: &str, value: f32) -> bool;

    /// Stage a float3
    fn set_float3(&mut self, name: &str, value: &Vec3) -> bool;

    /// Stage a float4
    fn set_float4(&mut self, name: &str, value: &Vec4) -> bool;

    /// Stage an int
    fn set_int(&mut self, name: &str, value: i32) -> bool;

    /// Stage raw bytes (structured data such as light arrays)
    fn set_data(&mut self, name: &str, data: &[u8]) -> bool;

    /// Bind a texture to a named slot
    fn set_shader_resource_view(&mut self, name: &str, view: TextureView) -> bool;

    /// Bind a sampler to a named slot
    fn set_sampler_state(&mut self, name: &str, sampler: SamplerState) -> bool;

    /// Upload every staged constant buffer
    fn copy_all_buffer_data(&mut self, device: &mut dyn GraphicsDevice);

    /// Make this the active shader for its stage
    fn set_shader(&mut self, device: &mut dyn GraphicsDevice);
}

/// Extra per-material uniform value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    /// Scalar float
    Float(f32),
    /// Scalar int
    Int(i32),
    /// float3
    Float3([f32; 3]),
    /// float4
    Float4([f32; 4]),
}

impl UniformValue {
    /// Stage this value on `shader` under `name`
    pub fn apply(&self, shader: &mut dyn ShaderProgram, name: &str) -> bool {
        match *self {
            Self::Float(value) => shader.set_float(name, value),
            Self::Int(value) => shader.set_int(name, value),
            Self::Float3(value) => shader.set_float3(name, &Vec3::from(value)),
            Self::Float4(value) => shader.set_float4(name, &Vec4::from(value)),
        }
    }
}
