//! Asset loading collaborator
//!
//! File decoding (OBJ models, images, compiled shaders) happens behind
//! [`AssetLoader`]. The registry only ever sees the finished GPU objects.

use crate::render::device::{GraphicsDevice, RenderError, TextureView};
use crate::render::mesh::Mesh;
use crate::render::shader::ShaderProgram;

/// Asset loading errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// File exists but could not be decoded
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// Offending file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// GPU upload of the decoded asset failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Turns file paths into GPU resources
pub trait AssetLoader {
    /// Load a model; the mesh carries its template collider
    fn load_mesh(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<Mesh, AssetError>;

    /// Load an image as a shader-resource view
    fn load_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureView, AssetError>;

    /// Load a compiled vertex shader
    fn load_vertex_shader(
        &mut self,
        device: &mut dyn GraphicsDevice,
        path: &str,
    ) -> Result<Box<dyn ShaderProgram>, AssetError>;

    /// Load a compiled pixel shader
    fn load_pixel_shader(
        &mut self,
        device: &mut dyn GraphicsDevice,
        path: &str,
    ) -> Result<Box<dyn ShaderProgram>, AssetError>;
}
