//! Graphics device collaborator
//!
//! The simulation core never creates a device or swap chain. It talks to the
//! GPU through the [`GraphicsDevice`] trait: buffers, textures, sampler and
//! pipeline state objects identified by opaque handles, plus an indexed draw
//! call. A native backend implements this trait; [`crate::render::headless`]
//! provides a recording implementation for tests and headless runs.

/// Result type for device operations
pub type DeviceResult<T> = Result<T, RenderError>;

/// Handle to a GPU buffer owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a shader-resource view (a bindable texture)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureView(pub u64);

/// Handle to a sampler state object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerState(pub u64);

/// Handle to a blend state object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState(pub u64);

/// Handle to a depth-stencil state object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState(pub u64);

/// Rendering errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Buffer creation failed
    #[error("Buffer creation failed: {0}")]
    BufferCreation(String),

    /// A handle that the device does not know about was used
    #[error("Unknown {kind} handle {id}")]
    UnknownHandle {
        /// Resource kind of the handle
        kind: &'static str,
        /// Raw handle value
        id: u64,
    },

    /// Upload larger than the destination buffer
    #[error("Upload of {size} bytes overflows buffer of {capacity} bytes")]
    UploadOverflow {
        /// Bytes written
        size: usize,
        /// Buffer capacity in bytes
        capacity: usize,
    },

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Vertex buffer
    Vertex,
    /// 32-bit index buffer
    Index,
}

/// Buffer creation parameters
#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    /// Binding kind
    pub kind: BufferKind,
    /// CPU-writable buffer that is re-uploaded with discard writes
    pub dynamic: bool,
    /// Size in bytes
    pub size: usize,
    /// Initial contents; must not exceed `size`
    pub initial_data: Option<&'a [u8]>,
}

impl<'a> BufferDesc<'a> {
    /// Immutable buffer initialized from `data`
    pub fn immutable(kind: BufferKind, data: &'a [u8]) -> Self {
        Self {
            kind,
            dynamic: false,
            size: data.len(),
            initial_data: Some(data),
        }
    }

    /// Empty dynamic buffer of `size` bytes
    pub fn dynamic(kind: BufferKind, size: usize) -> Self {
        Self {
            kind,
            dynamic: true,
            size,
            initial_data: None,
        }
    }
}

/// Color blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source replaces destination
    Opaque,
    /// Source is added onto destination
    Additive,
}

/// Depth buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// Depth test and depth write
    ReadWrite,
    /// Depth test only; nothing is written
    ReadOnly,
}

/// Texture addressing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Tile the texture
    #[default]
    Wrap,
    /// Clamp to the edge texel
    Clamp,
}

/// Sampler creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    /// Addressing mode on all three axes
    pub address_mode: AddressMode,
    /// Anisotropic filtering level; 1 disables anisotropy
    pub max_anisotropy: u32,
    /// Highest mip level that may be sampled
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            address_mode: AddressMode::Wrap,
            max_anisotropy: 16,
            max_lod: f32::MAX,
        }
    }
}

/// Graphics device abstraction
///
/// Everything the simulation core needs from the GPU. State setters take
/// `None` to restore the device default.
pub trait GraphicsDevice {
    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> DeviceResult<BufferHandle>;

    /// Destroy a buffer
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Replace the whole contents of a dynamic buffer (map with discard, copy, unmap)
    fn write_buffer_discard(&mut self, buffer: BufferHandle, data: &[u8]) -> DeviceResult<()>;

    /// Create a texture view from already-decoded RGBA8 pixels
    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> DeviceResult<TextureView>;

    /// Destroy a texture view
    fn release_texture(&mut self, texture: TextureView);

    /// Create a sampler state
    fn create_sampler(&mut self, desc: &SamplerDesc) -> DeviceResult<SamplerState>;

    /// Destroy a sampler state
    fn release_sampler(&mut self, sampler: SamplerState);

    /// Create (or fetch a cached) blend state
    fn create_blend_state(&mut self, mode: BlendMode) -> DeviceResult<BlendState>;

    /// Create (or fetch a cached) depth-stencil state
    fn create_depth_stencil_state(&mut self, mode: DepthMode) -> DeviceResult<DepthStencilState>;

    /// Bind a blend state
    fn set_blend_state(&mut self, state: Option<BlendState>);

    /// Bind a depth-stencil state
    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilState>);

    /// Bind a vertex buffer with the given vertex stride in bytes
    fn set_vertex_buffer(&mut self, buffer: BufferHandle, stride: u32);

    /// Bind a 32-bit index buffer
    fn set_index_buffer(&mut self, buffer: BufferHandle);

    /// Issue an indexed draw call
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);
}
