//! Headless rendering backend
//!
//! A [`GraphicsDevice`], [`ShaderProgram`] and [`AssetLoader`] that record
//! what they are asked to do instead of talking to a GPU. The game binary uses
//! them to run its full update and draw loop without a window; tests use them
//! to observe draw calls, uploads and shader parameters.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::assets::loader::{AssetError, AssetLoader};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::device::{
    BlendMode, BlendState, BufferDesc, BufferHandle, DepthMode, DepthStencilState, DeviceResult,
    GraphicsDevice, RenderError, SamplerDesc, SamplerState, TextureView,
};
use crate::render::mesh::{sphere_geometry, Mesh};
use crate::render::shader::ShaderProgram;

/// One recorded `draw_indexed` call with the state bound at the time
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Number of indices drawn
    pub index_count: u32,
    /// First index read
    pub first_index: u32,
    /// Value added to each index
    pub base_vertex: i32,
    /// Bound vertex buffer
    pub vertex_buffer: Option<BufferHandle>,
    /// Stride of the bound vertex buffer
    pub vertex_stride: u32,
    /// Bound index buffer
    pub index_buffer: Option<BufferHandle>,
    /// Bound blend mode, `None` for the device default
    pub blend: Option<BlendMode>,
    /// Bound depth mode, `None` for the device default
    pub depth: Option<DepthMode>,
}

#[derive(Debug)]
struct BufferRecord {
    dynamic: bool,
    contents: Vec<u8>,
}

/// Recording graphics device
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: u64,
    buffers: HashMap<u64, BufferRecord>,
    textures: HashMap<u64, (u32, u32)>,
    samplers: HashMap<u64, SamplerDesc>,
    blend_states: HashMap<u64, BlendMode>,
    depth_states: HashMap<u64, DepthMode>,

    bound_vertex_buffer: Option<(BufferHandle, u32)>,
    bound_index_buffer: Option<BufferHandle>,
    blend: Option<BlendMode>,
    depth: Option<DepthMode>,

    draw_calls: Vec<DrawCall>,
    upload_count: usize,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Draw calls recorded since creation or the last [`Self::clear_draw_calls`]
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    /// Forget recorded draw calls (call once per frame)
    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
    }

    /// Number of discard uploads performed
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    /// Number of buffers not yet released
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of textures not yet released
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of samplers not yet released
    pub fn live_sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// Current contents of a buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|record| record.contents.as_slice())
    }

    /// Currently bound blend mode
    pub fn current_blend_mode(&self) -> Option<BlendMode> {
        self.blend
    }

    /// Currently bound depth mode
    pub fn current_depth_mode(&self) -> Option<DepthMode> {
        self.depth
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> DeviceResult<BufferHandle> {
        let mut contents = vec![0_u8; desc.size];
        if let Some(data) = desc.initial_data {
            if data.len() > desc.size {
                return Err(RenderError::BufferCreation(format!(
                    "initial data of {} bytes exceeds buffer size {}",
                    data.len(),
                    desc.size
                )));
            }
            contents[..data.len()].copy_from_slice(data);
        }

        let id = self.allocate_id();
        self.buffers.insert(
            id,
            BufferRecord {
                dynamic: desc.dynamic,
                contents,
            },
        );
        Ok(BufferHandle(id))
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.0).is_none() {
            log::warn!("Release of unknown buffer {}", buffer.0);
        }
    }

    fn write_buffer_discard(&mut self, buffer: BufferHandle, data: &[u8]) -> DeviceResult<()> {
        let record = self.buffers.get_mut(&buffer.0).ok_or(RenderError::UnknownHandle {
            kind: "buffer",
            id: buffer.0,
        })?;
        if !record.dynamic {
            return Err(RenderError::Backend(format!("buffer {} is not dynamic", buffer.0)));
        }
        if data.len() > record.contents.len() {
            return Err(RenderError::UploadOverflow {
                size: data.len(),
                capacity: record.contents.len(),
            });
        }

        record.contents.fill(0);
        record.contents[..data.len()].copy_from_slice(data);
        self.upload_count += 1;
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> DeviceResult<TextureView> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::Backend(format!(
                "texture {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        let id = self.allocate_id();
        self.textures.insert(id, (width, height));
        Ok(TextureView(id))
    }

    fn release_texture(&mut self, texture: TextureView) {
        self.textures.remove(&texture.0);
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> DeviceResult<SamplerState> {
        let id = self.allocate_id();
        self.samplers.insert(id, *desc);
        Ok(SamplerState(id))
    }

    fn release_sampler(&mut self, sampler: SamplerState) {
        self.samplers.remove(&sampler.0);
    }

    fn create_blend_state(&mut self, mode: BlendMode) -> DeviceResult<BlendState> {
        if let Some((&id, _)) = self.blend_states.iter().find(|(_, &m)| m == mode) {
            return Ok(BlendState(id));
        }
        let id = self.allocate_id();
        self.blend_states.insert(id, mode);
        Ok(BlendState(id))
    }

    fn create_depth_stencil_state(&mut self, mode: DepthMode) -> DeviceResult<DepthStencilState> {
        if let Some((&id, _)) = self.depth_states.iter().find(|(_, &m)| m == mode) {
            return Ok(DepthStencilState(id));
        }
        let id = self.allocate_id();
        self.depth_states.insert(id, mode);
        Ok(DepthStencilState(id))
    }

    fn set_blend_state(&mut self, state: Option<BlendState>) {
        self.blend = state.and_then(|s| self.blend_states.get(&s.0).copied());
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilState>) {
        self.depth = state.and_then(|s| self.depth_states.get(&s.0).copied());
    }

    fn set_vertex_buffer(&mut self, buffer: BufferHandle, stride: u32) {
        self.bound_vertex_buffer = Some((buffer, stride));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.bound_index_buffer = Some(buffer);
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.draw_calls.push(DrawCall {
            index_count,
            first_index,
            base_vertex,
            vertex_buffer: self.bound_vertex_buffer.map(|(buffer, _)| buffer),
            vertex_stride: self.bound_vertex_buffer.map_or(0, |(_, stride)| stride),
            index_buffer: self.bound_index_buffer,
            blend: self.blend,
            depth: self.depth,
        });
    }
}

/// A value staged on a [`HeadlessShader`]
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderValue {
    /// 4x4 matrix
    Matrix(Mat4),
    /// float
    Float(f32),
    /// float3
    Float3(Vec3),
    /// float4
    Float4(Vec4),
    /// int
    Int(i32),
    /// Raw bytes
    Data(Vec<u8>),
    /// Texture binding
    Texture(TextureView),
    /// Sampler binding
    Sampler(SamplerState),
}

/// Everything a [`HeadlessShader`] has been told
#[derive(Debug, Default)]
pub struct ShaderRecord {
    /// Shader name (usually its file path)
    pub name: String,
    values: HashMap<String, ShaderValue>,
    /// Number of `copy_all_buffer_data` calls
    pub uploads: usize,
    /// Number of `set_shader` calls
    pub activations: usize,
}

impl ShaderRecord {
    /// Last value staged under `name`
    pub fn value(&self, name: &str) -> Option<&ShaderValue> {
        self.values.get(name)
    }

    /// Last matrix staged under `name`
    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        match self.values.get(name) {
            Some(ShaderValue::Matrix(m)) => Some(*m),
            _ => None,
        }
    }

    /// Last float staged under `name`
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.values.get(name) {
            Some(ShaderValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Last raw data staged under `name`
    pub fn data(&self, name: &str) -> Option<&[u8]> {
        match self.values.get(name) {
            Some(ShaderValue::Data(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Last texture bound under `name`
    pub fn texture(&self, name: &str) -> Option<TextureView> {
        match self.values.get(name) {
            Some(ShaderValue::Texture(view)) => Some(*view),
            _ => None,
        }
    }
}

/// Recording shader
///
/// Accepts every parameter name unless built with [`Self::with_parameters`].
/// The record is shared so it stays observable after the shader is boxed and
/// handed to a registry.
#[derive(Debug)]
pub struct HeadlessShader {
    record: Rc<RefCell<ShaderRecord>>,
    parameters: Option<HashSet<String>>,
}

impl HeadlessShader {
    /// Shader that accepts any parameter
    pub fn new(name: &str) -> Self {
        Self {
            record: Rc::new(RefCell::new(ShaderRecord {
                name: name.to_string(),
                ..ShaderRecord::default()
            })),
            parameters: None,
        }
    }

    /// Shader that only knows the listed parameters
    pub fn with_parameters(name: &str, parameters: &[&str]) -> Self {
        let mut shader = Self::new(name);
        shader.parameters = Some(parameters.iter().map(|p| (*p).to_string()).collect());
        shader
    }

    /// Shared handle to this shader's record
    pub fn record(&self) -> Rc<RefCell<ShaderRecord>> {
        Rc::clone(&self.record)
    }

    fn stage(&mut self, name: &str, value: ShaderValue) -> bool {
        if let Some(parameters) = &self.parameters {
            if !parameters.contains(name) {
                return false;
            }
        }
        self.record.borrow_mut().values.insert(name.to_string(), value);
        true
    }
}

impl ShaderProgram for HeadlessShader {
    fn set_matrix4x4(&mut self, name: &str, value: &Mat4) -> bool {
        self.stage(name, ShaderValue::Matrix(*value))
    }

    fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.stage(name, ShaderValue::Float(value))
    }

    fn set_float3(&mut self, name: &str, value: &Vec3) -> bool {
        self.stage(name, ShaderValue::Float3(*value))
    }

    fn set_float4(&mut self, name: &str, value: &Vec4) -> bool {
        self.stage(name, ShaderValue::Float4(*value))
    }

    fn set_int(&mut self, name: &str, value: i32) -> bool {
        self.stage(name, ShaderValue::Int(value))
    }

    fn set_data(&mut self, name: &str, data: &[u8]) -> bool {
        self.stage(name, ShaderValue::Data(data.to_vec()))
    }

    fn set_shader_resource_view(&mut self, name: &str, view: TextureView) -> bool {
        self.stage(name, ShaderValue::Texture(view))
    }

    fn set_sampler_state(&mut self, name: &str, sampler: SamplerState) -> bool {
        self.stage(name, ShaderValue::Sampler(sampler))
    }

    fn copy_all_buffer_data(&mut self, _device: &mut dyn GraphicsDevice) {
        self.record.borrow_mut().uploads += 1;
    }

    fn set_shader(&mut self, _device: &mut dyn GraphicsDevice) {
        self.record.borrow_mut().activations += 1;
    }
}

/// Asset loader that synthesizes placeholder assets
///
/// Meshes are unit spheres, textures are 1x1 white, shaders are
/// [`HeadlessShader`]s named after their path. With an asset root set, every
/// requested path must exist under it.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    asset_root: Option<PathBuf>,
    shader_records: HashMap<String, Rc<RefCell<ShaderRecord>>>,
}

impl HeadlessLoader {
    /// Loader that accepts any path
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that requires each path to exist under `root`
    pub fn with_asset_root(root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: Some(root.into()),
            shader_records: HashMap::new(),
        }
    }

    /// Record of the shader loaded from `path`
    pub fn shader_record(&self, path: &str) -> Option<Rc<RefCell<ShaderRecord>>> {
        self.shader_records.get(path).cloned()
    }

    fn check_exists(&self, path: &str) -> Result<(), AssetError> {
        match &self.asset_root {
            Some(root) if !root.join(Path::new(path)).exists() => Err(AssetError::NotFound(path.to_string())),
            _ => Ok(()),
        }
    }

    fn load_shader(&mut self, path: &str) -> Result<Box<dyn ShaderProgram>, AssetError> {
        self.check_exists(path)?;
        let shader = HeadlessShader::new(path);
        self.shader_records.insert(path.to_string(), shader.record());
        Ok(Box::new(shader))
    }
}

impl AssetLoader for HeadlessLoader {
    fn load_mesh(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<Mesh, AssetError> {
        self.check_exists(path)?;
        let (vertices, indices) = sphere_geometry(8, 16);
        Ok(Mesh::from_geometry(device, &vertices, &indices)?)
    }

    fn load_texture(&mut self, device: &mut dyn GraphicsDevice, path: &str) -> Result<TextureView, AssetError> {
        self.check_exists(path)?;
        Ok(device.create_texture(1, 1, &[255, 255, 255, 255])?)
    }

    fn load_vertex_shader(
        &mut self,
        _device: &mut dyn GraphicsDevice,
        path: &str,
    ) -> Result<Box<dyn ShaderProgram>, AssetError> {
        self.load_shader(path)
    }

    fn load_pixel_shader(
        &mut self,
        _device: &mut dyn GraphicsDevice,
        path: &str,
    ) -> Result<Box<dyn ShaderProgram>, AssetError> {
        self.load_shader(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::BufferKind;

    #[test]
    fn test_discard_write_rejects_overflow_and_static_buffers() {
        let mut device = HeadlessDevice::new();
        let dynamic = device.create_buffer(&BufferDesc::dynamic(BufferKind::Vertex, 4)).unwrap();
        let fixed = device.create_buffer(&BufferDesc::immutable(BufferKind::Index, &[1, 2])).unwrap();

        assert!(device.write_buffer_discard(dynamic, &[9, 9, 9]).is_ok());
        assert_eq!(device.buffer_contents(dynamic), Some(&[9, 9, 9, 0][..]));
        assert!(matches!(
            device.write_buffer_discard(dynamic, &[0; 5]),
            Err(RenderError::UploadOverflow { size: 5, capacity: 4 })
        ));
        assert!(device.write_buffer_discard(fixed, &[0]).is_err());
        assert_eq!(device.upload_count(), 1);
    }

    #[test]
    fn test_state_objects_are_cached_per_mode() {
        let mut device = HeadlessDevice::new();
        let a = device.create_blend_state(BlendMode::Additive).unwrap();
        let b = device.create_blend_state(BlendMode::Additive).unwrap();
        assert_eq!(a, b);

        device.set_blend_state(Some(a));
        assert_eq!(device.current_blend_mode(), Some(BlendMode::Additive));
        device.set_blend_state(None);
        assert_eq!(device.current_blend_mode(), None);
    }

    #[test]
    fn test_restricted_shader_refuses_unknown_names() {
        let mut shader = HeadlessShader::with_parameters("PixelShader.cso", &["lights"]);
        assert!(shader.set_data("lights", &[1, 2, 3]));
        assert!(!shader.set_float("roomCount", 3.0));

        let record = shader.record();
        assert_eq!(record.borrow().data("lights"), Some(&[1, 2, 3][..]));
        assert_eq!(record.borrow().float("roomCount"), None);
    }

    #[test]
    fn test_loader_with_root_reports_missing_files() {
        let mut device = HeadlessDevice::new();
        let mut loader = HeadlessLoader::with_asset_root(std::env::temp_dir());
        assert!(matches!(
            loader.load_texture(&mut device, "no_such_texture.dds"),
            Err(AssetError::NotFound(_))
        ));

        let mut open_loader = HeadlessLoader::new();
        assert!(open_loader.load_mesh(&mut device, "Models/sphere.obj").is_ok());
        assert!(open_loader.load_vertex_shader(&mut device, "VertexShader.cso").is_ok());
        assert!(open_loader.shader_record("VertexShader.cso").is_some());
    }
}
