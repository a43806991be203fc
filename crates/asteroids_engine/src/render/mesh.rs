//! Mesh geometry and its GPU buffers
//!
//! A mesh owns one immutable vertex buffer and one immutable index buffer. It
//! also carries the template [`Collider`] that every entity built from the
//! mesh starts with; its radius is the furthest vertex from the mesh origin
//! on the XZ plane.

use crate::foundation::math::{constants, planar_distance, Vec3};
use crate::physics::Collider;
use crate::render::device::{BufferDesc, BufferHandle, BufferKind, DeviceResult, GraphicsDevice};
use bytemuck::{Pod, Zeroable};

/// 3D vertex data structure for rendering
///
/// `#[repr(C)]` keeps the layout identical to the vertex shader's input
/// signature so slices can be uploaded with [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Surface normal in model space
    pub normal: [f32; 3],
    /// Texture coordinate
    pub uv: [f32; 2],
}

impl Vertex {
    /// Byte stride of one vertex
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    /// Create a vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }
}

/// Generate a UV sphere of radius 1 centered on the origin
///
/// `rings` latitude bands and `segments` longitude slices; both are clamped to
/// a minimum of 3.
pub fn sphere_geometry(rings: u32, segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let rings = rings.max(3);
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let polar = v * constants::PI;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let azimuth = u * constants::TAU;
            let normal = [polar.sin() * azimuth.cos(), polar.cos(), polar.sin() * azimuth.sin()];
            vertices.push(Vertex::new(normal, normal, [u, v]));
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

/// Geometry uploaded to the GPU
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: u32,
    collider: Collider,
}

impl Mesh {
    /// Upload vertices and indices and derive the template collider
    pub fn from_geometry(
        device: &mut dyn GraphicsDevice,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> DeviceResult<Self> {
        let vertex_buffer = device.create_buffer(&BufferDesc::immutable(
            BufferKind::Vertex,
            bytemuck::cast_slice(vertices),
        ))?;
        let index_buffer = match device.create_buffer(&BufferDesc::immutable(
            BufferKind::Index,
            bytemuck::cast_slice(indices),
        )) {
            Ok(buffer) => buffer,
            Err(e) => {
                device.release_buffer(vertex_buffer);
                return Err(e);
            }
        };

        let radius = vertices
            .iter()
            .map(|v| planar_distance(&Vec3::from(v.position), &Vec3::zeros()))
            .fold(0.0_f32, f32::max);

        log::debug!(
            "Created mesh: {} vertices, {} indices, collider radius {:.3}",
            vertices.len(),
            indices.len(),
            radius
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            collider: Collider::new(radius),
        })
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Index buffer handle
    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    /// Number of indices to draw
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Template collider copied into each entity that uses this mesh
    pub fn collider(&self) -> Collider {
        self.collider
    }

    /// Override the template collider
    pub fn set_collider(&mut self, collider: Collider) {
        self.collider = collider;
    }

    /// Bind both buffers and issue one indexed draw
    pub fn draw(&self, device: &mut dyn GraphicsDevice) {
        device.set_vertex_buffer(self.vertex_buffer, Vertex::STRIDE);
        device.set_index_buffer(self.index_buffer);
        device.draw_indexed(self.index_count, 0, 0);
    }

    /// Destroy the GPU buffers
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        device.release_buffer(self.vertex_buffer);
        device.release_buffer(self.index_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;
    use approx::assert_relative_eq;

    fn quad() -> (Vec<Vertex>, Vec<u32>) {
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-1.0, 0.0, -1.0], up, [0.0, 0.0]),
            Vertex::new([1.0, 5.0, -1.0], up, [1.0, 0.0]),
            Vertex::new([1.0, 0.0, 1.0], up, [1.0, 1.0]),
            Vertex::new([-1.0, 0.0, 1.0], up, [0.0, 1.0]),
        ];
        (vertices, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(Vertex::STRIDE, 32);
    }

    #[test]
    fn test_collider_radius_ignores_height() {
        let mut device = HeadlessDevice::new();
        let (vertices, indices) = quad();
        let mesh = Mesh::from_geometry(&mut device, &vertices, &indices).unwrap();

        assert_eq!(mesh.index_count(), 6);
        assert!(mesh.collider().enabled());
        assert_relative_eq!(mesh.collider().radius(), 2.0_f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_draw_binds_and_draws_all_indices() {
        let mut device = HeadlessDevice::new();
        let (vertices, indices) = quad();
        let mesh = Mesh::from_geometry(&mut device, &vertices, &indices).unwrap();

        mesh.draw(&mut device);
        let call = device.draw_calls().last().unwrap();
        assert_eq!(call.index_count, 6);
        assert_eq!(call.vertex_buffer, Some(mesh.vertex_buffer()));
        assert_eq!(call.index_buffer, Some(mesh.index_buffer()));
    }

    #[test]
    fn test_sphere_collider_is_unit_radius() {
        let mut device = HeadlessDevice::new();
        let (vertices, indices) = sphere_geometry(8, 12);
        let mesh = Mesh::from_geometry(&mut device, &vertices, &indices).unwrap();

        assert_eq!(indices.len(), 8 * 12 * 6);
        assert_relative_eq!(mesh.collider().radius(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_release_frees_both_buffers() {
        let mut device = HeadlessDevice::new();
        let (vertices, indices) = quad();
        let mesh = Mesh::from_geometry(&mut device, &vertices, &indices).unwrap();
        assert_eq!(device.live_buffer_count(), 2);

        mesh.release(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
    }
}
