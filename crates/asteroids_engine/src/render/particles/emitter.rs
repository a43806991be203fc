//! Fixed-capacity particle ring buffer
//!
//! Particles live in a circular array of `max_particles` slots. Two indices
//! advance monotonically (modulo capacity): new particles are written at
//! `first_dead` and retired from `first_alive`, so spawning and retiring are
//! O(1) and nothing is allocated per frame. The alive range is either the
//! contiguous run `first_alive..first_dead` or, once it wraps past the end of
//! the array, `first_alive..max` followed by `0..first_dead`.
//!
//! Every particle shares one lifetime, so the oldest particle is always at
//! `first_alive` and retirement only ever looks at the front of the range.
//!
//! Positions are evaluated in closed form from the particle's age rather than
//! integrated:
//!
//! ```text
//! p(t) = emitter_position + v0 * t + 0.5 * a * t^2
//! ```

use std::ops::Range;

use crate::assets::handles::{PixelShaderKey, TextureKey, VertexShaderKey};
use crate::foundation::math::{utils, Vec3, Vec4};
use crate::render::camera::Camera;
use crate::render::device::{
    BlendMode, BlendState, BufferDesc, BufferHandle, BufferKind, DepthMode, DepthStencilState,
    DeviceResult, GraphicsDevice, TextureView,
};
use crate::render::shader::ShaderProgram;
use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const VERTICES_PER_PARTICLE: usize = 4;
const INDICES_PER_PARTICLE: usize = 6;
const QUAD_UVS: [[f32; 2]; VERTICES_PER_PARTICLE] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// CPU-side state of one particle slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    /// Seconds since the particle was spawned
    pub age: f32,
    /// Current billboard size
    pub size: f32,
    /// Current RGBA color
    pub color: Vec4,
    /// Current world position
    pub position: Vec3,
    /// Velocity at spawn time
    pub start_velocity: Vec3,
}

/// One corner of a particle quad as seen by the particle vertex shader
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ParticleVertex {
    /// Particle center in world space
    pub position: [f32; 3],
    /// Corner texture coordinate; also selects the corner offset in the shader
    pub uv: [f32; 2],
    /// RGBA color
    pub color: [f32; 4],
    /// Billboard size
    pub size: f32,
}

impl ParticleVertex {
    /// Byte stride of one vertex
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;
}

/// Emitter configuration
///
/// Missing fields fall back to [`EmitterSettings::default`] when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Ring buffer capacity
    pub max_particles: usize,
    /// Continuous emission rate; zero or less disables emission
    pub particles_per_second: f32,
    /// Seconds each particle lives
    pub lifetime: f32,
    /// Size at spawn
    pub start_size: f32,
    /// Size at the end of the lifetime
    pub end_size: f32,
    /// RGBA color at spawn
    pub start_color: [f32; 4],
    /// RGBA color at the end of the lifetime
    pub end_color: [f32; 4],
    /// Base velocity of continuously emitted particles
    pub start_velocity: [f32; 3],
    /// Emitter position in world space
    pub position: [f32; 3],
    /// Constant acceleration applied to every particle
    pub acceleration: [f32; 3],
    /// Half-width of the uniform random perturbation added to each velocity axis
    pub velocity_jitter: f32,
    /// Half-width of the random velocity range of explosion particles
    pub explosion_speed: f32,
    /// Fixed RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            particles_per_second: 100.0,
            lifetime: 1.0,
            start_size: 0.1,
            end_size: 0.5,
            start_color: [1.0, 0.6, 0.1, 1.0],
            end_color: [0.4, 0.1, 0.0, 0.0],
            start_velocity: [0.0, 0.0, 0.0],
            position: [0.0, 0.0, 0.0],
            acceleration: [0.0, 0.0, 0.0],
            velocity_jitter: 0.2,
            explosion_speed: 5.0,
            seed: None,
        }
    }
}

/// Particle emitter with a fixed-capacity ring buffer
#[derive(Debug)]
pub struct Emitter {
    particles: Vec<Particle>,
    local_vertices: Vec<ParticleVertex>,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    blend_state: BlendState,
    depth_state: DepthStencilState,

    vertex_shader: VertexShaderKey,
    pixel_shader: PixelShaderKey,
    texture: TextureKey,

    first_alive: usize,
    first_dead: usize,
    living: usize,

    time_since_emit: f32,
    particles_per_second: f32,
    seconds_per_particle: f32,

    lifetime: f32,
    start_size: f32,
    end_size: f32,
    start_color: Vec4,
    end_color: Vec4,
    start_velocity: Vec3,
    position: Vec3,
    acceleration: Vec3,
    velocity_jitter: f32,
    explosion_speed: f32,

    rng: StdRng,
}

impl Emitter {
    /// Create an emitter and allocate its GPU buffers
    pub fn new(
        device: &mut dyn GraphicsDevice,
        settings: &EmitterSettings,
        vertex_shader: VertexShaderKey,
        pixel_shader: PixelShaderKey,
        texture: TextureKey,
    ) -> DeviceResult<Self> {
        let capacity = Self::checked_capacity(settings.max_particles);
        let (vertex_buffer, index_buffer) = Self::create_buffers(device, capacity)?;
        let blend_state = device.create_blend_state(BlendMode::Additive)?;
        let depth_state = device.create_depth_stencil_state(DepthMode::ReadOnly)?;

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut emitter = Self {
            particles: vec![Particle::default(); capacity],
            local_vertices: Self::quad_vertices(capacity),
            vertex_buffer,
            index_buffer,
            blend_state,
            depth_state,
            vertex_shader,
            pixel_shader,
            texture,
            first_alive: 0,
            first_dead: 0,
            living: 0,
            time_since_emit: 0.0,
            particles_per_second: 0.0,
            seconds_per_particle: f32::INFINITY,
            lifetime: settings.lifetime,
            start_size: settings.start_size,
            end_size: settings.end_size,
            start_color: Vec4::from(settings.start_color),
            end_color: Vec4::from(settings.end_color),
            start_velocity: Vec3::from(settings.start_velocity),
            position: Vec3::from(settings.position),
            acceleration: Vec3::from(settings.acceleration),
            velocity_jitter: settings.velocity_jitter,
            explosion_speed: settings.explosion_speed,
            rng,
        };
        emitter.set_particles_per_second(settings.particles_per_second);

        log::debug!(
            "Created emitter: capacity {}, {} particles/s, lifetime {:.2}s",
            capacity,
            settings.particles_per_second,
            settings.lifetime
        );

        Ok(emitter)
    }

    fn checked_capacity(max_particles: usize) -> usize {
        if max_particles == 0 {
            log::warn!("Emitter capacity of 0 requested, using 1");
            1
        } else {
            max_particles
        }
    }

    fn quad_vertices(capacity: usize) -> Vec<ParticleVertex> {
        (0..capacity * VERTICES_PER_PARTICLE)
            .map(|i| ParticleVertex {
                uv: QUAD_UVS[i % VERTICES_PER_PARTICLE],
                ..ParticleVertex::default()
            })
            .collect()
    }

    fn create_buffers(
        device: &mut dyn GraphicsDevice,
        capacity: usize,
    ) -> DeviceResult<(BufferHandle, BufferHandle)> {
        let vertex_bytes = capacity * VERTICES_PER_PARTICLE * ParticleVertex::STRIDE as usize;
        let vertex_buffer = device.create_buffer(&BufferDesc::dynamic(BufferKind::Vertex, vertex_bytes))?;

        let indices: Vec<u32> = (0..capacity as u32)
            .flat_map(|particle| {
                let i = particle * VERTICES_PER_PARTICLE as u32;
                [i, i + 1, i + 2, i, i + 2, i + 3]
            })
            .collect();

        match device.create_buffer(&BufferDesc::immutable(BufferKind::Index, bytemuck::cast_slice(&indices))) {
            Ok(index_buffer) => Ok((vertex_buffer, index_buffer)),
            Err(e) => {
                device.release_buffer(vertex_buffer);
                Err(e)
            }
        }
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Ages every living particle, retires the ones that reached their
    /// lifetime, then emits as many particles as the elapsed time pays for.
    pub fn update(&mut self, dt: f32) {
        let (head, tail) = self.alive_ranges();
        for index in head.chain(tail) {
            self.update_particle(index, dt);
        }

        while self.living > 0 && self.particles[self.first_alive].age >= self.lifetime {
            self.first_alive = (self.first_alive + 1) % self.capacity();
            self.living -= 1;
        }

        if !self.seconds_per_particle.is_finite() {
            self.time_since_emit = 0.0;
            return;
        }

        self.time_since_emit += dt;
        let due = self.due_particles();
        let free = self.capacity() - self.living;
        for _ in 0..due.min(free) {
            self.spawn_particle();
        }
    }

    /// Consume the emission debt, returning how many particles it paid for
    ///
    /// Matches one spawn per whole interval strictly exceeded. The leftover
    /// stays in `[0, seconds_per_particle]`, so tiny intervals and huge steps
    /// settle in constant time.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn due_particles(&mut self) -> usize {
        let interval = self.seconds_per_particle;
        if self.time_since_emit <= interval {
            return 0;
        }

        let mut due = (self.time_since_emit / interval).floor();
        if due * interval >= self.time_since_emit {
            due -= 1.0;
        }
        self.time_since_emit = (self.time_since_emit - due * interval).clamp(0.0, interval);
        due as usize
    }

    fn update_particle(&mut self, index: usize, dt: f32) {
        let particle = &mut self.particles[index];
        particle.age += dt;
        if particle.age >= self.lifetime {
            return;
        }

        let t = particle.age;
        let fraction = if self.lifetime > 0.0 { t / self.lifetime } else { 1.0 };

        particle.color = utils::lerp_color(&self.start_color, &self.end_color, fraction);
        particle.size = utils::lerp(self.start_size, self.end_size, fraction);
        particle.position = self.position + particle.start_velocity * t + self.acceleration * (0.5 * t * t);
    }

    fn jitter(&mut self) -> Vec3 {
        let width = self.velocity_jitter;
        Vec3::new(
            self.rng.gen::<f32>() * 2.0 * width - width,
            self.rng.gen::<f32>() * 2.0 * width - width,
            self.rng.gen::<f32>() * 2.0 * width - width,
        )
    }

    fn claim_slot(&mut self, start_velocity: Vec3) -> bool {
        if self.is_full() {
            return false;
        }

        self.particles[self.first_dead] = Particle {
            age: 0.0,
            size: self.start_size,
            color: self.start_color,
            position: self.position,
            start_velocity,
        };

        self.first_dead = (self.first_dead + 1) % self.capacity();
        self.living += 1;
        true
    }

    /// Spawn one particle at the emitter with the base velocity plus jitter
    ///
    /// Returns `false`, leaving the buffer untouched, when every slot is alive.
    pub fn spawn_particle(&mut self) -> bool {
        if self.is_full() {
            log::trace!("Emitter full, spawn skipped");
            return false;
        }
        let velocity = self.start_velocity + self.jitter();
        self.claim_slot(velocity)
    }

    /// Spawn one particle with a random outward velocity
    ///
    /// Returns `false`, leaving the buffer untouched, when every slot is alive.
    pub fn spawn_explosion_particle(&mut self) -> bool {
        if self.is_full() {
            log::trace!("Emitter full, explosion spawn skipped");
            return false;
        }
        let speed = self.explosion_speed;
        let burst = Vec3::new(
            self.rng.gen::<f32>() * 2.0 * speed - speed,
            self.rng.gen::<f32>() * 2.0 * speed - speed,
            self.rng.gen::<f32>() * 2.0 * speed - speed,
        );
        let velocity = burst + self.jitter();
        self.claim_slot(velocity)
    }

    /// Move the emitter to `position` and fill every free slot with a burst
    ///
    /// Returns the number of particles spawned.
    pub fn explode(&mut self, position: Vec3) -> usize {
        self.position = position;

        let mut spawned = 0;
        while self.spawn_explosion_particle() {
            spawned += 1;
        }
        log::debug!("Explosion at {:?}: {} particles", position, spawned);
        spawned
    }

    /// Slot ranges holding living particles, oldest first
    ///
    /// The second range is empty unless the alive range wraps past the end of
    /// the array.
    pub fn alive_ranges(&self) -> (Range<usize>, Range<usize>) {
        if self.living == 0 {
            (0..0, 0..0)
        } else if self.first_alive < self.first_dead {
            (self.first_alive..self.first_dead, 0..0)
        } else {
            (self.first_alive..self.capacity(), 0..self.first_dead)
        }
    }

    /// Rewrite the local quads of living particles and upload the whole buffer
    ///
    /// Dead slots are not touched; the draw ranges never reach them.
    pub fn copy_particles_to_gpu(&mut self, device: &mut dyn GraphicsDevice) -> DeviceResult<()> {
        let (head, tail) = self.alive_ranges();
        for index in head.chain(tail) {
            let particle = &self.particles[index];
            let first = index * VERTICES_PER_PARTICLE;
            for vertex in &mut self.local_vertices[first..first + VERTICES_PER_PARTICLE] {
                vertex.position = particle.position.into();
                vertex.color = particle.color.into();
                vertex.size = particle.size;
            }
        }

        device.write_buffer_discard(self.vertex_buffer, bytemuck::cast_slice(&self.local_vertices))
    }

    /// Draw every living particle
    ///
    /// Uses additive blending with depth writes off, then restores the
    /// device's default states. Issues two draw calls when the alive range
    /// wraps, one otherwise, and none when nothing is alive.
    pub fn draw(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertex_shader: &mut dyn ShaderProgram,
        pixel_shader: &mut dyn ShaderProgram,
        texture: TextureView,
        camera: &Camera,
    ) -> DeviceResult<()> {
        if self.living == 0 {
            return Ok(());
        }

        self.copy_particles_to_gpu(device)?;

        device.set_blend_state(Some(self.blend_state));
        device.set_depth_stencil_state(Some(self.depth_state));
        device.set_vertex_buffer(self.vertex_buffer, ParticleVertex::STRIDE);
        device.set_index_buffer(self.index_buffer);

        vertex_shader.set_matrix4x4("view", &camera.view_matrix());
        vertex_shader.set_matrix4x4("projection", &camera.projection_matrix());
        vertex_shader.set_shader(device);
        vertex_shader.copy_all_buffer_data(device);

        pixel_shader.set_shader_resource_view("particle", texture);
        pixel_shader.set_shader(device);
        pixel_shader.copy_all_buffer_data(device);

        let (head, tail) = self.alive_ranges();
        for range in [head, tail] {
            if range.is_empty() {
                continue;
            }
            device.draw_indexed(
                (range.len() * INDICES_PER_PARTICLE) as u32,
                (range.start * INDICES_PER_PARTICLE) as u32,
                0,
            );
        }

        device.set_blend_state(None);
        device.set_depth_stencil_state(None);
        Ok(())
    }

    /// Resize the ring buffer
    ///
    /// Reallocates the GPU buffers and kills every living particle.
    pub fn set_max_particles(&mut self, device: &mut dyn GraphicsDevice, max_particles: usize) -> DeviceResult<()> {
        let capacity = Self::checked_capacity(max_particles);
        let (vertex_buffer, index_buffer) = Self::create_buffers(device, capacity)?;

        device.release_buffer(self.vertex_buffer);
        device.release_buffer(self.index_buffer);
        self.vertex_buffer = vertex_buffer;
        self.index_buffer = index_buffer;

        self.particles = vec![Particle::default(); capacity];
        self.local_vertices = Self::quad_vertices(capacity);
        self.first_alive = 0;
        self.first_dead = 0;
        self.living = 0;

        log::debug!("Emitter resized to {} particles", capacity);
        Ok(())
    }

    /// Set the continuous emission rate; zero or less stops emission
    pub fn set_particles_per_second(&mut self, particles_per_second: f32) {
        self.particles_per_second = particles_per_second;
        self.seconds_per_particle = if particles_per_second > 0.0 {
            1.0 / particles_per_second
        } else {
            f32::INFINITY
        };
    }

    /// Set the particle lifetime in seconds
    pub fn set_lifetime(&mut self, lifetime: f32) {
        self.lifetime = lifetime;
    }

    /// Set the size at spawn
    pub fn set_start_size(&mut self, size: f32) {
        self.start_size = size;
    }

    /// Set the size at the end of the lifetime
    pub fn set_end_size(&mut self, size: f32) {
        self.end_size = size;
    }

    /// Set the color at spawn
    pub fn set_start_color(&mut self, color: Vec4) {
        self.start_color = color;
    }

    /// Set the color at the end of the lifetime
    pub fn set_end_color(&mut self, color: Vec4) {
        self.end_color = color;
    }

    /// Set the base velocity of continuously emitted particles
    pub fn set_emitter_velocity(&mut self, velocity: Vec3) {
        self.start_velocity = velocity;
    }

    /// Move the emitter
    pub fn set_emitter_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the constant acceleration
    pub fn set_emitter_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = acceleration;
    }

    /// Emitter position
    pub fn emitter_position(&self) -> Vec3 {
        self.position
    }

    /// Continuous emission rate
    pub fn particles_per_second(&self) -> f32 {
        self.particles_per_second
    }

    /// Ring buffer capacity
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of living particles
    pub fn living_count(&self) -> usize {
        self.living
    }

    /// Whether every slot holds a living particle
    pub fn is_full(&self) -> bool {
        self.living == self.capacity()
    }

    /// Slot of the oldest living particle
    pub fn first_alive_index(&self) -> usize {
        self.first_alive
    }

    /// Slot the next particle will be written to
    pub fn first_dead_index(&self) -> usize {
        self.first_dead
    }

    /// Particle slot, alive or dead
    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Living particles, oldest first
    pub fn living_particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        let (head, tail) = self.alive_ranges();
        head.chain(tail).map(move |index| &self.particles[index])
    }

    /// Vertex shader this emitter draws with
    pub fn vertex_shader(&self) -> VertexShaderKey {
        self.vertex_shader
    }

    /// Pixel shader this emitter draws with
    pub fn pixel_shader(&self) -> PixelShaderKey {
        self.pixel_shader
    }

    /// Particle texture
    pub fn texture(&self) -> TextureKey {
        self.texture
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
    use crate::render::headless::{HeadlessDevice, HeadlessShader};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn still_settings(max_particles: usize) -> EmitterSettings {
        EmitterSettings {
            max_particles,
            particles_per_second: 0.0,
            lifetime: 2.0,
            velocity_jitter: 0.0,
            seed: Some(7),
            ..EmitterSettings::default()
        }
    }

    fn make_emitter(device: &mut HeadlessDevice, settings: &EmitterSettings) -> Emitter {
        let vs = SlotMap::<VertexShaderKey, ()>::with_key().insert(());
        let ps = SlotMap::<PixelShaderKey, ()>::with_key().insert(());
        let texture = SlotMap::<TextureKey, ()>::with_key().insert(());
        Emitter::new(device, settings, vs, ps, texture).unwrap()
    }

    #[test]
    fn test_spawn_when_full_changes_nothing() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(3));

        for _ in 0..3 {
            assert!(emitter.spawn_particle());
        }
        let before = (emitter.first_alive_index(), emitter.first_dead_index(), emitter.living_count());

        assert!(!emitter.spawn_particle());
        assert!(!emitter.spawn_explosion_particle());
        assert_eq!(
            (emitter.first_alive_index(), emitter.first_dead_index(), emitter.living_count()),
            before
        );
    }

    #[test]
    fn test_particles_retire_after_lifetime() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(10));

        for _ in 0..6 {
            emitter.spawn_particle();
        }
        emitter.update(0.0);
        assert_eq!(emitter.living_count(), 6);

        emitter.update(2.0);
        assert_eq!(emitter.living_count(), 0);
        assert_eq!(emitter.first_alive_index(), emitter.first_dead_index());
    }

    #[test]
    fn test_still_particle_stays_at_emitter() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(4);
        settings.position = [3.0, 1.0, -2.0];
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.spawn_particle();
        for _ in 0..19 {
            emitter.update(0.1);
            let particle = emitter.living_particles().next().unwrap();
            assert_relative_eq!(particle.position, Vec3::new(3.0, 1.0, -2.0));
        }
    }

    #[test]
    fn test_closed_form_kinematics() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(4);
        settings.start_velocity = [1.0, 0.0, 0.0];
        settings.acceleration = [0.0, -2.0, 0.0];
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.spawn_particle();
        emitter.update(0.5);
        emitter.update(0.5);

        let particle = emitter.living_particles().next().unwrap();
        assert_relative_eq!(particle.position, Vec3::new(1.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_color_and_size_interpolate_with_age() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(4);
        settings.start_size = 1.0;
        settings.end_size = 3.0;
        settings.start_color = [1.0, 1.0, 1.0, 1.0];
        settings.end_color = [0.0, 0.0, 0.0, 0.0];
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.spawn_particle();
        emitter.update(1.0);

        let particle = emitter.living_particles().next().unwrap();
        assert_relative_eq!(particle.size, 2.0);
        assert_relative_eq!(particle.color, Vec4::new(0.5, 0.5, 0.5, 0.5));
    }

    #[test]
    fn test_emission_catches_up_on_large_steps() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(100);
        settings.particles_per_second = 10.0;
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.update(0.55);
        assert_eq!(emitter.living_count(), 5);
    }

    #[test]
    fn test_tiny_interval_fills_buffer_and_returns() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(8);
        settings.particles_per_second = 1.0e10;
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.update(1.0 / 60.0);
        assert_eq!(emitter.living_count(), 8);
        assert!(emitter.is_full());

        emitter.update(1.0 / 60.0);
        assert_eq!(emitter.living_count(), 8);
    }

    #[test]
    fn test_huge_step_spawns_at_most_capacity() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(16);
        settings.particles_per_second = 100.0;
        settings.lifetime = 1.0e9;
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.update(1.0e7);
        assert_eq!(emitter.living_count(), 16);
        assert!(emitter.time_since_emit <= emitter.seconds_per_particle);
    }

    #[test]
    fn test_exact_interval_waits_for_next_step() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(10);
        settings.particles_per_second = 2.0;
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.update(0.5);
        assert_eq!(emitter.living_count(), 0);
        emitter.update(0.25);
        assert_eq!(emitter.living_count(), 1);
    }

    #[test]
    fn test_zero_rate_never_emits() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(10));
        emitter.update(100.0);
        assert_eq!(emitter.living_count(), 0);
    }

    #[test]
    fn test_alive_range_wraps() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(4));

        for _ in 0..3 {
            emitter.spawn_particle();
        }
        emitter.update(1.0);
        emitter.spawn_particle();
        emitter.update(1.0);
        emitter.spawn_particle();

        // the three oldest retired; survivors sit in slot 3 and slot 0
        assert_eq!(emitter.living_count(), 2);
        assert_eq!(emitter.alive_ranges(), (3..4, 0..1));
    }

    #[test]
    fn test_explode_fills_buffer_at_impact_point() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(16));

        emitter.spawn_particle();
        let spawned = emitter.explode(Vec3::new(5.0, 0.0, 5.0));

        assert_eq!(spawned, 15);
        assert!(emitter.is_full());
        assert_relative_eq!(emitter.emitter_position(), Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn test_draw_contiguous_range_is_one_call() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(8));
        let (mut vs, mut ps) = (HeadlessShader::new("ParticleVS"), HeadlessShader::new("ParticlePS"));
        let texture = device.create_texture(1, 1, &[255; 4]).unwrap();

        emitter.spawn_particle();
        emitter.spawn_particle();
        emitter.draw(&mut device, &mut vs, &mut ps, texture, &Camera::default()).unwrap();

        let calls = device.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].index_count, 12);
        assert_eq!(calls[0].first_index, 0);
        assert_eq!(calls[0].blend, Some(BlendMode::Additive));
        assert_eq!(calls[0].depth, Some(DepthMode::ReadOnly));
        assert_eq!(device.current_blend_mode(), None);
        assert_eq!(device.current_depth_mode(), None);
        assert!(ps.record().borrow().texture("particle").is_some());
    }

    #[test]
    fn test_draw_wrapped_range_is_two_calls() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(4));
        let (mut vs, mut ps) = (HeadlessShader::new("ParticleVS"), HeadlessShader::new("ParticlePS"));
        let texture = device.create_texture(1, 1, &[255; 4]).unwrap();

        for _ in 0..3 {
            emitter.spawn_particle();
        }
        emitter.update(1.0);
        emitter.spawn_particle();
        emitter.update(1.0);
        emitter.spawn_particle();

        emitter.draw(&mut device, &mut vs, &mut ps, texture, &Camera::default()).unwrap();
        let calls: Vec<_> = device.draw_calls().iter().map(|c| (c.index_count, c.first_index)).collect();
        assert_eq!(calls, vec![(6, 18), (6, 0)]);
    }

    #[test]
    fn test_draw_with_nothing_alive_is_skipped() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(4));
        let (mut vs, mut ps) = (HeadlessShader::new("ParticleVS"), HeadlessShader::new("ParticlePS"));
        let texture = device.create_texture(1, 1, &[255; 4]).unwrap();

        emitter.draw(&mut device, &mut vs, &mut ps, texture, &Camera::default()).unwrap();
        assert!(device.draw_calls().is_empty());
        assert_eq!(device.upload_count(), 0);
    }

    #[test]
    fn test_upload_writes_only_living_quads() {
        let mut device = HeadlessDevice::new();
        let mut settings = still_settings(3);
        settings.position = [9.0, 0.0, 0.0];
        let mut emitter = make_emitter(&mut device, &settings);

        emitter.spawn_particle();
        emitter.copy_particles_to_gpu(&mut device).unwrap();

        let bytes = device.buffer_contents(emitter.vertex_buffer).unwrap();
        let vertices: Vec<ParticleVertex> = bytes
            .chunks_exact(ParticleVertex::STRIDE as usize)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(vertices.len(), 12);
        assert!(vertices[..4].iter().all(|v| v.position == [9.0, 0.0, 0.0]));
        assert!(vertices[4..].iter().all(|v| v.position == [0.0, 0.0, 0.0]));
        assert_eq!(vertices[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_resize_reallocates_and_clears() {
        let mut device = HeadlessDevice::new();
        let mut emitter = make_emitter(&mut device, &still_settings(4));
        emitter.spawn_particle();

        emitter.set_max_particles(&mut device, 32).unwrap();
        assert_eq!(emitter.capacity(), 32);
        assert_eq!(emitter.living_count(), 0);
        assert_eq!(device.live_buffer_count(), 2);
    }
}
