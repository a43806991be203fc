//! GPU particle effects
//!
//! A particle [`Emitter`] simulates its particles on the CPU and uploads one
//! camera-facing quad per living particle; see [`emitter`] for the ring-buffer
//! layout.

pub mod emitter;

pub use emitter::{Emitter, EmitterSettings, Particle, ParticleVertex};
