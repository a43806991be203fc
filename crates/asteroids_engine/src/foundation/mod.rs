//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and transform composition
//! - Frame time tracking
//! - Logging bootstrap

pub mod math;
pub mod time;
pub mod logging;
