//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Logging utilities
//! - Color values shared by materials and render passes

pub mod math;
pub mod logging;
pub mod color;
