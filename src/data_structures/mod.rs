//! Capture data structures: geometry, bounds, GPU meshes and render targets.
//!
//! - `geometry` holds the CPU mesh and the provider's explicit fallback variants
//! - `bounds` estimates the object center and characteristic size
//! - `model` contains the GPU vertex layout and mesh buffers
//! - `texture` contains the offscreen color/depth attachments

pub mod bounds;
pub mod geometry;
pub mod model;
pub mod texture;
