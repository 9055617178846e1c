//! nerf-capture
//!
//! Renders a single static glTF asset from an orbit of viewpoints and writes
//! the images together with a `transforms.json` manifest describing every
//! camera pose, ready to be used as a radiance-field training set.
//!
//! High-level modules
//! - `camera`: poses, look-at construction, projection and camera uniform
//! - `capture`: the render-and-export pipeline tying everything together
//! - `config`: capture configuration and command line arguments
//! - `context`: headless GPU context that owns device/queue/pipeline
//! - `data_structures`: geometry, bounding volume, GPU mesh and textures
//! - `error`: error kinds of a capture run
//! - `manifest`: the `transforms.json` schema
//! - `pipelines`: render pipeline and light uniform definitions
//! - `render`: the scene renderer boundary and the offscreen wgpu renderer
//! - `resources`: helpers to load geometry from glTF files
//! - `scene`: base scene (mesh + lights) with scoped camera attachment
//! - `trajectory`: deterministic orbit of camera poses around the asset
//!

pub mod camera;
pub mod capture;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod manifest;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod trajectory;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use capture::{CaptureReport, capture_views};
pub use config::{CaptureConfig, ImageFormat};
pub use error::CaptureError;
pub use render::{OffscreenRenderer, RenderedFrame, Resolution, SceneRenderer};
