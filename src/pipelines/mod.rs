//! Render pipeline definitions for the capture renderer.
//!
//! - `basic` builds the depth-tested mesh pipeline
//! - `light` holds the two-light uniform and its bind group

pub mod basic;
pub mod light;
