//! Error kinds surfaced by the capture pipeline.
//!
//! Every variant is fatal: a run either produces all frames plus the manifest
//! or it is reported as failed. The messages carry the asset path, frame index
//! or output path needed to tell which stage broke.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The asset container is missing structures the geometry provider needs.
    #[error("failed to parse asset {path}: {reason}")]
    AssetParse { path: PathBuf, reason: String },

    /// The bounding volume has no extent, so no camera distance can be derived.
    #[error("degenerate geometry: bounding volume extent is {extent}, cameras cannot be placed")]
    DegenerateGeometry { extent: f32 },

    /// Look-at construction was given a colinear eye/target/up configuration.
    #[error("degenerate camera basis: eye {eye:?}, target {target:?}, up {up:?}")]
    DegenerateCameraBasis {
        eye: [f32; 3],
        target: [f32; 3],
        up: [f32; 3],
    },

    #[error("failed to upload mesh to the renderer: {0}")]
    MeshUpload(String),

    #[error("render failure on frame {frame}: {reason}")]
    Render { frame: usize, reason: String },

    #[error("failed to encode frame {frame} to {path}: {source}")]
    ImageEncode {
        frame: usize,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetParse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
