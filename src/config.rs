//! Capture configuration and command line parsing.
//!
//! The binary maps [`Args`] onto a [`CaptureConfig`]; library callers build
//! the config directly. Both go through [`CaptureConfig::validate`] before any
//! file is touched.

use std::path::PathBuf;

use clap::Parser;

use crate::{error::CaptureError, render::Resolution};

pub const DEFAULT_VIEW_COUNT: usize = 100;
pub const DEFAULT_RESOLUTION: Resolution = Resolution::new(800, 800);
pub const DEFAULT_OUTPUT_DIR: &str = "renders";

/// Encoding of the captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub(crate) fn encoding(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Directory receiving the images and `transforms.json`. Created with its
    /// parents if absent.
    pub output_dir: PathBuf,
    pub view_count: usize,
    pub resolution: Resolution,
    pub image_format: ImageFormat,
}

impl CaptureConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_view_count(mut self, view_count: usize) -> Self {
        self.view_count = view_count;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_image_format(mut self, image_format: ImageFormat) -> Self {
        self.image_format = image_format;
        self
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.view_count == 0 {
            return Err(CaptureError::InvalidConfig(
                "view count must be positive".to_string(),
            ));
        }
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "resolution {} has a zero dimension",
                self.resolution
            )));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            view_count: DEFAULT_VIEW_COUNT,
            resolution: DEFAULT_RESOLUTION,
            image_format: ImageFormat::default(),
        }
    }
}

/// Render a glTF asset from an orbit of viewpoints and write a NeRF dataset.
#[derive(Parser, Debug, Clone)]
#[command(name = "render-views", version, about)]
pub struct Args {
    /// Path to the .glb / .gltf asset
    pub asset: PathBuf,

    /// Output directory for images and transforms.json
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Number of viewpoints to render
    #[arg(short = 'n', long, default_value_t = DEFAULT_VIEW_COUNT)]
    pub views: usize,

    /// Image resolution as WIDTHxHEIGHT
    #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: Resolution,

    /// Image encoding
    #[arg(long, default_value = "png", value_enum)]
    pub format: ImageFormat,
}

impl Args {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig::new(&self.output)
            .with_view_count(self.views)
            .with_resolution(self.resolution)
            .with_image_format(self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_documented_defaults() {
        let args = Args::try_parse_from(["render-views", "helmet.glb"]).unwrap();
        let config = args.capture_config();
        assert_eq!(args.asset, PathBuf::from("helmet.glb"));
        assert_eq!(config.output_dir, PathBuf::from("renders"));
        assert_eq!(config.view_count, 100);
        assert_eq!(config.resolution, Resolution::new(800, 800));
        assert_eq!(config.image_format, ImageFormat::Png);
    }

    #[test]
    fn should_parse_overrides() {
        let args = Args::try_parse_from([
            "render-views",
            "model.gltf",
            "-o",
            "out/nested",
            "-n",
            "12",
            "--resolution",
            "640x480",
            "--format",
            "jpeg",
        ])
        .unwrap();
        let config = args.capture_config();
        assert_eq!(config.output_dir, PathBuf::from("out/nested"));
        assert_eq!(config.view_count, 12);
        assert_eq!(config.resolution, Resolution::new(640, 480));
        assert_eq!(config.image_format, ImageFormat::Jpeg);
    }

    #[test]
    fn should_reject_malformed_resolution() {
        assert!(Args::try_parse_from(["render-views", "a.glb", "-r", "800"]).is_err());
    }

    #[test]
    fn validate_should_reject_zero_views_and_empty_resolution() {
        assert!(CaptureConfig::default().validate().is_ok());
        assert!(matches!(
            CaptureConfig::default().with_view_count(0).validate(),
            Err(CaptureError::InvalidConfig(_))
        ));
        assert!(matches!(
            CaptureConfig::default()
                .with_resolution(Resolution::new(0, 10))
                .validate(),
            Err(CaptureError::InvalidConfig(_))
        ));
    }
}
