//! Render-and-export pipeline.
//!
//! [`capture_views`] walks the camera trajectory in index order. For each
//! sample it attaches a camera to the scene, renders, writes the image and
//! records the pose. The manifest is written once, after the last image is on
//! disk, so a failed run leaves image files behind but never a manifest that
//! references missing frames.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    camera::{Camera, Projection},
    config::{CaptureConfig, ImageFormat},
    data_structures::{bounds::BoundingVolume, geometry::MeshGeometry},
    error::CaptureError,
    manifest::{FrameRecord, Manifest, image_file_name},
    render::{RenderedFrame, Resolution, SceneRenderer},
    scene::Scene,
    trajectory::{Trajectory, ViewSample},
};

const PROGRESS_INTERVAL: usize = 10;

/// What a successful capture run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureReport {
    /// Image paths in frame order.
    pub images: Vec<PathBuf>,
    pub manifest_path: PathBuf,
    pub bounds: BoundingVolume,
    pub camera_distance: f32,
}

/// Render `config.view_count` views of `geometry` and write the dataset into
/// `config.output_dir`.
///
/// Everything that can be checked up front (config, geometry extent, face
/// indices) is checked before the output directory is created. Any failure
/// afterwards aborts the run without writing the manifest.
pub fn capture_views<R: SceneRenderer>(
    renderer: &mut R,
    geometry: &MeshGeometry,
    config: &CaptureConfig,
) -> Result<CaptureReport, CaptureError> {
    config.validate()?;

    let bounds = BoundingVolume::from_points(&geometry.vertices)
        .ok_or(CaptureError::DegenerateGeometry { extent: 0.0 })?;
    log::info!(
        "bounding volume: center ({:.4}, {:.4}, {:.4}), extent {:.4}",
        bounds.center().x,
        bounds.center().y,
        bounds.center().z,
        bounds.extent_size()
    );
    let trajectory = Trajectory::new(config.view_count, &bounds)?;
    let camera_distance = trajectory.camera_distance();
    let projection = Projection::new(config.resolution, camera_distance);
    if projection.aspect() != 1.0 {
        log::warn!(
            "{} is not square: camera_angle_x is written as the fixed {:.4} rad, \
             which only matches the horizontal field of view of square frames",
            config.resolution,
            projection.fovy()
        );
    }

    if let Some(face) = geometry.first_invalid_face() {
        return Err(CaptureError::MeshUpload(format!(
            "face {} references a vertex outside of the {} provided",
            face,
            geometry.vertices.len()
        )));
    }

    let mesh = renderer
        .upload(geometry)
        .map_err(|e| CaptureError::MeshUpload(format!("{:#}", e)))?;
    let mut scene = Scene::new(mesh);

    let output_dir = config.output_dir.as_path();
    fs::create_dir_all(output_dir).map_err(|e| CaptureError::io(output_dir, e))?;
    log::info!(
        "capturing {} views at {} into {}",
        config.view_count,
        config.resolution,
        output_dir.display()
    );

    let view_count = trajectory.view_count();
    let mut manifest = Manifest::new(projection.fovy());
    let mut images = Vec::with_capacity(view_count);
    for sample in trajectory {
        let sample = sample?;
        let frame = render_frame(renderer, &mut scene, &sample, projection, config.resolution)?;

        let file_name = image_file_name(sample.index, config.image_format);
        let path = output_dir.join(&file_name);
        save_frame(&frame, &path, sample.index, config.image_format)?;
        log::debug!(
            "frame {}: camera at ({:.4}, {:.4}, {:.4}) -> {}",
            sample.index,
            sample.camera_position.x,
            sample.camera_position.y,
            sample.camera_position.z,
            path.display()
        );

        manifest.push(FrameRecord::new(&file_name, &sample.pose));
        images.push(path);

        let done = sample.index + 1;
        if done % PROGRESS_INTERVAL == 0 || done == view_count {
            log::info!("rendered {}/{} views", done, view_count);
        }
    }

    let manifest_path = manifest.write(output_dir)?;
    log::info!(
        "wrote {} frames to {}",
        manifest.len(),
        manifest_path.display()
    );

    Ok(CaptureReport {
        images,
        manifest_path,
        bounds,
        camera_distance,
    })
}

/// Render one sample. The camera stays attached only while the renderer runs.
fn render_frame<R: SceneRenderer>(
    renderer: &mut R,
    scene: &mut Scene<R::Mesh>,
    sample: &ViewSample,
    projection: Projection,
    resolution: Resolution,
) -> Result<RenderedFrame, CaptureError> {
    let attached = scene.attach_camera(Camera::new(sample.pose, projection));
    let frame = renderer
        .render(&attached, resolution)
        .map_err(|e| CaptureError::Render {
            frame: sample.index,
            reason: format!("{:#}", e),
        })?;
    if frame.resolution() != resolution {
        return Err(CaptureError::Render {
            frame: sample.index,
            reason: format!(
                "renderer returned a {} frame, expected {}",
                frame.resolution(),
                resolution
            ),
        });
    }
    Ok(frame)
}

fn save_frame(
    frame: &RenderedFrame,
    path: &Path,
    index: usize,
    format: ImageFormat,
) -> Result<(), CaptureError> {
    let result = match format {
        ImageFormat::Png => frame.color.save_with_format(path, format.encoding()),
        // no alpha channel in JPEG
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(frame.color.clone())
            .to_rgb8()
            .save_with_format(path, format.encoding()),
    };
    result.map_err(|source| CaptureError::ImageEncode {
        frame: index,
        path: path.to_path_buf(),
        source,
    })
}
