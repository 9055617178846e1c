//! The `transforms.json` manifest consumed by radiance-field trainers.
//!
//! ```json
//! { "camera_angle_x": 1.0471975511965976,
//!   "frames": [
//!     { "file_path": "./image_0000.png", "transform_matrix": [[...], [...], [...], [...]] }
//!   ] }
//! ```
//!
//! `transform_matrix` is the camera-to-world pose, row-major. Frames are stored
//! in ascending capture index order.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{camera::Pose, config::ImageFormat, error::CaptureError};

pub const MANIFEST_FILE_NAME: &str = "transforms.json";
const MANIFEST_TMP_FILE_NAME: &str = "transforms.json.tmp";

/// File name of the image for frame `index`, zero-padded to four digits.
pub fn image_file_name(index: usize, format: ImageFormat) -> String {
    format!("image_{:04}.{}", index, format.extension())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub file_path: String,
    pub transform_matrix: [[f32; 4]; 4],
}

impl FrameRecord {
    /// Record for an image stored next to the manifest.
    pub fn new(file_name: &str, pose: &Pose) -> Self {
        Self {
            file_path: format!("./{}", file_name),
            transform_matrix: pose.to_rows(),
        }
    }

    /// Path of the referenced image, resolved against the manifest directory.
    pub fn resolve(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(self.file_path.trim_start_matches("./"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Horizontal field of view in radians.
    pub camera_angle_x: f64,
    pub frames: Vec<FrameRecord>,
}

impl Manifest {
    pub fn new(camera_angle_x: f64) -> Self {
        Self {
            camera_angle_x,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: FrameRecord) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Write the manifest as pretty-printed JSON into `dir`.
    ///
    /// The JSON goes to a temporary file that is renamed into place, so a
    /// failed write never leaves a truncated `transforms.json` behind.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, CaptureError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let tmp = dir.join(MANIFEST_TMP_FILE_NAME);
        let file = File::create(&tmp).map_err(|e| CaptureError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| CaptureError::io(&tmp, e.into()))?;
        writer.flush().map_err(|e| CaptureError::io(&tmp, e))?;
        drop(writer);
        fs::rename(&tmp, &path).map_err(|e| CaptureError::io(&path, e))?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|e| CaptureError::io(path, e))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| CaptureError::io(path, e.into()))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, Point3, Vector3};

    use super::*;
    use crate::camera::look_at;

    #[test]
    fn should_zero_pad_image_names() {
        assert_eq!(image_file_name(0, ImageFormat::Png), "image_0000.png");
        assert_eq!(image_file_name(42, ImageFormat::Jpeg), "image_0042.jpg");
        assert_eq!(image_file_name(12345, ImageFormat::Png), "image_12345.png");
    }

    #[test]
    fn should_serialize_trainer_schema() {
        let pose = look_at(Point3::new(2.0, 0.0, 2.0), Point3::origin(), Vector3::unit_z()).unwrap();
        let mut manifest = Manifest::new(std::f64::consts::FRAC_PI_3);
        manifest.push(FrameRecord::new("image_0000.png", &pose));

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["camera_angle_x"], serde_json::json!(std::f64::consts::FRAC_PI_3));
        let frame = &json["frames"][0];
        assert_eq!(frame["file_path"], "./image_0000.png");
        let matrix = frame["transform_matrix"].as_array().unwrap();
        assert_eq!(matrix.len(), 4);
        assert!(matrix.iter().all(|row| row.as_array().unwrap().len() == 4));
        // translation lives in the last column of the first three rows
        assert_eq!(matrix[0][3], 2.0);
        assert_eq!(matrix[2][3], 2.0);
        assert_eq!(matrix[3], serde_json::json!([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn should_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let pose = look_at(Point3::new(0.0, 3.0, 1.0), Point3::origin(), Vector3::unit_z()).unwrap();
        let mut manifest = Manifest::new(1.0);
        manifest.push(FrameRecord::new("image_0000.png", &pose));
        manifest.push(FrameRecord::new("image_0001.png", &pose));

        let path = manifest.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(MANIFEST_FILE_NAME));
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
        assert!(!dir.path().join(MANIFEST_TMP_FILE_NAME).exists());
    }

    #[test]
    fn should_keep_exact_field_of_view_through_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::new(std::f64::consts::FRAC_PI_3);

        let path = manifest.write(dir.path()).unwrap();
        assert_eq!(Manifest::read(&path).unwrap().camera_angle_x, std::f64::consts::FRAC_PI_3);
    }

    #[test]
    fn should_not_leave_partial_manifest_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        // a directory in the way of the temporary file makes creating it fail
        fs::create_dir(dir.path().join(MANIFEST_TMP_FILE_NAME)).unwrap();

        let err = Manifest::new(1.0).write(dir.path()).unwrap_err();
        assert!(matches!(err, CaptureError::Io { .. }), "{err}");
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn should_replace_existing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        Manifest::new(1.0).write(dir.path()).unwrap();

        let path = Manifest::new(0.5).write(dir.path()).unwrap();
        assert_eq!(Manifest::read(&path).unwrap().camera_angle_x, 0.5);
    }

    #[test]
    fn should_resolve_relative_paths() {
        let pose = look_at(Point3::new(0.0, 3.0, 1.0), Point3::origin(), Vector3::unit_z()).unwrap();
        let record = FrameRecord::new("image_0007.png", &pose);
        assert_eq!(record.resolve(Path::new("/data/out")), PathBuf::from("/data/out/image_0007.png"));
    }
}
