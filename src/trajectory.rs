//! Camera trajectory around the captured object.
//!
//! Cameras orbit the bounding-volume center once around the world Z axis.
//! Instead of a flat ring the elevation (measured from +Z) oscillates around
//! 45 degrees with 1.5 periods per orbit, so consecutive revolutions would not
//! revisit the same angles and a fixed view count covers more of the sphere.
//!
//! ```text
//! azimuth(i)   = 2pi * i / n
//! elevation(i) = pi/4 + pi/8 * sin(3pi * i / n)
//! offset       = d * (sin(el) cos(az), sin(el) sin(az), cos(el))
//! ```

use std::f32::consts::{FRAC_PI_4, FRAC_PI_8, PI, TAU};

use cgmath::{Point3, Vector3};

use crate::{
    camera::{Pose, look_at},
    data_structures::bounds::BoundingVolume,
    error::CaptureError,
};

/// Camera distance as a multiple of the bounding-volume diagonal. Keeps the
/// whole object inside the pi/3 field of view.
pub const DISTANCE_FACTOR: f32 = 2.0;
pub const BASE_ELEVATION: f32 = FRAC_PI_4;
pub const ELEVATION_AMPLITUDE: f32 = FRAC_PI_8;
/// Angular frequency of the elevation oscillation over one orbit.
pub const ELEVATION_FREQUENCY: f32 = 3.0 * PI;

/// Azimuth of view `index` out of `view_count`, in radians.
pub fn azimuth(index: usize, view_count: usize) -> f32 {
    TAU * index as f32 / view_count as f32
}

/// Elevation from the +Z axis of view `index` out of `view_count`, in radians.
pub fn elevation(index: usize, view_count: usize) -> f32 {
    BASE_ELEVATION + ELEVATION_AMPLITUDE * (ELEVATION_FREQUENCY * index as f32 / view_count as f32).sin()
}

pub fn camera_distance(bounds: &BoundingVolume) -> f32 {
    bounds.extent_size() * DISTANCE_FACTOR
}

/// One frame of the capture: where the camera is and how it is oriented.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSample {
    pub index: usize,
    pub camera_position: Point3<f32>,
    pub pose: Pose,
}

/// Ordered, finite sequence of [`ViewSample`]s.
///
/// The sequence is a pure function of the view count and the bounding volume.
/// It is consumed once, in order; every item drives exactly one render.
#[derive(Clone, Debug)]
pub struct Trajectory {
    view_count: usize,
    center: Point3<f32>,
    distance: f32,
    next: usize,
}

impl Trajectory {
    /// Validate inputs and prepare the orbit.
    ///
    /// A zero view count is a configuration error. A bounding volume without
    /// extent would put every camera on the object center, so it is rejected
    /// as [`CaptureError::DegenerateGeometry`].
    pub fn new(view_count: usize, bounds: &BoundingVolume) -> Result<Self, CaptureError> {
        if view_count == 0 {
            return Err(CaptureError::InvalidConfig(
                "view count must be positive".to_string(),
            ));
        }
        if bounds.is_degenerate() {
            return Err(CaptureError::DegenerateGeometry {
                extent: bounds.extent_size(),
            });
        }
        Ok(Self {
            view_count,
            center: bounds.center(),
            distance: camera_distance(bounds),
            next: 0,
        })
    }

    pub fn view_count(&self) -> usize {
        self.view_count
    }

    pub fn camera_distance(&self) -> f32 {
        self.distance
    }

    /// The sample at `index`, independent of iteration state.
    pub fn sample(&self, index: usize) -> Result<ViewSample, CaptureError> {
        let azimuth = azimuth(index, self.view_count);
        let elevation = elevation(index, self.view_count);
        let d = self.distance;
        let offset = Vector3::new(
            d * elevation.sin() * azimuth.cos(),
            d * elevation.sin() * azimuth.sin(),
            d * elevation.cos(),
        );
        let camera_position = self.center + offset;
        let pose = look_at(camera_position, self.center, Vector3::unit_z())?;
        Ok(ViewSample {
            index,
            camera_position,
            pose,
        })
    }
}

impl Iterator for Trajectory {
    type Item = Result<ViewSample, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.view_count {
            return None;
        }
        let sample = self.sample(self.next);
        self.next += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view_count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Trajectory {}
