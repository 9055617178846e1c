//! Camera poses, look-at construction and projection.
//!
//! Poses are camera-to-world transforms in a right-handed convention: the
//! camera looks down its local negative Z axis, local Y is up and local X is
//! right. This is the convention radiance-field trainers expect in
//! `transforms.json`, and it is also what `cgmath::perspective` assumes, so the
//! same [`Pose`] drives both the GPU view matrix and the exported manifest.

use std::f64::consts::FRAC_PI_3;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, Rad, Vector3, Vector4};

use crate::{error::CaptureError, render::Resolution};

/// Vertical field of view of every capture camera, in radians.
pub const FIELD_OF_VIEW_Y: f64 = FRAC_PI_3;

/// cgmath produces OpenGL clip space (z in -1..1), wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A camera-to-world transform.
///
/// The columns of the upper-left 3x3 block are `[right, up, -forward]`, the
/// fourth column is the camera position in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose(Matrix4<f32>);

impl Pose {
    pub fn matrix(&self) -> Matrix4<f32> {
        self.0
    }

    pub fn rotation(&self) -> Matrix3<f32> {
        Matrix3::from_cols(self.0.x.truncate(), self.0.y.truncate(), self.0.z.truncate())
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(self.0.w.x, self.0.w.y, self.0.w.z)
    }

    /// Direction the camera looks at, i.e. the negated third column.
    pub fn forward(&self) -> Vector3<f32> {
        -self.0.z.truncate()
    }

    /// World-to-camera transform.
    ///
    /// The rotation block is orthonormal, so the inverse is the transposed
    /// rotation combined with the rotated, negated translation.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let rotation_t = self.rotation().transpose();
        let translation = -(rotation_t * self.0.w.truncate());
        let mut view = Matrix4::from(rotation_t);
        view.w = translation.extend(1.0);
        view
    }

    /// Row-major 4x4 array, the layout `transform_matrix` uses on disk.
    pub fn to_rows(&self) -> [[f32; 4]; 4] {
        let m = self.0;
        [
            [m.x.x, m.y.x, m.z.x, m.w.x],
            [m.x.y, m.y.y, m.z.y, m.w.y],
            [m.x.z, m.y.z, m.z.z, m.w.z],
            [m.x.w, m.y.w, m.z.w, m.w.w],
        ]
    }
}

impl From<Pose> for Matrix4<f32> {
    fn from(pose: Pose) -> Self {
        pose.0
    }
}

// Minimum |forward x up| for unit inputs, about 1e-6 rad between the two.
const BASIS_EPSILON: f32 = 1e-6;

/// Build the camera-to-world pose of a camera at `eye` looking at `target`.
///
/// `up` only needs to be roughly up; the true up vector is re-derived so the
/// basis is orthonormal. Fails if `eye == target` or if `up` is parallel to
/// the view direction instead of producing a NaN-filled matrix. Only the
/// directions matter, so the scene may be arbitrarily small.
pub fn look_at(
    eye: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
) -> Result<Pose, CaptureError> {
    let degenerate = || CaptureError::DegenerateCameraBasis {
        eye: eye.into(),
        target: target.into(),
        up: up.into(),
    };
    let unit = |v: Vector3<f32>| {
        let length = v.magnitude();
        (length > 0.0 && length.is_finite()).then(|| v / length)
    };

    let forward = unit(target - eye).ok_or_else(degenerate)?;
    let up = unit(up).ok_or_else(degenerate)?;

    let side = forward.cross(up);
    if !(side.magnitude() > BASIS_EPSILON) {
        return Err(degenerate());
    }
    let right = side.normalize();
    // right and forward are orthonormal so this is unit length already
    let true_up = right.cross(forward);

    Ok(Pose(Matrix4::from_cols(
        right.extend(0.0),
        true_up.extend(0.0),
        (-forward).extend(0.0),
        Vector4::new(eye.x, eye.y, eye.z, 1.0),
    )))
}

/// Perspective projection of the capture camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: f64,
    znear: f32,
    zfar: f32,
}

impl Projection {
    /// Projection for cameras orbiting at `camera_distance`.
    ///
    /// The object lies within half its diagonal of the orbit center, which is
    /// at most a quarter of the distance, so the clip planes bracket it with
    /// plenty of room on both sides.
    pub fn new(resolution: Resolution, camera_distance: f32) -> Self {
        Self {
            aspect: resolution.aspect(),
            fovy: FIELD_OF_VIEW_Y,
            znear: camera_distance * 0.01,
            zfar: camera_distance * 4.0,
        }
    }

    /// The fixed field of view, also exported as `camera_angle_x`.
    pub fn fovy(&self) -> f64 {
        self.fovy
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let fovy = Rad(self.fovy as f32);
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, self.aspect, self.znear, self.zfar)
    }
}

/// A camera that can be attached to a scene for a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    pub projection: Projection,
}

impl Camera {
    pub fn new(pose: Pose, projection: Projection) -> Self {
        Self { pose, projection }
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.pose.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_position: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: Matrix4::identity().into(),
            view_position: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_position = camera.pose.position().to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
