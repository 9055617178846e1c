//! Base scene and per-frame camera attachment.
//!
//! The mesh and the two-light rig are fixed for a whole capture run. A camera
//! is attached for exactly one frame through a [`CameraAttachment`] guard that
//! detaches it when dropped, including on early returns and unwinding, so the
//! scene always returns to its lights + mesh state between frames.

use std::ops::Deref;

use cgmath::{Point3, Vector3};

use crate::camera::Camera;

/// A directional light.
///
/// Only `direction` influences shading. `position` is kept because the rig is
/// described by light poses and it makes the setup easier to inspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl DirectionalLight {
    /// Key light, placed at (2, 2, 2) and shining down -Z.
    pub fn key() -> Self {
        Self {
            position: Point3::new(2.0, 2.0, 2.0),
            direction: -Vector3::unit_z(),
            color: [1.0, 1.0, 1.0],
            intensity: 4.0,
        }
    }

    /// Fill light from the opposite side, placed at (-2, -2, 1).
    pub fn fill() -> Self {
        Self {
            position: Point3::new(-2.0, -2.0, 1.0),
            direction: -Vector3::unit_z(),
            color: [1.0, 1.0, 1.0],
            intensity: 1.5,
        }
    }
}

/// Mesh plus lights, and at most one active camera.
///
/// `M` is whatever handle the renderer uses for an uploaded mesh.
#[derive(Debug)]
pub struct Scene<M> {
    mesh: M,
    lights: [DirectionalLight; 2],
    camera: Option<Camera>,
}

impl<M> Scene<M> {
    /// A scene with the default key + fill light rig.
    pub fn new(mesh: M) -> Self {
        Self::with_lights(mesh, [DirectionalLight::key(), DirectionalLight::fill()])
    }

    pub fn with_lights(mesh: M, lights: [DirectionalLight; 2]) -> Self {
        Self {
            mesh,
            lights,
            camera: None,
        }
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn lights(&self) -> &[DirectionalLight; 2] {
        &self.lights
    }

    /// The currently attached camera, `None` between frames.
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Attach `camera` until the returned guard is dropped.
    ///
    /// The guard borrows the scene mutably, so a second camera cannot be
    /// attached while one is active.
    pub fn attach_camera(&mut self, camera: Camera) -> CameraAttachment<'_, M> {
        self.camera = Some(camera);
        CameraAttachment { scene: self }
    }
}

/// A scene with a camera attached for the lifetime of this value.
#[derive(Debug)]
pub struct CameraAttachment<'s, M> {
    scene: &'s mut Scene<M>,
}

impl<M> CameraAttachment<'_, M> {
    pub fn camera(&self) -> &Camera {
        match &self.scene.camera {
            Some(camera) => camera,
            // attach_camera always sets it and only Drop clears it
            None => unreachable!("camera attachment without a camera"),
        }
    }
}

impl<M> Deref for CameraAttachment<'_, M> {
    type Target = Scene<M>;

    fn deref(&self) -> &Self::Target {
        &*self.scene
    }
}

impl<M> Drop for CameraAttachment<'_, M> {
    fn drop(&mut self) {
        self.scene.camera = None;
    }
}
