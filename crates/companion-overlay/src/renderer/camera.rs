use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::api::config::CameraParams;

/// Orbit camera looking at the world origin.
///
/// The view is built as translate(0, 0, -distance) · rotX(pitch) · rotY(yaw),
/// with a right-handed perspective projection (Y up, GL depth range).
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub distance: f32,
    pub pitch_deg: f32,
    pub yaw_deg: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Overlay size in pixels.
    pub viewport: Vec2,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl Camera3D {
    pub fn new(params: &CameraParams, viewport: Vec2) -> Self {
        Self {
            distance: params.distance,
            pitch_deg: params.pitch_deg,
            yaw_deg: params.yaw_deg,
            fov_y_deg: params.fov_y_deg,
            near: params.near,
            far: params.far,
            viewport,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn aspect(&self) -> f32 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.pitch_deg.to_radians())
            * Mat4::from_rotation_y(self.yaw_deg.to_radians())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), self.aspect(), self.near, self.far)
    }

    /// Freeze the current matrices for one frame.
    pub fn frame_transform(&self) -> FrameTransform {
        FrameTransform::new(self.projection_matrix() * self.view_matrix(), self.viewport)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: (self.projection_matrix() * self.view_matrix()).to_cols_array_2d(),
        }
    }
}

/// Immutable world-to-screen mapping captured when a frame is drawn.
///
/// Anchor projection always goes through the transform of the last completed
/// frame, never through live camera state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    view_proj: Mat4,
    inv_view_proj: Mat4,
    viewport: Vec2,
}

impl FrameTransform {
    pub fn new(view_proj: Mat4, viewport: Vec2) -> Self {
        Self {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            viewport,
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// World point to overlay-local pixels (origin top-left, Y down).
    /// `None` for points behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }

    /// Cast a ray through an overlay pixel and intersect it with the
    /// horizontal plane `y = plane_y`.
    pub fn unproject_to_plane(&self, screen: Vec2, plane_y: f32) -> Option<Vec3> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc_x = screen.x / self.viewport.x * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / self.viewport.y * 2.0;
        let near = self.unproject_ndc(Vec4::new(ndc_x, ndc_y, -1.0, 1.0))?;
        let far = self.unproject_ndc(Vec4::new(ndc_x, ndc_y, 1.0, 1.0))?;

        let dir = far - near;
        if dir.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = (plane_y - near.y) / dir.y;
        if t < 0.0 {
            return None;
        }
        Some(near + dir * t)
    }

    fn unproject_ndc(&self, ndc: Vec4) -> Option<Vec3> {
        let world = self.inv_view_proj * ndc;
        if world.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(world.truncate() / world.w)
    }
}
