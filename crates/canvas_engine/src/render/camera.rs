//! # 3D Camera
//!
//! Perspective/orthographic camera with the screen-space helpers the gizmo
//! picking code needs, plus the per-frame matrix history the temporal passes
//! consume.
//!
//! ## Coordinate System
//! Right-handed, Y-up. The camera looks down its local -Z axis; +X is right
//! and +Y is up. Screen coordinates are in pixels with the origin at the
//! top-left of the viewport.
//!
//! ## Frame history
//! [`Camera::update_view_projection`] must be called once per frame before the
//! render passes run. It shifts the current view-projection into the
//! "previous" slot, recomputes the current one and its inverse, and advances
//! the sub-pixel jitter sequence when jittering is enabled.

use crate::foundation::math::{project_point, utils, Mat4, Mat4Ext, Quat, Vec2, Vec3};
use crate::foundation::color::Color;
use crate::scene::{LayerId, LAYERID_DEPTH, LAYERID_IMMEDIATE, LAYERID_SKYBOX, LAYERID_UI, LAYERID_WORLD};

/// Projection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Perspective projection using `fov`
    #[default]
    Perspective,
    /// Orthographic projection using `ortho_height`
    Orthographic,
}

/// Number of entries in the jitter sequence before it repeats
const JITTER_SEQUENCE_LENGTH: u32 = 16;

/// 3D camera for perspective and orthographic projections
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Camera orientation in world space
    pub rotation: Quat,

    /// Projection type
    pub projection: Projection,

    /// Vertical field of view in radians (perspective)
    pub fov: f32,

    /// Half-height of the view volume (orthographic)
    pub ortho_height: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    /// Viewport width in pixels
    pub width: u32,

    /// Viewport height in pixels
    pub height: u32,

    /// Whether the color buffer is cleared before the first scene pass
    pub clear_color_buffer: bool,

    /// Clear color
    pub clear_color: Color,

    /// Whether the depth buffer is cleared before the first scene pass
    ///
    /// May be toggled at runtime; passes re-read it every frame.
    pub clear_depth_buffer: bool,

    /// Layers rendered by this camera
    pub layers: Vec<LayerId>,

    /// Sub-pixel jitter amount in pixels; zero disables jittering
    pub jitter: f32,

    jitter_index: u32,
    jitter_offset: Vec2,
    jitter_offset_previous: Vec2,
    view_projection: Mat4,
    view_projection_previous: Mat4,
    view_projection_inverse: Mat4,
}

impl Camera {
    /// Create a perspective camera looking down -Z
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `width`, `height` - Viewport size in pixels
    /// * `near`, `far` - Clip plane distances
    pub fn perspective(position: Vec3, fov_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::identity(),
            projection: Projection::Perspective,
            fov: utils::deg_to_rad(fov_degrees),
            ortho_height: 10.0,
            near,
            far,
            width: width.max(1),
            height: height.max(1),
            clear_color_buffer: true,
            clear_color: Color::new(0.1, 0.1, 0.1, 1.0),
            clear_depth_buffer: true,
            layers: vec![LAYERID_WORLD, LAYERID_DEPTH, LAYERID_SKYBOX, LAYERID_IMMEDIATE, LAYERID_UI],
            jitter: 0.0,
            jitter_index: 0,
            jitter_offset: Vec2::zeros(),
            jitter_offset_previous: Vec2::zeros(),
            view_projection: Mat4::identity(),
            view_projection_previous: Mat4::identity(),
            view_projection_inverse: Mat4::identity(),
        };
        camera.view_projection = camera.view_projection_matrix();
        camera.view_projection_previous = camera.view_projection;
        camera.view_projection_inverse = camera.view_projection.try_inverse().unwrap_or_else(Mat4::identity);
        camera
    }

    /// Create an orthographic camera looking down -Z
    pub fn orthographic(position: Vec3, ortho_height: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        let mut camera = Self::perspective(position, 45.0, width, height, near, far);
        camera.projection = Projection::Orthographic;
        camera.ortho_height = ortho_height;
        camera.reset_history();
        camera
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let back = self.position - target;
        if back.norm_squared() <= f32::EPSILON {
            return;
        }
        self.rotation = Quat::face_towards(&back, &up);
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update viewport size in pixels
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Viewport aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Whether this camera renders the given layer
    pub fn renders_layer(&self, layer: LayerId) -> bool {
        self.layers.contains(&layer)
    }

    /// World-space viewing direction (-Z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// World-space right (+X)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// World-space up (+Y)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Camera-to-world matrix
    pub fn world_transform(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// World-to-camera matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.rotation.inverse().to_homogeneous() * Mat4::new_translation(&-self.position)
    }

    /// Projection matrix without jitter
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective => Mat4::perspective(self.fov, self.aspect(), self.near, self.far),
            Projection::Orthographic => Mat4::orthographic(self.ortho_height, self.aspect(), self.near, self.far),
        }
    }

    /// Projection matrix with the current sub-pixel jitter applied
    pub fn jittered_projection_matrix(&self) -> Mat4 {
        let mut projection = self.projection_matrix();
        if self.jitter > 0.0 {
            let offset_x = self.jitter_offset.x * 2.0 / self.width as f32;
            let offset_y = self.jitter_offset.y * 2.0 / self.height as f32;
            match self.projection {
                // w = -z_view, so the z column carries the shift
                Projection::Perspective => {
                    projection[(0, 2)] -= offset_x;
                    projection[(1, 2)] -= offset_y;
                }
                Projection::Orthographic => {
                    projection[(0, 3)] += offset_x;
                    projection[(1, 3)] += offset_y;
                }
            }
        }
        projection
    }

    /// View-projection matrix without jitter, computed from the current state
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Advance the frame history
    ///
    /// Shifts the last frame's view-projection into the previous slot, then
    /// recomputes the current matrix and its inverse. Advances the jitter
    /// sequence when `jitter > 0`.
    pub fn update_view_projection(&mut self) {
        self.view_projection_previous = self.view_projection;
        self.view_projection = self.view_projection_matrix();
        self.view_projection_inverse = self
            .view_projection
            .try_inverse()
            .unwrap_or_else(Mat4::identity);

        self.jitter_offset_previous = self.jitter_offset;
        if self.jitter > 0.0 {
            self.jitter_index = (self.jitter_index + 1) % JITTER_SEQUENCE_LENGTH;
            let i = self.jitter_index + 1;
            self.jitter_offset = Vec2::new(halton(i, 2) - 0.5, halton(i, 3) - 0.5) * self.jitter;
        } else {
            self.jitter_offset = Vec2::zeros();
        }
    }

    /// Forget the matrix history, e.g. after a camera cut
    pub fn reset_history(&mut self) {
        self.view_projection = self.view_projection_matrix();
        self.view_projection_previous = self.view_projection;
        self.view_projection_inverse = self.view_projection.try_inverse().unwrap_or_else(Mat4::identity);
    }

    /// View-projection captured by the last [`Camera::update_view_projection`]
    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// View-projection of the frame before
    pub fn view_projection_previous(&self) -> &Mat4 {
        &self.view_projection_previous
    }

    /// Inverse of [`Camera::view_projection`]
    pub fn view_projection_inverse(&self) -> &Mat4 {
        &self.view_projection_inverse
    }

    /// Current and previous jitter offsets in pixels, packed as (x, y, prev x, prev y)
    pub fn jitters(&self) -> [f32; 4] {
        [
            self.jitter_offset.x,
            self.jitter_offset.y,
            self.jitter_offset_previous.x,
            self.jitter_offset_previous.y,
        ]
    }

    /// Convert a screen point to world space
    ///
    /// `z` is the distance along the view direction (camera-space depth) of the
    /// returned point.
    pub fn screen_to_world(&self, x: f32, y: f32, z: f32) -> Vec3 {
        let ndc_x = x / self.width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - y / self.height as f32 * 2.0;
        let inverse = self
            .view_projection_matrix()
            .try_inverse()
            .unwrap_or_else(Mat4::identity);

        match self.projection {
            Projection::Perspective => {
                let far_point = project_point(&inverse, &Vec3::new(ndc_x, ndc_y, 1.0));
                self.position + (far_point - self.position) * (z / self.far)
            }
            Projection::Orthographic => {
                let near_point = project_point(&inverse, &Vec3::new(ndc_x, ndc_y, -1.0));
                near_point + self.forward() * (z - self.near)
            }
        }
    }

    /// Convert a world point to screen space
    ///
    /// Returns pixel x/y (origin top-left) and the camera-space depth in z.
    pub fn world_to_screen(&self, point: &Vec3) -> Vec3 {
        let ndc = project_point(&self.view_projection_matrix(), point);
        let depth = (point - self.position).dot(&self.forward());
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, 10.0), 45.0, 1280, 720, 0.1, 1000.0)
    }
}

/// Element `index` of the Halton low-discrepancy sequence in `base`
fn halton(mut index: u32, base: u32) -> f32 {
    let mut result = 0.0;
    let mut f = 1.0;
    while index > 0 {
        f /= base as f32;
        result += f * (index % base) as f32;
        index /= base;
    }
    result
}
