//! Camera system

use glam::{Mat4, Vec3};

use crate::scene::{NodeId, SceneGraph};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        /// Half-height of the view volume in world units
        size: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Orthographic {
            size: 5.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            near,
            far,
        }
    }

    pub fn orthographic(size: f32, near: f32, far: f32) -> Self {
        Projection::Orthographic { size, near, far }
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self, Projection::Orthographic { .. })
    }

    pub fn orthographic_size(&self) -> Option<f32> {
        match self {
            Projection::Orthographic { size, .. } => Some(*size),
            Projection::Perspective { .. } => None,
        }
    }

    /// Set the orthographic half-height. No effect on perspective projections.
    pub fn set_orthographic_size(&mut self, new_size: f32) {
        if let Projection::Orthographic { size, .. } = self {
            *size = new_size;
        }
    }

    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match self {
            Projection::Perspective { fov_y, near, far } => {
                Mat4::perspective_rh(*fov_y, aspect, *near, *far)
            }
            Projection::Orthographic { size, near, far } => {
                let half_w = size * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -size, *size, *near, *far)
            }
        }
    }

}

/// Viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Camera attached to a scene node.
///
/// The node's world transform places the camera; the camera looks down its
/// local -Z axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub node: NodeId,
    pub projection: Projection,
    pub viewport: Viewport,
    /// Render-target resolution relative to the viewport
    pub render_scale: f32,
}

impl Camera {
    pub fn new(node: NodeId, projection: Projection, viewport: Viewport) -> Self {
        Self {
            node,
            projection,
            viewport,
            render_scale: 1.0,
        }
    }

    pub fn with_render_scale(mut self, render_scale: f32) -> Self {
        self.render_scale = render_scale;
        self
    }

    pub fn is_orthographic(&self) -> bool {
        self.projection.is_orthographic()
    }

    /// Camera-to-world transform
    pub fn camera_to_world<S: SceneGraph + ?Sized>(&self, scene: &S) -> Mat4 {
        scene.world_matrix(self.node)
    }

    /// Get the view matrix
    pub fn view_matrix<S: SceneGraph + ?Sized>(&self, scene: &S) -> Mat4 {
        self.camera_to_world(scene).inverse()
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix(self.viewport.aspect())
    }

    /// Matrices handed to render passes for this frame
    pub fn matrices<S: SceneGraph + ?Sized>(&self, scene: &S) -> CameraMatrices {
        CameraMatrices {
            view: self.view_matrix(scene),
            projection: self.projection_matrix(),
            orthographic: self.is_orthographic(),
        }
    }
}

/// View and projection of the camera being rendered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub orthographic: bool,
}

impl CameraMatrices {
    pub const IDENTITY: Self = Self {
        view: Mat4::IDENTITY,
        projection: Mat4::IDENTITY,
        orthographic: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneTree, Transform};

    #[test]
    fn orthographic_size_is_settable() {
        let mut projection = Projection::orthographic(5.0, 0.1, 100.0);
        projection.set_orthographic_size(2.88);
        assert_eq!(projection.orthographic_size(), Some(2.88));

        let mut perspective = Projection::perspective(60.0, 0.1, 100.0);
        perspective.set_orthographic_size(2.88);
        assert_eq!(perspective.orthographic_size(), None);
    }

    #[test]
    fn view_matrix_inverts_node_transform() {
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        let camera = Camera::new(node, Projection::default(), Viewport::new(320, 180));

        let view = camera.view_matrix(&scene);
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        assert!((origin_in_view - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
    }
}
