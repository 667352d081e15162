//! Camera-aligned snapping grid

use glam::{Quat, Vec3};

use crate::scene::{Camera, SceneGraph};

/// Orthonormal world-space grid basis with a uniform cell size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBasis {
    pub ex: Vec3,
    pub ey: Vec3,
    pub ez: Vec3,
    /// World-space length of one grid cell
    pub spacing: f32,
}

impl GridBasis {
    /// World axes with unit spacing
    pub const WORLD: Self = Self {
        ex: Vec3::X,
        ey: Vec3::Y,
        ez: Vec3::Z,
        spacing: 1.0,
    };

    pub fn new(ex: Vec3, ey: Vec3, ez: Vec3, spacing: f32) -> Self {
        Self { ex, ey, ez, spacing }
    }

    /// Basis aligned with a rotation's local axes
    pub fn from_rotation(rotation: Quat, spacing: f32) -> Self {
        Self {
            ex: (rotation * Vec3::X).normalize(),
            ey: (rotation * Vec3::Y).normalize(),
            ez: (rotation * Vec3::Z).normalize(),
            spacing,
        }
    }

    /// Move `position` to the nearest point of the lattice
    /// `spacing * (n + bias)` along each basis vector.
    ///
    /// With `bias = 0` grid points sit on cell corners, with `bias = 0.5`
    /// on cell centers. Positions already on the lattice are unchanged.
    pub fn snap(&self, position: Vec3, bias: f32) -> Vec3 {
        let axis = |e: Vec3| {
            let coeff = (position.dot(e) / self.spacing - bias).round();
            e * (self.spacing * (coeff + bias))
        };
        axis(self.ex) + axis(self.ey) + axis(self.ez)
    }
}

/// Computes the per-frame snapping grid from camera state.
pub struct GridProjector;

impl GridProjector {
    /// Orthographic half-height that maps one viewport pixel to
    /// `pixel_size` world units.
    pub fn orthographic_size(pixel_height: u32, pixel_size: f32) -> f32 {
        pixel_height as f32 / 2.0 * pixel_size
    }

    /// World-space length of one rendered pixel.
    pub fn pixel_length(orthographic_size: f32, pixel_height: u32, render_scale: f32) -> f32 {
        (2.0 * orthographic_size) / (pixel_height as f32 * render_scale)
    }

    /// Grid for the camera this frame.
    ///
    /// `None` for perspective cameras or degenerate viewports, where a
    /// world-space pixel size is not defined.
    pub fn project<S: SceneGraph + ?Sized>(camera: &Camera, scene: &S) -> Option<GridBasis> {
        let size = camera.projection.orthographic_size()?;
        if camera.viewport.height == 0 || camera.render_scale <= 0.0 {
            return None;
        }
        let spacing = Self::pixel_length(size, camera.viewport.height, camera.render_scale);
        if !spacing.is_finite() || spacing <= 0.0 {
            return None;
        }
        Some(GridBasis::from_rotation(scene.world_rotation(camera.node), spacing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Projection, SceneTree, Transform, Viewport};
    use rstest::rstest;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn snaps_to_cell_centers() {
        let snapped = GridBasis::WORLD.snap(Vec3::new(1.3, -0.2, 5.9), 0.5);
        assert!(approx(snapped, Vec3::new(1.5, -0.5, 5.5)), "{snapped:?}");
    }

    #[test]
    fn snaps_to_cell_corners() {
        let snapped = GridBasis::WORLD.snap(Vec3::new(1.3, -0.2, 5.9), 0.0);
        assert!(approx(snapped, Vec3::new(1.0, 0.0, 6.0)), "{snapped:?}");
    }

    #[rstest]
    #[case(0.0, Vec3::new(3.0, -2.0, 7.0))]
    #[case(0.5, Vec3::new(3.5, -1.5, 7.5))]
    #[case(0.5, Vec3::new(-0.5, 0.5, -4.5))]
    fn aligned_positions_are_unchanged(#[case] bias: f32, #[case] position: Vec3) {
        let grid = GridBasis::new(Vec3::X, Vec3::Y, Vec3::Z, 0.25);
        let aligned = position * 0.25;
        assert!(approx(grid.snap(aligned, bias), aligned));
    }

    #[test]
    fn snapping_is_idempotent_on_rotated_basis() {
        let grid = GridBasis::from_rotation(Quat::from_rotation_y(0.7), 0.032);
        let once = grid.snap(Vec3::new(1.234, 5.678, -9.1011), 0.5);
        let twice = grid.snap(once, 0.5);
        assert!(approx(once, twice));
    }

    #[test]
    fn pixel_length_matches_configured_pixel_size() {
        let size = GridProjector::orthographic_size(720, 0.032);
        assert!((size - 11.52).abs() < 1e-5);
        let length = GridProjector::pixel_length(size, 720, 1.0);
        assert!((length - 0.032).abs() < 1e-7);
        let scaled = GridProjector::pixel_length(size, 720, 0.5);
        assert!((scaled - 0.064).abs() < 1e-7);
    }

    #[test]
    fn perspective_camera_has_no_grid() {
        let mut scene = SceneTree::new();
        let node = scene.spawn(Transform::new());
        let camera = Camera::new(
            node,
            Projection::perspective(60.0, 0.1, 100.0),
            Viewport::new(640, 360),
        );
        assert!(GridProjector::project(&camera, &scene).is_none());
    }

    #[test]
    fn basis_follows_camera_rotation() {
        let mut scene = SceneTree::new();
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let node = scene.spawn(Transform::from_position_rotation(Vec3::ZERO, rotation));
        let camera = Camera::new(
            node,
            Projection::orthographic(1.8, 0.1, 100.0),
            Viewport::new(320, 180),
        );

        let grid = GridProjector::project(&camera, &scene).unwrap();
        assert!(approx(grid.ex, -Vec3::Z));
        assert!(approx(grid.ey, Vec3::Y));
        assert!(approx(grid.ez, Vec3::X));
        assert!((grid.spacing - 0.02).abs() < 1e-6);
    }
}
