//! Local transform of a scene node

use glam::{Mat4, Quat, Vec3};

/// Transform for positioning objects in 3D space, relative to the parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create transform from position and euler angles in degrees (Y-X-Z order)
    pub fn from_position_euler_degrees(position: Vec3, euler: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(
                glam::EulerRot::YXZ,
                euler.y.to_radians(),
                euler.x.to_radians(),
                euler.z.to_radians(),
            ),
            ..Default::default()
        }
    }

    /// Get the local matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn euler_degrees_match_axis_rotation() {
        let t = Transform::from_position_euler_degrees(Vec3::ZERO, Vec3::new(0.0, 90.0, 0.0));
        let expected = Quat::from_rotation_y(FRAC_PI_2);
        assert!(t.rotation.angle_between(expected) < 1e-5);
    }
}
