use glam::{EulerRot, Mat4, Quat, Vec3};

/// Orientation, uniform scale, and offset of the model in the slot.
///
/// Only two writers exist: the per-frame idle spin and drag deltas. Both add
/// to `rotation`, which is left unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    /// Euler angles in radians, composed X then Y then Z.
    pub rotation: Vec3,
    pub scale: f32,
    pub position: Vec3,
}

impl ModelTransform {
    pub const IDENTITY: ModelTransform = ModelTransform {
        rotation: Vec3::ZERO,
        scale: 1.0,
        position: Vec3::ZERO,
    };

    /// A fresh transform for a model that was scaled by `scale` and shifted by `position`.
    pub fn placed(scale: f32, position: Vec3) -> Self {
        Self {
            scale,
            position,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Model-to-world matrix: translation * rotation * scale.
    pub fn matrix(&self) -> Mat4 {
        compose_local_transform(self.position, self.rotation_quat(), Vec3::splat(self.scale))
    }

    /// Rotate about the vertical axis.
    pub fn spin(&mut self, radians: f32) {
        self.rotation.y += radians;
    }

    /// Horizontal pointer travel turns the model about Y, vertical about X.
    pub fn apply_drag(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.rotation.y += dx * sensitivity;
        self.rotation.x += dy * sensitivity;
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Compose a local transform matrix from position, rotation, and scale.
pub fn compose_local_transform(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_matrix() {
        assert_eq!(ModelTransform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_placed_scales_then_translates() {
        let t = ModelTransform::placed(2.0, Vec3::new(1.0, 0.0, 0.0));
        let p = t.matrix().transform_point3(Vec3::new(1.0, 1.0, 1.0));
        assert!(approx_eq(p.x, 3.0));
        assert!(approx_eq(p.y, 2.0));
        assert!(approx_eq(p.z, 2.0));
    }

    #[test]
    fn test_spin_rotates_about_y() {
        let mut t = ModelTransform::IDENTITY;
        t.spin(std::f32::consts::FRAC_PI_2);
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.z, -1.0));
    }

    #[test]
    fn test_drag_axes() {
        let mut t = ModelTransform::IDENTITY;
        t.apply_drag(10.0, -5.0, 0.01);
        assert!(approx_eq(t.rotation.y, 0.1));
        assert!(approx_eq(t.rotation.x, -0.05));
        assert_eq!(t.rotation.z, 0.0);
    }

    #[test]
    fn test_rotation_is_unbounded() {
        let mut t = ModelTransform::IDENTITY;
        for _ in 0..1000 {
            t.spin(0.01);
        }
        assert!(t.rotation.y > std::f32::consts::TAU);
        assert!(t.matrix().is_finite());
    }
}
