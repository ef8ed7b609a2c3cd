//! Uniform buffer layouts. Field order and padding match `shaders/model.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Maximum number of non-ambient lights the shader iterates.
pub const MAX_LIGHTS: usize = 8;

pub const LIGHT_KIND_DIRECTIONAL: f32 = 0.0;
pub const LIGHT_KIND_POINT: f32 = 1.0;
pub const LIGHT_KIND_SPOT: f32 = 2.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub cone: [f32; 4],
}

impl LightUniform {
    pub fn directional(direction: Vec3, color: [f32; 3], intensity: f32) -> Self {
        let d = direction.normalize_or_zero();
        Self {
            position: [0.0, 0.0, 0.0, LIGHT_KIND_DIRECTIONAL],
            direction: [d.x, d.y, d.z, 0.0],
            color: [color[0], color[1], color[2], intensity],
            cone: [0.0; 4],
        }
    }

    pub fn point(position: Vec3, color: [f32; 3], intensity: f32, range: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z, LIGHT_KIND_POINT],
            direction: [0.0, 0.0, 0.0, range],
            color: [color[0], color[1], color[2], intensity],
            cone: [0.0; 4],
        }
    }

    /// Spot light aimed along `direction`. `penumbra` in [0, 1] softens the
    /// edge by shrinking the fully lit inner cone.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: [f32; 3],
        intensity: f32,
        range: f32,
        angle: f32,
        penumbra: f32,
    ) -> Self {
        let d = direction.normalize_or_zero();
        let inner = angle * (1.0 - penumbra.clamp(0.0, 1.0));
        Self {
            position: [position.x, position.y, position.z, LIGHT_KIND_SPOT],
            direction: [d.x, d.y, d.z, range],
            color: [color[0], color[1], color[2], intensity],
            cone: [angle.cos(), inner.cos(), 0.0, 0.0],
        }
    }
}

/// Per-frame data: camera, ambient term, and the light array.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub light_count: [u32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl FrameUniforms {
    /// Lights past [`MAX_LIGHTS`] are dropped.
    pub fn new(view_proj: Mat4, camera_pos: Vec3, ambient: [f32; 3], lights: &[LightUniform]) -> Self {
        let mut packed = [LightUniform::zeroed(); MAX_LIGHTS];
        let count = lights.len().min(MAX_LIGHTS);
        packed[..count].copy_from_slice(&lights[..count]);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: [camera_pos.x, camera_pos.y, camera_pos.z, 1.0],
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            light_count: [count as u32, 0, 0, 0],
            lights: packed,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: crate::math::normal_matrix(&model).to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    pub flags: [u32; 4],
}

impl MaterialUniforms {
    pub fn new(color: [f32; 3], opacity: f32, emissive: [f32; 3], emissive_intensity: f32, textured: bool) -> Self {
        Self {
            base_color: [color[0], color[1], color[2], opacity],
            emissive: [emissive[0], emissive[1], emissive[2], emissive_intensity],
            flags: [u32::from(textured), 0, 0, 0],
        }
    }

    pub fn is_textured(&self) -> bool {
        self.flags[0] == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 64 + 16 * 3 + 64 * MAX_LIGHTS);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 128);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 48);
    }

    #[test]
    fn test_frame_uniforms_truncate_lights() {
        let lights = vec![LightUniform::point(Vec3::ZERO, [1.0; 3], 1.0, 10.0); MAX_LIGHTS + 3];
        let frame = FrameUniforms::new(Mat4::IDENTITY, Vec3::ZERO, [0.1; 3], &lights);
        assert_eq!(frame.light_count[0], MAX_LIGHTS as u32);
    }

    #[test]
    fn test_frame_uniforms_pack_camera() {
        let frame = FrameUniforms::new(Mat4::IDENTITY, Vec3::new(1.0, 2.0, 3.0), [0.2; 3], &[]);
        assert_eq!(frame.camera_pos, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(frame.light_count[0], 0);
        assert_eq!(frame.view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_spot_cone_inner_inside_outer() {
        let spot = LightUniform::spot(
            Vec3::new(-3.0, 3.0, 3.0),
            Vec3::new(3.0, -3.0, -3.0),
            [1.0; 3],
            1.0,
            50.0,
            std::f32::consts::PI / 6.0,
            0.5,
        );
        assert!(spot.cone[1] > spot.cone[0]);
        let d = Vec3::new(spot.direction[0], spot.direction[1], spot.direction[2]);
        assert!((d.length() - 1.0).abs() < 1e-5);
        assert_eq!(spot.position[3], LIGHT_KIND_SPOT);
    }

    #[test]
    fn test_material_flags() {
        assert!(MaterialUniforms::new([1.0; 3], 0.9, [0.0, 1.0, 1.0], 0.3, true).is_textured());
        assert!(!MaterialUniforms::new([1.0; 3], 1.0, [0.0; 3], 0.0, false).is_textured());
    }
}
