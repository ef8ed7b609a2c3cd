//! Camera and the fixed hero lighting rig.

use glam::{Mat4, Vec3};
use hackviewer_gpu_shared::math::{framing_position, perspective};
use hackviewer_gpu_shared::uniforms::{FrameUniforms, LightUniform};

use crate::config::ViewerConfig;
use crate::scene::rgb;

/// Perspective camera that always looks at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target: Vec3::ZERO,
            fov_y,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn from_config(config: &ViewerConfig, aspect: f32) -> Self {
        Self::new(
            Vec3::from_array(config.camera_position),
            config.fov_degrees.to_radians(),
            aspect,
            config.near,
            config.far,
        )
    }

    /// Recompute the cached projection. Must follow any change to
    /// `fov_y`, `aspect`, `near` or `far`.
    pub fn update_projection(&mut self) {
        self.projection = perspective(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Back the camera off along the framing direction so an object of
    /// `max_dimension` at the origin fills the view.
    pub fn frame_object(&mut self, max_dimension: f32) {
        self.position = framing_position(max_dimension);
        self.look_at(Vec3::ZERO);
        self.update_projection();
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

/// Point light data for runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
}

/// Directional light shining from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirLight {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub casts_shadow: bool,
}

/// Spot light aimed at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    pub angle: f32,
    pub penumbra: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Directional(DirLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn to_uniform(&self) -> LightUniform {
        match *self {
            Light::Directional(l) => {
                LightUniform::directional(-l.position.normalize_or_zero(), l.color, l.intensity)
            }
            Light::Point(l) => LightUniform::point(l.position, l.color, l.intensity, l.range),
            Light::Spot(l) => LightUniform::spot(
                l.position,
                (-l.position).normalize_or_zero(),
                l.color,
                l.intensity,
                l.range,
                l.angle,
                l.penumbra,
            ),
        }
    }
}

/// Ambient term plus positioned lights. Fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub lights: Vec<Light>,
}

impl LightRig {
    /// The blue-tinted key, fill, rim and glow setup of the hero banner.
    pub fn hero() -> Self {
        Self {
            ambient_color: rgb(0x404040),
            ambient_intensity: 0.6,
            lights: vec![
                Light::Directional(DirLight {
                    position: Vec3::new(5.0, 5.0, 5.0),
                    color: rgb(0xffffff),
                    intensity: 1.2,
                    casts_shadow: true,
                }),
                Light::Point(PointLight {
                    position: Vec3::new(0.0, 2.0, 2.0),
                    color: rgb(0x60A5FA),
                    intensity: 1.5,
                    range: 100.0,
                }),
                Light::Spot(SpotLight {
                    position: Vec3::new(-3.0, 3.0, 3.0),
                    color: rgb(0xffffff),
                    intensity: 1.0,
                    range: 50.0,
                    angle: std::f32::consts::FRAC_PI_6,
                    penumbra: 0.5,
                }),
                Light::Point(PointLight {
                    position: Vec3::new(3.0, -2.0, 1.0),
                    color: rgb(0x1D4ED8),
                    intensity: 0.8,
                    range: 30.0,
                }),
                // rim
                Light::Directional(DirLight {
                    position: Vec3::new(-5.0, 0.0, -5.0),
                    color: rgb(0x1E40AF),
                    intensity: 0.8,
                    casts_shadow: false,
                }),
                // glow
                Light::Point(PointLight {
                    position: Vec3::new(0.0, 0.0, 3.0),
                    color: rgb(0x00FFFF),
                    intensity: 0.8,
                    range: 40.0,
                }),
            ],
        }
    }

    /// Number of light sources including the ambient term.
    pub fn source_count(&self) -> usize {
        self.lights.len() + 1
    }

    pub fn frame_uniforms(&self, camera: &Camera) -> FrameUniforms {
        let ambient = self.ambient_color.map(|c| c * self.ambient_intensity);
        let lights: Vec<LightUniform> = self.lights.iter().map(Light::to_uniform).collect();
        FrameUniforms::new(camera.view_projection(), camera.position, ambient, &lights)
    }
}
