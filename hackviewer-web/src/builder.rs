//! Scene assembly: camera, lights, and the single model slot.

use glam::{Mat4, Vec3};
use hackviewer_gpu_shared::math::{fit_to_target, framing_position, Aabb, Fit};
use hackviewer_wgpu::{wgpu, FrameDraw, Handle};

use crate::config::ViewerConfig;
use crate::loader::{LoadError, LoadedModel};
use crate::resize::aspect_ratio;
use crate::rig::{Camera, LightRig};
use crate::scene::{fallback_sphere, ModelGraph};
use crate::surface::RenderSurface;
use crate::transform::ModelTransform;

/// Result of fitting a model into the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub raw_bounds: Aabb,
    pub fit: Fit,
    /// Bounds after scale and offset are applied.
    pub final_bounds: Aabb,
    pub camera_position: Vec3,
}

/// Center `graph` on the origin and scale its largest dimension to
/// `target_size`, then pick a camera position that frames it.
pub fn normalize(graph: &ModelGraph, target_size: f32) -> Result<Normalized, LoadError> {
    let raw_bounds = graph.bounding_box(&Mat4::IDENTITY);
    if raw_bounds.is_empty() {
        return Err(LoadError::NoGeometry);
    }
    let fit = fit_to_target(&raw_bounds, target_size).ok_or(LoadError::Degenerate)?;
    let placed = ModelTransform::placed(fit.scale, fit.offset);
    let final_bounds = graph.bounding_box(&placed.matrix());
    Ok(Normalized {
        raw_bounds,
        fit,
        final_bounds,
        camera_position: framing_position(final_bounds.max_dimension()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Loaded,
    Fallback,
}

#[derive(Debug)]
pub struct Occupant {
    pub kind: SlotKind,
    pub model: LoadedModel,
    /// `None` when the upload failed; the model is then simply not drawn.
    pub gpu: Option<Handle>,
}

/// Holds at most one displayed model.
#[derive(Debug, Default)]
pub struct ModelSlot {
    occupant: Option<Occupant>,
}

impl ModelSlot {
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn kind(&self) -> Option<SlotKind> {
        self.occupant.as_ref().map(|o| o.kind)
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    pub fn gpu_handle(&self) -> Option<Handle> {
        self.occupant.as_ref().and_then(|o| o.gpu)
    }
}

/// Camera, lights, and the model slot, plus the transform of whatever
/// occupies the slot.
#[derive(Debug)]
pub struct SceneGraph {
    pub camera: Camera,
    pub lights: LightRig,
    pub transform: ModelTransform,
    slot: ModelSlot,
    target_size: f32,
    clear_color: wgpu::Color,
}

impl SceneGraph {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        let [r, g, b, a] = config.clear_color;
        Self {
            camera: Camera::from_config(config, aspect_ratio(width, height)),
            lights: LightRig::hero(),
            transform: ModelTransform::IDENTITY,
            slot: ModelSlot::default(),
            target_size: config.target_size,
            clear_color: wgpu::Color { r, g, b, a },
        }
    }

    pub fn slot(&self) -> &ModelSlot {
        &self.slot
    }

    /// Normalize and install a loaded model, framing the camera on it.
    /// On error the slot is left untouched.
    pub fn install_loaded<S: RenderSurface>(
        &mut self,
        surface: &mut S,
        model: LoadedModel,
    ) -> Result<Normalized, LoadError> {
        let normalized = normalize(&model.graph, self.target_size)?;
        self.replace(surface, SlotKind::Loaded, model);
        self.transform = ModelTransform::placed(normalized.fit.scale, normalized.fit.offset);
        self.camera.frame_object(normalized.final_bounds.max_dimension());
        Ok(normalized)
    }

    /// Install the placeholder sphere as is, without normalization.
    pub fn install_fallback<S: RenderSurface>(&mut self, surface: &mut S) {
        let model = LoadedModel {
            graph: fallback_sphere(),
            texture: None,
        };
        self.replace(surface, SlotKind::Fallback, model);
        self.transform = ModelTransform::IDENTITY;
    }

    fn replace<S: RenderSurface>(&mut self, surface: &mut S, kind: SlotKind, model: LoadedModel) {
        self.release(surface);
        let gpu = match surface.upload_model(&model) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("failed to upload {kind:?} model: {err}");
                None
            }
        };
        self.slot.occupant = Some(Occupant { kind, model, gpu });
    }

    /// Empty the slot, releasing the occupant's GPU resources.
    pub fn release<S: RenderSurface>(&mut self, surface: &mut S) {
        if let Some(previous) = self.slot.occupant.take() {
            if let Some(handle) = previous.gpu {
                surface.release_model(handle);
            }
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(aspect_ratio(width, height));
    }

    pub fn frame_draw(&self) -> FrameDraw {
        FrameDraw {
            uniforms: self.lights.frame_uniforms(&self.camera),
            model: self.slot.gpu_handle().map(|h| (h, self.transform.matrix())),
            clear_color: self.clear_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::{box_mesh, mesh_node};
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn box_graph(min: Vec3, max: Vec3) -> ModelGraph {
        ModelGraph::new(mesh_node("box", Mat4::IDENTITY, box_mesh(min, max)))
    }

    #[test]
    fn test_normalize_box() {
        let n = normalize(&box_graph(Vec3::new(2.0, 0.0, 0.0), Vec3::new(6.0, 2.0, 1.0)), 8.0).unwrap();
        assert!(approx_eq(n.fit.scale, 2.0));
        assert!(approx_eq(n.final_bounds.max_dimension(), 8.0));
        assert!(n.final_bounds.center().length() < EPSILON);
        assert!(approx_eq(n.camera_position.y, 4.8));
        assert!(approx_eq(n.camera_position.z, 16.0));
    }

    #[test]
    fn test_normalize_nested_transforms() {
        let graph = crate::scene::tests::two_box_graph();
        let n = normalize(&graph, 8.0).unwrap();
        assert!(approx_eq(n.raw_bounds.max_dimension(), 11.0));
        assert!(approx_eq(n.final_bounds.max_dimension(), 8.0));
    }

    #[test]
    fn test_normalize_degenerate() {
        let point = box_graph(Vec3::ONE, Vec3::ONE);
        assert_eq!(normalize(&point, 8.0), Err(LoadError::Degenerate));
    }

    #[test]
    fn test_normalize_empty() {
        let graph = ModelGraph::new(mesh_node("empty", Mat4::IDENTITY, Default::default()));
        assert_eq!(normalize(&graph, 8.0), Err(LoadError::NoGeometry));
    }

    proptest! {
        #[test]
        fn prop_normalized_size_and_center(
            min in prop::array::uniform3(-5.0f32..5.0),
            extent in prop::array::uniform3(1.0f32..20.0),
        ) {
            let min = Vec3::from_array(min);
            let max = min + Vec3::from_array(extent);
            let n = normalize(&box_graph(min, max), 8.0).unwrap();
            prop_assert!((n.final_bounds.max_dimension() - 8.0).abs() < EPSILON);
            prop_assert!(n.final_bounds.center().abs().max_element() < EPSILON);
        }
    }
}
