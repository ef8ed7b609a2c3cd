use hackviewer_wgpu::{FrameDraw, GpuBackend, Handle, MeshUpload, RenderResult, TextureUpload};

use crate::loader::LoadedModel;

/// The drawing surface a viewer session renders into.
///
/// Whatever an implementation allocates in `upload_model` stays alive until
/// `release_model` or `dispose`.
pub trait RenderSurface {
    fn resize(&mut self, width: u32, height: u32);

    fn upload_model(&mut self, model: &LoadedModel) -> RenderResult<Handle>;

    fn release_model(&mut self, handle: Handle);

    fn draw(&mut self, frame: &FrameDraw) -> RenderResult<()>;

    /// Release everything. Calls after the first are no-ops.
    fn dispose(&mut self);
}

/// Borrowed per-mesh uploads for every mesh in the model, with transforms
/// relative to the model root.
pub fn mesh_uploads(model: &LoadedModel) -> Vec<MeshUpload<'_>> {
    model
        .graph
        .meshes()
        .into_iter()
        .map(|(node, local)| MeshUpload {
            positions: &node.mesh.positions,
            normals: &node.mesh.normals,
            uvs: &node.mesh.uvs,
            indices: &node.mesh.indices,
            local,
            material: node.material.uniforms(),
        })
        .collect()
}

impl RenderSurface for GpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        GpuBackend::resize(self, width, height);
    }

    fn upload_model(&mut self, model: &LoadedModel) -> RenderResult<Handle> {
        let texture = match &model.texture {
            Some(image) => match self.upload_texture(&TextureUpload {
                rgba: &image.rgba,
                width: image.width,
                height: image.height,
            }) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::warn!("texture upload failed, drawing untextured: {err}");
                    None
                }
            },
            None => None,
        };
        GpuBackend::upload_model(self, &mesh_uploads(model), texture)
    }

    fn release_model(&mut self, handle: Handle) {
        if !GpuBackend::release_model(self, handle) {
            log::debug!("release of unknown model {}", handle.raw());
        }
    }

    fn draw(&mut self, frame: &FrameDraw) -> RenderResult<()> {
        self.render(frame)
    }

    fn dispose(&mut self) {
        GpuBackend::dispose(self);
    }
}
