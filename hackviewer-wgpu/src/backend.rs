use glam::Mat4;
use hackviewer_gpu_shared::shaders;
use hackviewer_gpu_shared::uniforms::{FrameUniforms, MaterialUniforms, ObjectUniforms};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::handle::{Handle, HandleStore};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const UV_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

/// GPU mesh with one buffer per vertex attribute plus indices.
pub struct GpuMesh {
    pub position_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub uv_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn destroy(&self) {
        self.position_buffer.destroy();
        self.normal_buffer.destroy();
        self.uv_buffer.destroy();
        self.index_buffer.destroy();
    }
}

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// One drawable mesh of an uploaded model.
struct GpuPart {
    mesh: Handle,
    local: Mat4,
    object_buffer: Handle,
    object_bind_group: wgpu::BindGroup,
    material_buffer: Handle,
    material_bind_group: wgpu::BindGroup,
}

/// An uploaded model: its parts and the texture they share.
struct GpuModel {
    parts: Vec<GpuPart>,
    texture: Option<Handle>,
}

/// CPU-side mesh handed to [`GpuBackend::upload_model`].
/// `normals` and `uvs` must have one entry per position.
pub struct MeshUpload<'a> {
    pub positions: &'a [[f32; 3]],
    pub normals: &'a [[f32; 3]],
    pub uvs: &'a [[f32; 2]],
    pub indices: &'a [u32],
    /// Mesh-to-model transform.
    pub local: Mat4,
    pub material: MaterialUniforms,
}

/// Tightly packed RGBA8 pixels.
pub struct TextureUpload<'a> {
    pub rgba: &'a [u8],
    pub width: u32,
    pub height: u32,
}

/// Everything one draw call needs.
pub struct FrameDraw {
    pub uniforms: FrameUniforms,
    /// Model to draw and its model-to-world transform.
    pub model: Option<(Handle, Mat4)>,
    pub clear_color: wgpu::Color,
}

/// Live resource counts, for diagnostics and leak checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    pub models: usize,
    pub meshes: usize,
    pub textures: usize,
    pub buffers: usize,
}

/// Owns the device, the canvas surface, and every GPU resource allocated
/// for the viewer. Nothing here is released implicitly: [`dispose`]
/// destroys all tracked buffers and textures, and runs on drop.
///
/// [`dispose`]: GpuBackend::dispose
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white_texture: GpuTexture,
    depth: GpuTexture,

    meshes: HandleStore<GpuMesh>,
    textures: HandleStore<GpuTexture>,
    buffers: HandleStore<wgpu::Buffer>,
    models: HandleStore<GpuModel>,

    disposed: bool,
}

impl GpuBackend {
    /// Create the device and configure `target` (a canvas on the web) as the
    /// drawing surface.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Hackviewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Albedo Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MODEL_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let vertex_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &POSITION_ATTRS,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &NORMAL_ATTRS,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &UV_ATTRS,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(shaders::MODEL_VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(shaders::MODEL_FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let white_texture =
            create_rgba_texture(&device, &queue, "White Texture", &[255, 255, 255, 255], 1, 1);
        let depth = create_depth_texture(&device, surface_config.width, surface_config.height);

        let info = adapter.get_info();
        log::info!(
            "Drawing surface ready: {} ({}), {}x{}",
            info.name,
            info.backend.to_str(),
            surface_config.width,
            surface_config.height,
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            material_layout,
            sampler,
            white_texture,
            depth,
            meshes: HandleStore::new(),
            textures: HandleStore::new(),
            buffers: HandleStore::new(),
            models: HandleStore::new(),
            disposed: false,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn resource_counts(&self) -> ResourceCounts {
        ResourceCounts {
            models: self.models.len(),
            meshes: self.meshes.len(),
            textures: self.textures.len(),
            buffers: self.buffers.len(),
        }
    }

    /// Reconfigure the surface and recreate the depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        if (width, height) == self.size() {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);

        self.depth.texture.destroy();
        self.depth = create_depth_texture(&self.device, width, height);
    }

    /// Upload RGBA8 pixels. The texture is owned by the model it is later
    /// passed to and released with it.
    pub fn upload_texture(&mut self, upload: &TextureUpload<'_>) -> RenderResult<Handle> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        let TextureUpload { rgba, width, height } = *upload;
        let max_dim = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max_dim || height > max_dim {
            return Err(RenderError::InvalidTexture(format!(
                "{width}x{height} outside 1..={max_dim}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::InvalidTexture(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                rgba.len()
            )));
        }

        let texture = create_rgba_texture(&self.device, &self.queue, "Model Texture", rgba, width, height);
        Ok(self.textures.insert(texture))
    }

    /// Upload every mesh of a model. Meshes without indices are skipped.
    pub fn upload_model(
        &mut self,
        meshes: &[MeshUpload<'_>],
        texture: Option<Handle>,
    ) -> RenderResult<Handle> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }

        let texture = texture.filter(|t| self.textures.contains(*t));
        let mut parts = Vec::with_capacity(meshes.len());

        for mesh in meshes.iter().filter(|m| !m.indices.is_empty()) {
            let gpu_mesh = GpuMesh {
                position_buffer: self.vertex_buffer("Position Buffer", bytemuck::cast_slice(mesh.positions)),
                normal_buffer: self.vertex_buffer("Normal Buffer", bytemuck::cast_slice(mesh.normals)),
                uv_buffer: self.vertex_buffer("UV Buffer", bytemuck::cast_slice(mesh.uvs)),
                index_buffer: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Index Buffer"),
                    contents: bytemuck::cast_slice(mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.indices.len() as u32,
            };
            let mesh_handle = self.meshes.insert(gpu_mesh);

            let object_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Object Uniforms"),
                contents: bytemuck::bytes_of(&ObjectUniforms::new(mesh.local)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let object_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object Bind Group"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: object_buffer.as_entire_binding(),
                }],
            });

            let mut material = mesh.material;
            if texture.is_none() {
                material.flags[0] = 0;
            }
            let material_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Uniforms"),
                contents: bytemuck::bytes_of(&material),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let albedo_view = texture
                .and_then(|t| self.textures.get(t))
                .map_or(&self.white_texture.view, |t| &t.view);
            let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &self.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: material_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(albedo_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

            parts.push(GpuPart {
                mesh: mesh_handle,
                local: mesh.local,
                object_buffer: self.buffers.insert(object_buffer),
                object_bind_group,
                material_buffer: self.buffers.insert(material_buffer),
                material_bind_group,
            });
        }

        log::debug!("Uploaded model: {} parts, textured: {}", parts.len(), texture.is_some());
        Ok(self.models.insert(GpuModel { parts, texture }))
    }

    /// Destroy a model's meshes, uniform buffers, and texture.
    /// Returns false for an unknown handle.
    pub fn release_model(&mut self, handle: Handle) -> bool {
        let Some(model) = self.models.remove(handle) else {
            return false;
        };
        for part in model.parts {
            if let Some(mesh) = self.meshes.remove(part.mesh) {
                mesh.destroy();
            }
            for buffer in [part.object_buffer, part.material_buffer] {
                if let Some(buffer) = self.buffers.remove(buffer) {
                    buffer.destroy();
                }
            }
        }
        if let Some(texture) = model.texture.and_then(|t| self.textures.remove(t)) {
            texture.texture.destroy();
        }
        true
    }

    /// Clear to `draw.clear_color` and draw the model, if any.
    pub fn render(&mut self, draw: &FrameDraw) -> RenderResult<()> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }

        let model = match draw.model {
            Some((handle, transform)) => {
                let model = self
                    .models
                    .get(handle)
                    .ok_or(RenderError::UnknownModel(handle.raw()))?;
                Some((model, transform))
            }
            None => None,
        };

        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&draw.uniforms));
        if let Some((model, transform)) = model {
            for part in &model.parts {
                if let Some(buffer) = self.buffers.get(part.object_buffer) {
                    let uniforms = ObjectUniforms::new(transform * part.local);
                    self.queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
                }
            }
        }

        let output = self.acquire_frame()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(draw.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some((model, _)) = model {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
                for part in &model.parts {
                    let Some(mesh) = self.meshes.get(part.mesh) else {
                        continue;
                    };
                    pass.set_bind_group(1, &part.object_bind_group, &[]);
                    pass.set_bind_group(2, &part.material_bind_group, &[]);
                    pass.set_vertex_buffer(0, mesh.position_buffer.slice(..));
                    pass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
                    pass.set_vertex_buffer(2, mesh.uv_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Destroy every tracked buffer and texture. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let counts = self.resource_counts();

        // Bind groups go with the models; the buffers they reference are
        // destroyed below.
        drop(self.models.drain());
        for (_, mesh) in self.meshes.drain() {
            mesh.destroy();
        }
        for (_, texture) in self.textures.drain() {
            texture.texture.destroy();
        }
        for (_, buffer) in self.buffers.drain() {
            buffer.destroy();
        }
        self.frame_buffer.destroy();
        self.white_texture.texture.destroy();
        self.depth.texture.destroy();

        self.disposed = true;
        log::info!(
            "Drawing surface disposed: {} models, {} meshes, {} textures, {} buffers released",
            counts.models,
            counts.meshes,
            counts.textures,
            counts.buffers,
        );
    }

    fn acquire_frame(&self) -> RenderResult<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(RenderError::OutOfMemory),
            Err(_) => Err(RenderError::FrameUnavailable),
        }
    }

    fn vertex_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        })
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}
