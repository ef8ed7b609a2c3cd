//! WebGPU drawing surface for the hackviewer runtime.
//!
//! Owns the device, queue, and canvas surface. Every buffer and texture it
//! allocates is tracked in a [`HandleStore`] so teardown can release GPU
//! memory explicitly rather than leaving it to the page's garbage collector.

mod backend;
mod error;
mod handle;

pub use backend::{FrameDraw, GpuBackend, GpuMesh, GpuTexture, MeshUpload, ResourceCounts, TextureUpload};
pub use error::{RenderError, RenderResult};
pub use handle::{Handle, HandleStore};

pub use wgpu;
