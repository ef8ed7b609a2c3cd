//! Types shared between the wgpu drawing surface and the web viewer:
//! bounds math, uniform layouts, and the embedded WGSL shader.

pub mod math;
pub mod shaders;
pub mod uniforms;
