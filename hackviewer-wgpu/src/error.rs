//! Drawing-surface error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find a suitable GPU adapter")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("surface lost or outdated, reconfigured")]
    SurfaceLost,

    #[error("next surface texture unavailable")]
    FrameUnavailable,

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("invalid texture: {0}")]
    InvalidTexture(String),

    #[error("unknown model handle {0}")]
    UnknownModel(u64),

    #[error("drawing surface already disposed")]
    Disposed,
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
