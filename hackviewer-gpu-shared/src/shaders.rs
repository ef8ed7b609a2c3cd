/// Embedded WGSL source for the forward model pass.
pub const MODEL_SHADER: &str = include_str!("../shaders/model.wgsl");

/// Entry points in [`MODEL_SHADER`].
pub const MODEL_VERTEX_ENTRY: &str = "vs_main";
pub const MODEL_FRAGMENT_ENTRY: &str = "fs_main";
