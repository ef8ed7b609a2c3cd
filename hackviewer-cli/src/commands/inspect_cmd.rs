use std::fmt;
use std::path::PathBuf;

use hackviewer_web::loader::{decode_texture, parse_model, prepare_model, TextureImage};
use hackviewer_web::{normalize, LoadError, Normalized, ViewerConfig};

/// What the viewer would do with a model.
#[derive(Debug)]
pub struct Report {
    pub nodes: usize,
    pub meshes: usize,
    pub vertices: usize,
    pub texture: Option<(u32, u32)>,
    pub texture_error: Option<LoadError>,
    pub normalized: Normalized,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = &self.normalized;
        writeln!(f, "Nodes:        {}", self.nodes)?;
        writeln!(f, "Meshes:       {}", self.meshes)?;
        writeln!(f, "Vertices:     {}", self.vertices)?;
        match (&self.texture, &self.texture_error) {
            (Some((w, h)), _) => writeln!(f, "Texture:      {w}x{h}")?,
            (None, Some(err)) => writeln!(f, "Texture:      unusable ({err}), model shown untextured")?,
            (None, None) => writeln!(f, "Texture:      none")?,
        }
        writeln!(f, "Raw bounds:   {:?} .. {:?}", n.raw_bounds.min, n.raw_bounds.max)?;
        writeln!(f, "Scale:        {:.6}", n.fit.scale)?;
        writeln!(f, "Offset:       {:?}", n.fit.offset)?;
        writeln!(f, "Final bounds: {:?} .. {:?}", n.final_bounds.min, n.final_bounds.max)?;
        write!(
            f,
            "Camera:       {:?} (distance {:.3})",
            n.camera_position,
            n.camera_position.length()
        )
    }
}

/// Run the viewer's decode, decorate, and normalize steps on raw bytes.
pub fn inspect_bytes(
    model: &[u8],
    texture: Option<&[u8]>,
    viewer: &ViewerConfig,
) -> Result<Report, LoadError> {
    let (texture, texture_error): (Option<TextureImage>, Option<LoadError>) =
        match texture.map(decode_texture) {
            Some(Ok(image)) => (Some(image), None),
            Some(Err(err)) => (None, Some(err)),
            None => (None, None),
        };
    let loaded = prepare_model(parse_model(model)?, texture);
    let normalized = normalize(&loaded.graph, viewer.target_size)?;
    Ok(Report {
        nodes: loaded.graph.node_count(),
        meshes: loaded.graph.mesh_count(),
        vertices: loaded.graph.vertex_count(),
        texture: loaded.texture.as_ref().map(|t| (t.width, t.height)),
        texture_error,
        normalized,
    })
}

pub async fn run(model: PathBuf, texture: Option<PathBuf>, viewer: &ViewerConfig) -> anyhow::Result<()> {
    let model_bytes = tokio::fs::read(&model)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", model.display()))?;
    let texture_bytes = match &texture {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?,
        ),
        None => None,
    };

    match inspect_bytes(&model_bytes, texture_bytes.as_deref(), viewer) {
        Ok(report) => {
            println!("{}", model.display());
            println!("{report}");
            Ok(())
        }
        Err(err) => anyhow::bail!("{}: {err} (the viewer would show the fallback sphere)", model.display()),
    }
}
