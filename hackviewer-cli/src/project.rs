use std::path::{Path, PathBuf};

use hackviewer_web::ViewerConfig;
use serde::{Deserialize, Serialize};

pub const PROJECT_FILE: &str = "hackviewer.toml";
const WEB_CRATE_DIR: &str = "hackviewer-web";

/// What kind of project we are operating in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKind {
    /// Inside the Hackviewer workspace itself (has hackviewer-web/Cargo.toml)
    Workspace,
    /// A site project with a hackviewer.toml
    SiteProject,
}

/// Configuration read from hackviewer.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Path of the web runtime crate, relative to the project root.
    #[serde(default = "default_web_crate")]
    pub web_crate: String,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

fn default_web_crate() -> String {
    WEB_CRATE_DIR.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            web_crate: default_web_crate(),
            viewer: ViewerConfig::default(),
        }
    }
}

impl ProjectConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.viewer.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// The resolved project context.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory holding hackviewer.toml, or the workspace root
    pub project_root: PathBuf,
    pub kind: ProjectKind,
    pub config: ProjectConfig,
}

impl ProjectContext {
    pub fn web_crate_path(&self) -> PathBuf {
        self.project_root.join(&self.config.web_crate)
    }
}

/// Detect project context from the current directory, walking up.
pub fn detect_project_context() -> anyhow::Result<ProjectContext> {
    detect_project_context_from(&std::env::current_dir()?)
}

/// Detect project context starting from a specific directory, walking up.
/// A hackviewer.toml wins over the workspace layout in the same directory.
pub fn detect_project_context_from(start: &Path) -> anyhow::Result<ProjectContext> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(PROJECT_FILE);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config = ProjectConfig::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("{}: {e}", config_path.display()))?;
            return Ok(ProjectContext {
                project_root: dir,
                kind: ProjectKind::SiteProject,
                config,
            });
        }
        if dir.join(WEB_CRATE_DIR).join("Cargo.toml").exists() {
            return Ok(ProjectContext {
                project_root: dir,
                kind: ProjectKind::Workspace,
                config: ProjectConfig::default(),
            });
        }
        if !dir.pop() {
            anyhow::bail!(
                "Could not find a Hackviewer project.\n\
                 Run `hvcli` from within the Hackviewer workspace or a directory with a {PROJECT_FILE}.\n\
                 To create one: hvcli init"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let web = dir.path().join(WEB_CRATE_DIR);
        std::fs::create_dir(&web).unwrap();
        std::fs::write(web.join("Cargo.toml"), "[package]").unwrap();

        let ctx = detect_project_context_from(dir.path()).unwrap();
        assert_eq!(ctx.kind, ProjectKind::Workspace);
        assert_eq!(ctx.project_root, dir.path());
        assert_eq!(ctx.web_crate_path(), web);
        assert_eq!(ctx.config, ProjectConfig::default());
    }

    #[test]
    fn test_detect_site_project_from_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "web_crate = \"viewer\"\n\n[viewer]\nmodel_url = \"/hero.glb\"\nidle_spin = 0.02\n",
        )
        .unwrap();
        let nested = dir.path().join("public/models");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = detect_project_context_from(&nested).unwrap();
        assert_eq!(ctx.kind, ProjectKind::SiteProject);
        assert_eq!(ctx.project_root, dir.path());
        assert_eq!(ctx.web_crate_path(), dir.path().join("viewer"));
        assert_eq!(ctx.config.viewer.model_url, "/hero.glb");
        assert_eq!(ctx.config.viewer.idle_spin, 0.02);
        assert_eq!(ctx.config.viewer.target_size, 8.0);
    }

    #[test]
    fn test_invalid_viewer_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "[viewer]\nnear = 5.0\nfar = 1.0\n").unwrap();
        assert!(detect_project_context_from(dir.path()).is_err());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = ProjectConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[viewer]"));
        assert_eq!(ProjectConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_detect_no_project() {
        let dir = tempfile::tempdir().unwrap();
        // Create a nested dir so pop() hits the tempdir root, not filesystem root
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let result = detect_project_context_from(&nested);
        assert!(result.is_err());
    }
}
