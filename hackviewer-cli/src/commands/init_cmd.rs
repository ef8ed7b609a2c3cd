use std::path::Path;

use crate::project::{ProjectConfig, PROJECT_FILE};

pub fn run(dir: &Path) -> anyhow::Result<()> {
    let path = write_default_config(dir)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Write a default hackviewer.toml into `dir`, creating the directory if
/// needed. Refuses to overwrite an existing file.
pub fn write_default_config(dir: &Path) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join(PROJECT_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, ProjectConfig::default().to_toml()?)?;
    log::debug!("wrote default config to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{detect_project_context_from, ProjectKind};

    #[test]
    fn test_init_creates_detectable_project() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("site");
        let path = write_default_config(&target).unwrap();
        assert_eq!(path, target.join(PROJECT_FILE));

        let ctx = detect_project_context_from(&target).unwrap();
        assert_eq!(ctx.kind, ProjectKind::SiteProject);
        assert_eq!(ctx.config, ProjectConfig::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "# mine\n").unwrap();
        assert!(write_default_config(dir.path()).is_err());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(PROJECT_FILE)).unwrap(),
            "# mine\n"
        );
    }
}
