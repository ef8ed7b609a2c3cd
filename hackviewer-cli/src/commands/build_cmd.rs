use crate::project::ProjectContext;

/// Arguments passed to wasm-pack.
pub fn wasm_pack_args(release: bool) -> Vec<&'static str> {
    let mut args = vec!["build", "--target", "web"];
    args.push(if release { "--release" } else { "--dev" });
    args
}

pub async fn run(release: bool, ctx: ProjectContext) -> anyhow::Result<()> {
    let wasm_pack = which::which("wasm-pack").map_err(|_| {
        anyhow::anyhow!("wasm-pack not found on PATH. Install it with `cargo install wasm-pack`.")
    })?;

    let cwd = ctx.web_crate_path();
    if !cwd.join("Cargo.toml").exists() {
        anyhow::bail!("No web crate at {}", cwd.display());
    }

    println!(
        "Building {} WASM runtime in {}...",
        if release { "release" } else { "dev" },
        cwd.display()
    );

    let status = tokio::process::Command::new(wasm_pack)
        .args(wasm_pack_args(release))
        .current_dir(&cwd)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await?;

    std::process::exit(status.code().unwrap_or(1));
}
