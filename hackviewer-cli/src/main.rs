mod cli;
mod commands;
mod project;

use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Init { dir } => commands::init_cmd::run(&dir),
        Command::Inspect { model, texture } => {
            // Outside a project the default viewer settings apply.
            let viewer = match project::detect_project_context() {
                Ok(ctx) => ctx.config.viewer,
                Err(err) => {
                    log::warn!("using default viewer settings: {err}");
                    Default::default()
                }
            };
            commands::inspect_cmd::run(model, texture, &viewer).await
        }
        Command::Build { release } => {
            let ctx = project::detect_project_context()?;
            commands::build_cmd::run(release, ctx).await
        }
    }
}
