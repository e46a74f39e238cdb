use std::path::Path;

use anyhow::{Context, Result};

use watchpost_core::EngineBuilder;

fn main() -> Result<()> {
    let config = watchpost_config::load_config(Path::new("."))
        .context("failed to load .watchpost.toml from the current directory")?;

    let builder = EngineBuilder::from_config(&config).context("invalid default scheduling strategy in config")?;

    watchpost_cli::run(builder)
}
