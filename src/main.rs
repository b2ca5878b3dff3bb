//! Standalone preview window: `sandbox-preview <config.toml>`.

use std::path::PathBuf;

use sandbox_preview::{ProviderConfig, Viewer};

fn main() {
    env_logger::init();

    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            log::error!("Usage: sandbox-preview <config.toml>");
            std::process::exit(1);
        }
    };

    let config = match ProviderConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let title = format!("Sandbox Preview - {}", path.display());
    if let Err(e) = Viewer::builder()
        .with_config(config)
        .with_title(title)
        .build()
        .run()
    {
        log::error!("{e}");
        std::process::exit(1);
    }
}
