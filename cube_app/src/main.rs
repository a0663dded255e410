//! Colored cube demo
//!
//! Renders a cube (or an OBJ model named in the config) and lets the viewer
//! fly around it with WASD/QE and the arrow keys. Resizing or minimizing the
//! window exercises swap chain recreation.

mod app;

use std::error::Error;
use std::path::PathBuf;

use vkt_engine::core::{Config, ConfigError, EngineConfig};
use vkt_engine::foundation::logging;

const DEFAULT_CONFIG_PATH: &str = "cube_app/engine.toml";

fn load_config(path: &PathBuf) -> Result<EngineConfig, ConfigError> {
    let config = if path.exists() {
        log::info!("Loading configuration from {}", path.display());
        EngineConfig::load_from_file(path)?
    } else {
        log::info!("No configuration at {}, using defaults", path.display());
        EngineConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let result = load_config(&config_path)
        .map_err(Box::<dyn Error>::from)
        .and_then(|config| app::CubeApp::new(config)?.run());

    if let Err(e) = &result {
        log::error!("Fatal error: {e}");
    }
    result
}
