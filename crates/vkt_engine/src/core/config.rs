//! # Engine Configuration
//!
//! Serializable configuration for the window, the renderer, shader locations
//! and the demo scene. Every section has defaults, so a config file only needs
//! to name the values it changes.
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//!
//! [renderer]
//! max_frames_in_flight = 3
//! present_mode = "fifo"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// File-backed configuration in TOML or RON, chosen by extension
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match extension(path) {
            Some("toml") => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => {
                let contents = std::fs::read_to_string(path)?;
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan practice".to_string(),
            width: 720,
            height: 720,
            resizable: true,
        }
    }
}

/// Presentation mode requested from the surface
///
/// FIFO is the only mode every surface must support, so it is also the
/// fallback when the preferred mode is not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModePreference {
    /// Triple-buffered, no tearing, lowest latency without vsync waits
    Mailbox,
    /// Vsync
    Fifo,
    /// No synchronization, may tear
    Immediate,
}

/// Renderer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Upper bound on frames the CPU may record ahead of the GPU
    pub max_frames_in_flight: usize,
    /// Color the swap chain image is cleared to at the start of the pass
    pub clear_color: [f32; 4],
    /// Preferred presentation mode
    pub present_mode: PresentModePreference,
    /// Enable Vulkan validation layers and route their messages to the log
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: 2,
            clear_color: [0.05, 0.05, 0.05, 1.0],
            present_mode: PresentModePreference::Mailbox,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// SPIR-V shader locations for the simple render system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::new("target/shaders/simple.vert.spv", "target/shaders/simple.frag.spv")
    }
}

/// What the demo scene shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// OBJ file to load; the built-in colored cube is used when unset
    pub model_path: Option<String>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Shader locations
    pub shaders: ShaderConfig,
    /// Scene contents
    pub scene: SceneConfig,
}

impl EngineConfig {
    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.renderer.max_frames_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "max_frames_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("vkt_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.renderer.max_frames_in_flight, 2);
        assert_eq!(config.window.width, 720);
        assert_eq!(config.renderer.present_mode, PresentModePreference::Mailbox);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [window]
            width = 1280

            [renderer]
            max_frames_in_flight = 3
            present_mode = "fifo"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.renderer.max_frames_in_flight, 3);
        assert_eq!(config.renderer.present_mode, PresentModePreference::Fifo);
        assert_eq!(config.renderer.clear_color, [0.05, 0.05, 0.05, 1.0]);
        assert_eq!(config.scene.model_path, None);
    }

    #[test]
    fn test_validate_rejects_zero_frames_in_flight() {
        let mut config = EngineConfig::default();
        config.renderer.max_frames_in_flight = 0;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = EngineConfig::default();
        config.window.height = 0;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let path = temp_path("roundtrip.toml");
        let mut config = EngineConfig::default();
        config.window.title = "roundtrip".to_string();
        config.scene.model_path = Some("models/smooth_vase.obj".to_string());

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_loads() {
        let path = temp_path("engine.ron");
        std::fs::write(&path, "(renderer: (max_frames_in_flight: 1))").unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.renderer.max_frames_in_flight, 1);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::load_from_file(Path::new("Cargo.lock"));

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
