//! Core engine services

pub mod config;

pub use config::{
    Config, ConfigError, EngineConfig, PresentModePreference, RendererConfig, SceneConfig,
    ShaderConfig, WindowConfig,
};
