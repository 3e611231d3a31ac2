use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub directory: Option<PathBuf>,
    #[serde(default = "default_false")]
    pub open_after_save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub preview: bool,
}

// Default value functions
fn default_size() -> u32 { 1024 }
fn default_margin() -> u32 { 2 }
fn default_debounce_ms() -> u64 { 200 }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            margin: default_margin(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            open_after_save: default_false(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            preview: default_true(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            export: ExportConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("qrstudio.toml").required(false))
            .add_source(config::Environment::with_prefix("QRSTUDIO").separator("__"));

        if let Ok(dir) = std::env::var("QR_EXPORT_DIR") {
            builder = builder.set_override("export.directory", dir)?;
        }

        let settings = builder.build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.render.size == 0 {
            return Err(AppError::Config("render.size must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn save_example() -> AppResult<()> {
        let example_config = AppConfig::default();
        let toml_string = toml::to_string_pretty(&example_config)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write("qrstudio.example.toml", toml_string)?;
        Ok(())
    }

    pub fn from_toml(toml_content: &str) -> AppResult<Self> {
        let config: AppConfig =
            toml::from_str(toml_content).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn export_directory(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
