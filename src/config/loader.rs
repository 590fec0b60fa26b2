//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/wordwise/config.toml)
//! 3. Project config (.wordwise/config.toml)
//! 4. Environment variables (WORDWISE_* prefix, `__` between levels)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, WordwiseError};

const ENV_PREFIX: &str = "WORDWISE_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let global = Self::global_config_path();
        Self::load_layers(global.as_deref(), &Self::project_config_path())
    }

    /// Load configuration from a specific file only, still honoring env overrides
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(WordwiseError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Self::env_provider());
        Self::extract(figment)
    }

    fn load_layers(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // WORDWISE_GEMINI__MODEL -> gemini.model
        figment = figment.merge(Self::env_provider());

        Self::extract(figment)
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| WordwiseError::config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/wordwise/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("wordwise"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".wordwise")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| WordwiseError::config(e.to_string()))
        }
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;
        println!("{}", Self::render(&config, as_json)?);
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir()
            .ok_or_else(|| WordwiseError::config("Cannot determine global config directory"))?;
        Self::write_default(&global_dir, force)?;
        Ok(global_dir)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        Self::write_default(&project_dir, force)?;
        Ok(project_dir)
    }

    fn write_default(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Default config content (TOML)
    fn default_config() -> String {
        r#"# Wordwise Configuration
# Project settings in .wordwise/config.toml override ~/.config/wordwise/config.toml.

version = "1.0"

[gemini]
# api_key = "..."          # or set GEMINI_API_KEY
model = "gemini-2.5-flash"
image_model = "imagen-3.0-generate-002"
temperature = 0.7
timeout_secs = 60

# Attempts = max_retries + 1; delay before retry n = initial_delay_ms * backoff_multiplier^n
[retry.word_details]
max_retries = 3
initial_delay_ms = 1000
backoff_multiplier = 2

[retry.image]
max_retries = 2
initial_delay_ms = 2000
backoff_multiplier = 2

# AI features pause this long after the service reports quota exhaustion
[cooldown]
duration_secs = 900
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_layers(
            Some(&temp_dir.path().join("missing.toml")),
            &temp_dir.path().join("also-missing.toml"),
        )
        .unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.cooldown.duration_secs, 900);
    }

    #[test]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");
        fs::write(
            &global,
            "[gemini]\nmodel = \"global-model\"\n[cooldown]\nduration_secs = 60\n",
        )
        .unwrap();
        fs::write(&project, "[gemini]\nmodel = \"project-model\"\n").unwrap();

        let config = ConfigLoader::load_layers(Some(&global), &project).unwrap();
        assert_eq!(config.gemini.model, "project-model");
        assert_eq!(config.cooldown.duration_secs, 60);
    }

    #[test]
    fn test_invalid_values_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[retry.image]\ninitial_delay_ms = 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("initial_delay_ms"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_default_config_parses_and_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.retry.word_details.max_retries, 3);
        assert_eq!(config.retry.image.max_retries, 2);
    }

    #[test]
    fn test_write_default_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "version = \"custom\"\n").unwrap();

        ConfigLoader::write_default(temp_dir.path(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = \"custom\"\n");

        ConfigLoader::write_default(temp_dir.path(), true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[cooldown]"));
    }

    #[test]
    fn test_env_override() {
        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("WORDWISE_GEMINI__IMAGE_MODEL", "imagen-test");
        }
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_layers(None, &temp_dir.path().join("none.toml"));
        unsafe {
            std::env::remove_var("WORDWISE_GEMINI__IMAGE_MODEL");
        }
        assert_eq!(config.unwrap().gemini.image_model, "imagen-test");
    }

    #[test]
    fn test_render_hides_api_key() {
        let mut config = Config::default();
        config.gemini.api_key = Some("k-123".to_string());
        let text = ConfigLoader::render(&config, false).unwrap();
        assert!(text.contains("[cooldown]"));
        assert!(!text.contains("k-123"));
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(!json.contains("k-123"));
    }
}
