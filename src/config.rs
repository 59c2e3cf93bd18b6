//! Configuration module for the vector operations engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TVO_` and use double underscores
//! to separate nested levels:
//! - `TVO_NATIVE__ENABLED=false` sets `native.enabled`
//! - `TVO_NATIVE__LIBRARY_NAME=libcustom.so` sets `native.library_name`
//! - `TVO_COMPUTE__PARALLEL_THREADS=4` sets `compute.parallel_threads`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the settings file, searched for from the current
/// directory upwards.
pub const CONFIG_DIR: &str = ".tessera";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

const ENV_PREFIX: &str = "TVO_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Native library discovery
    #[serde(default)]
    pub native: NativeConfig,

    /// Compute settings
    #[serde(default)]
    pub compute: ComputeConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NativeConfig {
    /// Try to load the native library at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// File name probed in each default search directory
    #[serde(default = "default_library_name")]
    pub library_name: String,

    /// Explicit candidate paths, tried in order. Replaces the default search
    /// list when non-empty.
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ComputeConfig {
    /// Worker threads for parallel batch scoring
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_library_name() -> String {
    native_library_file_name("tessera_vector_ops")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_log_level() -> String {
    "warn".to_string()
}

/// Platform file name for a dynamic library, e.g. `libfoo.so` on Linux.
pub fn native_library_file_name(stem: &str) -> String {
    format!(
        "{}{stem}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            native: NativeConfig::default(),
            compute: ComputeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library_name: default_library_name(),
            library_paths: Vec::new(),
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .tessera directory from the
    /// current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        dir: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# Tessera vector operations configuration

# Version of the configuration schema
version = 1

[native]
# Load the native library on first use. When false, every enhanced call
# runs on the Rust reference implementation.
enabled = true

# File name probed in each default search directory
library_name = "{}"

# Explicit candidate paths, tried in order. Leave empty to search next to
# the executable, ./target/{{release,debug}}, ./lib and the system lib dirs.
library_paths = []

[compute]
# Worker threads for parallel batch scoring (defaults to CPU count)
parallel_threads = {}

[logging]
# Log filter used when RUST_LOG is not set
level = "warn"
"#,
            default_library_name(),
            num_cpus::get()
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.native.enabled);
        assert!(settings.native.library_paths.is_empty());
        assert!(settings.native.library_name.contains("tessera_vector_ops"));
        assert!(settings.compute.parallel_threads > 0);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
[native]
enabled = false
library_paths = ["/opt/a/libx.so", "lib/libx.so"]

[compute]
parallel_threads = 3
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(!settings.native.enabled);
        assert_eq!(
            settings.native.library_paths,
            vec![PathBuf::from("/opt/a/libx.so"), PathBuf::from("lib/libx.so")]
        );
        assert_eq!(settings.compute.parallel_threads, 3);
        // Untouched sections keep defaults
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.compute.parallel_threads = 2;
        settings.native.library_paths = vec![PathBuf::from("/tmp/libtvo.so")];

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.compute.parallel_threads, 2);
        assert_eq!(loaded.native.library_paths, settings.native.library_paths);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.native, NativeConfig::default());
    }

    #[test]
    fn test_init_config_file_round_trips() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".tessera/settings.toml"));

        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.native.enabled);
        assert!(settings.native.library_paths.is_empty());

        // Second init without force refuses to overwrite
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "version = 3\n").unwrap();

        unsafe {
            std::env::set_var("TVO_VERSION", "7");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("TVO_VERSION");
        }

        assert_eq!(settings.version, 7);
    }
}
