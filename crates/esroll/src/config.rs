//! Layered configuration
//!
//! Later layers win: built-in defaults, the user config file, `esroll.toml`
//! in the working directory, an explicit `--config` file, then `ESROLL_*`
//! environment variables. Command-line flags are applied on top by the
//! binary.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    bundle::GenerateOptions,
    dirs::{CONFIG_FILE_NAME, user_config_file},
    finalisers::{ExportMode, OutputFormat},
};

pub const EXPORTS_ENV: &str = "ESROLL_EXPORTS";
pub const FORMAT_ENV: &str = "ESROLL_FORMAT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Entry module of the bundle
    pub entry: Option<PathBuf>,
    /// Where to write the bundle; stdout when unset
    pub output: Option<PathBuf>,
    pub exports: ExportMode,
    pub format: OutputFormat,
}

/// One config file; unset keys leave the layer below untouched
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    entry: Option<PathBuf>,
    output: Option<PathBuf>,
    exports: Option<ExportMode>,
    format: Option<OutputFormat>,
}

impl Config {
    /// Load every layer, `explicit` being the `--config` file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user) = user_config_file().filter(|path| path.is_file()) {
            config.merge_file(&user)?;
        }

        let project = env::current_dir()
            .context("Failed to determine the working directory")?
            .join(CONFIG_FILE_NAME);
        if project.is_file() {
            config.merge_file(&project)?;
        }

        if let Some(explicit) = explicit {
            config.merge_file(explicit)?;
        }

        config.apply_env_vars()?;
        debug!("Effective configuration: {config:?}");
        Ok(config)
    }

    /// Overlay the keys set in the TOML file at `path`
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let layer: ConfigLayer = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        self.merge(layer);
        Ok(())
    }

    fn merge(&mut self, layer: ConfigLayer) {
        if let Some(entry) = layer.entry {
            self.entry = Some(entry);
        }
        if let Some(output) = layer.output {
            self.output = Some(output);
        }
        if let Some(exports) = layer.exports {
            self.exports = exports;
        }
        if let Some(format) = layer.format {
            self.format = format;
        }
    }

    /// Apply `ESROLL_EXPORTS` and `ESROLL_FORMAT`
    pub fn apply_env_vars(&mut self) -> Result<()> {
        if let Some(value) = env_value(EXPORTS_ENV) {
            self.exports = parse_value(EXPORTS_ENV, &value)?;
        }
        if let Some(value) = env_value(FORMAT_ENV) {
            self.format = parse_value(FORMAT_ENV, &value)?;
        }
        Ok(())
    }

    pub const fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            exports: self.exports,
            format: self.format,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_value<T: ValueEnum>(name: &str, value: &str) -> Result<T> {
    T::from_str(value, true).map_err(|err| anyhow!("Invalid value for {name}: {err}"))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    /// Sets an environment variable for the guard's lifetime
    struct EnvGuard {
        name: &'static str,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(name: &'static str, value: &str) -> Self {
            let original = env::var(name).ok();
            // SAFETY: tests touching the environment are serialized
            unsafe {
                env::set_var(name, value);
            }
            Self { name, original }
        }

        fn unset(name: &'static str) -> Self {
            let original = env::var(name).ok();
            // SAFETY: tests touching the environment are serialized
            unsafe {
                env::remove_var(name);
            }
            Self { name, original }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: restores the value captured in the constructor
            unsafe {
                match self.original.take() {
                    Some(original) => env::set_var(self.name, original),
                    None => env::remove_var(self.name),
                }
            }
        }
    }

    #[test]
    fn test_later_files_win() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path().join("base.toml");
        let top = temp_dir.path().join("top.toml");
        fs::write(&base, "entry = \"src/main.js\"\nexports = \"named\"\n")?;
        fs::write(&top, "output = \"dist/bundle.js\"\nexports = \"default\"\n")?;

        let mut config = Config::default();
        config.merge_file(&base)?;
        config.merge_file(&top)?;

        assert_eq!(config.entry, Some(PathBuf::from("src/main.js")));
        assert_eq!(config.output, Some(PathBuf::from("dist/bundle.js")));
        assert_eq!(config.exports, ExportMode::Default);
        assert_eq!(config.format, OutputFormat::Cjs);
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("esroll.toml");
        fs::write(&path, "entry = \"main.js\"\nminify = true\n")?;

        let err = Config::default()
            .merge_file(&path)
            .expect_err("minify is not an option");
        assert!(err.to_string().contains("Invalid config file"));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_vars_override_files() -> Result<()> {
        let _exports = EnvGuard::set(EXPORTS_ENV, "none");
        let _format = EnvGuard::set(FORMAT_ENV, " CJS ");

        let mut config = Config {
            exports: ExportMode::Named,
            ..Config::default()
        };
        config.apply_env_vars()?;

        assert_eq!(config.exports, ExportMode::None);
        assert_eq!(config.format, OutputFormat::Cjs);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_an_error() {
        let _exports = EnvGuard::set(EXPORTS_ENV, "everything");
        let _format = EnvGuard::unset(FORMAT_ENV);

        let err = Config::default()
            .apply_env_vars()
            .expect_err("not an export mode");
        assert!(err.to_string().contains(EXPORTS_ENV));
    }

    #[test]
    #[serial]
    fn test_explicit_file_is_applied() -> Result<()> {
        let _exports = EnvGuard::unset(EXPORTS_ENV);
        let _format = EnvGuard::unset(FORMAT_ENV);
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "entry = \"app.js\"\nexports = \"none\"\n")?;

        let config = Config::load(Some(&path))?;
        assert_eq!(config.entry, Some(PathBuf::from("app.js")));
        assert_eq!(config.exports, ExportMode::None);
        Ok(())
    }
}
