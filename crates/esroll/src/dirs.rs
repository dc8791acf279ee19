use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Name of the configuration file looked up in each location
pub const CONFIG_FILE_NAME: &str = "esroll.toml";

/// Per-user configuration directory, e.g. `~/.config/esroll`
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("esroll"))
}

/// Per-user configuration file, if the platform has a config directory
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
