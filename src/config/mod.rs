use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::domain::abi::DecodeMode;
use crate::logging::LogConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Default JSON-RPC endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Overrides the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub decode_mode: DecodeMode,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Directory holding the SQLite databases
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(data_dir)
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.resolved_data_dir().map(|dir| db_path_in(&dir))
    }
}

/// Load the config file, falling back to defaults when missing or invalid
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_from(&path)
}

pub fn load_from(path: &Path) -> Config {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match Config::parse(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring invalid config");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("ABISCOPE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("abiscope").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("abiscope").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "abiscope", "abiscope")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("abiscope"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("abiscope"));
    }
    directories::ProjectDirs::from("io", "abiscope", "abiscope")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// ABIs, labels and settings share one database
pub fn db_path_in(dir: &Path) -> PathBuf {
    dir.join("abiscope.sqlite3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            rpc_url = "http://localhost:8545"
            data_dir = "/tmp/abiscope"
            decode_mode = "full"

            [log]
            level = "debug"
            components = { "abiscope::store" = "trace" }
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.decode_mode, DecodeMode::Full);
        assert_eq!(config.log.level, "debug");
        assert_eq!(
            config.db_path(),
            Some(PathBuf::from("/tmp/abiscope/abiscope.sqlite3"))
        );
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.decode_mode, DecodeMode::Slots);
    }

    #[test]
    fn test_invalid_or_missing_file_yields_defaults() {
        let mut path = std::env::temp_dir();
        path.push(format!("abiscope_config_{}.toml", std::process::id()));

        assert_eq!(load_from(&path), Config::default());

        fs::write(&path, "decode_mode = \"sideways\"").unwrap();
        assert_eq!(load_from(&path), Config::default());

        fs::remove_file(path).ok();
    }
}
