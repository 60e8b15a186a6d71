use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "playctl";
const CONFIG_FILE_NAME: &str = "config.yaml";
const HISTORY_FILE_NAME: &str = ".playctl_history";

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub ansible_playbook_bin: String,
    pub multipass_bin: String,
    pub docker_bin: String,
    pub enumerator_timeout_secs: u64,
    pub default_ssh_key_file: String,
    pub history_file: Option<PathBuf>,
}

impl Settings {
    pub fn enumerator_timeout(&self) -> Duration {
        Duration::from_secs(self.enumerator_timeout_secs)
    }

    /// Configured history file with `~` expanded, else `~/.playctl_history`.
    /// `None` only when no home directory can be determined.
    pub fn history_path(&self) -> Option<PathBuf> {
        match &self.history_file {
            Some(path) => expand_home(path),
            None => dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME)),
        }
    }
}

fn expand_home(path: &Path) -> Option<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
        Err(_) => Some(path.to_path_buf()),
    }
}

/// Layers configuration sources on top of the built-in defaults. Later
/// layers replace earlier values key by key.
pub struct ConfigManager {
    base_defs: IndexMap<String, Value>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        ConfigManager {
            base_defs: IndexMap::new(),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        let config_map = read_config_yaml(include_str!("base.yaml"))?;
        self.base_defs.extend(config_map);
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config_map = read_config_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        self.base_defs.extend(config_map);
        Ok(())
    }

    pub fn settings(&self) -> Result<Settings> {
        let mapping = self
            .base_defs
            .iter()
            .map(|(key, value)| (Value::String(key.clone()), value.clone()))
            .collect();
        let settings = serde_yaml::from_value(Value::Mapping(mapping))?;
        Ok(settings)
    }
}

fn read_config_yaml(yaml_content: &str) -> Result<IndexMap<String, Value>> {
    let value: Value = serde_yaml::from_str(yaml_content)?;

    // an empty file parses as null
    if value.is_null() {
        return Ok(IndexMap::new());
    }

    value
        .as_mapping()
        .cloned()
        .ok_or_else(|| anyhow!("YAML root is not a mapping"))?
        .into_iter()
        .map(|(key, value)| {
            let key_str = key
                .as_str()
                .ok_or_else(|| anyhow!("YAML key is not a string"))?
                .to_string();
            Ok((key_str, value))
        })
        .collect()
}

/// Defaults, overlaid with `config_file` if given, otherwise with
/// `<config dir>/playctl/config.yaml` when that file exists.
pub fn load_settings(config_file: Option<&Path>) -> Result<Settings> {
    let mut manager = ConfigManager::new();
    manager.init()?;

    match config_file {
        Some(path) => manager.load_file(path)?,
        None => {
            let user_config = dirs::config_dir()
                .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME));
            if let Some(path) = user_config.filter(|path| path.is_file()) {
                manager.load_file(&path)?;
            }
        }
    }

    manager.settings()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> Settings {
        let mut manager = ConfigManager::new();
        manager.init().unwrap();
        manager.settings().unwrap()
    }

    #[test]
    fn test_builtin_defaults() {
        let settings = defaults();
        assert_eq!(settings.ansible_playbook_bin, "ansible-playbook");
        assert_eq!(settings.multipass_bin, "multipass");
        assert_eq!(settings.docker_bin, "docker");
        assert_eq!(settings.enumerator_timeout(), Duration::from_secs(10));
        assert_eq!(settings.default_ssh_key_file, "~/.ssh/id_rsa");
        assert!(settings.history_file.is_none());
    }

    #[test]
    fn test_user_file_overrides_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "docker_bin: podman\nenumerator_timeout_secs: 3\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.docker_bin, "podman");
        assert_eq!(settings.enumerator_timeout_secs, 3);
        assert_eq!(settings.multipass_bin, "multipass");
    }

    #[test]
    fn test_empty_user_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.ansible_playbook_bin, "ansible-playbook");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "dockr_bin: podman\n").unwrap();

        let err = load_settings(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("dockr_bin"));
    }

    #[test]
    fn test_missing_user_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_settings(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_history_path_is_used_verbatim_when_absolute() {
        let mut settings = defaults();
        settings.history_file = Some(PathBuf::from("/tmp/playctl-history"));
        assert_eq!(
            settings.history_path(),
            Some(PathBuf::from("/tmp/playctl-history"))
        );
    }
}
