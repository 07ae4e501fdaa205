use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub generator: Option<GeneratorConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Platform config directory path: `<config_dir>/paperlens/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperlens").join("config.toml"))
}

/// Load config by cascading CWD `.paperlens.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".paperlens.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        storage: Some(StorageConfig {
            db_path: overlay
                .storage
                .as_ref()
                .and_then(|s| s.db_path.clone())
                .or_else(|| base.storage.as_ref().and_then(|s| s.db_path.clone())),
        }),
        generator: Some(GeneratorConfig {
            api_key: overlay
                .generator
                .as_ref()
                .and_then(|g| g.api_key.clone())
                .or_else(|| base.generator.as_ref().and_then(|g| g.api_key.clone())),
            model: overlay
                .generator
                .as_ref()
                .and_then(|g| g.model.clone())
                .or_else(|| base.generator.as_ref().and_then(|g| g.model.clone())),
            base_url: overlay
                .generator
                .as_ref()
                .and_then(|g| g.base_url.clone())
                .or_else(|| base.generator.as_ref().and_then(|g| g.base_url.clone())),
            timeout_secs: overlay
                .generator
                .as_ref()
                .and_then(|g| g.timeout_secs)
                .or_else(|| base.generator.as_ref().and_then(|g| g.timeout_secs)),
        }),
    }
}
