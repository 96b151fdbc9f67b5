use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from
/// `<user-config-dir>/jackal-memory/config.toml`. Every field is optional;
/// environment variables take precedence (see `remote.rs`).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Bearer credential for the memory service.
    pub api_key: Option<String>,
    /// Explicit AES-256 key as 64 hex chars; overrides the key file.
    pub encryption_key: Option<String>,
    /// Service base URL override (defaults to the hosted deployment).
    pub base_url: Option<String>,
    /// Key file location override.
    pub key_file: Option<PathBuf>,
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("config.toml"))
}

/// Default location of the persisted encryption key.
pub fn default_key_file() -> Result<PathBuf> {
    Ok(app_dir()?.join("key"))
}

fn app_dir() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("jackal-memory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn returns_default_when_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n").expect("write");
        let cfg = load_from_path(&path).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            api_key = "jm_secret"
            encryption_key = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff"
            base_url = "https://memory.example.test"
            key_file = "/tmp/jackal-key"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                api_key: Some("jm_secret".into()),
                encryption_key: Some(
                    "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff".into()
                ),
                base_url: Some("https://memory.example.test".into()),
                key_file: Some(PathBuf::from("/tmp/jackal-key")),
            }
        );
    }

    #[test]
    fn partial_config_leaves_other_fields_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = \"jm_secret\"").expect("write");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(cfg.api_key.as_deref(), Some("jm_secret"));
        assert_eq!(cfg.encryption_key, None);
        assert_eq!(cfg.base_url, None);
        assert_eq!(cfg.key_file, None);
    }
}
