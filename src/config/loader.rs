use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = "curlhop.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogServiceConfig {
    pub origin: Option<String>,
    pub token: Option<String>,
    #[serde(rename = "tokenEnv")]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ImportConfig {
    #[serde(rename = "includeHeaders")]
    pub include_headers: Vec<String>,
    #[serde(rename = "excludeHeaders")]
    pub exclude_headers: Vec<String>,
    #[serde(rename = "appendHeaders")]
    pub append_headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CurlhopConfig {
    pub services: Vec<String>,
    #[serde(rename = "logService")]
    pub log_service: Option<LogServiceConfig>,
    pub env: Option<String>,
    #[serde(rename = "downloadDir")]
    pub download_dir: Option<String>,
    #[serde(rename = "stateFile")]
    pub state_file: Option<String>,
    #[serde(rename = "timeoutSeconds")]
    pub timeout_seconds: Option<u64>,
    #[serde(rename = "historyLimit")]
    pub history_limit: Option<usize>,
    pub import: Option<ImportConfig>,
    #[serde(flatten)]
    extras: HashMap<String, Value>,
}

impl CurlhopConfig {
    /// Top-level keys curlhop does not understand, sorted.
    pub fn unknown_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.extras.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CurlhopConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Loads `curlhop.json` from a directory, or the given file directly.
/// A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        std::env::current_dir()?.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE_NAME), resolved)
    } else {
        let dir = match resolved.parent() {
            Some(parent) => parent.to_path_buf(),
            None => std::env::current_dir()?,
        };
        (resolved.clone(), dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: CurlhopConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;
    for key in config.unknown_keys() {
        warn!(key, path = %file_path.display(), "ignoring unknown config key");
    }

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn returns_none_when_config_missing() -> Result<()> {
        let temp = tempdir()?;
        let result = load_config(temp.path())?;
        assert!(result.is_none());
        Ok(())
    }

    #[test]
    fn loads_config_from_directory() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            r#"{
  "services": ["https://a.example", "https://b.example/"],
  "logService": {"origin": "https://logs.example", "tokenEnv": "LOGS_TOKEN"},
  "timeoutSeconds": 30,
  "import": {"excludeHeaders": ["cookie"], "appendHeaders": {"X-Debug": "1"}},
  "theme": "dark",
  "downloadFolder": "typo"
}"#,
        )?;

        let result = load_config(temp.path())?.expect("config should load");
        assert_eq!(result.path, config_path);
        assert_eq!(result.dir, temp.path());
        assert_eq!(result.config.services.len(), 2);
        let log_service = result.config.log_service.as_ref().expect("log service");
        assert_eq!(log_service.origin.as_deref(), Some("https://logs.example"));
        assert_eq!(log_service.token_env.as_deref(), Some("LOGS_TOKEN"));
        assert_eq!(result.config.timeout_seconds, Some(30));
        let import = result.config.import.as_ref().expect("import rules");
        assert_eq!(import.exclude_headers, vec!["cookie"]);
        assert_eq!(import.append_headers.get("X-Debug").map(String::as_str), Some("1"));
        assert_eq!(result.config.unknown_keys(), vec!["downloadFolder", "theme"]);
        Ok(())
    }

    #[test]
    fn reports_parse_errors_with_path() -> Result<()> {
        let temp = tempdir()?;
        let config_path = temp.path().join("custom.json");
        std::fs::write(&config_path, "{ nope")?;

        let err = load_config(&config_path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
        Ok(())
    }
}
