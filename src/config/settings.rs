use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;

use super::loader::LoadedConfig;
use crate::env::{load_env_file_sync, lookup, EnvMap};
use crate::request::HeaderRules;
use crate::store::{normalize_origin, DEFAULT_HISTORY_LIMIT};

pub const DEFAULT_TOKEN_ENV: &str = "CURLHOP_LOG_TOKEN";
pub const DEFAULT_STATE_FILE: &str = ".curlhop/state.json";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

fn resolve_relative(base: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogServiceSettings {
    pub origin: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub services: Vec<String>,
    pub log_service: LogServiceSettings,
    pub header_rules: HeaderRules,
    pub download_dir: PathBuf,
    pub state_path: PathBuf,
    pub timeout: Option<Duration>,
    pub history_limit: usize,
    pub env_files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    base_dir: PathBuf,
    config_dir: PathBuf,
    config: Option<LoadedConfig>,
    explicit_env: Option<PathBuf>,
    explicit_state: Option<PathBuf>,
    explicit_download_dir: Option<PathBuf>,
}

impl SettingsBuilder {
    pub fn new(base_dir: PathBuf, config_dir: PathBuf, config: Option<LoadedConfig>) -> Self {
        Self {
            base_dir,
            config_dir,
            config,
            explicit_env: None,
            explicit_state: None,
            explicit_download_dir: None,
        }
    }

    pub fn env_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_env = path;
        self
    }

    pub fn state_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_state = path;
        self
    }

    pub fn download_dir(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_download_dir = path;
        self
    }

    pub fn build(&self) -> Result<Settings> {
        let config = self.config.as_ref().map(|loaded| &loaded.config);

        let mut env = EnvMap::new();
        let mut env_files = Vec::new();
        let env_path = self.explicit_env.clone().or_else(|| {
            config
                .and_then(|cfg| cfg.env.as_deref())
                .map(|value| resolve_relative(&self.config_dir, value))
        });
        if let Some(env_path) = env_path {
            env_files.push(load_env_file_sync(&env_path, &mut env)?);
        }

        let log_config = config.and_then(|cfg| cfg.log_service.clone()).unwrap_or_default();
        let token_env = log_config
            .token_env
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
        let log_service = LogServiceSettings {
            origin: log_config
                .origin
                .as_deref()
                .map(normalize_origin)
                .filter(|origin| !origin.is_empty()),
            token: log_config
                .token
                .clone()
                .filter(|token| !token.is_empty())
                .or_else(|| lookup(&env, &token_env)),
        };

        let header_rules = config
            .and_then(|cfg| cfg.import.as_ref())
            .map(|import| HeaderRules {
                include: import.include_headers.clone(),
                exclude: import.exclude_headers.clone(),
                append: import.append_headers.clone(),
            })
            .unwrap_or_default();

        let download_dir = match &self.explicit_download_dir {
            Some(dir) => resolve_relative(&self.base_dir, &dir.to_string_lossy()),
            None => config
                .and_then(|cfg| cfg.download_dir.as_deref())
                .map(|dir| resolve_relative(&self.config_dir, dir))
                .unwrap_or_else(|| self.base_dir.join(DEFAULT_DOWNLOAD_DIR)),
        };

        let state_path = match &self.explicit_state {
            Some(path) => resolve_relative(&self.base_dir, &path.to_string_lossy()),
            None => resolve_relative(
                &self.config_dir,
                config
                    .and_then(|cfg| cfg.state_file.as_deref())
                    .unwrap_or(DEFAULT_STATE_FILE),
            ),
        };

        Ok(Settings {
            services: config.map(|cfg| cfg.services.clone()).unwrap_or_default(),
            log_service,
            header_rules,
            download_dir,
            state_path,
            timeout: config
                .and_then(|cfg| cfg.timeout_seconds)
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs),
            history_limit: config
                .and_then(|cfg| cfg.history_limit)
                .unwrap_or(DEFAULT_HISTORY_LIMIT),
            env_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn settings_resolve_paths_and_log_token_from_env_file() -> Result<()> {
        let temp = tempdir()?;
        let base_dir = temp.path().join("workspace");
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&base_dir)?;

        write_file(
            &config_dir.join("curlhop.json"),
            r#"{
  "services": ["https://a.example"],
  "logService": {"origin": "https://logs.example/", "tokenEnv": "LOGS_TOKEN_FOR_TEST"},
  "env": "local.env",
  "downloadDir": "saved",
  "timeoutSeconds": 15,
  "historyLimit": 5,
  "import": {"excludeHeaders": ["Cookie"]}
}"#,
        );
        write_file(&config_dir.join("local.env"), "LOGS_TOKEN_FOR_TEST=from-env-file\n");

        let loaded = load_config(&config_dir)?.expect("config should be present");
        let settings = SettingsBuilder::new(base_dir.clone(), config_dir.clone(), Some(loaded))
            .build()?;

        assert_eq!(settings.services, vec!["https://a.example"]);
        assert_eq!(
            settings.log_service,
            LogServiceSettings {
                origin: Some("https://logs.example".to_string()),
                token: Some("from-env-file".to_string()),
            }
        );
        assert_eq!(settings.download_dir, config_dir.join("saved"));
        assert_eq!(settings.state_path, config_dir.join(DEFAULT_STATE_FILE));
        assert_eq!(settings.timeout, Some(Duration::from_secs(15)));
        assert_eq!(settings.history_limit, 5);
        assert_eq!(settings.header_rules.exclude, vec!["Cookie"]);
        assert_eq!(settings.env_files, vec![config_dir.join("local.env")]);
        Ok(())
    }

    #[test]
    fn explicit_overrides_win_without_config() -> Result<()> {
        let temp = tempdir()?;
        let base_dir = temp.path().to_path_buf();
        let env_path = base_dir.join("override.env");
        write_file(&env_path, "CURLHOP_LOG_TOKEN=override\n");

        let settings = SettingsBuilder::new(base_dir.clone(), base_dir.clone(), None)
            .env_file(Some(env_path.clone()))
            .state_file(Some(PathBuf::from("state.json")))
            .download_dir(Some(PathBuf::from("out")))
            .build()?;

        assert_eq!(settings.log_service.origin, None);
        assert_eq!(settings.log_service.token.as_deref(), Some("override"));
        assert_eq!(settings.state_path, base_dir.join("state.json"));
        assert_eq!(settings.download_dir, base_dir.join("out"));
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(settings.header_rules.is_empty());
        assert_eq!(settings.env_files, vec![env_path]);
        Ok(())
    }
}
