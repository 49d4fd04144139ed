use std::{
    collections::HashMap,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

pub type EnvMap = HashMap<String, String>;

pub fn load_env_file_sync(path: &Path, env: &mut EnvMap) -> Result<PathBuf> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;
    let iter = dotenvy::from_read_iter(Cursor::new(content));

    for item in iter {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }

    Ok(path.to_path_buf())
}

/// Looks a variable up in the loaded env file first, then in the process
/// environment.
pub fn lookup(env: &EnvMap, key: &str) -> Option<String> {
    env.get(key)
        .cloned()
        .or_else(|| std::env::var(key).ok())
        .filter(|value| !value.is_empty())
}
