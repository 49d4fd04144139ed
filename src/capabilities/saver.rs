use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::info;

use crate::response::DEFAULT_FILENAME;

pub trait FileSaver: Send + Sync {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory. Existing files are never overwritten;
/// a numbered prefix is added instead.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating download directory {}", self.dir.display()))?;

        let name = sanitize_filename(filename);
        let mut path = self.dir.join(&name);
        if path.exists() {
            let index = next_index(&self.dir)?;
            path = self.dir.join(format!("{:03}-{}", index, name));
        }

        fs::write(&path, bytes)
            .with_context(|| format!("writing attachment to {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "saved attachment");
        Ok(path)
    }
}

pub fn sanitize_filename(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ' ' | '(' | ')') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches(|c: char| c == '-' || c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn next_index(dir: &Path) -> Result<u32> {
    let mut max_index = 1;
    for entry in
        fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?
    {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.len() >= 4
                && name.chars().take(3).all(|c| c.is_ascii_digit())
                && name[3..].starts_with('-')
            {
                if let Ok(value) = name[0..3].parse::<u32>() {
                    max_index = max_index.max(value + 1);
                }
            }
        }
    }
    Ok(max_index)
}
