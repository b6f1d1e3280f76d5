use crate::calm::CalmError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text(path, &text)
}

pub fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Makes `dir` an empty directory. An existing non-empty directory is only
/// removed when `clear` is set.
pub fn prepare_output_dir(dir: &Path, clear: bool) -> anyhow::Result<()> {
    if dir.exists() {
        let occupied = std::fs::read_dir(dir)?.next().is_some();
        if occupied {
            if !clear {
                return Err(CalmError::OutputNotEmpty(dir.display().to_string()).into());
            }
            std::fs::remove_dir_all(dir)?;
        }
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn cache_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home)
        .join(".cache")
        .join("calm")
        .join("documents"))
}

pub fn cache_path(url: &str) -> anyhow::Result<PathBuf> {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let id = hex::encode(hasher.finalize());
    Ok(cache_dir()?.join(format!("{}.json", id)))
}

pub fn read_cache(url: &str) -> Option<String> {
    let path = cache_path(url).ok()?;
    std::fs::read_to_string(path).ok()
}

pub fn write_cache(url: &str, body: &str) -> anyhow::Result<()> {
    let path = cache_path(url)?;
    write_text(&path, body)
}
