use crate::calm::CalmError;
use crate::domain::constants::{LOADER_TARGET, REMOTE_TIMEOUT_MS};
use crate::services::storage::{read_cache, write_cache};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A document read from disk or the network, with its original text kept for
/// position lookups.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source: String,
    pub raw: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    schemas: BTreeMap<String, Value>,
    url_mapping: BTreeMap<String, PathBuf>,
    timeout_ms: u64,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn normalize_id(id: &str) -> String {
    id.trim().trim_end_matches('#').to_string()
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            timeout_ms: REMOTE_TIMEOUT_MS,
            ..Self::default()
        }
    }

    pub fn with_schema_directory(mut self, dir: &Path) -> anyhow::Result<Self> {
        if !dir.is_dir() {
            return Err(CalmError::DocumentLoad {
                location: dir.display().to_string(),
                reason: "schema directory does not exist".to_string(),
            }
            .into());
        }
        info!(target: LOADER_TARGET, "Loading schemas from {}", dir.display());
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            let parsed = std::fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|raw| Ok(serde_json::from_str::<Value>(&raw)?));
            match parsed {
                Ok(schema) => match schema.get("$id").and_then(Value::as_str) {
                    Some(id) => {
                        debug!(target: LOADER_TARGET, "Registered schema {} from {}", id, path.display());
                        self.schemas.insert(normalize_id(id), schema.clone());
                    }
                    None => {
                        debug!(target: LOADER_TARGET, "Skipping {} (no $id)", path.display());
                    }
                },
                Err(e) => {
                    warn!(target: LOADER_TARGET, "Skipping unreadable schema {}: {}", path.display(), e);
                }
            }
        }
        Ok(self)
    }

    pub fn with_url_mapping(mut self, file: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(file).map_err(|e| CalmError::DocumentLoad {
            location: file.display().to_string(),
            reason: e.to_string(),
        })?;
        let mapping: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| CalmError::DocumentParse {
                location: file.display().to_string(),
                reason: e.to_string(),
            })?;
        let base = file.parent().map(Path::to_path_buf).unwrap_or_default();
        for (url, local) in mapping {
            let local = PathBuf::from(local);
            let resolved = if local.is_absolute() {
                local
            } else {
                base.join(local)
            };
            self.url_mapping.insert(normalize_id(&url), resolved);
        }
        Ok(self)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Loads a document named on the command line.
    pub fn load(&self, kind: &str, source: &str) -> anyhow::Result<LoadedDocument> {
        info!(target: LOADER_TARGET, "Loading {} from {}", kind, source);
        let raw = if let Some(mapped) = self.url_mapping.get(&normalize_id(source)) {
            debug!(target: LOADER_TARGET, "Mapped {} to {}", source, mapped.display());
            read_local(mapped)?
        } else if is_remote(source) {
            self.fetch(source)?
        } else {
            read_local(Path::new(source))?
        };
        let value = serde_json::from_str(&raw).map_err(|e| CalmError::DocumentParse {
            location: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(LoadedDocument {
            source: source.to_string(),
            raw,
            value,
        })
    }

    /// Looks a schema up by id: registered schemas, then the URL mapping,
    /// then the network (with the on-disk cache as fallback).
    pub fn resolve_schema(&self, id: &str) -> anyhow::Result<Value> {
        let key = normalize_id(id);
        if let Some(schema) = self.schemas.get(&key) {
            return Ok(schema.clone());
        }
        if let Some(mapped) = self.url_mapping.get(&key) {
            let raw = read_local(mapped)?;
            return parse(&key, &raw);
        }
        if is_remote(&key) {
            let raw = self.fetch(&key)?;
            return parse(&key, &raw);
        }
        let local = key.strip_prefix("file://").unwrap_or(&key);
        if Path::new(local).is_file() {
            let raw = read_local(Path::new(local))?;
            return parse(&key, &raw);
        }
        Err(CalmError::SchemaNotFound(key).into())
    }

    fn fetch(&self, url: &str) -> anyhow::Result<String> {
        match fetch_text(url, self.timeout_ms) {
            Ok(body) => {
                if let Err(e) = write_cache(url, &body) {
                    debug!(target: LOADER_TARGET, "Could not cache {}: {}", url, e);
                }
                Ok(body)
            }
            Err(e) => match read_cache(url) {
                Some(cached) => {
                    warn!(target: LOADER_TARGET, "Fetching {} failed ({}), using cached copy", url, e);
                    Ok(cached)
                }
                None => Err(CalmError::DocumentLoad {
                    location: url.to_string(),
                    reason: e.to_string(),
                }
                .into()),
            },
        }
    }
}

fn read_local(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CalmError::DocumentLoad {
            location: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn parse(source: &str, raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).map_err(|e| {
        CalmError::DocumentParse {
            location: source.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn fetch_text(url: &str, timeout_ms: u64) -> anyhow::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?;
    let resp = client.get(url).send()?.error_for_status()?;
    Ok(resp.text()?)
}

/// Routes `$ref`s met during JSON Schema validation through the loader.
pub struct LoaderResolver {
    loader: Arc<DocumentLoader>,
}

impl LoaderResolver {
    pub fn new(loader: Arc<DocumentLoader>) -> Self {
        Self { loader }
    }
}

impl jsonschema::SchemaResolver for LoaderResolver {
    fn resolve(
        &self,
        _root_schema: &Value,
        url: &url::Url,
        _original_reference: &str,
    ) -> Result<Arc<Value>, jsonschema::SchemaResolverError> {
        let mut document = url.clone();
        document.set_fragment(None);
        self.loader.resolve_schema(document.as_str()).map(Arc::new)
    }
}
