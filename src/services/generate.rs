//! Instantiates an architecture skeleton from a pattern.

use crate::calm::{count_placeholders, placeholder_for, CalmError};
use crate::domain::constants::{GENERATE_TARGET, MAX_REF_DEPTH};
use crate::domain::models::GenerateReport;
use crate::services::loader::{is_remote, DocumentLoader};
use crate::services::storage::write_json;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Loads `pattern`, instantiates it and writes the result to `output`.
pub fn generate(
    loader: Arc<DocumentLoader>,
    pattern: &str,
    output: &Path,
    generate_all: bool,
) -> anyhow::Result<GenerateReport> {
    let doc = loader.load("pattern", pattern)?;
    let architecture =
        generate_architecture(&loader, &doc.value, source_url(pattern), generate_all)?;
    write_json(output, &architecture)?;
    info!(target: GENERATE_TARGET, "Wrote architecture to {}", output.display());

    let len = |key: &str| {
        architecture
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    };
    Ok(GenerateReport {
        pattern: pattern.to_string(),
        output: output.display().to_string(),
        nodes: len("nodes"),
        relationships: len("relationships"),
        placeholders: count_placeholders(&architecture),
    })
}

/// The URL a pattern named on the command line was read from.
fn source_url(source: &str) -> Option<Url> {
    if is_remote(source) {
        return Url::parse(source).ok();
    }
    let path = std::path::absolute(source).ok()?;
    Url::from_file_path(path).ok()
}

/// Instantiates `pattern`. Relative `$ref`s resolve against the pattern's
/// `$id`, falling back to `location`.
pub fn generate_architecture(
    loader: &DocumentLoader,
    pattern: &Value,
    location: Option<Url>,
    generate_all: bool,
) -> anyhow::Result<Value> {
    let generator = Generator {
        loader,
        generate_all,
    };
    let scope = Scope::new(Arc::new(pattern.clone()), location);
    let body = generator.instantiate(pattern, &scope, "", 0)?;

    let mut out = Map::new();
    if let Some(id) = pattern.get("$id").and_then(Value::as_str) {
        out.insert("$schema".to_string(), Value::String(id.to_string()));
    }
    match body {
        Value::Object(map) => {
            for (k, v) in map {
                if !out.contains_key(&k) {
                    out.insert(k, v);
                }
            }
        }
        other => {
            debug!(target: GENERATE_TARGET, "Pattern root is not an object schema: {}", other);
        }
    }
    Ok(Value::Object(out))
}

/// The document a schema fragment belongs to and the base URI its
/// references resolve against.
#[derive(Debug, Clone)]
struct Scope {
    root: Arc<Value>,
    base: Option<Url>,
}

impl Scope {
    /// `$id` of the document wins over the location it was read from.
    fn new(root: Arc<Value>, location: Option<Url>) -> Self {
        let id = root.get("$id").and_then(Value::as_str);
        let declared = id.and_then(|id| match &location {
            Some(loc) => loc.join(id).ok(),
            None => Url::parse(id).ok(),
        });
        Self {
            base: declared.or(location),
            root,
        }
    }

    /// Absolute form of the document part of a `$ref`. Without a base, an
    /// unparseable reference is passed to the loader as written.
    fn join(&self, document: &str) -> (String, Option<Url>) {
        let joined = match &self.base {
            Some(base) => base.join(document).ok(),
            None => Url::parse(document).ok(),
        };
        match joined {
            Some(mut url) => {
                url.set_fragment(None);
                (url.to_string(), Some(url))
            }
            None => (document.to_string(), None),
        }
    }
}

struct Generator<'a> {
    loader: &'a DocumentLoader,
    generate_all: bool,
}

impl Generator<'_> {
    fn instantiate(
        &self,
        schema: &Value,
        scope: &Scope,
        name: &str,
        depth: usize,
    ) -> anyhow::Result<Value> {
        let (schema, scope) = self.resolve(schema, scope, depth)?;
        let Some(obj) = schema.as_object() else {
            // `true`/`false` schemas carry no shape.
            return Ok(Value::String(placeholder_for(name)));
        };

        if let Some(value) = obj.get("const") {
            return Ok(value.clone());
        }
        if let Some(items) = obj.get("prefixItems").and_then(Value::as_array) {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(self.instantiate(item, &scope, name, depth + 1)?);
            }
            return Ok(Value::Array(out));
        }
        for key in ["anyOf", "oneOf"] {
            if let Some(first) = obj.get(key).and_then(Value::as_array).and_then(|o| o.first()) {
                return self.instantiate(first, &scope, name, depth + 1);
            }
        }
        if obj.contains_key("properties") {
            return self.object(obj, &scope, depth);
        }

        Ok(match primary_type(obj) {
            Some("string") | None => Value::String(placeholder_for(name)),
            Some("integer") | Some("number") => Value::from(-1),
            Some("boolean") => Value::Bool(false),
            Some("array") => Value::Array(vec![]),
            Some("object") => Value::Object(Map::new()),
            Some("null") => Value::Null,
            Some(_) => Value::String(placeholder_for(name)),
        })
    }

    fn object(
        &self,
        schema: &Map<String, Value>,
        scope: &Scope,
        depth: usize,
    ) -> anyhow::Result<Value> {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let mut out = Map::new();
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Ok(Value::Object(out));
        };
        for (key, property) in properties {
            let (resolved, _) = self.resolve(property, scope, depth + 1)?;
            let wanted = self.generate_all
                || required.contains(&key.as_str())
                || resolved.get("const").is_some();
            if wanted {
                out.insert(key.clone(), self.instantiate(property, scope, key, depth + 1)?);
            }
        }
        Ok(Value::Object(out))
    }

    /// Follows `$ref` chains, overlaying local keywords on the target.
    /// Returns the merged schema and the scope later refs resolve in.
    fn resolve(
        &self,
        schema: &Value,
        scope: &Scope,
        depth: usize,
    ) -> anyhow::Result<(Value, Scope)> {
        if depth > MAX_REF_DEPTH {
            let reference = schema.get("$ref").and_then(Value::as_str).unwrap_or("#");
            return Err(CalmError::ReferenceCycle(reference.to_string()).into());
        }
        let Some(reference) = schema.get("$ref").and_then(Value::as_str) else {
            return Ok((schema.clone(), scope.clone()));
        };
        let (document, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let target_scope = if document.is_empty() {
            scope.clone()
        } else {
            let (id, location) = scope.join(document);
            debug!(target: GENERATE_TARGET, "Resolving {} as {}", document, id);
            Scope::new(Arc::new(self.loader.resolve_schema(&id)?), location)
        };
        let target = if fragment.is_empty() {
            target_scope.root.as_ref()
        } else {
            target_scope
                .root
                .pointer(fragment)
                .ok_or_else(|| CalmError::SchemaNotFound(reference.to_string()))?
        };
        let (base, base_scope) = self.resolve(target, &target_scope, depth + 1)?;
        Ok((overlay(base, schema), base_scope))
    }
}

/// Local keywords win over referenced ones, except that `properties` are
/// merged per key and `required` lists are unioned.
fn overlay(base: Value, local: &Value) -> Value {
    let (Value::Object(mut merged), Some(local)) = (base, local.as_object()) else {
        return local.clone();
    };
    for (key, value) in local {
        if key == "$ref" {
            continue;
        }
        let combined = match (key.as_str(), merged.get_mut(key), value) {
            ("properties", Some(Value::Object(existing)), Value::Object(extra)) => {
                for (k, v) in extra {
                    existing.insert(k.clone(), v.clone());
                }
                true
            }
            ("required", Some(Value::Array(existing)), Value::Array(extra)) => {
                for v in extra {
                    if !existing.contains(v) {
                        existing.push(v.clone());
                    }
                }
                true
            }
            _ => false,
        };
        if !combined {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

fn primary_type(schema: &Map<String, Value>) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .or(Some("null")),
        _ => None,
    }
}
