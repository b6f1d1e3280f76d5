use crate::calm::CalmError;
use crate::domain::constants::{JSON_SCHEMA_CODE, VALIDATE_TARGET};
use crate::domain::models::{Severity, ValidationOutput};
use crate::services::loader::{DocumentLoader, LoaderResolver};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Validates `instance` against `schema` (draft 2020-12). Every failure is
/// reported as a `json-schema` error.
pub fn validate_against_schema(
    loader: Arc<DocumentLoader>,
    schema_source: &str,
    schema: &Value,
    instance: &Value,
) -> anyhow::Result<Vec<ValidationOutput>> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .with_resolver(LoaderResolver::new(loader))
        .compile(schema)
        .map_err(|e| CalmError::SchemaCompile {
            location: schema_source.to_string(),
            reason: e.to_string(),
        })?;

    let outputs: Vec<ValidationOutput> = match compiled.validate(instance) {
        Ok(()) => vec![],
        Err(errors) => errors
            .map(|e| {
                ValidationOutput::new(
                    JSON_SCHEMA_CODE,
                    Severity::Error,
                    e.to_string(),
                    e.instance_path.to_string(),
                    format!("#{}", e.schema_path),
                )
            })
            .collect(),
    };
    debug!(
        target: VALIDATE_TARGET,
        "JSON Schema validation against {} produced {} outputs",
        schema_source,
        outputs.len()
    );
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pattern() -> Value {
        json!({
            "$schema": "https://calm.finos.org/release/1.0/meta/calm.json",
            "type": "object",
            "properties": {
                "nodes": {
                    "type": "array",
                    "prefixItems": [
                        {"type": "object",
                         "properties": {"unique-id": {"const": "api"}, "node-type": {"const": "service"}},
                         "required": ["unique-id", "node-type"]}
                    ]
                }
            },
            "required": ["nodes"]
        })
    }

    #[test]
    fn const_mismatch_is_reported_with_paths() {
        let loader = Arc::new(DocumentLoader::new());
        let arch = json!({"nodes": [{"unique-id": "api", "node-type": "database"}]});
        let outputs = validate_against_schema(loader, "pattern.json", &pattern(), &arch).unwrap();
        assert_eq!(outputs.len(), 1);
        let out = &outputs[0];
        assert_eq!(out.code, "json-schema");
        assert_eq!(out.severity, Severity::Error);
        assert_eq!(out.path, "/nodes/0/node-type");
        assert!(out.schema_path.starts_with("#/properties/nodes/prefixItems/0"));
        assert!(out.schema_path.ends_with("const"));
        assert!(out.line_start.is_none());
    }

    #[test]
    fn conforming_instance_has_no_outputs() {
        let loader = Arc::new(DocumentLoader::new());
        let arch = json!({"nodes": [{"unique-id": "api", "node-type": "service"}]});
        let outputs = validate_against_schema(loader, "pattern.json", &pattern(), &arch).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn missing_required_property_is_reported_at_parent() {
        let loader = Arc::new(DocumentLoader::new());
        let outputs =
            validate_against_schema(loader, "pattern.json", &pattern(), &json!({})).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path, "");
        assert!(outputs[0].message.contains("nodes"));
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let loader = Arc::new(DocumentLoader::new());
        let err = validate_against_schema(
            loader,
            "broken.json",
            &json!({"type": 12}),
            &json!({}),
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CalmError>().unwrap().code(),
            "SCHEMA_COMPILE"
        );
    }
}
