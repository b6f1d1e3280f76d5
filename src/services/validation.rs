use crate::calm::CalmError;
use crate::domain::constants::VALIDATE_TARGET;
use crate::domain::models::{Severity, ValidationOutcome, ValidationOutput};
use crate::services::json_schema::validate_against_schema;
use crate::services::loader::{DocumentLoader, LoadedDocument};
use crate::services::rules::{architecture_rules, pattern_rules, run_rules};
use crate::services::source_map::SourceMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads the named documents and validates them.
pub fn validate(
    loader: Arc<DocumentLoader>,
    pattern: Option<&str>,
    architecture: Option<&str>,
) -> anyhow::Result<ValidationOutcome> {
    if pattern.is_none() && architecture.is_none() {
        return Err(CalmError::MissingInput(
            "validate needs --pattern, --architecture or both".to_string(),
        )
        .into());
    }
    let pattern = pattern
        .map(|p| loader.load("pattern", p))
        .transpose()?;
    let architecture = architecture
        .map(|a| loader.load("architecture", a))
        .transpose()?;
    validate_documents(loader, pattern.as_ref(), architecture.as_ref())
}

/// Runs the JSON Schema stage and the rule stage over already loaded
/// documents.
pub fn validate_documents(
    loader: Arc<DocumentLoader>,
    pattern: Option<&LoadedDocument>,
    architecture: Option<&LoadedDocument>,
) -> anyhow::Result<ValidationOutcome> {
    let schema_outputs = match (pattern, architecture) {
        (Some(p), Some(a)) => {
            info!(target: VALIDATE_TARGET, "Validating {} against pattern {}", a.source, p.source);
            validate_against_schema(loader, &p.source, &p.value, &a.value)?
        }
        (None, Some(a)) => validate_with_declared_schema(loader, "architecture", a)?,
        (Some(p), None) => validate_with_declared_schema(loader, "pattern", p)?,
        (None, None) => {
            return Err(CalmError::MissingInput(
                "validate needs --pattern, --architecture or both".to_string(),
            )
            .into())
        }
    };

    let mut rule_outputs = Vec::new();
    if let Some(p) = pattern {
        rule_outputs.extend(run_rules(&pattern_rules(), &p.value, &SourceMap::parse(&p.raw)));
    }
    if let Some(a) = architecture {
        rule_outputs.extend(run_rules(
            &architecture_rules(),
            &a.value,
            &SourceMap::parse(&a.raw),
        ));
    }

    let outcome = ValidationOutcome::new(schema_outputs, rule_outputs);
    debug!(
        target: VALIDATE_TARGET,
        "{} errors, {} warnings",
        outcome.count(Severity::Error),
        outcome.count(Severity::Warning)
    );
    Ok(outcome)
}

/// Validates a document against the schema named by its own `$schema`.
fn validate_with_declared_schema(
    loader: Arc<DocumentLoader>,
    kind: &str,
    doc: &LoadedDocument,
) -> anyhow::Result<Vec<ValidationOutput>> {
    let Some(schema_id) = doc.value.get("$schema").and_then(Value::as_str) else {
        warn!(
            target: VALIDATE_TARGET,
            "The {} {} declares no $schema, skipping JSON Schema validation", kind, doc.source
        );
        return Ok(vec![]);
    };
    let schema = match loader.resolve_schema(schema_id) {
        Ok(schema) => schema,
        // Only the architecture depends on its schema being present.
        Err(e) if kind == "pattern" => {
            warn!(
                target: VALIDATE_TARGET,
                "Could not resolve {} for pattern {}: {}", schema_id, doc.source, e
            );
            return Ok(vec![]);
        }
        Err(e) => return Err(e),
    };
    info!(target: VALIDATE_TARGET, "Validating {} {} against {}", kind, doc.source, schema_id);
    validate_against_schema(loader, schema_id, &schema, &doc.value)
}
