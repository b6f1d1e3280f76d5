use crate::cli::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            "hint" => Ok(Severity::Hint),
            other => Err(format!(
                "unknown severity '{}' (expected error, warning, info or hint)",
                other
            )),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, <Self as TryFrom<String>>::Error> {
        value.parse()
    }
}

/// One diagnostic. Positions are zero-based and only present for rule outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutput {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub path: String,
    #[serde(rename = "schemaPath")]
    pub schema_path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub character_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub character_end: Option<usize>,
}

impl ValidationOutput {
    pub fn new(
        code: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        path: impl Into<String>,
        schema_path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            path: path.into(),
            schema_path: schema_path.into(),
            line_start: None,
            line_end: None,
            character_start: None,
            character_end: None,
        }
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.line_start = Some(range.line_start);
        self.line_end = Some(range.line_end);
        self.character_start = Some(range.character_start);
        self.character_end = Some(range.character_end);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    #[serde(rename = "jsonSchemaValidationOutputs")]
    pub json_schema_validation_outputs: Vec<ValidationOutput>,
    #[serde(rename = "spectralSchemaValidationOutputs")]
    pub spectral_schema_validation_outputs: Vec<ValidationOutput>,
    #[serde(rename = "hasErrors")]
    pub has_errors: bool,
    #[serde(rename = "hasWarnings")]
    pub has_warnings: bool,
}

impl ValidationOutcome {
    pub fn new(json_schema: Vec<ValidationOutput>, spectral: Vec<ValidationOutput>) -> Self {
        let all = || json_schema.iter().chain(spectral.iter());
        let has_errors = all().any(|o| o.severity == Severity::Error);
        let has_warnings = all().any(|o| o.severity == Severity::Warning);
        Self {
            json_schema_validation_outputs: json_schema,
            spectral_schema_validation_outputs: spectral,
            has_errors,
            has_warnings,
        }
    }

    /// Whether the run should fail the process.
    pub fn failed(&self, strict: bool) -> bool {
        self.has_errors || (strict && self.has_warnings)
    }

    /// Re-grades rule outputs whose code has a configured severity.
    pub fn with_rule_severities(self, overrides: &BTreeMap<String, Severity>) -> Self {
        if overrides.is_empty() {
            return self;
        }
        let mut spectral = self.spectral_schema_validation_outputs;
        for output in &mut spectral {
            if let Some(severity) = overrides.get(&output.code) {
                output.severity = *severity;
            }
        }
        Self::new(self.json_schema_validation_outputs, spectral)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.json_schema_validation_outputs
            .iter()
            .chain(self.spectral_schema_validation_outputs.iter())
            .filter(|o| o.severity == severity)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    pub line_start: usize,
    pub character_start: usize,
    pub line_end: usize,
    pub character_end: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateReport {
    pub pattern: String,
    pub output: String,
    pub nodes: usize,
    pub relationships: usize,
    pub placeholders: usize,
}

#[derive(Debug, Serialize)]
pub struct DocifyReport {
    pub input: String,
    pub output: String,
    pub pages: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CalmConfig {
    #[serde(default)]
    pub schema_directory: Option<PathBuf>,
    #[serde(default)]
    pub url_mapping: Option<PathBuf>,
    #[serde(default)]
    pub validate: ValidateConfig,
    #[serde(default)]
    pub docify: DocifyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct ValidateConfig {
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub strict: bool,
    /// Severity per rule code, replacing the built-in one.
    #[serde(default)]
    pub rules: BTreeMap<String, Severity>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DocifyConfig {
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_flags_follow_severities() {
        let warn = ValidationOutput::new("r", Severity::Warning, "w", "/nodes/0", "");
        let outcome = ValidationOutcome::new(vec![], vec![warn]);
        assert!(!outcome.has_errors);
        assert!(outcome.has_warnings);
        assert!(!outcome.failed(false));
        assert!(outcome.failed(true));
    }

    #[test]
    fn configured_rule_severities_regrade_outcome() {
        let warn = ValidationOutput::new(
            "architecture-nodes-must-be-referenced",
            Severity::Warning,
            "w",
            "/nodes/0",
            "",
        );
        let schema = ValidationOutput::new("json-schema", Severity::Error, "e", "/a", "#/b");
        let overrides = BTreeMap::from([
            ("architecture-nodes-must-be-referenced".to_string(), Severity::Hint),
            ("json-schema".to_string(), Severity::Info),
        ]);
        let outcome = ValidationOutcome::new(vec![schema], vec![warn]).with_rule_severities(&overrides);
        assert!(!outcome.has_warnings);
        assert!(outcome.has_errors);
        assert_eq!(outcome.spectral_schema_validation_outputs[0].severity, Severity::Hint);
        assert_eq!(outcome.json_schema_validation_outputs[0].severity, Severity::Error);
    }

    #[test]
    fn severities_parse_case_insensitively() {
        assert_eq!("Info".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn output_serializes_with_documented_field_names() {
        let out = ValidationOutput::new("json-schema", Severity::Error, "m", "/a", "#/b");
        let v = serde_json::to_value(ValidationOutcome::new(vec![out], vec![])).unwrap();
        assert_eq!(v["hasErrors"], true);
        assert_eq!(v["jsonSchemaValidationOutputs"][0]["schemaPath"], "#/b");
        assert!(v["jsonSchemaValidationOutputs"][0].get("line_start").is_none());
    }

    #[test]
    fn ranges_are_flattened_into_snake_case_fields() {
        let out = ValidationOutput::new("rule", Severity::Warning, "m", "/a", "").with_range(
            SourceRange {
                line_start: 3,
                character_start: 4,
                line_end: 3,
                character_end: 9,
            },
        );
        let v = serde_json::to_value(out).unwrap();
        assert_eq!(v["line_start"], 3);
        assert_eq!(v["character_end"], 9);
    }
}
