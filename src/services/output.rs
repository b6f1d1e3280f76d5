use crate::cli::OutputFormat;
use crate::domain::models::{JsonOut, Severity, ValidationOutcome, ValidationOutput};
use serde::Serialize;

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

const SCHEMA_STAGE: &str = "JSON Schema Validation";
const RULE_STAGE: &str = "Spectral Validation";

pub fn format_outcome(outcome: &ValidationOutcome, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
        OutputFormat::Junit => junit(outcome),
        OutputFormat::Pretty => pretty(outcome),
    })
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn location(o: &ValidationOutput) -> String {
    let path = if o.path.is_empty() { "/" } else { &o.path };
    match (o.line_start, o.character_start) {
        (Some(line), Some(ch)) => format!("{} ({}:{})", path, line + 1, ch + 1),
        _ => path.to_string(),
    }
}

fn junit_suite(name: &str, outputs: &[ValidationOutput]) -> String {
    let failures = outputs
        .iter()
        .filter(|o| o.severity == Severity::Error)
        .count();
    let tests = outputs.len().max(1);
    let mut xml = format!(
        "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\">\n",
        xml_escape(name),
        tests,
        failures
    );
    if outputs.is_empty() {
        xml.push_str(&format!(
            "    <testcase name=\"{}\" classname=\"{}\"/>\n",
            xml_escape(&format!("{} passed", name)),
            xml_escape(name)
        ));
    }
    for o in outputs {
        xml.push_str(&format!(
            "    <testcase name=\"{}\" classname=\"{}\">\n",
            xml_escape(&format!("{} at {}", o.code, location(o))),
            xml_escape(name)
        ));
        let body = xml_escape(&o.message);
        if o.severity == Severity::Error {
            xml.push_str(&format!(
                "      <failure message=\"{}\" type=\"{}\">{}</failure>\n",
                body,
                xml_escape(&o.code),
                body
            ));
        } else {
            xml.push_str(&format!(
                "      <system-out>{}: {}</system-out>\n",
                o.severity.as_str(),
                body
            ));
        }
        xml.push_str("    </testcase>\n");
    }
    xml.push_str("  </testsuite>\n");
    xml
}

fn junit(outcome: &ValidationOutcome) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n");
    xml.push_str(&junit_suite(SCHEMA_STAGE, &outcome.json_schema_validation_outputs));
    xml.push_str(&junit_suite(RULE_STAGE, &outcome.spectral_schema_validation_outputs));
    xml.push_str("</testsuites>");
    xml
}

fn pretty(outcome: &ValidationOutcome) -> String {
    let mut lines = Vec::new();
    for (stage, outputs) in [
        (SCHEMA_STAGE, &outcome.json_schema_validation_outputs),
        (RULE_STAGE, &outcome.spectral_schema_validation_outputs),
    ] {
        lines.push(format!("{} ({}):", stage, outputs.len()));
        if outputs.is_empty() {
            lines.push("  no issues".to_string());
        }
        for o in outputs {
            lines.push(format!(
                "  {:<7} {} {}: {}",
                o.severity.as_str(),
                location(o),
                o.code,
                o.message
            ));
        }
    }
    lines.push(format!(
        "{} error(s), {} warning(s)",
        outcome.count(Severity::Error),
        outcome.count(Severity::Warning)
    ));
    lines.join("\n")
}
