use crate::cli::{Cli, OutputFormat, SourceArgs};
use crate::commands::build_loader;
use crate::domain::constants::VALIDATE_TARGET;
use crate::domain::models::CalmConfig;
use crate::services::output::format_outcome;
use crate::services::storage::write_text;
use crate::services::validation::validate;
use crate::Exit;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[allow(clippy::too_many_arguments)]
pub fn handle_validate(
    cli: &Cli,
    config: &CalmConfig,
    pattern: Option<&str>,
    architecture: Option<&str>,
    sources: &SourceArgs,
    strict: bool,
    format: Option<OutputFormat>,
    output: Option<&Path>,
) -> anyhow::Result<Exit> {
    let format = match format {
        Some(f) => f,
        None if cli.json => OutputFormat::Json,
        None => config.validate.format.unwrap_or(OutputFormat::Json),
    };
    let strict = strict || config.validate.strict;

    let loader = Arc::new(build_loader(sources, config)?);
    let outcome =
        validate(loader, pattern, architecture)?.with_rule_severities(&config.validate.rules);

    info!(target: VALIDATE_TARGET, "Formatting output as {}", format.as_str());
    let text = format_outcome(&outcome, format)?;
    match output {
        Some(path) => {
            write_text(path, &format!("{}\n", text))?;
            info!(target: VALIDATE_TARGET, "Wrote validation results to {}", path.display());
        }
        None => println!("{}", text),
    }

    if outcome.failed(strict) {
        Ok(Exit::ValidationFailed)
    } else {
        Ok(Exit::Success)
    }
}
