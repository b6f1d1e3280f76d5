use crate::cli::{Cli, SourceArgs};
use crate::commands::build_loader;
use crate::domain::models::CalmConfig;
use crate::services::generate::generate;
use crate::services::output::print_one;
use crate::Exit;
use std::path::Path;
use std::sync::Arc;

pub fn handle_generate(
    cli: &Cli,
    config: &CalmConfig,
    pattern: &str,
    output: &Path,
    sources: &SourceArgs,
    generate_all: bool,
) -> anyhow::Result<Exit> {
    let loader = Arc::new(build_loader(sources, config)?);
    let report = generate(loader, pattern, output, generate_all)?;
    print_one(cli.json, report, |r| {
        format!(
            "wrote {} ({} nodes, {} relationships, {} placeholders to fill)",
            r.output, r.nodes, r.relationships, r.placeholders
        )
    })?;
    Ok(Exit::Success)
}
