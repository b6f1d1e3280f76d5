use crate::cli::{Cli, SourceArgs};
use crate::commands::build_loader;
use crate::domain::models::CalmConfig;
use crate::services::docify::docify;
use crate::services::output::print_one;
use crate::Exit;
use std::path::Path;

pub fn handle_docify(
    cli: &Cli,
    config: &CalmConfig,
    input: &str,
    output: &Path,
    clear_output_directory: bool,
    template_dir: Option<&Path>,
    sources: &SourceArgs,
) -> anyhow::Result<Exit> {
    let loader = build_loader(sources, config)?;
    let template_dir = template_dir.or(config.docify.template_dir.as_deref());
    let report = docify(&loader, input, output, clear_output_directory, template_dir)?;
    print_one(cli.json, report, |r| {
        format!("wrote {} pages to {}", r.pages.len(), r.output)
    })?;
    Ok(Exit::Success)
}
