//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `generate.rs`: `calm generate`.
//! - `validate.rs`: `calm validate` and its report formats.
//! - `docify.rs`: `calm docify`.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Merge flags with the user config (flags win).
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod docify;
pub mod generate;
pub mod validate;

pub use docify::handle_docify;
pub use generate::handle_generate;
pub use validate::handle_validate;

use crate::cli::{Cli, Commands, SourceArgs};
use crate::domain::constants::LOADER_TARGET;
use crate::domain::models::CalmConfig;
use crate::services::loader::DocumentLoader;
use crate::Exit;
use tracing::debug;

pub fn handle_command(cli: &Cli, config: &CalmConfig) -> anyhow::Result<Exit> {
    match &cli.command {
        Commands::Generate {
            pattern,
            output,
            sources,
            generate_all,
        } => handle_generate(cli, config, pattern, output, sources, *generate_all),
        Commands::Validate {
            pattern,
            architecture,
            sources,
            strict,
            format,
            output,
        } => handle_validate(
            cli,
            config,
            pattern.as_deref(),
            architecture.as_deref(),
            sources,
            *strict,
            *format,
            output.as_deref(),
        ),
        Commands::Docify {
            input,
            output,
            clear_output_directory,
            template_dir,
            sources,
        } => handle_docify(
            cli,
            config,
            input,
            output,
            *clear_output_directory,
            template_dir.as_deref(),
            sources,
        ),
    }
}

/// Builds the loader from `-s` / `--url-to-local-file-mapping`, falling back
/// to the config file.
pub fn build_loader(sources: &SourceArgs, config: &CalmConfig) -> anyhow::Result<DocumentLoader> {
    let mut loader = DocumentLoader::new();
    if let Some(dir) = sources
        .schema_directory
        .as_ref()
        .or(config.schema_directory.as_ref())
    {
        loader = loader.with_schema_directory(dir)?;
        debug!(target: LOADER_TARGET, "{} schemas registered", loader.schema_count());
    }
    if let Some(mapping) = sources
        .url_to_local_file_mapping
        .as_ref()
        .or(config.url_mapping.as_ref())
    {
        loader = loader.with_url_mapping(mapping)?;
    }
    Ok(loader)
}
