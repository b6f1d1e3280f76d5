use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::constants::DEFAULT_GENERATE_OUTPUT;

#[derive(Parser, Debug)]
#[command(
    name = "calm",
    version,
    about = "A set of tools for interacting with the Common Architecture Language Model (CALM)"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug, -vvv trace)"
    )]
    pub verbose: u8,
    #[arg(short, long, global = true, help = "Only log errors")]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an architecture from a CALM pattern file.
    Generate {
        #[arg(short, long, help = "Path to the pattern file to use (file path or URL)")]
        pattern: String,
        #[arg(
            short,
            long,
            default_value = DEFAULT_GENERATE_OUTPUT,
            help = "Path location at which to output the generated file"
        )]
        output: PathBuf,
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(
            short,
            long,
            help = "Instantiate all properties, ignoring the \"required\" field"
        )]
        generate_all: bool,
    },
    /// Validate that an architecture conforms to a given CALM pattern.
    Validate {
        #[arg(short, long, help = "Path to the pattern file to use (file path or URL)")]
        pattern: Option<String>,
        #[arg(
            short,
            long,
            help = "Path to the architecture file to use (file path or URL)"
        )]
        architecture: Option<String>,
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long, help = "When run in strict mode, the CLI will fail if any warnings are reported")]
        strict: bool,
        #[arg(short, long, value_enum, help = "The format of the output [default: json]")]
        format: Option<OutputFormat>,
        #[arg(short, long, help = "Path location at which to output the validation results")]
        output: Option<PathBuf>,
    },
    /// Generate a documentation website from your CALM model.
    Docify {
        #[arg(short, long, help = "Path to the architecture file to document (file path or URL)")]
        input: String,
        #[arg(short, long, help = "Directory in which to write the documentation site")]
        output: PathBuf,
        #[arg(long, help = "Remove the output directory before generating")]
        clear_output_directory: bool,
        #[arg(short, long, help = "Directory of handlebars templates overriding the built-ins")]
        template_dir: Option<PathBuf>,
        #[command(flatten)]
        sources: SourceArgs,
    },
}

/// Where referenced schemas and documents come from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long, help = "Path to the directory containing the meta schemas to use")]
    pub schema_directory: Option<PathBuf>,
    #[arg(long, help = "Path to a JSON file mapping URLs to local file paths")]
    pub url_to_local_file_mapping: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Junit,
    Pretty,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Junit => "junit",
            OutputFormat::Pretty => "pretty",
        }
    }
}
