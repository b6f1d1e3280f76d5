use clap::Parser;
use std::process::ExitCode;

mod calm;
mod cli;
mod commands;
mod domain;
mod services;

use crate::calm::CalmError;
use crate::cli::Cli;
use crate::commands::handle_command;
use crate::domain::models::{ErrorBody, JsonErr};
use crate::services::config::load_config;
use crate::services::logging::init_logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    ValidationFailed = 1,
    RuntimeError = 2,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_config();
    init_logging(
        cli.verbose,
        cli.quiet,
        config.as_ref().ok().and_then(|c| c.log.level.as_deref()),
    );

    match config.and_then(|config| handle_command(&cli, &config)) {
        Ok(exit) => exit.into(),
        Err(e) => {
            report_error(cli.json, &e);
            Exit::RuntimeError.into()
        }
    }
}

fn report_error(json: bool, err: &anyhow::Error) {
    let code = err
        .downcast_ref::<CalmError>()
        .map(CalmError::code)
        .unwrap_or("INTERNAL");
    if json {
        let body = JsonErr {
            ok: false,
            error: ErrorBody {
                code: code.to_string(),
                message: format!("{:#}", err),
            },
        };
        if let Ok(text) = serde_json::to_string_pretty(&body) {
            println!("{}", text);
            return;
        }
    }
    eprintln!("error: {:#}", err);
}
