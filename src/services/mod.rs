//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `loader.rs`: reads patterns, architectures and schemas (files, URLs, mappings).
//! - `source_map.rs`: JSON pointer to line/character lookup.
//! - `json_schema.rs`: draft 2020-12 validation stage.
//! - `rules.rs`: built-in architecture and pattern lint rules.
//! - `validation.rs`: validation modes and outcome assembly.
//! - `generate.rs`: pattern instantiation.
//! - `docify.rs`: Markdown site rendering.
//! - `storage.rs`: output files, output directories and the document cache.
//! - `config.rs`: user config file.
//! - `logging.rs`: tracing subscriber setup.
//! - `output.rs`: JSON/text output helpers and validation report formats.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod config;
pub mod docify;
pub mod generate;
pub mod json_schema;
pub mod loader;
pub mod logging;
pub mod output;
pub mod rules;
pub mod source_map;
pub mod storage;
pub mod validation;
