//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Validation outcome, report and config structs live here so services
//!   and commands agree on one definition.
//! - JSON field names are fixed with serde attributes, not by convention.
//!
//! ## Files
//! - `models.rs`: validation outcome, command reports, JSON envelopes, config.
//! - `constants.rs`: log targets, defaults, template names.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! `ValidationOutcome` and the `--json` envelopes are checked against
//! `docs/contracts/*` in `tests/contracts_check.rs`.

pub mod constants;
pub mod models;
