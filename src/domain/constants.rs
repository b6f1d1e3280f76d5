/// Log target used while reading documents from disk or the network.
pub const LOADER_TARGET: &str = "file-system-document-loader";
pub const VALIDATE_TARGET: &str = "calm-validate";
pub const GENERATE_TARGET: &str = "calm-generate";
pub const DOCIFY_TARGET: &str = "calm-docify";

pub const JSON_SCHEMA_CODE: &str = "json-schema";

pub const DEFAULT_GENERATE_OUTPUT: &str = "architecture.json";
pub const CONFIG_ENV: &str = "CALM_CONFIG";
pub const LOG_ENV: &str = "CALM_LOG";

/// Remote fetches give up after this many milliseconds.
pub const REMOTE_TIMEOUT_MS: u64 = 3000;

/// Nesting limit while following `$ref` chains during generation.
pub const MAX_REF_DEPTH: usize = 64;

pub const TEMPLATE_INDEX: &str = "index.md.hbs";
pub const TEMPLATE_NODE: &str = "node.md.hbs";
pub const TEMPLATE_RELATIONSHIP: &str = "relationship.md.hbs";
pub const TEMPLATE_FLOW: &str = "flow.md.hbs";
