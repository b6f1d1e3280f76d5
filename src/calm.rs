use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Architecture {
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    #[serde(rename = "unique-id")]
    pub unique_id: String,
    #[serde(rename = "node-type", default)]
    pub node_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub controls: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Interface {
    #[serde(rename = "unique-id")]
    pub unique_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Relationship {
    #[serde(rename = "unique-id")]
    pub unique_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "relationship-type", default)]
    pub relationship_type: Value,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub controls: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct NodeInterface {
    pub node: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    Connects {
        source: NodeInterface,
        destination: NodeInterface,
    },
    Interacts {
        actor: String,
        nodes: Vec<String>,
    },
    ComposedOf {
        container: String,
        nodes: Vec<String>,
    },
    DeployedIn {
        container: String,
        nodes: Vec<String>,
    },
    #[serde(skip)]
    Other(Value),
}

impl RelationshipType {
    pub fn kind(&self) -> &'static str {
        match self {
            RelationshipType::Connects { .. } => "connects",
            RelationshipType::Interacts { .. } => "interacts",
            RelationshipType::ComposedOf { .. } => "composed-of",
            RelationshipType::DeployedIn { .. } => "deployed-in",
            RelationshipType::Other(_) => "other",
        }
    }

    /// Node ids this relationship points at, in declaration order.
    pub fn referenced_nodes(&self) -> Vec<&str> {
        match self {
            RelationshipType::Connects {
                source,
                destination,
            } => vec![source.node.as_str(), destination.node.as_str()],
            RelationshipType::Interacts { actor, nodes } => std::iter::once(actor.as_str())
                .chain(nodes.iter().map(String::as_str))
                .collect(),
            RelationshipType::ComposedOf { container, nodes }
            | RelationshipType::DeployedIn { container, nodes } => {
                std::iter::once(container.as_str())
                    .chain(nodes.iter().map(String::as_str))
                    .collect()
            }
            RelationshipType::Other(_) => vec![],
        }
    }
}

impl Relationship {
    pub fn kind(&self) -> RelationshipType {
        serde_json::from_value(self.relationship_type.clone())
            .unwrap_or_else(|_| RelationshipType::Other(self.relationship_type.clone()))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Flow {
    #[serde(rename = "unique-id")]
    pub unique_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Transition {
    #[serde(rename = "relationship-unique-id")]
    pub relationship_unique_id: String,
    #[serde(rename = "sequence-number", default)]
    pub sequence_number: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CalmError {
    #[error("{0}")]
    MissingInput(String),
    #[error("failed to load {location}: {reason}")]
    DocumentLoad { location: String, reason: String },
    #[error("failed to parse {location}: {reason}")]
    DocumentParse { location: String, reason: String },
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
    #[error("schema {location} failed to compile: {reason}")]
    SchemaCompile { location: String, reason: String },
    #[error("reference chain too deep while resolving {0}")]
    ReferenceCycle(String),
    #[error("output directory is not empty: {0} (pass --clear-output-directory to replace it)")]
    OutputNotEmpty(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("invalid config {path}: {reason}")]
    Config { path: String, reason: String },
}

impl CalmError {
    pub fn code(&self) -> &'static str {
        match self {
            CalmError::MissingInput(_) => "MISSING_INPUT",
            CalmError::DocumentLoad { .. } => "DOCUMENT_LOAD",
            CalmError::DocumentParse { .. } => "DOCUMENT_PARSE",
            CalmError::SchemaNotFound(_) => "SCHEMA_NOT_FOUND",
            CalmError::SchemaCompile { .. } => "SCHEMA_COMPILE",
            CalmError::ReferenceCycle(_) => "REFERENCE_CYCLE",
            CalmError::OutputNotEmpty(_) => "OUTPUT_NOT_EMPTY",
            CalmError::Template(_) => "TEMPLATE",
            CalmError::Config { .. } => "CONFIG",
        }
    }
}

impl Architecture {
    pub fn from_value(source: &str, value: &Value) -> Result<Self, CalmError> {
        serde_json::from_value(value.clone()).map_err(|e| CalmError::DocumentParse {
            location: source.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.unique_id == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.unique_id == id)
    }

    pub fn relationships_for_node<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.kind().referenced_nodes().contains(&id))
    }
}

pub fn is_string_placeholder(s: &str) -> bool {
    let t = s.trim();
    match t.strip_prefix("[[").and_then(|r| r.strip_suffix("]]")) {
        Some(inner) => {
            let inner = inner.trim();
            !inner.is_empty()
                && inner
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    }
}

pub fn is_numeric_placeholder(v: &Value) -> bool {
    v.as_i64() == Some(-1) || v.as_f64() == Some(-1.0)
}

/// `unique-id` becomes `[[ UNIQUE_ID ]]`.
pub fn placeholder_for(name: &str) -> String {
    let mut token = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            token.push(c.to_ascii_uppercase());
        } else if !token.ends_with('_') {
            token.push('_');
        }
    }
    let token = token.trim_matches('_');
    let token = if token.is_empty() { "VALUE" } else { token };
    format!("[[ {} ]]", token)
}

pub fn count_placeholders(value: &Value) -> usize {
    match value {
        Value::String(s) if is_string_placeholder(s) => 1,
        Value::Number(_) if is_numeric_placeholder(value) => 1,
        Value::Array(items) => items.iter().map(count_placeholders).sum(),
        Value::Object(map) => map.values().map(count_placeholders).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "nodes": [
                {"unique-id": "web", "node-type": "webclient", "name": "Web", "description": "UI",
                 "interfaces": [{"unique-id": "web-http", "url": "https://x"}]},
                {"unique-id": "api", "node-type": "service", "name": "API", "description": "Backend"},
                {"unique-id": "dev", "node-type": "actor", "name": "Dev", "description": "Person"}
            ],
            "relationships": [
                {"unique-id": "web-api", "relationship-type": {"connects": {
                    "source": {"node": "web", "interfaces": ["web-http"]},
                    "destination": {"node": "api"}}}},
                {"unique-id": "dev-web", "relationship-type": {"interacts": {"actor": "dev", "nodes": ["web"]}}},
                {"unique-id": "odd", "relationship-type": {"options": []}}
            ]
        })
    }

    #[test]
    fn relationship_kinds_parse() {
        let arch = Architecture::from_value("mem", &sample()).unwrap();
        assert_eq!(arch.relationships[0].kind().kind(), "connects");
        assert_eq!(arch.relationships[1].kind().kind(), "interacts");
        assert_eq!(arch.relationships[2].kind().kind(), "other");
        assert_eq!(
            arch.relationships[1].kind().referenced_nodes(),
            vec!["dev", "web"]
        );
    }

    #[test]
    fn relationships_for_node_follow_references() {
        let arch = Architecture::from_value("mem", &sample()).unwrap();
        let ids: Vec<_> = arch
            .relationships_for_node("web")
            .map(|r| r.unique_id.as_str())
            .collect();
        assert_eq!(ids, vec!["web-api", "dev-web"]);
        assert_eq!(arch.relationships_for_node("api").count(), 1);
    }

    #[test]
    fn node_without_unique_id_is_a_parse_error() {
        let err = Architecture::from_value("bad.json", &json!({"nodes": [{"name": "x"}]}))
            .unwrap_err();
        assert_eq!(err.code(), "DOCUMENT_PARSE");
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn placeholders_round_through_helpers() {
        assert_eq!(placeholder_for("unique-id"), "[[ UNIQUE_ID ]]");
        assert_eq!(placeholder_for("--"), "[[ VALUE ]]");
        assert!(is_string_placeholder("[[ NODE_TYPE ]]"));
        assert!(is_string_placeholder("[[PORT]]"));
        assert!(!is_string_placeholder("[[ lower ]]"));
        assert!(!is_string_placeholder("api"));
        assert!(is_numeric_placeholder(&json!(-1)));
        assert!(!is_numeric_placeholder(&json!(1)));
        let v = json!({"a": "[[ A ]]", "b": [-1, 2, {"c": "[[ C ]]"}]});
        assert_eq!(count_placeholders(&v), 3);
    }
}
