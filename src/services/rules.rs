//! Built-in lint rules reported as `spectralSchemaValidationOutputs`.
//!
//! Rules work on the raw `serde_json::Value` rather than the typed model so
//! that documents which fail schema validation can still be linted.

use crate::calm::{is_numeric_placeholder, is_string_placeholder};
use crate::domain::models::{Severity, ValidationOutput};
use crate::domain::constants::VALIDATE_TARGET;
use crate::services::source_map::{escape_pointer_token, SourceMap};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// A problem found by a rule, located by JSON pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub path: String,
    pub message: String,
}

impl Finding {
    fn new(path: String, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

pub struct Rule {
    pub code: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    check: fn(&Value) -> Vec<Finding>,
}

impl Rule {
    pub fn check(&self, doc: &Value) -> Vec<Finding> {
        (self.check)(doc)
    }
}

pub fn architecture_rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "architecture-has-nodes-relationships",
            severity: Severity::Error,
            description: "Architecture must declare nodes and relationships arrays",
            check: has_nodes_relationships,
        },
        Rule {
            code: "architecture-has-no-empty-properties",
            severity: Severity::Error,
            description: "Properties must not be empty strings, objects or arrays",
            check: no_empty_properties,
        },
        Rule {
            code: "architecture-has-no-placeholder-properties-string",
            severity: Severity::Error,
            description: "String placeholders left by generate must be replaced",
            check: no_string_placeholders,
        },
        Rule {
            code: "architecture-has-no-placeholder-properties-numerical",
            severity: Severity::Error,
            description: "Numerical placeholders (-1) left by generate must be replaced",
            check: no_numeric_placeholders,
        },
        Rule {
            code: "unique-ids-must-be-unique-in-architecture",
            severity: Severity::Error,
            description: "unique-id values must not repeat across the document",
            check: unique_ids_in_architecture,
        },
        Rule {
            code: "connects-relationship-references-existing-nodes-in-architecture",
            severity: Severity::Error,
            description: "connects source and destination must name existing nodes",
            check: connects_references_nodes,
        },
        Rule {
            code: "interacts-relationship-references-existing-nodes-in-architecture",
            severity: Severity::Error,
            description: "interacts actor and nodes must name existing nodes",
            check: interacts_references_nodes,
        },
        Rule {
            code: "composition-relationships-reference-existing-nodes-in-architecture",
            severity: Severity::Error,
            description: "composed-of container and nodes must name existing nodes",
            check: composed_of_references_nodes,
        },
        Rule {
            code: "deployed-in-relationships-reference-existing-nodes-in-architecture",
            severity: Severity::Error,
            description: "deployed-in container and nodes must name existing nodes",
            check: deployed_in_references_nodes,
        },
        Rule {
            code: "referenced-interfaces-defined-in-architecture",
            severity: Severity::Error,
            description: "Interfaces used by connects must be defined on their node",
            check: interfaces_defined,
        },
        Rule {
            code: "flow-transitions-reference-existing-relationships",
            severity: Severity::Error,
            description: "Flow transitions must name existing relationships",
            check: transitions_reference_relationships,
        },
        Rule {
            code: "flow-transitions-have-unique-sequence-numbers",
            severity: Severity::Warning,
            description: "Sequence numbers should not repeat within a flow",
            check: transitions_unique_sequence,
        },
        Rule {
            code: "architecture-nodes-must-be-referenced",
            severity: Severity::Warning,
            description: "Every node should take part in at least one relationship",
            check: nodes_referenced,
        },
    ]
}

pub fn pattern_rules() -> Vec<Rule> {
    vec![
        Rule {
            code: "pattern-has-no-empty-properties",
            severity: Severity::Error,
            description: "Properties must not be empty strings, objects or arrays",
            check: pattern_no_empty_properties,
        },
        Rule {
            code: "pattern-unique-ids-must-be-unique",
            severity: Severity::Error,
            description: "const unique-id values must not repeat",
            check: pattern_unique_ids,
        },
        Rule {
            code: "pattern-relationships-reference-existing-nodes",
            severity: Severity::Error,
            description: "const node references must name nodes declared by the pattern",
            check: pattern_relationships_reference_nodes,
        },
        Rule {
            code: "pattern-nodes-must-be-referenced",
            severity: Severity::Warning,
            description: "Every node declared by the pattern should be referenced by a relationship",
            check: pattern_nodes_referenced,
        },
    ]
}

/// Runs `rules` over `doc`, attaching positions from `map`.
pub fn run_rules(rules: &[Rule], doc: &Value, map: &SourceMap) -> Vec<ValidationOutput> {
    let mut out = Vec::new();
    for rule in rules {
        trace!(target: VALIDATE_TARGET, "Running rule {} ({})", rule.code, rule.description);
        for finding in rule.check(doc) {
            let mut output =
                ValidationOutput::new(rule.code, rule.severity, finding.message, finding.path, "");
            if let Some(range) = map.locate(&output.path) {
                output = output.with_range(range);
            }
            out.push(output);
        }
    }
    out
}

fn items<'a>(doc: &'a Value, key: &str) -> impl Iterator<Item = (usize, &'a Value)> {
    doc.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flat_map(|a| a.iter().enumerate())
}

fn unique_id(v: &Value) -> Option<&str> {
    v.get("unique-id").and_then(Value::as_str)
}

fn node_ids(doc: &Value) -> HashSet<&str> {
    items(doc, "nodes").filter_map(|(_, n)| unique_id(n)).collect()
}

fn has_nodes_relationships(doc: &Value) -> Vec<Finding> {
    ["nodes", "relationships"]
        .iter()
        .filter(|k| !doc.get(**k).map(Value::is_array).unwrap_or(false))
        .map(|k| {
            Finding::new(
                String::new(),
                format!("Architecture must declare a '{}' array.", k),
            )
        })
        .collect()
}

fn walk<'a, F>(v: &'a Value, path: &str, visit: &mut F)
where
    F: FnMut(&str, &'a Value),
{
    visit(path, v);
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                walk(child, &format!("{}/{}", path, escape_pointer_token(k)), visit);
            }
        }
        Value::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                walk(child, &format!("{}/{}", path, i), visit);
            }
        }
        _ => {}
    }
}

fn empty_properties(doc: &Value, skip_keys: &[&str]) -> Vec<Finding> {
    let mut out = Vec::new();
    walk(doc, "", &mut |path, v| {
        if path.is_empty() {
            return;
        }
        let key = path.rsplit('/').next().unwrap_or_default();
        if skip_keys.contains(&key) {
            return;
        }
        let empty = match v {
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(m) => m.is_empty(),
            _ => false,
        };
        if empty {
            out.push(Finding::new(path.to_string(), "Property must not be empty."));
        }
    });
    out
}

fn no_empty_properties(doc: &Value) -> Vec<Finding> {
    empty_properties(doc, &[])
}

fn no_string_placeholders(doc: &Value) -> Vec<Finding> {
    let mut out = Vec::new();
    walk(doc, "", &mut |path, v| {
        if let Value::String(s) = v {
            if is_string_placeholder(s) {
                out.push(Finding::new(
                    path.to_string(),
                    format!("String placeholder {} detected in architecture.", s.trim()),
                ));
            }
        }
    });
    out
}

fn no_numeric_placeholders(doc: &Value) -> Vec<Finding> {
    let mut out = Vec::new();
    walk(doc, "", &mut |path, v| {
        if v.is_number() && is_numeric_placeholder(v) {
            out.push(Finding::new(
                path.to_string(),
                "Numerical placeholder (-1) detected in architecture.",
            ));
        }
    });
    out
}

fn unique_ids_in_architecture(doc: &Value) -> Vec<Finding> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut out = Vec::new();
    let mut note = |id: &str, path: String| {
        let count = seen.entry(id.to_string()).or_insert(0);
        *count += 1;
        if *count > 1 {
            out.push(Finding::new(
                path,
                format!("Unique ID '{}' is used more than once in the document.", id),
            ));
        }
    };
    for (i, node) in items(doc, "nodes") {
        if let Some(id) = unique_id(node) {
            note(id, format!("/nodes/{}/unique-id", i));
        }
        for (j, iface) in items(node, "interfaces") {
            if let Some(id) = unique_id(iface) {
                note(id, format!("/nodes/{}/interfaces/{}/unique-id", i, j));
            }
        }
    }
    for key in ["relationships", "flows"] {
        for (i, item) in items(doc, key) {
            if let Some(id) = unique_id(item) {
                note(id, format!("/{}/{}/unique-id", key, i));
            }
        }
    }
    out
}

fn unknown_node(id: &str) -> String {
    format!("'{}' does not refer to the unique-id of an existing node.", id)
}

/// Checks `actor`/`container`-style single references plus a `nodes` list
/// under `relationship-type.<kind>`.
fn membership_references(doc: &Value, kind: &str, single: &str) -> Vec<Finding> {
    let nodes = node_ids(doc);
    let mut out = Vec::new();
    for (i, rel) in items(doc, "relationships") {
        let Some(body) = rel.get("relationship-type").and_then(|t| t.get(kind)) else {
            continue;
        };
        let base = format!("/relationships/{}/relationship-type/{}", i, kind);
        if let Some(id) = body.get(single).and_then(Value::as_str) {
            if !nodes.contains(id) {
                out.push(Finding::new(format!("{}/{}", base, single), unknown_node(id)));
            }
        }
        for (j, member) in items(body, "nodes") {
            if let Some(id) = member.as_str() {
                if !nodes.contains(id) {
                    out.push(Finding::new(format!("{}/nodes/{}", base, j), unknown_node(id)));
                }
            }
        }
    }
    out
}

fn connects_references_nodes(doc: &Value) -> Vec<Finding> {
    let nodes = node_ids(doc);
    let mut out = Vec::new();
    for (i, rel) in items(doc, "relationships") {
        let Some(connects) = rel.get("relationship-type").and_then(|t| t.get("connects")) else {
            continue;
        };
        for end in ["source", "destination"] {
            if let Some(id) = connects
                .get(end)
                .and_then(|e| e.get("node"))
                .and_then(Value::as_str)
            {
                if !nodes.contains(id) {
                    out.push(Finding::new(
                        format!(
                            "/relationships/{}/relationship-type/connects/{}/node",
                            i, end
                        ),
                        unknown_node(id),
                    ));
                }
            }
        }
    }
    out
}

fn interacts_references_nodes(doc: &Value) -> Vec<Finding> {
    membership_references(doc, "interacts", "actor")
}

fn composed_of_references_nodes(doc: &Value) -> Vec<Finding> {
    membership_references(doc, "composed-of", "container")
}

fn deployed_in_references_nodes(doc: &Value) -> Vec<Finding> {
    membership_references(doc, "deployed-in", "container")
}

fn interfaces_defined(doc: &Value) -> Vec<Finding> {
    let mut interfaces: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for (_, node) in items(doc, "nodes") {
        if let Some(id) = unique_id(node) {
            let set = interfaces.entry(id).or_default();
            set.extend(items(node, "interfaces").filter_map(|(_, i)| unique_id(i)));
        }
    }
    let mut out = Vec::new();
    for (i, rel) in items(doc, "relationships") {
        let Some(connects) = rel.get("relationship-type").and_then(|t| t.get("connects")) else {
            continue;
        };
        for end in ["source", "destination"] {
            let Some(side) = connects.get(end) else {
                continue;
            };
            let Some(node) = side.get("node").and_then(Value::as_str) else {
                continue;
            };
            // Unknown nodes are reported by the connects rule.
            let Some(defined) = interfaces.get(node) else {
                continue;
            };
            for (j, iface) in items(side, "interfaces") {
                if let Some(iface) = iface.as_str() {
                    if !defined.contains(iface) {
                        out.push(Finding::new(
                            format!(
                                "/relationships/{}/relationship-type/connects/{}/interfaces/{}",
                                i, end, j
                            ),
                            format!(
                                "'{}' does not refer to the unique-id of an existing interface on node '{}'.",
                                iface, node
                            ),
                        ));
                    }
                }
            }
        }
    }
    out
}

fn transitions_reference_relationships(doc: &Value) -> Vec<Finding> {
    let relationships: HashSet<&str> = items(doc, "relationships")
        .filter_map(|(_, r)| unique_id(r))
        .collect();
    let mut out = Vec::new();
    for (i, flow) in items(doc, "flows") {
        for (j, t) in items(flow, "transitions") {
            if let Some(id) = t.get("relationship-unique-id").and_then(Value::as_str) {
                if !relationships.contains(id) {
                    out.push(Finding::new(
                        format!("/flows/{}/transitions/{}/relationship-unique-id", i, j),
                        format!(
                            "'{}' does not refer to the unique-id of an existing relationship.",
                            id
                        ),
                    ));
                }
            }
        }
    }
    out
}

fn transitions_unique_sequence(doc: &Value) -> Vec<Finding> {
    let mut out = Vec::new();
    for (i, flow) in items(doc, "flows") {
        let mut seen = HashSet::new();
        for (j, t) in items(flow, "transitions") {
            if let Some(n) = t.get("sequence-number").and_then(Value::as_i64) {
                if !seen.insert(n) {
                    out.push(Finding::new(
                        format!("/flows/{}/transitions/{}/sequence-number", i, j),
                        format!("Sequence number {} is used more than once in this flow.", n),
                    ));
                }
            }
        }
    }
    out
}

fn referenced_node_ids(doc: &Value) -> HashSet<&str> {
    let mut referenced = HashSet::new();
    for (_, rel) in items(doc, "relationships") {
        let Some(kind) = rel.get("relationship-type").and_then(Value::as_object) else {
            continue;
        };
        for body in kind.values() {
            for end in ["source", "destination"] {
                if let Some(id) = body
                    .get(end)
                    .and_then(|e| e.get("node"))
                    .and_then(Value::as_str)
                {
                    referenced.insert(id);
                }
            }
            for single in ["actor", "container"] {
                if let Some(id) = body.get(single).and_then(Value::as_str) {
                    referenced.insert(id);
                }
            }
            referenced.extend(items(body, "nodes").filter_map(|(_, n)| n.as_str()));
        }
    }
    referenced
}

fn nodes_referenced(doc: &Value) -> Vec<Finding> {
    let referenced = referenced_node_ids(doc);
    items(doc, "nodes")
        .filter_map(|(i, node)| {
            let id = unique_id(node)?;
            (!referenced.contains(id)).then(|| {
                Finding::new(
                    format!("/nodes/{}/unique-id", i),
                    format!("Node with ID '{}' is not referenced by any relationships.", id),
                )
            })
        })
        .collect()
}

// Pattern rules read the `const` values a pattern pins inside
// `properties.<collection>.prefixItems[*]`.

fn pattern_items<'a>(
    pattern: &'a Value,
    collection: &str,
) -> impl Iterator<Item = (usize, &'a Value)> {
    pattern
        .get("properties")
        .and_then(|p| p.get(collection))
        .and_then(|c| c.get("prefixItems"))
        .and_then(Value::as_array)
        .into_iter()
        .flat_map(|a| a.iter().enumerate())
}

fn const_unique_id(item: &Value) -> Option<&str> {
    item.get("properties")
        .and_then(|p| p.get("unique-id"))
        .and_then(|u| u.get("const"))
        .and_then(Value::as_str)
}

fn pattern_node_ids(pattern: &Value) -> HashSet<&str> {
    pattern_items(pattern, "nodes")
        .filter_map(|(_, n)| const_unique_id(n))
        .collect()
}

/// Node references pinned by a relationship item, with their pointers
/// relative to the item. Covers both `const` on the `relationship-type`
/// property and `const` on nested reference properties.
fn pattern_relationship_refs(item: &Value) -> Vec<(String, &str)> {
    let mut refs = Vec::new();
    walk(item, "", &mut |path, v| {
        let tokens: Vec<&str> = path.split('/').collect();
        let Some((key, ancestors)) = tokens.split_last() else {
            return;
        };
        let parent = ancestors.last().copied().unwrap_or_default();
        if ancestors.contains(&"const") {
            // inside a const literal: {"connects": {"source": {"node": "x"}}}
            match (*key, v) {
                ("node" | "actor" | "container", Value::String(s)) => {
                    refs.push((path.to_string(), s.as_str()))
                }
                (_, Value::String(s)) if parent == "nodes" => {
                    refs.push((path.to_string(), s.as_str()))
                }
                _ => {}
            }
        } else if *key == "const" {
            // a const directly on a reference property: .../node/const
            match (parent, v) {
                ("node" | "actor" | "container", Value::String(s)) => {
                    refs.push((path.to_string(), s.as_str()))
                }
                ("nodes", Value::Array(arr)) => {
                    for (i, m) in arr.iter().enumerate() {
                        if let Some(s) = m.as_str() {
                            refs.push((format!("{}/{}", path, i), s));
                        }
                    }
                }
                _ => {}
            }
        }
    });
    refs
}

fn pattern_no_empty_properties(pattern: &Value) -> Vec<Finding> {
    // An empty `required` list is a legitimate schema keyword value.
    empty_properties(pattern, &["required"])
}

fn pattern_unique_ids(pattern: &Value) -> Vec<Finding> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for collection in ["nodes", "relationships"] {
        for (i, item) in pattern_items(pattern, collection) {
            if let Some(id) = const_unique_id(item) {
                if !seen.insert(id) {
                    out.push(Finding::new(
                        format!(
                            "/properties/{}/prefixItems/{}/properties/unique-id/const",
                            collection, i
                        ),
                        format!("Unique ID '{}' is used more than once in the pattern.", id),
                    ));
                }
            }
        }
    }
    out
}

fn pattern_relationships_reference_nodes(pattern: &Value) -> Vec<Finding> {
    let nodes = pattern_node_ids(pattern);
    let mut out = Vec::new();
    for (i, item) in pattern_items(pattern, "relationships") {
        for (rel_path, id) in pattern_relationship_refs(item) {
            if !nodes.contains(id) {
                out.push(Finding::new(
                    format!("/properties/relationships/prefixItems/{}{}", i, rel_path),
                    unknown_node(id),
                ));
            }
        }
    }
    out
}

fn pattern_nodes_referenced(pattern: &Value) -> Vec<Finding> {
    let referenced: HashSet<&str> = pattern_items(pattern, "relationships")
        .flat_map(|(_, item)| pattern_relationship_refs(item))
        .map(|(_, id)| id)
        .collect();
    pattern_items(pattern, "nodes")
        .filter_map(|(i, item)| {
            let id = const_unique_id(item)?;
            (!referenced.contains(id)).then(|| {
                Finding::new(
                    format!(
                        "/properties/nodes/prefixItems/{}/properties/unique-id/const",
                        i
                    ),
                    format!("Node with ID '{}' is not referenced by any relationships.", id),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn architecture() -> Value {
        json!({
            "nodes": [
                {"unique-id": "web", "node-type": "webclient", "name": "Web", "description": "UI",
                 "interfaces": [{"unique-id": "web-http"}]},
                {"unique-id": "api", "node-type": "service", "name": "API", "description": "Backend"},
                {"unique-id": "audit", "node-type": "database", "name": "Audit", "description": "Log"}
            ],
            "relationships": [
                {"unique-id": "web-api", "relationship-type": {"connects": {
                    "source": {"node": "web", "interfaces": ["web-http"]},
                    "destination": {"node": "api"}}}}
            ],
            "flows": [
                {"unique-id": "login", "name": "Login", "transitions": [
                    {"relationship-unique-id": "web-api", "sequence-number": 1}
                ]}
            ]
        })
    }

    fn findings(code: &str, doc: &Value) -> Vec<Finding> {
        architecture_rules()
            .into_iter()
            .chain(pattern_rules())
            .find(|r| r.code == code)
            .expect("rule exists")
            .check(doc)
    }

    #[test]
    fn clean_architecture_only_warns_about_unreferenced_node() {
        let doc = architecture();
        let outputs = run_rules(&architecture_rules(), &doc, &SourceMap::default());
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].code, "architecture-nodes-must-be-referenced");
        assert_eq!(outputs[0].severity, Severity::Warning);
        assert_eq!(outputs[0].path, "/nodes/2/unique-id");
        assert_eq!(
            outputs[0].message,
            "Node with ID 'audit' is not referenced by any relationships."
        );
    }

    #[test]
    fn positions_come_from_source_map() {
        let doc = architecture();
        let text = serde_json::to_string_pretty(&doc).unwrap();
        let map = SourceMap::parse(&text);
        let outputs = run_rules(&architecture_rules(), &doc, &map);
        assert!(outputs[0].line_start.is_some());
        assert_eq!(outputs[0].line_start, outputs[0].line_end);
    }

    #[test]
    fn missing_collections_are_errors() {
        let f = findings("architecture-has-nodes-relationships", &json!({"nodes": []}));
        assert_eq!(f.len(), 1);
        assert!(f[0].message.contains("relationships"));
    }

    #[test]
    fn empty_values_are_flagged() {
        let doc = json!({"nodes": [{"unique-id": "a", "description": " ", "details": {}}]});
        let paths: Vec<_> = findings("architecture-has-no-empty-properties", &doc)
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(paths, vec!["/nodes/0/description", "/nodes/0/details"]);
    }

    #[test]
    fn placeholders_are_flagged() {
        let doc = json!({"nodes": [{"unique-id": "[[ UNIQUE_ID ]]", "port": -1, "ok": 3}]});
        let s = findings("architecture-has-no-placeholder-properties-string", &doc);
        assert_eq!(s[0].path, "/nodes/0/unique-id");
        let n = findings("architecture-has-no-placeholder-properties-numerical", &doc);
        assert_eq!(n.len(), 1);
        assert_eq!(n[0].path, "/nodes/0/port");
    }

    #[test]
    fn duplicate_ids_across_collections_are_flagged_once_per_repeat() {
        let doc = json!({
            "nodes": [{"unique-id": "x"}, {"unique-id": "x", "interfaces": [{"unique-id": "x"}]}],
            "relationships": [{"unique-id": "y"}]
        });
        let f = findings("unique-ids-must-be-unique-in-architecture", &doc);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].path, "/nodes/1/unique-id");
        assert_eq!(f[1].path, "/nodes/1/interfaces/0/unique-id");
    }

    #[test]
    fn dangling_relationship_references_are_errors() {
        let doc = json!({
            "nodes": [{"unique-id": "a"}],
            "relationships": [
                {"unique-id": "r1", "relationship-type": {"connects": {
                    "source": {"node": "a"}, "destination": {"node": "ghost"}}}},
                {"unique-id": "r2", "relationship-type": {"interacts": {"actor": "nobody", "nodes": ["a"]}}},
                {"unique-id": "r3", "relationship-type": {"composed-of": {"container": "a", "nodes": ["b"]}}},
                {"unique-id": "r4", "relationship-type": {"deployed-in": {"container": "k8s", "nodes": ["a"]}}}
            ]
        });
        let c = findings("connects-relationship-references-existing-nodes-in-architecture", &doc);
        assert_eq!(
            c[0].path,
            "/relationships/0/relationship-type/connects/destination/node"
        );
        assert_eq!(
            c[0].message,
            "'ghost' does not refer to the unique-id of an existing node."
        );
        let i = findings("interacts-relationship-references-existing-nodes-in-architecture", &doc);
        assert_eq!(i[0].path, "/relationships/1/relationship-type/interacts/actor");
        let comp = findings("composition-relationships-reference-existing-nodes-in-architecture", &doc);
        assert_eq!(comp[0].path, "/relationships/2/relationship-type/composed-of/nodes/0");
        let dep = findings("deployed-in-relationships-reference-existing-nodes-in-architecture", &doc);
        assert_eq!(dep[0].path, "/relationships/3/relationship-type/deployed-in/container");
    }

    #[test]
    fn undefined_interfaces_are_errors() {
        let mut doc = architecture();
        doc["relationships"][0]["relationship-type"]["connects"]["source"]["interfaces"] =
            json!(["web-http", "web-grpc"]);
        let f = findings("referenced-interfaces-defined-in-architecture", &doc);
        assert_eq!(f.len(), 1);
        assert!(f[0].path.ends_with("/source/interfaces/1"));
        assert!(f[0].message.contains("web-grpc"));
    }

    #[test]
    fn flow_checks_cover_relationships_and_sequence() {
        let mut doc = architecture();
        doc["flows"][0]["transitions"] = json!([
            {"relationship-unique-id": "web-api", "sequence-number": 1},
            {"relationship-unique-id": "missing", "sequence-number": 1}
        ]);
        let r = findings("flow-transitions-reference-existing-relationships", &doc);
        assert_eq!(r[0].path, "/flows/0/transitions/1/relationship-unique-id");
        let s = findings("flow-transitions-have-unique-sequence-numbers", &doc);
        assert_eq!(s[0].path, "/flows/0/transitions/1/sequence-number");
    }

    fn pattern() -> Value {
        json!({
            "type": "object",
            "required": ["nodes", "relationships"],
            "properties": {
                "nodes": {"type": "array", "prefixItems": [
                    {"properties": {"unique-id": {"const": "web"}}},
                    {"properties": {"unique-id": {"const": "api"}}},
                    {"properties": {"unique-id": {"const": "lonely"}}}
                ]},
                "relationships": {"type": "array", "prefixItems": [
                    {"properties": {
                        "unique-id": {"const": "web-api"},
                        "relationship-type": {"const": {"connects": {
                            "source": {"node": "web"}, "destination": {"node": "api"}}}}
                    }},
                    {"properties": {
                        "unique-id": {"const": "dev-web"},
                        "relationship-type": {"properties": {"interacts": {"properties": {
                            "actor": {"const": "dev"},
                            "nodes": {"const": ["web"]}
                        }}}}
                    }}
                ]}
            }
        })
    }

    #[test]
    fn pattern_references_are_checked_in_both_const_styles() {
        let f = findings("pattern-relationships-reference-existing-nodes", &pattern());
        assert_eq!(f.len(), 1);
        assert!(f[0].message.contains("'dev'"));
        assert!(f[0].path.starts_with("/properties/relationships/prefixItems/1/"));
        assert!(f[0].path.ends_with("/actor/const"));
    }

    #[test]
    fn pattern_unreferenced_nodes_warn() {
        let f = findings("pattern-nodes-must-be-referenced", &pattern());
        assert_eq!(f.len(), 1);
        assert_eq!(
            f[0].path,
            "/properties/nodes/prefixItems/2/properties/unique-id/const"
        );
    }

    #[test]
    fn pattern_duplicate_ids_and_empty_values() {
        let mut p = pattern();
        p["properties"]["nodes"]["prefixItems"][1]["properties"]["unique-id"]["const"] =
            json!("web");
        p["properties"]["nodes"]["description"] = json!("");
        p["required"] = json!([]);
        let dup = findings("pattern-unique-ids-must-be-unique", &p);
        assert_eq!(dup.len(), 1);
        let empty = findings("pattern-has-no-empty-properties", &p);
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].path, "/properties/nodes/description");
    }
}
