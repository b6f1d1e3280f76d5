//! Renders an architecture as a small Markdown site.

use crate::calm::{Architecture, CalmError, Node, Relationship, RelationshipType};
use crate::domain::constants::{
    DOCIFY_TARGET, TEMPLATE_FLOW, TEMPLATE_INDEX, TEMPLATE_NODE, TEMPLATE_RELATIONSHIP,
};
use crate::domain::models::DocifyReport;
use crate::services::loader::DocumentLoader;
use crate::services::storage::{prepare_output_dir, write_text};
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

const INDEX_TEMPLATE: &str = r#"# {{title}}
{{#if description}}

{{description}}
{{/if}}

| Nodes | Relationships | Flows |
|---|---|---|
| {{node_count}} | {{relationship_count}} | {{flow_count}} |

```mermaid
{{mermaid}}
```

## Nodes

{{#each nodes}}
- [{{name}}]({{link}}) `{{unique_id}}`
{{/each}}

## Relationships

{{#each relationships}}
- [{{name}}]({{link}})
{{/each}}
{{#if flows}}

## Flows

{{#each flows}}
- [{{name}}]({{link}})
{{/each}}
{{/if}}
"#;

const NODE_TEMPLATE: &str = r#"# {{name}}

| Field | Value |
|---|---|
| Unique ID | `{{unique_id}}` |
| Node type | {{node_type}} |

{{description}}
{{#if interfaces}}

## Interfaces

{{#each interfaces}}
- `{{this}}`
{{/each}}
{{/if}}
{{#if relationships}}

## Relationships

{{#each relationships}}
- [{{name}}]({{link}})
{{/each}}
{{/if}}
{{#each sections}}

## {{title}}

```json
{{body}}
```
{{/each}}
"#;

const RELATIONSHIP_TEMPLATE: &str = r#"# {{unique_id}}

| Field | Value |
|---|---|
| Kind | {{kind}} |
{{#if protocol}}
| Protocol | {{protocol}} |
{{/if}}
{{#if description}}

{{description}}
{{/if}}

## Participants

{{#each participants}}
- {{role}}: [{{name}}]({{link}}) `{{node}}`{{#if interfaces}} via {{#each interfaces}}`{{this}}`{{#unless @last}}, {{/unless}}{{/each}}{{/if}}
{{/each}}
"#;

const FLOW_TEMPLATE: &str = r#"# {{name}}

`{{unique_id}}`
{{#if description}}

{{description}}
{{/if}}

| # | Relationship | Direction | Description |
|---|---|---|---|
{{#each transitions}}
| {{sequence_number}} | [{{relationship}}]({{link}}) | {{direction}} | {{description}} |
{{/each}}
"#;

#[derive(Serialize)]
struct PageLink {
    unique_id: String,
    name: String,
    link: String,
}

#[derive(Serialize)]
struct IndexContext {
    title: String,
    description: Option<String>,
    node_count: usize,
    relationship_count: usize,
    flow_count: usize,
    mermaid: String,
    nodes: Vec<PageLink>,
    relationships: Vec<PageLink>,
    flows: Vec<PageLink>,
}

#[derive(Serialize)]
struct Section {
    title: &'static str,
    body: String,
}

#[derive(Serialize)]
struct NodeContext {
    unique_id: String,
    name: String,
    node_type: String,
    description: String,
    interfaces: Vec<String>,
    relationships: Vec<PageLink>,
    sections: Vec<Section>,
}

#[derive(Serialize)]
struct Participant {
    role: &'static str,
    node: String,
    name: String,
    link: String,
    interfaces: Vec<String>,
}

#[derive(Serialize)]
struct RelationshipContext {
    unique_id: String,
    kind: String,
    protocol: Option<String>,
    description: Option<String>,
    participants: Vec<Participant>,
}

#[derive(Serialize)]
struct TransitionContext {
    sequence_number: i64,
    relationship: String,
    link: String,
    direction: String,
    description: String,
}

#[derive(Serialize)]
struct FlowContext {
    unique_id: String,
    name: String,
    description: Option<String>,
    transitions: Vec<TransitionContext>,
}

/// Lowercases and replaces every run of non-alphanumerics with one `-`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Page slugs for one collection of elements. Ids that slugify alike get
/// `-2`, `-3`, ... suffixes in document order so every element keeps its
/// own page.
#[derive(Debug, Default)]
struct SlugTable {
    by_index: Vec<String>,
    by_id: HashMap<String, String>,
}

impl SlugTable {
    fn build<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        let mut used = HashSet::new();
        for id in ids {
            let mut base = slugify(id);
            if base.is_empty() {
                base = "unnamed".to_string();
            }
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{}-{}", base, n);
                n += 1;
            }
            table
                .by_id
                .entry(id.to_string())
                .or_insert_with(|| slug.clone());
            table.by_index.push(slug);
        }
        table
    }

    fn at(&self, index: usize) -> &str {
        &self.by_index[index]
    }

    /// Slug of the first element with `id`; unknown ids fall back to
    /// their plain slug.
    fn of(&self, id: &str) -> String {
        self.by_id.get(id).cloned().unwrap_or_else(|| slugify(id))
    }
}

#[derive(Debug)]
struct SiteSlugs {
    nodes: SlugTable,
    relationships: SlugTable,
    flows: SlugTable,
}

impl SiteSlugs {
    fn new(arch: &Architecture) -> Self {
        Self {
            nodes: SlugTable::build(arch.nodes.iter().map(|n| n.unique_id.as_str())),
            relationships: SlugTable::build(
                arch.relationships.iter().map(|r| r.unique_id.as_str()),
            ),
            flows: SlugTable::build(arch.flows.iter().map(|f| f.unique_id.as_str())),
        }
    }

    fn node_link(&self, prefix: &str, id: &str) -> String {
        format!("{}nodes/{}.md", prefix, self.nodes.of(id))
    }

    fn relationship_link(&self, prefix: &str, id: &str) -> String {
        format!("{}relationships/{}.md", prefix, self.relationships.of(id))
    }
}

fn slug_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let text = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&slugify(text))?;
    Ok(())
}

pub struct SiteRenderer {
    handlebars: Handlebars<'static>,
}

impl SiteRenderer {
    /// Built-in templates, each replaced by `<template_dir>/<name>.md.hbs`
    /// when that file exists.
    pub fn new(template_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("slug", Box::new(slug_helper));

        for (name, builtin) in [
            (TEMPLATE_INDEX, INDEX_TEMPLATE),
            (TEMPLATE_NODE, NODE_TEMPLATE),
            (TEMPLATE_RELATIONSHIP, RELATIONSHIP_TEMPLATE),
            (TEMPLATE_FLOW, FLOW_TEMPLATE),
        ] {
            let custom = template_dir.map(|d| d.join(name)).filter(|p| p.is_file());
            let source = match custom {
                Some(path) => {
                    debug!(target: DOCIFY_TARGET, "Using template {}", path.display());
                    std::fs::read_to_string(&path).map_err(|e| {
                        CalmError::Template(format!("{}: {}", path.display(), e))
                    })?
                }
                None => builtin.to_string(),
            };
            handlebars
                .register_template_string(name, source)
                .map_err(|e| CalmError::Template(format!("{}: {}", name, e)))?;
        }
        Ok(Self { handlebars })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> anyhow::Result<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| CalmError::Template(format!("{}: {}", name, e)).into())
    }

    /// Renders every page, keyed by its path relative to the site root.
    pub fn render_site(&self, arch: &Architecture) -> anyhow::Result<Vec<(String, String)>> {
        let slugs = SiteSlugs::new(arch);
        let mut pages = vec![(
            "index.md".to_string(),
            self.render(TEMPLATE_INDEX, &index_context(arch, &slugs))?,
        )];
        for (i, node) in arch.nodes.iter().enumerate() {
            pages.push((
                format!("nodes/{}.md", slugs.nodes.at(i)),
                self.render(TEMPLATE_NODE, &node_context(arch, &slugs, node))?,
            ));
        }
        for (i, rel) in arch.relationships.iter().enumerate() {
            pages.push((
                format!("relationships/{}.md", slugs.relationships.at(i)),
                self.render(TEMPLATE_RELATIONSHIP, &relationship_context(arch, &slugs, rel))?,
            ));
        }
        for (i, flow) in arch.flows.iter().enumerate() {
            let mut transitions: Vec<_> = flow.transitions.iter().collect();
            transitions.sort_by_key(|t| t.sequence_number);
            let ctx = FlowContext {
                unique_id: flow.unique_id.clone(),
                name: display_name(&flow.name, &flow.unique_id),
                description: flow.description.clone(),
                transitions: transitions
                    .into_iter()
                    .map(|t| TransitionContext {
                        sequence_number: t.sequence_number,
                        relationship: t.relationship_unique_id.clone(),
                        link: slugs.relationship_link("../", &t.relationship_unique_id),
                        direction: t.direction.clone().unwrap_or_else(|| "source-to-destination".to_string()),
                        description: t
                            .description
                            .clone()
                            .or_else(|| {
                                arch.relationship(&t.relationship_unique_id)
                                    .and_then(|r| r.description.clone())
                            })
                            .unwrap_or_default(),
                    })
                    .collect(),
            };
            pages.push((
                format!("flows/{}.md", slugs.flows.at(i)),
                self.render(TEMPLATE_FLOW, &ctx)?,
            ));
        }
        Ok(pages)
    }
}

/// Loads `input` and writes its site under `output`.
pub fn docify(
    loader: &DocumentLoader,
    input: &str,
    output: &Path,
    clear: bool,
    template_dir: Option<&Path>,
) -> anyhow::Result<DocifyReport> {
    let doc = loader.load("architecture", input)?;
    let arch = Architecture::from_value(input, &doc.value)?;
    let renderer = SiteRenderer::new(template_dir)?;
    let pages = renderer.render_site(&arch)?;

    prepare_output_dir(output, clear)?;
    for (rel_path, body) in &pages {
        write_text(&output.join(rel_path), body)?;
    }
    info!(
        target: DOCIFY_TARGET,
        "Wrote {} pages to {}",
        pages.len(),
        output.display()
    );
    Ok(DocifyReport {
        input: input.to_string(),
        output: output.display().to_string(),
        pages: pages.into_iter().map(|(p, _)| p).collect(),
    })
}

fn display_name(name: &str, unique_id: &str) -> String {
    if name.trim().is_empty() {
        unique_id.to_string()
    } else {
        name.to_string()
    }
}

fn index_context(arch: &Architecture, slugs: &SiteSlugs) -> IndexContext {
    IndexContext {
        title: arch.name.clone().unwrap_or_else(|| "Architecture".to_string()),
        description: arch.description.clone(),
        node_count: arch.nodes.len(),
        relationship_count: arch.relationships.len(),
        flow_count: arch.flows.len(),
        mermaid: mermaid(arch, slugs),
        nodes: arch
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| PageLink {
                unique_id: n.unique_id.clone(),
                name: display_name(&n.name, &n.unique_id),
                link: format!("nodes/{}.md", slugs.nodes.at(i)),
            })
            .collect(),
        relationships: arch
            .relationships
            .iter()
            .enumerate()
            .map(|(i, r)| PageLink {
                unique_id: r.unique_id.clone(),
                name: r.unique_id.clone(),
                link: format!("relationships/{}.md", slugs.relationships.at(i)),
            })
            .collect(),
        flows: arch
            .flows
            .iter()
            .enumerate()
            .map(|(i, f)| PageLink {
                unique_id: f.unique_id.clone(),
                name: display_name(&f.name, &f.unique_id),
                link: format!("flows/{}.md", slugs.flows.at(i)),
            })
            .collect(),
    }
}

fn mermaid_id(slug: &str) -> String {
    slug.replace('-', "_")
}

fn mermaid(arch: &Architecture, slugs: &SiteSlugs) -> String {
    let mut lines = vec!["flowchart TD".to_string()];
    for (i, node) in arch.nodes.iter().enumerate() {
        let label = display_name(&node.name, &node.unique_id).replace('"', "'");
        lines.push(format!("    {}[\"{}\"]", mermaid_id(slugs.nodes.at(i)), label));
    }
    for rel in &arch.relationships {
        let kind = rel.kind();
        let referenced = kind.referenced_nodes();
        let Some((first, rest)) = referenced.split_first() else {
            continue;
        };
        for other in rest {
            lines.push(format!(
                "    {} -->|{}| {}",
                mermaid_id(&slugs.nodes.of(first)),
                kind.kind(),
                mermaid_id(&slugs.nodes.of(other))
            ));
        }
    }
    lines.join("\n")
}

fn json_section(title: &'static str, value: &Option<Value>) -> Option<Section> {
    let value = value.as_ref()?;
    let body = serde_json::to_string_pretty(value).ok()?;
    Some(Section { title, body })
}

fn node_context(arch: &Architecture, slugs: &SiteSlugs, node: &Node) -> NodeContext {
    NodeContext {
        unique_id: node.unique_id.clone(),
        name: display_name(&node.name, &node.unique_id),
        node_type: node.node_type.clone(),
        description: node.description.clone(),
        interfaces: node.interfaces.iter().map(|i| i.unique_id.clone()).collect(),
        relationships: arch
            .relationships_for_node(&node.unique_id)
            .map(|r| PageLink {
                unique_id: r.unique_id.clone(),
                name: r.unique_id.clone(),
                link: slugs.relationship_link("../", &r.unique_id),
            })
            .collect(),
        sections: [
            json_section("Details", &node.details),
            json_section("Controls", &node.controls),
            json_section("Metadata", &node.metadata),
        ]
        .into_iter()
        .flatten()
        .collect(),
    }
}

fn participant(
    arch: &Architecture,
    slugs: &SiteSlugs,
    role: &'static str,
    node: &str,
    interfaces: &[String],
) -> Participant {
    Participant {
        role,
        node: node.to_string(),
        name: arch
            .node(node)
            .map(|n| display_name(&n.name, &n.unique_id))
            .unwrap_or_else(|| node.to_string()),
        link: slugs.node_link("../", node),
        interfaces: interfaces.to_vec(),
    }
}

fn relationship_context(
    arch: &Architecture,
    slugs: &SiteSlugs,
    rel: &Relationship,
) -> RelationshipContext {
    let kind = rel.kind();
    let participants = match &kind {
        RelationshipType::Connects {
            source,
            destination,
        } => vec![
            participant(arch, slugs, "source", &source.node, &source.interfaces),
            participant(arch, slugs, "destination", &destination.node, &destination.interfaces),
        ],
        RelationshipType::Interacts { actor, nodes } => {
            std::iter::once(participant(arch, slugs, "actor", actor, &[]))
                .chain(nodes.iter().map(|n| participant(arch, slugs, "node", n, &[])))
                .collect()
        }
        RelationshipType::ComposedOf { container, nodes }
        | RelationshipType::DeployedIn { container, nodes } => {
            std::iter::once(participant(arch, slugs, "container", container, &[]))
                .chain(nodes.iter().map(|n| participant(arch, slugs, "node", n, &[])))
                .collect()
        }
        RelationshipType::Other(_) => vec![],
    };
    RelationshipContext {
        unique_id: rel.unique_id.clone(),
        kind: kind.kind().to_string(),
        protocol: rel.protocol.clone(),
        description: rel.description.clone(),
        participants,
    }
}
