use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::config::LayoutConfig;
use crate::ir::{GraphDescription, GroupSpec, LinkSpec, NodeSpec};

use super::error::{LayoutError, Result};
use super::types::{LayoutEdge, LayoutGraph, LayoutNode, NodeKind};

pub const ROOT_ID: &str = "root";

/// Id lookups for one description, built once and shared by every stage.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    nodes: HashMap<String, NodeSpec>,
    groups: HashMap<String, GroupSpec>,
    parents: HashMap<String, String>,
    links: HashMap<(String, String), usize>,
}

impl GraphIndex {
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.get(id)
    }

    pub fn group(&self, id: &str) -> Option<&GroupSpec> {
        self.groups.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id) || self.groups.contains_key(id)
    }

    /// Immediate non-root container of `id`, if any. Groups always sit at root.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Index into the filtered link list of the first link declared for a pair.
    pub fn link_index(&self, source: &str, target: &str) -> Option<usize> {
        self.links
            .get(&(source.to_string(), target.to_string()))
            .copied()
    }

    /// Label shown for an entity in connection summaries.
    pub fn display_label<'a>(&'a self, id: &'a str) -> &'a str {
        if let Some(node) = self.nodes.get(id) {
            return node.display_label();
        }
        if let Some(group) = self.groups.get(id) {
            return group.display_label();
        }
        id
    }
}

/// Output of the builder: the solver input plus what later stages need to
/// resolve ids back to semantics.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: LayoutGraph,
    pub links: Vec<LinkSpec>,
    pub index: GraphIndex,
}

impl BuiltGraph {
    pub fn link(&self, source: &str, target: &str) -> Option<&LinkSpec> {
        self.index
            .link_index(source, target)
            .and_then(|idx| self.links.get(idx))
    }
}

/// Converts a flat description into the hierarchical solver input. Returns
/// `None` for a description without nodes; no layout is needed then.
pub fn build_layout_graph(desc: &GraphDescription, config: &LayoutConfig) -> Option<BuiltGraph> {
    if desc.nodes.is_empty() {
        return None;
    }

    let mut index = GraphIndex::default();
    let mut group_slots: HashMap<String, usize> = HashMap::new();
    let mut containers: Vec<LayoutNode> = Vec::new();
    let mut order = 0usize;

    for group in &desc.groups {
        if index.groups.contains_key(&group.id) {
            warn!(group = %group.id, "duplicate group id; keeping the first declaration");
            continue;
        }
        group_slots.insert(group.id.clone(), containers.len());
        containers.push(LayoutNode {
            id: group.id.clone(),
            kind: NodeKind::Group,
            width: 0.0,
            height: 0.0,
            order: 0,
            padding: Some(config.group_padding),
            edge_node_spacing: Some(config.group_edge_node_spacing),
            children: Vec::new(),
        });
        index.groups.insert(group.id.clone(), group.clone());
    }

    let mut taken: HashSet<String> = desc
        .nodes
        .iter()
        .map(|n| n.id.clone())
        .chain(index.groups.keys().cloned())
        .collect();
    let mut declared: HashSet<&str> = HashSet::new();
    let mut top_level: Vec<LayoutNode> = Vec::new();
    for node in &desc.nodes {
        if !declared.insert(node.id.as_str()) {
            warn!(node = %node.id, "duplicate node id; keeping the first declaration");
            continue;
        }
        let layout_id = if index.groups.contains_key(&node.id) {
            let renamed = unique_layout_id(&node.id, &mut taken);
            warn!(node = %node.id, layout_id = %renamed, "node id collides with a group id; laying it out under a separate id");
            renamed
        } else {
            node.id.clone()
        };
        let leaf = LayoutNode {
            id: layout_id.clone(),
            kind: NodeKind::Leaf,
            width: config.node_width,
            height: config.node_height,
            order,
            padding: None,
            edge_node_spacing: None,
            children: Vec::new(),
        };
        order += 1;
        match node.parent.as_deref() {
            Some(parent) => match group_slots.get(parent) {
                Some(&slot) => {
                    containers[slot].children.push(leaf);
                    index.parents.insert(layout_id.clone(), parent.to_string());
                }
                None => {
                    warn!(node = %node.id, parent, "parent group is not declared; placing node at root");
                    top_level.push(leaf);
                }
            },
            None => top_level.push(leaf),
        }
        index.nodes.insert(layout_id, node.clone());
    }

    for container in &mut containers {
        container.order = order;
        order += 1;
    }

    // Links name declared ids; a name shared by a node and a group resolves to the group.
    let known: HashSet<&str> = declared
        .into_iter()
        .chain(index.groups.keys().map(String::as_str))
        .collect();
    let links = filter_links(&desc.links, &known);

    let mut edges = Vec::with_capacity(links.len());
    let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
    for (idx, link) in links.iter().enumerate() {
        let key = (link.source.clone(), link.target.clone());
        let count = pair_counts.entry(key.clone()).or_insert(0);
        *count += 1;
        let id = if *count == 1 {
            format!("{}-{}", link.source, link.target)
        } else {
            format!("{}-{}#{}", link.source, link.target, count)
        };
        index.links.entry(key).or_insert(idx);
        edges.push(LayoutEdge {
            id,
            source: link.source.clone(),
            target: link.target.clone(),
        });
    }

    top_level.extend(containers);
    Some(BuiltGraph {
        graph: LayoutGraph {
            id: ROOT_ID.to_string(),
            children: top_level,
            edges,
        },
        links,
        index,
    })
}

/// Internal id for a node whose declared id is already used by a group.
fn unique_layout_id(id: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = format!("{id}#node");
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{id}#node{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Keeps the links whose endpoints both resolve, in their original order.
pub fn filter_links(links: &[LinkSpec], known: &HashSet<&str>) -> Vec<LinkSpec> {
    links
        .iter()
        .filter(|link| {
            let ok = known.contains(link.source.as_str()) && known.contains(link.target.as_str());
            if !ok {
                warn!(
                    source = %link.source,
                    target = %link.target,
                    "skipping link with an unknown endpoint"
                );
            }
            ok
        })
        .cloned()
        .collect()
}

impl LayoutGraph {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first walk over every entity with its enclosing container id.
    pub fn walk(&self) -> Vec<(&LayoutNode, Option<&str>)> {
        fn visit<'a>(
            nodes: &'a [LayoutNode],
            parent: Option<&'a str>,
            out: &mut Vec<(&'a LayoutNode, Option<&'a str>)>,
        ) {
            for node in nodes {
                out.push((node, parent));
                visit(&node.children, Some(node.id.as_str()), out);
            }
        }
        let mut out = Vec::new();
        visit(&self.children, None, &mut out);
        out
    }

    /// Rejects graphs a solver must not see: duplicate ids or edges naming
    /// entities that are not part of the graph.
    pub fn validate(&self) -> Result<()> {
        let mut ids: HashSet<&str> = HashSet::new();
        for (node, _) in self.walk() {
            if !ids.insert(node.id.as_str()) {
                return Err(LayoutError::DuplicateId(node.id.clone()));
            }
        }
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(LayoutError::UnknownEndpoint {
                        edge: edge.id.clone(),
                        id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
