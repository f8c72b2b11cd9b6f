use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Instant;

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use tracing::debug;

use crate::config::{EdgeRouting, LayoutConfig, Padding};
use crate::ir::Direction;

use super::error::{LayoutError, Result};
use super::routing::{Rect, route_orthogonal, route_polyline, route_self_loop};
use super::types::{
    EdgeSection, LayoutEdge, LayoutGraph, LayoutNode, LayoutResult, NodeKind, Point,
    PositionedNode, RoutedEdge,
};

/// An external hierarchical layout engine.
///
/// Given a graph honoring containment, a solver returns positions where the
/// children of a container are relative to that container's origin while
/// top-level entities are relative to the diagram root. Edge sections are
/// expressed in root coordinates, except for edges whose endpoints share the
/// same non-root parent: those are relative to that parent.
pub trait LayoutSolver {
    fn solve(
        &self,
        graph: &LayoutGraph,
        options: &LayoutConfig,
    ) -> impl Future<Output = Result<LayoutResult>>;
}

/// Layered solver backed by dagre. Each populated container is laid out on
/// its own first, then placed as a single sized box in the top-level layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreSolver;

impl LayoutSolver for DagreSolver {
    async fn solve(&self, graph: &LayoutGraph, options: &LayoutConfig) -> Result<LayoutResult> {
        graph.validate()?;
        let started = Instant::now();
        let result = solve_nested(graph, options)?;
        debug!(
            entities = graph.walk().len(),
            edges = graph.edges.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dagre layout finished"
        );
        Ok(result)
    }
}

struct Placement {
    /// Origin relative to the enclosing frame.
    rect: Rect,
    children: Vec<(String, Rect)>,
}

fn solve_nested(graph: &LayoutGraph, options: &LayoutConfig) -> Result<LayoutResult> {
    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    for (node, parent) in graph.walk() {
        if let Some(parent) = parent {
            parent_of.insert(node.id.as_str(), parent);
        }
    }

    // Containers first: local layout, then their outer size.
    let mut local: HashMap<&str, Vec<(String, Rect)>> = HashMap::new();
    let mut sizes: HashMap<&str, (f32, f32)> = HashMap::new();
    for node in &graph.children {
        match node.kind {
            NodeKind::Leaf => {
                sizes.insert(node.id.as_str(), (node.width, node.height));
            }
            NodeKind::Group => {
                let padding = node.padding.unwrap_or(options.group_padding);
                let (children, width, height) = layout_container(node, graph, &parent_of, padding, options)?;
                sizes.insert(node.id.as_str(), (width, height));
                local.insert(node.id.as_str(), children);
            }
        }
    }

    let top_ids: Vec<(String, f32, f32, usize)> = graph
        .children
        .iter()
        .map(|node| {
            let (w, h) = sizes
                .get(node.id.as_str())
                .copied()
                .unwrap_or((node.width, node.height));
            (node.id.clone(), w, h, node.order)
        })
        .collect();
    let top_of = |id: &str| -> String { parent_of.get(id).copied().unwrap_or(id).to_string() };
    let mut top_edges: Vec<(String, String)> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for edge in &graph.edges {
        let from = top_of(&edge.source);
        let to = top_of(&edge.target);
        if from == to {
            continue;
        }
        if seen.insert((from.clone(), to.clone())) {
            top_edges.push((from, to));
        }
    }

    let placed = run_dagre(&top_ids, &top_edges, options.direction, options)?;
    let (placed, width, height) = shift_into_frame(placed, options.root_padding);

    let mut placements: HashMap<&str, Placement> = HashMap::new();
    let mut children = Vec::with_capacity(graph.children.len());
    for node in &graph.children {
        let rect = *placed
            .iter()
            .find(|(id, _)| id == &node.id)
            .map(|(_, rect)| rect)
            .ok_or_else(|| LayoutError::MissingPosition(node.id.clone()))?;
        let nested = local.remove(node.id.as_str()).unwrap_or_default();
        children.push(PositionedNode {
            id: node.id.clone(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            children: nested
                .iter()
                .map(|(id, r)| PositionedNode {
                    id: id.clone(),
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                    children: Vec::new(),
                })
                .collect(),
        });
        placements.insert(node.id.as_str(), Placement { rect, children: nested });
    }

    let edges = graph
        .edges
        .iter()
        .map(|edge| route_edge(edge, &parent_of, &placements, graph, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(LayoutResult {
        width,
        height,
        children,
        edges,
    })
}

/// Lays out the members of one container. Returns child rects relative to
/// the container origin and the container's outer size.
fn layout_container(
    container: &LayoutNode,
    graph: &LayoutGraph,
    parent_of: &HashMap<&str, &str>,
    padding: Padding,
    options: &LayoutConfig,
) -> Result<(Vec<(String, Rect)>, f32, f32)> {
    if container.children.is_empty() {
        return Ok((
            Vec::new(),
            (padding.left + padding.right).max(container.width),
            (padding.top + padding.bottom).max(container.height),
        ));
    }
    let ids: Vec<(String, f32, f32, usize)> = container
        .children
        .iter()
        .map(|child| (child.id.clone(), child.width, child.height, child.order))
        .collect();
    let edges: Vec<(String, String)> = graph
        .edges
        .iter()
        .filter(|edge| {
            edge.source != edge.target
                && parent_of.get(edge.source.as_str()) == Some(&container.id.as_str())
                && parent_of.get(edge.target.as_str()) == Some(&container.id.as_str())
        })
        .map(|edge| (edge.source.clone(), edge.target.clone()))
        .collect();
    let placed = run_dagre(&ids, &edges, options.direction, options)?;
    let (placed, width, height) = shift_into_frame(placed, padding);
    Ok((placed, width, height))
}

fn run_dagre(
    nodes: &[(String, f32, f32, usize)],
    edges: &[(String, String)],
    direction: Direction,
    options: &LayoutConfig,
) -> Result<Vec<(String, Rect)>> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(direction).to_string());
    graph_config.nodesep = Some(options.node_spacing);
    graph_config.ranksep = Some(options.layer_spacing);
    graph_config.marginx = Some(options.margin);
    graph_config.marginy = Some(options.margin);
    dagre_graph.set_graph(graph_config);

    for (id, width, height, order) in nodes {
        let mut node = DagreNode::default();
        node.width = *width;
        node.height = *height;
        node.order = Some(*order);
        dagre_graph.set_node(id.clone(), Some(node));
    }
    for (from, to) in edges {
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut placed = Vec::with_capacity(nodes.len());
    for (id, width, height, _) in nodes {
        let Some(dagre_node) = dagre_graph.node(id) else {
            return Err(LayoutError::MissingPosition(id.clone()));
        };
        if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
            return Err(LayoutError::Solver(format!(
                "non-finite position for '{id}'"
            )));
        }
        placed.push((
            id.clone(),
            Rect {
                x: dagre_node.x - width / 2.0,
                y: dagre_node.y - height / 2.0,
                width: *width,
                height: *height,
            },
        ));
    }
    Ok(placed)
}

/// Moves a set of rects so their bounding box starts at the padding corner
/// and returns the padded frame size.
fn shift_into_frame(placed: Vec<(String, Rect)>, padding: Padding) -> (Vec<(String, Rect)>, f32, f32) {
    let min_x = placed.iter().map(|(_, r)| r.x).fold(f32::INFINITY, f32::min);
    let min_y = placed.iter().map(|(_, r)| r.y).fold(f32::INFINITY, f32::min);
    let max_x = placed
        .iter()
        .map(|(_, r)| r.x + r.width)
        .fold(f32::NEG_INFINITY, f32::max);
    let max_y = placed
        .iter()
        .map(|(_, r)| r.y + r.height)
        .fold(f32::NEG_INFINITY, f32::max);
    if placed.is_empty() {
        return (placed, padding.left + padding.right, padding.top + padding.bottom);
    }
    let dx = padding.left - min_x;
    let dy = padding.top - min_y;
    let shifted = placed
        .into_iter()
        .map(|(id, r)| {
            (
                id,
                Rect {
                    x: r.x + dx,
                    y: r.y + dy,
                    ..r
                },
            )
        })
        .collect();
    (
        shifted,
        max_x - min_x + padding.left + padding.right,
        max_y - min_y + padding.top + padding.bottom,
    )
}

fn route_edge(
    edge: &LayoutEdge,
    parent_of: &HashMap<&str, &str>,
    placements: &HashMap<&str, Placement>,
    graph: &LayoutGraph,
    options: &LayoutConfig,
) -> Result<RoutedEdge> {
    let source_parent = parent_of.get(edge.source.as_str()).copied();
    let target_parent = parent_of.get(edge.target.as_str()).copied();
    let shared = match (source_parent, target_parent) {
        (Some(a), Some(b)) if a == b => Some(a),
        _ => None,
    };

    // Intra-container edges are routed in the container's own frame.
    let frame_rect = |id: &str| -> Result<Rect> {
        if let Some(parent) = shared {
            return placements
                .get(parent)
                .and_then(|p| p.children.iter().find(|(child, _)| child == id))
                .map(|(_, rect)| *rect)
                .ok_or_else(|| LayoutError::MissingPosition(id.to_string()));
        }
        absolute_rect(id, parent_of, placements)
    };
    let from = frame_rect(&edge.source)?;
    let to = frame_rect(&edge.target)?;

    let clearance = shared
        .and_then(|parent| graph.children.iter().find(|node| node.id == parent))
        .and_then(|node| node.edge_node_spacing)
        .unwrap_or(options.edge_node_spacing);

    let points = if edge.source == edge.target {
        route_self_loop(&from, options.direction, clearance)
    } else {
        match options.edge_routing {
            EdgeRouting::Orthogonal => route_orthogonal(
                &from,
                &to,
                options.direction,
                options.edge_node_layer_spacing,
                clearance,
            ),
            EdgeRouting::Polyline => route_polyline(&from, &to),
        }
    };
    let section = EdgeSection::from_polyline(&points)
        .unwrap_or_else(|| EdgeSection::straight(center(&from), center(&to)));

    Ok(RoutedEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        sections: vec![section],
    })
}

fn absolute_rect(
    id: &str,
    parent_of: &HashMap<&str, &str>,
    placements: &HashMap<&str, Placement>,
) -> Result<Rect> {
    match parent_of.get(id) {
        None => placements
            .get(id)
            .map(|p| p.rect)
            .ok_or_else(|| LayoutError::MissingPosition(id.to_string())),
        Some(parent) => {
            let placement = placements
                .get(parent)
                .ok_or_else(|| LayoutError::MissingPosition(parent.to_string()))?;
            let (_, local) = placement
                .children
                .iter()
                .find(|(child, _)| child == id)
                .ok_or_else(|| LayoutError::MissingPosition(id.to_string()))?;
            Ok(Rect {
                x: placement.rect.x + local.x,
                y: placement.rect.y + local.y,
                ..*local
            })
        }
    }
}

fn center(rect: &Rect) -> Point {
    Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::Down => "tb",
        Direction::Up => "bt",
        Direction::Right => "lr",
        Direction::Left => "rl",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{GraphDescription, GroupSpec, LinkSpec, NodeSpec};
    use crate::layout::builder::build_layout_graph;
    use crate::layout::types::Bounds;
    use futures::executor::block_on;

    fn grouped() -> GraphDescription {
        GraphDescription {
            nodes: vec![
                NodeSpec::new("a").with_parent("g"),
                NodeSpec::new("b").with_parent("g"),
                NodeSpec::new("c"),
            ],
            groups: vec![GroupSpec::new("g")],
            links: vec![LinkSpec::new("a", "b"), LinkSpec::new("b", "c")],
        }
    }

    #[test]
    fn children_are_relative_and_fit_inside_container() {
        let config = LayoutConfig::default();
        let built = build_layout_graph(&grouped(), &config).unwrap();
        let result = block_on(DagreSolver.solve(&built.graph, &config)).unwrap();
        let group = result.children.iter().find(|n| n.id == "g").unwrap();
        assert_eq!(group.children.len(), 2);
        for child in &group.children {
            assert!(child.x >= config.group_padding.left - 1e-3);
            assert!(child.y >= config.group_padding.top - 1e-3);
            assert!(child.x + child.width <= group.width + 1e-3);
            assert!(child.y + child.height <= group.height + 1e-3);
        }
    }

    #[test]
    fn intra_group_route_is_local_and_cross_route_is_absolute() {
        let config = LayoutConfig::default();
        let built = build_layout_graph(&grouped(), &config).unwrap();
        let result = block_on(DagreSolver.solve(&built.graph, &config)).unwrap();
        let group = result.children.iter().find(|n| n.id == "g").unwrap();

        let inner = result.edges.iter().find(|e| e.id == "a-b").unwrap();
        let local = Bounds::from_points(inner.sections[0].points()).unwrap();
        assert!(local.max_x <= group.width + 1e-3);
        assert!(local.max_y <= group.height + 1e-3);

        let cross = result.edges.iter().find(|e| e.id == "b-c").unwrap();
        let c = result.children.iter().find(|n| n.id == "c").unwrap();
        let end = cross.sections[0].end;
        let c_box = Bounds::from_rect(
            Point::new(c.x, c.y),
            crate::layout::types::Size::new(c.width, c.height),
        );
        assert!(c_box.contains(&Bounds::from_points([&end]).unwrap()));
    }

    #[test]
    fn rejects_graph_with_dangling_edge() {
        let config = LayoutConfig::default();
        let mut graph = build_layout_graph(&grouped(), &config).unwrap().graph;
        graph.edges.push(LayoutEdge {
            id: "c-z".to_string(),
            source: "c".to_string(),
            target: "z".to_string(),
        });
        let err = block_on(DagreSolver.solve(&graph, &config)).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownEndpoint { .. }));
    }

    #[test]
    fn empty_group_gets_padding_sized_box() {
        let config = LayoutConfig::default();
        let desc = GraphDescription {
            nodes: vec![NodeSpec::new("a")],
            groups: vec![GroupSpec::new("empty")],
            links: vec![LinkSpec::new("a", "empty")],
        };
        let built = build_layout_graph(&desc, &config).unwrap();
        let result = block_on(DagreSolver.solve(&built.graph, &config)).unwrap();
        let group = result.children.iter().find(|n| n.id == "empty").unwrap();
        assert_eq!(group.width, config.group_padding.left + config.group_padding.right);
        assert!(group.children.is_empty());
        assert_eq!(result.edges.len(), 1);
    }
}
