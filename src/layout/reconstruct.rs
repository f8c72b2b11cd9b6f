use tracing::warn;

use crate::config::Config;

use super::builder::GraphIndex;
use super::types::{LayoutResult, NodeKind, Point, PositionedNode, RenderNode, Size};

/// Flattens the solver's positioned tree into render nodes. Positions are
/// copied as reported: a child stays relative to its container, which is
/// recorded as its `parent_id`. Containers precede their children.
pub fn reconstruct_nodes(result: &LayoutResult, index: &GraphIndex, config: &Config) -> Vec<RenderNode> {
    let mut out = Vec::new();
    for node in &result.children {
        visit(node, None, index, config, &mut out);
    }
    out
}

fn visit(
    node: &PositionedNode,
    parent: Option<&str>,
    index: &GraphIndex,
    config: &Config,
    out: &mut Vec<RenderNode>,
) {
    let position = Point::new(node.x, node.y);
    let parent_id = parent.map(str::to_string);

    if let Some(group) = index.group(&node.id) {
        out.push(RenderNode {
            id: node.id.clone(),
            position,
            size: Size::new(node.width, node.height),
            parent_id,
            kind: NodeKind::Group,
            label: group.display_label().to_string(),
            info: group.info.clone().unwrap_or_default(),
            color: group.color.clone(),
            fill: group
                .color
                .clone()
                .unwrap_or_else(|| config.theme.group_fill.clone()),
            border: config.theme.group_border.clone(),
            z_index: config.theme.group_z_index,
        });
        for child in &node.children {
            visit(child, Some(node.id.as_str()), index, config, out);
        }
        return;
    }

    let Some(spec) = index.node(&node.id) else {
        warn!(id = %node.id, "solver reported an entity that was never declared; skipping");
        return;
    };
    out.push(RenderNode {
        id: node.id.clone(),
        position,
        // Leaves render at a fixed size regardless of the size used for layout.
        size: Size::new(config.view.node_render_width, config.view.node_render_height),
        parent_id,
        kind: NodeKind::Leaf,
        label: spec.display_label().to_string(),
        info: spec.info.clone().unwrap_or_default(),
        color: spec.color.clone(),
        fill: spec
            .color
            .clone()
            .unwrap_or_else(|| config.theme.node_fill.clone()),
        border: config.theme.node_border.clone(),
        z_index: config.theme.node_z_index,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GraphDescription, GroupSpec, NodeSpec};
    use crate::layout::builder::build_layout_graph;

    fn positioned(id: &str, x: f32, y: f32, children: Vec<PositionedNode>) -> PositionedNode {
        PositionedNode {
            id: id.to_string(),
            x,
            y,
            width: 300.0,
            height: 200.0,
            children,
        }
    }

    fn index() -> GraphIndex {
        let mut colored = NodeSpec::new("x").with_parent("g");
        colored.color = Some("#f00".to_string());
        colored.label = Some("Service X".to_string());
        let desc = GraphDescription {
            nodes: vec![colored, NodeSpec::new("y")],
            groups: vec![GroupSpec::new("g")],
            links: vec![],
        };
        build_layout_graph(&desc, &Config::default().layout)
            .unwrap()
            .index
    }

    #[test]
    fn child_positions_stay_relative_to_their_group() {
        let result = LayoutResult {
            width: 600.0,
            height: 400.0,
            children: vec![
                positioned("y", 400.0, 20.0, vec![]),
                positioned("g", 50.0, 50.0, vec![positioned("x", 10.0, 10.0, vec![])]),
            ],
            edges: vec![],
        };
        let config = Config::default();
        let nodes = reconstruct_nodes(&result, &index(), &config);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "g", "x"]);

        let x = &nodes[2];
        assert_eq!(x.position, Point::new(10.0, 10.0));
        assert_eq!(x.parent_id.as_deref(), Some("g"));
        assert_eq!(x.fill, "#f00");
        assert_eq!(x.label, "Service X");
        assert_eq!(x.size, Size::new(180.0, 55.0));

        let g = &nodes[1];
        assert!(g.is_group());
        assert_eq!(g.size, Size::new(300.0, 200.0));
        assert_eq!(g.fill, config.theme.group_fill);
        assert_eq!(g.border, "#ccc");
        assert_eq!(x.border, config.theme.node_border);
        assert!(g.z_index < nodes[0].z_index);
        assert_eq!(nodes[0].parent_id, None);
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let result = LayoutResult {
            width: 0.0,
            height: 0.0,
            children: vec![positioned("ghost", 0.0, 0.0, vec![]), positioned("y", 0.0, 0.0, vec![])],
            edges: vec![],
        };
        let nodes = reconstruct_nodes(&result, &index(), &Config::default());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].fill, "#fff");
    }
}
