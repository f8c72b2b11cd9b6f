use std::collections::HashMap;

use crate::theme::Theme;

use super::builder::BuiltGraph;
use super::routing::label_anchor;
use super::types::{LayoutResult, Point, PositionedNode, RenderEdge};

/// Brings every routed edge into world space and attaches its link semantics.
///
/// Sections of an edge whose endpoints share the same non-root container are
/// reported relative to that container and get shifted by its absolute
/// origin. All other sections are already absolute and are left untouched.
pub fn normalize_edges(
    result: &LayoutResult,
    built: &BuiltGraph,
    theme: &Theme,
    show_labels: bool,
) -> Vec<RenderEdge> {
    let origins = absolute_origins(&result.children);

    result
        .edges
        .iter()
        .map(|edge| {
            let source_parent = built.index.parent_of(&edge.source);
            let target_parent = built.index.parent_of(&edge.target);
            let offset = match (source_parent, target_parent) {
                (Some(a), Some(b)) if a == b => origins.get(a).copied(),
                _ => None,
            };
            let sections = match offset {
                Some(offset) => edge.sections.iter().map(|s| s.translated(offset)).collect(),
                None => edge.sections.clone(),
            };

            let route: Vec<Point> = sections.iter().flat_map(|s| s.points().copied()).collect();
            let link = built.link(&edge.source, &edge.target);
            let dashed = link.is_some_and(|l| l.dashed);

            RenderEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                sections,
                label: link.and_then(|l| l.label.clone()),
                info: link.and_then(|l| l.info.clone()),
                dashed,
                dasharray: theme.dashes_for(dashed).map(str::to_string),
                stroke: theme.edge_stroke.clone(),
                stroke_width: theme.edge_stroke_width,
                z_index: theme.edge_z_index,
                show_label: show_labels,
                label_anchor: label_anchor(&route),
            }
        })
        .collect()
}

/// Absolute origin of every container in the positioned tree.
fn absolute_origins(nodes: &[PositionedNode]) -> HashMap<&str, Point> {
    fn visit<'a>(nodes: &'a [PositionedNode], base: Point, out: &mut HashMap<&'a str, Point>) {
        for node in nodes {
            if node.children.is_empty() {
                continue;
            }
            let origin = base.translate(Point::new(node.x, node.y));
            out.insert(node.id.as_str(), origin);
            visit(&node.children, origin, out);
        }
    }
    let mut out = HashMap::new();
    visit(nodes, Point::ORIGIN, &mut out);
    out
}
