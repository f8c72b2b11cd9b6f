use crate::layout::routing::path_bend_count;
use crate::layout::{Bounds, NodeKind, Point, RenderModel};
use crate::viewport::Viewport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub bounds: Option<Bounds>,
    pub viewport: Option<Viewport>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: NodeKind,
    pub parent: Option<String>,
    pub label: String,
    /// Position relative to `parent`, as handed to the renderer.
    pub x: f32,
    pub y: f32,
    /// Absolute position in world space.
    pub world_x: f32,
    pub world_y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: String,
    pub border: String,
    pub z_index: i32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub show_label: bool,
    pub dasharray: Option<String>,
    pub stroke: String,
    pub stroke_width: f32,
    pub bends: usize,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_model(model: &RenderModel, viewport: Option<Viewport>) -> Self {
        let nodes = model
            .nodes
            .iter()
            .map(|node| {
                let world = model.absolute_position(&node.id).unwrap_or(node.position);
                NodeDump {
                    id: node.id.clone(),
                    kind: node.kind,
                    parent: node.parent_id.clone(),
                    label: node.label.clone(),
                    x: node.position.x,
                    y: node.position.y,
                    world_x: world.x,
                    world_y: world.y,
                    width: node.size.width,
                    height: node.size.height,
                    fill: node.fill.clone(),
                    border: node.border.clone(),
                    z_index: node.z_index,
                }
            })
            .collect();

        let edges = model
            .edges
            .iter()
            .map(|edge| {
                let points: Vec<Point> = edge.route_points().copied().collect();
                EdgeDump {
                    id: edge.id.clone(),
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    label: edge.label.clone(),
                    show_label: edge.label_visible(),
                    dasharray: edge.dasharray.clone(),
                    stroke: edge.stroke.clone(),
                    stroke_width: edge.stroke_width,
                    bends: path_bend_count(&points),
                    points: points.iter().map(|p| [p.x, p.y]).collect(),
                }
            })
            .collect();

        LayoutDump {
            width: model.bounds.map(|b| b.width()).unwrap_or(0.0),
            height: model.bounds.map(|b| b.height()).unwrap_or(0.0),
            bounds: model.bounds,
            viewport,
            nodes,
            edges,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_layout_dump(
    path: Option<&Path>,
    model: &RenderModel,
    viewport: Option<Viewport>,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_model(model, viewport);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{RenderNode, Size};

    #[test]
    fn dump_reports_relative_and_world_positions() {
        let group = RenderNode {
            id: "g".to_string(),
            position: Point::new(50.0, 50.0),
            size: Size::new(400.0, 200.0),
            parent_id: None,
            kind: NodeKind::Group,
            label: "Group".to_string(),
            info: String::new(),
            color: None,
            fill: "rgba(0,0,0,0.02)".to_string(),
            border: "#ccc".to_string(),
            z_index: -1,
        };
        let child = RenderNode {
            id: "x".to_string(),
            position: Point::new(10.0, 10.0),
            parent_id: Some("g".to_string()),
            kind: NodeKind::Leaf,
            size: Size::new(180.0, 55.0),
            z_index: 10,
            ..group.clone()
        };
        let model = RenderModel {
            nodes: vec![group, child],
            edges: vec![],
            bounds: Some(Bounds::from_rect(Point::new(50.0, 50.0), Size::new(400.0, 200.0))),
            fit_pending: true,
        };
        let dump = LayoutDump::from_model(&model, None);
        assert_eq!(dump.width, 400.0);
        let x = &dump.nodes[1];
        assert_eq!((x.x, x.y), (10.0, 10.0));
        assert_eq!((x.world_x, x.world_y), (60.0, 60.0));
        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["nodes"][1]["kind"], "leaf");
        assert_eq!(json["nodes"][0]["border"], "#ccc");
    }
}
