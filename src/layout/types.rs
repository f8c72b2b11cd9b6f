use serde::Serialize;

use crate::config::Padding;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn translate(self, offset: Point) -> Point {
        Point::new(self.x + offset.x, self.y + offset.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn from_rect(origin: Point, size: Size) -> Self {
        Self {
            min_x: origin.x,
            min_y: origin.y,
            max_x: origin.x + size.width,
            max_y: origin.y + size.height,
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in iter {
            bounds.include(*p);
        }
        Some(bounds)
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x - 1e-3
            && other.min_y >= self.min_y - 1e-3
            && other.max_x <= self.max_x + 1e-3
            && other.max_y <= self.max_y + 1e-3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Leaf,
}

// ── Solver input ────────────────────────────────────────────────────

/// Entity of the hierarchical solver input. Groups own `children`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub kind: NodeKind,
    pub width: f32,
    pub height: f32,
    /// Declaration index, used as the deterministic in-layer order.
    pub order: usize,
    pub padding: Option<Padding>,
    pub edge_node_spacing: Option<f32>,
    pub children: Vec<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Root container handed to a solver; edges are declared once here.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGraph {
    pub id: String,
    pub children: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

// ── Solver output ───────────────────────────────────────────────────

/// Placed entity. `x`/`y` are relative to the enclosing container, or to the
/// diagram root for top-level entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PositionedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSection {
    pub start: Point,
    pub bends: Vec<Point>,
    pub end: Point,
}

impl EdgeSection {
    pub fn straight(start: Point, end: Point) -> Self {
        Self {
            start,
            bends: Vec::new(),
            end,
        }
    }

    /// Builds a section from a polyline of at least two points.
    pub fn from_polyline(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (last, middle) = rest.split_last()?;
        Some(Self {
            start: *first,
            bends: middle.to_vec(),
            end: *last,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        std::iter::once(&self.start)
            .chain(self.bends.iter())
            .chain(std::iter::once(&self.end))
    }

    pub fn translated(&self, offset: Point) -> Self {
        Self {
            start: self.start.translate(offset),
            bends: self.bends.iter().map(|p| p.translate(offset)).collect(),
            end: self.end.translate(offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub sections: Vec<EdgeSection>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayoutResult {
    pub width: f32,
    pub height: f32,
    pub children: Vec<PositionedNode>,
    pub edges: Vec<RoutedEdge>,
}

// ── Render model ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    /// Relative to `parent_id`'s frame when set, absolute otherwise.
    pub position: Point,
    pub size: Size,
    pub parent_id: Option<String>,
    pub kind: NodeKind,
    pub label: String,
    pub info: String,
    pub color: Option<String>,
    pub fill: String,
    pub border: String,
    pub z_index: i32,
}

impl RenderNode {
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f32,
    pub y: f32,
    /// Text rotation in degrees, kept within [-90, 90] so labels read left to right.
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// World-space route.
    pub sections: Vec<EdgeSection>,
    pub label: Option<String>,
    pub info: Option<String>,
    pub dashed: bool,
    pub dasharray: Option<String>,
    pub stroke: String,
    pub stroke_width: f32,
    pub z_index: i32,
    pub show_label: bool,
    pub label_anchor: Option<LabelAnchor>,
}

impl RenderEdge {
    pub fn route_points(&self) -> impl Iterator<Item = &Point> {
        self.sections.iter().flat_map(EdgeSection::points)
    }

    /// Whether a label should currently be drawn for this edge.
    pub fn label_visible(&self) -> bool {
        self.show_label && self.label.as_deref().is_some_and(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub bounds: Option<Bounds>,
    pub fit_pending: bool,
}

impl RenderModel {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The "no diagram" state.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Absolute origin of a render node, following its parent chain.
    pub fn absolute_position(&self, id: &str) -> Option<Point> {
        let mut node = self.node(id)?;
        let mut pos = node.position;
        let mut depth = 0usize;
        while let Some(parent_id) = node.parent_id.as_deref() {
            node = self.node(parent_id)?;
            pos = pos.translate(node.position);
            depth += 1;
            if depth > self.nodes.len() {
                return None;
            }
        }
        Some(pos)
    }

    pub fn absolute_bounds(&self, id: &str) -> Option<Bounds> {
        let node = self.node(id)?;
        Some(Bounds::from_rect(self.absolute_position(id)?, node.size))
    }
}
