use crate::ir::Direction;

use super::types::{LabelAnchor, Point};

// ── Orthogonal routing ──────────────────────────────────────────────
/// Cross-axis distance under which two ports count as aligned.
const ALIGN_EPSILON: f32 = 0.5;
/// Tolerance used when dropping duplicate or collinear points.
const COMPRESS_EPSILON: f32 = 1e-4;

/// Absolute box of a placed entity, used only while routing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Rect {
    pub(super) x: f32,
    pub(super) y: f32,
    pub(super) width: f32,
    pub(super) height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

/// A rect expressed along the flow: `main` grows in the layout direction,
/// `cross` runs perpendicular to it.
#[derive(Debug, Clone, Copy)]
struct FlowRect {
    main_min: f32,
    main_max: f32,
    cross_min: f32,
    cross_max: f32,
}

impl FlowRect {
    fn cross_mid(&self) -> f32 {
        (self.cross_min + self.cross_max) / 2.0
    }
}

fn to_flow(p: Point, direction: Direction) -> (f32, f32) {
    match direction {
        Direction::Right => (p.x, p.y),
        Direction::Left => (-p.x, p.y),
        Direction::Down => (p.y, p.x),
        Direction::Up => (-p.y, p.x),
    }
}

fn from_flow(main: f32, cross: f32, direction: Direction) -> Point {
    match direction {
        Direction::Right => Point::new(main, cross),
        Direction::Left => Point::new(-main, cross),
        Direction::Down => Point::new(cross, main),
        Direction::Up => Point::new(cross, -main),
    }
}

fn flow_rect(rect: &Rect, direction: Direction) -> FlowRect {
    let (m1, c1) = to_flow(Point::new(rect.x, rect.y), direction);
    let (m2, c2) = to_flow(
        Point::new(rect.x + rect.width, rect.y + rect.height),
        direction,
    );
    FlowRect {
        main_min: m1.min(m2),
        main_max: m1.max(m2),
        cross_min: c1.min(c2),
        cross_max: c1.max(c2),
    }
}

/// Exit and entry sides for an edge that follows the layout direction.
pub(super) fn flow_sides(direction: Direction) -> (EdgeSide, EdgeSide) {
    match direction {
        Direction::Right => (EdgeSide::Right, EdgeSide::Left),
        Direction::Left => (EdgeSide::Left, EdgeSide::Right),
        Direction::Down => (EdgeSide::Bottom, EdgeSide::Top),
        Direction::Up => (EdgeSide::Top, EdgeSide::Bottom),
    }
}

pub(super) fn anchor_point(rect: &Rect, side: EdgeSide) -> Point {
    match side {
        EdgeSide::Left => Point::new(rect.x, rect.y + rect.height / 2.0),
        EdgeSide::Right => Point::new(rect.x + rect.width, rect.y + rect.height / 2.0),
        EdgeSide::Top => Point::new(rect.x + rect.width / 2.0, rect.y),
        EdgeSide::Bottom => Point::new(rect.x + rect.width / 2.0, rect.y + rect.height),
    }
}

/// Routes `from` → `to` with axis-parallel segments. Forward edges bend once
/// in the channel between the two layers; edges that point against the flow
/// leave through the exit side, detour past both boxes and come back in
/// through the entry side.
pub(super) fn route_orthogonal(
    from: &Rect,
    to: &Rect,
    direction: Direction,
    layer_step: f32,
    clearance: f32,
) -> Vec<Point> {
    let (exit, entry) = flow_sides(direction);
    let s = flow_rect(from, direction);
    let t = flow_rect(to, direction);
    let start = anchor_point(from, exit);
    let end = anchor_point(to, entry);
    let (start_main, start_cross) = to_flow(start, direction);
    let (end_main, end_cross) = to_flow(end, direction);

    let points = if t.main_min >= s.main_max {
        if (start_cross - end_cross).abs() < ALIGN_EPSILON {
            vec![start, from_flow(end_main, start_cross, direction)]
        } else {
            let mid = (start_main + end_main) / 2.0;
            vec![
                start,
                from_flow(mid, start_cross, direction),
                from_flow(mid, end_cross, direction),
                end,
            ]
        }
    } else {
        let out = s.main_max + layer_step;
        let back = t.main_min - layer_step;
        let detour = s.cross_max.max(t.cross_max) + clearance;
        vec![
            start,
            from_flow(out, s.cross_mid(), direction),
            from_flow(out, detour, direction),
            from_flow(back, detour, direction),
            from_flow(back, t.cross_mid(), direction),
            end,
        ]
    };
    compress_path(&points)
}

pub(super) fn route_self_loop(rect: &Rect, direction: Direction, pad: f32) -> Vec<Point> {
    if direction.is_horizontal() {
        let start = Point::new(rect.x + rect.width, rect.y + rect.height / 2.0);
        let p1 = Point::new(rect.x + rect.width + pad, rect.y + rect.height / 2.0);
        let p2 = Point::new(rect.x + rect.width + pad, rect.y - pad);
        let p3 = Point::new(rect.x + rect.width / 2.0, rect.y - pad);
        let end = Point::new(rect.x + rect.width / 2.0, rect.y);
        vec![start, p1, p2, p3, end]
    } else {
        let start = Point::new(rect.x + rect.width / 2.0, rect.y + rect.height);
        let p1 = Point::new(rect.x + rect.width / 2.0, rect.y + rect.height + pad);
        let p2 = Point::new(rect.x + rect.width + pad, rect.y + rect.height + pad);
        let p3 = Point::new(rect.x + rect.width + pad, rect.y + rect.height / 2.0);
        let end = Point::new(rect.x + rect.width, rect.y + rect.height / 2.0);
        vec![start, p1, p2, p3, end]
    }
}

/// Straight segments from center to center, clipped at the box borders.
pub(super) fn route_polyline(from: &Rect, to: &Rect) -> Vec<Point> {
    let a = Point::new(from.x + from.width / 2.0, from.y + from.height / 2.0);
    let b = Point::new(to.x + to.width / 2.0, to.y + to.height / 2.0);
    vec![clip_to_border(from, a, b), clip_to_border(to, b, a)]
}

fn clip_to_border(rect: &Rect, center: Point, toward: Point) -> Point {
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    if dx.abs() < COMPRESS_EPSILON && dy.abs() < COMPRESS_EPSILON {
        return center;
    }
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    let scale_x = if dx.abs() > COMPRESS_EPSILON { half_w / dx.abs() } else { f32::INFINITY };
    let scale_y = if dy.abs() > COMPRESS_EPSILON { half_h / dy.abs() } else { f32::INFINITY };
    let scale = scale_x.min(scale_y).min(1.0);
    Point::new(center.x + dx * scale, center.y + dy * scale)
}

pub(super) fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        if (curr.x - prev.x).abs() <= COMPRESS_EPSILON && (curr.y - prev.y).abs() <= COMPRESS_EPSILON {
            continue;
        }
        let next = points[idx + 1];
        let dx1 = curr.x - prev.x;
        let dy1 = curr.y - prev.y;
        let dx2 = next.x - curr.x;
        let dy2 = next.y - curr.y;
        if (dx1.abs() <= COMPRESS_EPSILON && dx2.abs() <= COMPRESS_EPSILON)
            || (dy1.abs() <= COMPRESS_EPSILON && dy2.abs() <= COMPRESS_EPSILON)
        {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let tail = out[out.len() - 1];
    if (last.x - tail.x).abs() > COMPRESS_EPSILON || (last.y - tail.y).abs() > COMPRESS_EPSILON {
        out.push(last);
    }
    out
}

pub(crate) fn path_length(points: &[Point]) -> f32 {
    let mut length = 0.0;
    for segment in points.windows(2) {
        let dx = segment[1].x - segment[0].x;
        let dy = segment[1].y - segment[0].y;
        length += (dx * dx + dy * dy).sqrt();
    }
    length
}

pub(crate) fn path_bend_count(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for idx in 1..points.len() - 1 {
        let p0 = points[idx - 1];
        let p1 = points[idx];
        let p2 = points[idx + 1];
        let dx1 = p1.x - p0.x;
        let dy1 = p1.y - p0.y;
        let dx2 = p2.x - p1.x;
        let dy2 = p2.y - p1.y;
        let cross = dx1 * dy2 - dy1 * dx2;
        if cross.abs() > COMPRESS_EPSILON {
            bends += 1;
        }
    }
    bends
}

/// Point halfway along the path, with the direction of the segment it lies on.
pub(crate) fn label_anchor(points: &[Point]) -> Option<LabelAnchor> {
    let first = *points.first()?;
    let total = path_length(points);
    let target = total / 2.0;
    let mut walked = 0.0;
    for segment in points.windows(2) {
        let (p1, p2) = (segment[0], segment[1]);
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > 0.0 && walked + dist >= target {
            let ratio = (target - walked) / dist;
            return Some(LabelAnchor {
                x: p1.x + dx * ratio,
                y: p1.y + dy * ratio,
                angle: readable_angle(dy.atan2(dx).to_degrees()),
            });
        }
        walked += dist;
    }
    Some(LabelAnchor {
        x: first.x,
        y: first.y,
        angle: 0.0,
    })
}

fn readable_angle(angle: f32) -> f32 {
    if angle > 90.0 {
        angle - 180.0
    } else if angle < -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    fn is_orthogonal(points: &[Point]) -> bool {
        points
            .windows(2)
            .all(|s| (s[0].x - s[1].x).abs() < 1e-3 || (s[0].y - s[1].y).abs() < 1e-3)
    }

    #[test]
    fn aligned_forward_edge_is_straight() {
        let a = rect(0.0, 0.0, 100.0, 40.0);
        let b = rect(200.0, 0.0, 100.0, 40.0);
        let points = route_orthogonal(&a, &b, Direction::Right, 20.0, 20.0);
        assert_eq!(points, vec![Point::new(100.0, 20.0), Point::new(200.0, 20.0)]);
    }

    #[test]
    fn offset_forward_edge_bends_in_channel() {
        let a = rect(0.0, 0.0, 100.0, 40.0);
        let b = rect(200.0, 100.0, 100.0, 40.0);
        let points = route_orthogonal(&a, &b, Direction::Right, 20.0, 20.0);
        assert_eq!(points.len(), 4);
        assert_eq!(points[1], Point::new(150.0, 20.0));
        assert_eq!(points[2], Point::new(150.0, 120.0));
        assert_eq!(path_bend_count(&points), 2);
        assert!(is_orthogonal(&points));
    }

    #[test]
    fn backward_edge_detours_past_both_boxes() {
        let a = rect(200.0, 0.0, 100.0, 40.0);
        let b = rect(0.0, 0.0, 100.0, 40.0);
        let points = route_orthogonal(&a, &b, Direction::Right, 20.0, 20.0);
        assert!(is_orthogonal(&points));
        assert_eq!(points.first(), Some(&Point::new(300.0, 20.0)));
        assert_eq!(points.last(), Some(&Point::new(0.0, 20.0)));
        assert!(points.iter().any(|p| p.y >= 60.0));
    }

    #[test]
    fn downward_flow_uses_vertical_sides() {
        let a = rect(0.0, 0.0, 100.0, 40.0);
        let b = rect(0.0, 140.0, 100.0, 40.0);
        let points = route_orthogonal(&a, &b, Direction::Down, 20.0, 20.0);
        assert_eq!(points, vec![Point::new(50.0, 40.0), Point::new(50.0, 140.0)]);
    }

    #[test]
    fn compress_drops_collinear_points() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert_eq!(
            compress_path(&points),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
    }

    #[test]
    fn label_anchor_sits_at_half_length() {
        let points = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let anchor = label_anchor(&points).unwrap();
        assert_eq!((anchor.x, anchor.y), (10.0, 0.0));
        assert_eq!(anchor.angle, 0.0);

        let leftward = vec![Point::new(10.0, 0.0), Point::new(0.0, 0.0)];
        let anchor = label_anchor(&leftward).unwrap();
        assert_eq!((anchor.x, anchor.y), (5.0, 0.0));
        assert!(anchor.angle.abs() < 1e-3);
    }

    #[test]
    fn polyline_is_clipped_to_borders() {
        let a = rect(0.0, 0.0, 100.0, 40.0);
        let b = rect(200.0, 0.0, 100.0, 40.0);
        let points = route_polyline(&a, &b);
        assert_eq!(points, vec![Point::new(100.0, 20.0), Point::new(200.0, 20.0)]);
    }
}
