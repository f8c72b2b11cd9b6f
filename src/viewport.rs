use serde::Serialize;

use crate::config::ViewConfig;
use crate::layout::{Bounds, Point};

/// Pan and zoom of the canvas. World coordinates map to screen coordinates
/// as `screen = world * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        Self { pan_x, pan_y, zoom }
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan_x, p.y * self.zoom + self.pan_y)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        if self.zoom == 0.0 {
            return Point::new(p.x - self.pan_x, p.y - self.pan_y);
        }
        Point::new((p.x - self.pan_x) / self.zoom, (p.y - self.pan_y) / self.zoom)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Scales around a screen point, keeping the world point under it fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f32, view: &ViewConfig) {
        let anchor = self.screen_to_world(screen);
        self.zoom = clamp_zoom(self.zoom * factor, view);
        self.pan_x = screen.x - anchor.x * self.zoom;
        self.pan_y = screen.y - anchor.y * self.zoom;
    }
}

fn clamp_zoom(zoom: f32, view: &ViewConfig) -> f32 {
    if !zoom.is_finite() {
        return view.max_zoom;
    }
    zoom.clamp(view.min_zoom, view.max_zoom)
}

/// Viewport that centers `bounds` on a canvas, leaving `fit_padding` of
/// slack around the diagram, with the zoom clamped to the configured range.
pub fn fit_view(bounds: &Bounds, canvas_width: f32, canvas_height: f32, view: &ViewConfig) -> Viewport {
    let width = bounds.width().max(1.0);
    let height = bounds.height().max(1.0);
    let zoom_x = canvas_width / (width * (1.0 + view.fit_padding));
    let zoom_y = canvas_height / (height * (1.0 + view.fit_padding));
    let zoom = clamp_zoom(zoom_x.min(zoom_y), view);
    let center = bounds.center();
    Viewport {
        pan_x: canvas_width / 2.0 - center.x * zoom,
        pan_y: canvas_height / 2.0 - center.y * zoom,
        zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Size;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn screen_world_round_trip() {
        let viewport = Viewport::new(120.0, -40.0, 1.5);
        let world = Point::new(60.0, 60.0);
        let screen = viewport.world_to_screen(world);
        assert_eq!(screen, Point::new(210.0, 50.0));
        assert!(close(viewport.screen_to_world(screen), world));
    }

    #[test]
    fn fit_centers_bounds_with_padding() {
        let bounds = Bounds::from_rect(Point::new(0.0, 0.0), Size::new(1000.0, 500.0));
        let viewport = fit_view(&bounds, 1200.0, 800.0, &ViewConfig::default());
        assert!((viewport.zoom - 1.0).abs() < 1e-4);
        assert!(close(viewport.world_to_screen(bounds.center()), Point::new(600.0, 400.0)));
    }

    #[test]
    fn fit_clamps_zoom() {
        let view = ViewConfig::default();
        let tiny = Bounds::from_rect(Point::new(10.0, 10.0), Size::new(5.0, 5.0));
        assert_eq!(fit_view(&tiny, 1200.0, 800.0, &view).zoom, view.max_zoom);
        let huge = Bounds::from_rect(Point::ORIGIN, Size::new(100_000.0, 100_000.0));
        assert_eq!(fit_view(&huge, 1200.0, 800.0, &view).zoom, view.min_zoom);
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(30.0, 20.0, 1.0);
        let screen = Point::new(400.0, 300.0);
        let before = viewport.screen_to_world(screen);
        viewport.zoom_at(screen, 1.25, &ViewConfig::default());
        assert_eq!(viewport.zoom, 1.25);
        assert!(close(viewport.screen_to_world(screen), before));
    }
}
