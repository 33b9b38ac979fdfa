//! Cursor-anchored zoom and drag panning.

use crate::layout::{Layout, Point, Size, ViewTransform};

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 8.0;
pub const ZOOM_STEP: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: a positive delta (scroll down) zooms out.
    pub fn from_wheel(delta_y: f64) -> Option<Self> {
        if delta_y > 0.0 {
            Some(ZoomDirection::Out)
        } else if delta_y < 0.0 {
            Some(ZoomDirection::In)
        } else {
            None
        }
    }

    fn factor(self) -> f64 {
        match self {
            ZoomDirection::In => ZOOM_STEP,
            ZoomDirection::Out => 1.0 / ZOOM_STEP,
        }
    }
}

/// Zoom/pan state for one viewer.
#[derive(Debug, Clone, Default)]
pub struct ZoomPan {
    transform: ViewTransform,
    drag_from: Option<Point>,
}

impl ZoomPan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn is_panning(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Zooms one step about `pointer` (viewport coordinates).
    ///
    /// Returns `true` when the transform changed.
    pub fn zoom_at(&mut self, pointer: Point, direction: ZoomDirection, layout: &Layout) -> bool {
        if !layout.ready {
            return false;
        }
        let current = self.transform.scale;
        let target = (current * direction.factor()).clamp(MIN_SCALE, MAX_SCALE);
        if target == current {
            return false;
        }
        let gx = pointer.x - layout.offset_x;
        let gy = pointer.y - layout.offset_y;
        let ratio = target / current;
        let tx = gx - ratio * (gx - self.transform.tx);
        let ty = gy - ratio * (gy - self.transform.ty);
        self.transform = ViewTransform {
            scale: target,
            tx,
            ty,
        };
        true
    }

    /// Button zoom: anchors at the viewport centre.
    pub fn zoom_from_center(&mut self, viewport: Size, direction: ZoomDirection, layout: &Layout) -> bool {
        let center = Point::new(viewport.w / 2.0, viewport.h / 2.0);
        self.zoom_at(center, direction, layout)
    }

    /// Wheel gesture; zero deltas are ignored.
    pub fn wheel(&mut self, pointer: Point, delta_y: f64, layout: &Layout) -> bool {
        match ZoomDirection::from_wheel(delta_y) {
            Some(direction) => self.zoom_at(pointer, direction, layout),
            None => false,
        }
    }

    pub fn begin_pan(&mut self, pointer: Point, layout: &Layout) {
        if layout.ready {
            self.drag_from = Some(pointer);
        }
    }

    /// Adds the pointer delta since the previous move to the translation.
    pub fn pan_to(&mut self, pointer: Point) -> bool {
        let Some(last) = self.drag_from else {
            return false;
        };
        self.transform.tx += pointer.x - last.x;
        self.transform.ty += pointer.y - last.y;
        self.drag_from = Some(pointer);
        true
    }

    /// Pointer up or pointer leave.
    pub fn end_pan(&mut self) {
        self.drag_from = None;
    }

    pub fn reset(&mut self) {
        self.transform = ViewTransform::IDENTITY;
        self.drag_from = None;
    }

    pub fn can_zoom_out(&self) -> bool {
        self.transform.scale > MIN_SCALE
    }

    pub fn can_zoom_in(&self) -> bool {
        self.transform.scale < MAX_SCALE
    }

    /// Zoom level as a whole percentage of the fitted view.
    pub fn percent(&self) -> u32 {
        (self.transform.scale * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::compute(Size::new(800.0, 600.0), Size::new(1920.0, 1080.0))
    }

    #[test]
    fn test_zoom_in_clamps_at_max() {
        let l = layout();
        let mut z = ZoomPan::new();
        for _ in 0..50 {
            z.zoom_at(Point::new(400.0, 300.0), ZoomDirection::In, &l);
        }
        assert_eq!(z.scale(), MAX_SCALE);
        assert!(!z.can_zoom_in());
        assert!(!z.zoom_at(Point::new(10.0, 10.0), ZoomDirection::In, &l));
    }

    #[test]
    fn test_zoom_out_clamps_at_min() {
        let l = layout();
        let mut z = ZoomPan::new();
        z.zoom_at(Point::new(400.0, 300.0), ZoomDirection::In, &l);
        for _ in 0..50 {
            z.zoom_at(Point::new(100.0, 200.0), ZoomDirection::Out, &l);
        }
        assert_eq!(z.scale(), MIN_SCALE);
        assert!(!z.can_zoom_out());
    }

    #[test]
    fn test_zoom_in_then_out_restores_transform() {
        let l = layout();
        let mut z = ZoomPan::new();
        z.zoom_at(Point::new(500.0, 220.0), ZoomDirection::In, &l);
        z.begin_pan(Point::new(0.0, 0.0), &l);
        z.pan_to(Point::new(-40.0, 25.0));
        z.end_pan();
        let before = z.transform();

        let pointer = Point::new(321.0, 123.0);
        assert!(z.zoom_at(pointer, ZoomDirection::In, &l));
        assert!(z.zoom_at(pointer, ZoomDirection::Out, &l));
        let after = z.transform();
        assert!((after.scale - before.scale).abs() < 1e-9);
        assert!((after.tx - before.tx).abs() < 1e-9);
        assert!((after.ty - before.ty).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor_fixed() {
        let l = layout();
        let mut z = ZoomPan::new();
        let pointer = Point::new(600.0, 250.0);
        let under = z.transform().invert(&l, pointer);
        z.zoom_at(pointer, ZoomDirection::In, &l);
        let projected = z.transform().apply(&l, under);
        assert!((projected.x - pointer.x).abs() < 1e-9);
        assert!((projected.y - pointer.y).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_direction() {
        let l = layout();
        let mut z = ZoomPan::new();
        assert!(!z.wheel(Point::new(1.0, 1.0), 120.0, &l));
        assert!(z.wheel(Point::new(1.0, 1.0), -120.0, &l));
        assert!((z.scale() - ZOOM_STEP).abs() < 1e-12);
        assert!(!z.wheel(Point::new(1.0, 1.0), 0.0, &l));
    }

    #[test]
    fn test_pan_accumulates_deltas_only_while_dragging() {
        let l = layout();
        let mut z = ZoomPan::new();
        assert!(!z.pan_to(Point::new(50.0, 50.0)));
        z.begin_pan(Point::new(10.0, 10.0), &l);
        z.pan_to(Point::new(15.0, 7.0));
        z.pan_to(Point::new(25.0, 17.0));
        z.end_pan();
        z.pan_to(Point::new(90.0, 90.0));
        assert_eq!(z.transform().tx, 15.0);
        assert_eq!(z.transform().ty, 7.0);
    }

    #[test]
    fn test_gestures_ignored_until_ready() {
        let l = Layout::default();
        let mut z = ZoomPan::new();
        assert!(!z.zoom_from_center(Size::new(800.0, 600.0), ZoomDirection::In, &l));
        z.begin_pan(Point::new(0.0, 0.0), &l);
        assert!(!z.is_panning());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let l = layout();
        let mut z = ZoomPan::new();
        z.reset();
        assert!(z.transform().is_identity());
        z.zoom_from_center(Size::new(800.0, 600.0), ZoomDirection::In, &l);
        z.begin_pan(Point::new(0.0, 0.0), &l);
        z.pan_to(Point::new(33.0, -8.0));
        z.reset();
        assert_eq!(z.transform(), ViewTransform::IDENTITY);
        assert!(!z.is_panning());
        z.reset();
        assert_eq!(z.transform(), ViewTransform::IDENTITY);
    }
}
