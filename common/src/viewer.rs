//! Image viewer state: fitted layout plus zoom/pan.
//!
//! Layout is recomputed when the image decodes or the viewport changes size,
//! and every recompute resets the view to the fitted frame.

use crate::layout::{Layout, Point, Rect, Size, ViewTransform};
use crate::overlay::{self, OverlayShape};
use crate::region::ErrorRegion;
use crate::zoom::{ZoomDirection, ZoomPan};

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    viewport: Size,
    natural: Option<Size>,
    layout: Layout,
    zoom: ZoomPan,
}

impl Viewer {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn transform(&self) -> ViewTransform {
        self.zoom.transform()
    }

    pub fn zoom(&self) -> &ZoomPan {
        &self.zoom
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn is_ready(&self) -> bool {
        self.layout.ready
    }

    /// The image finished decoding with this natural size.
    pub fn on_image_decoded(&mut self, natural: Size) {
        self.natural = Some(natural);
        self.recompute();
    }

    /// A new image source was set; nothing is shown until it decodes.
    pub fn on_image_changed(&mut self) {
        self.natural = None;
        self.recompute();
    }

    /// Viewport resized. Returns `true` when the layout was recomputed.
    pub fn on_resize(&mut self, viewport: Size) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.layout = match self.natural {
            Some(natural) => Layout::compute(self.viewport, natural),
            None => Layout::default(),
        };
        self.zoom.reset();
    }

    pub fn wheel(&mut self, pointer: Point, delta_y: f64) -> bool {
        self.zoom.wheel(pointer, delta_y, &self.layout)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom
            .zoom_from_center(self.viewport, ZoomDirection::In, &self.layout)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom
            .zoom_from_center(self.viewport, ZoomDirection::Out, &self.layout)
    }

    pub fn begin_pan(&mut self, pointer: Point) {
        self.zoom.begin_pan(pointer, &self.layout);
    }

    pub fn pan_to(&mut self, pointer: Point) -> bool {
        self.zoom.pan_to(pointer)
    }

    pub fn end_pan(&mut self) {
        self.zoom.end_pan();
    }

    pub fn reset_view(&mut self) {
        self.zoom.reset();
    }

    pub fn can_zoom_out(&self) -> bool {
        self.layout.ready && self.zoom.can_zoom_out()
    }

    pub fn can_zoom_in(&self) -> bool {
        self.layout.ready && self.zoom.can_zoom_in()
    }

    /// The image in viewport space.
    pub fn image_rect(&self) -> Option<Rect> {
        if !self.layout.ready {
            return None;
        }
        let frame = Rect::new(0.0, 0.0, self.layout.render_w, self.layout.render_h);
        Some(self.transform().apply_rect(&self.layout, frame))
    }

    /// Overlay shapes mapped to viewport space.
    pub fn viewport_shapes(&self, regions: &[ErrorRegion]) -> Vec<OverlayShape> {
        let t = self.transform();
        overlay::render_overlay(regions, &self.layout)
            .into_iter()
            .map(|mut shape| {
                shape.rect = t.apply_rect(&self.layout, shape.rect);
                shape.badge = t.apply(&self.layout, shape.badge);
                shape
            })
            .collect()
    }

    /// Topmost live region under a viewport point.
    pub fn region_at(&self, regions: &[ErrorRegion], pointer: Point) -> Option<usize> {
        self.viewport_shapes(regions)
            .into_iter()
            .rev()
            .find(|s| s.rect.contains(pointer))
            .map(|s| s.source)
    }

    /// Viewport point to natural-image pixels.
    pub fn to_natural(&self, pointer: Point) -> Option<Point> {
        if !self.layout.ready {
            return None;
        }
        let render = self.transform().invert(&self.layout, pointer);
        Some(self.layout.render_to_natural(render))
    }
}
