//! Fit-to-viewport layout and view-space transforms.
//!
//! Three coordinate spaces are involved:
//! - natural: pixels of the decoded image
//! - render: the letterboxed image box, origin at its top-left corner
//! - viewport: the host widget, `offset + pan + render * scale`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_drawable(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle, top-left + size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanned by two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (b.x - a.x).abs(),
            h: (b.y - a.y).abs(),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Fit of a natural-size image inside a viewport.
///
/// `ready == false` means the image has not decoded yet or the viewport has
/// no area; nothing is drawn and gestures are ignored in that state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub ready: bool,
    pub natural_w: f64,
    pub natural_h: f64,
    pub render_w: f64,
    pub render_h: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Layout {
    /// Letterboxes `natural` inside `viewport`, centred, without cropping.
    pub fn compute(viewport: Size, natural: Size) -> Self {
        if !viewport.is_drawable() || !natural.is_drawable() {
            return Self::default();
        }
        let fit = (viewport.w / natural.w).min(viewport.h / natural.h);
        let render_w = natural.w * fit;
        let render_h = natural.h * fit;
        Self {
            ready: true,
            natural_w: natural.w,
            natural_h: natural.h,
            render_w,
            render_h,
            offset_x: (viewport.w - render_w) / 2.0,
            offset_y: (viewport.h - render_h) / 2.0,
        }
    }

    /// Fit for a dialog canvas bounded by `max`, anchored at the origin.
    ///
    /// With `allow_upscale == false` small images keep their natural size.
    pub fn fit_within(max: Size, natural: Size, allow_upscale: bool) -> Self {
        if !max.is_drawable() || !natural.is_drawable() {
            return Self::default();
        }
        let mut fit = (max.w / natural.w).min(max.h / natural.h);
        if !allow_upscale {
            fit = fit.min(1.0);
        }
        Self {
            ready: true,
            natural_w: natural.w,
            natural_h: natural.h,
            render_w: natural.w * fit,
            render_h: natural.h * fit,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Render pixels per natural pixel.
    pub fn render_scale(&self) -> f64 {
        if self.ready {
            self.render_w / self.natural_w
        } else {
            0.0
        }
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_w, self.natural_h)
    }

    pub fn render_size(&self) -> Size {
        Size::new(self.render_w, self.render_h)
    }

    /// The offset box (letterboxed image) in viewport space, before pan/zoom.
    pub fn render_rect(&self) -> Rect {
        Rect::new(self.offset_x, self.offset_y, self.render_w, self.render_h)
    }

    pub fn natural_to_render(&self, p: Point) -> Point {
        let s = self.render_scale();
        Point::new(p.x * s, p.y * s)
    }

    pub fn render_to_natural(&self, p: Point) -> Point {
        let s = self.render_scale();
        if s == 0.0 {
            return Point::default();
        }
        Point::new(p.x / s, p.y / s)
    }
}

/// Pan/zoom applied on top of the fitted layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Maps a render-space point to viewport space.
    pub fn apply(&self, layout: &Layout, p: Point) -> Point {
        Point::new(
            layout.offset_x + self.tx + p.x * self.scale,
            layout.offset_y + self.ty + p.y * self.scale,
        )
    }

    /// Maps a render-space rectangle to viewport space.
    pub fn apply_rect(&self, layout: &Layout, r: Rect) -> Rect {
        let origin = self.apply(layout, Point::new(r.x, r.y));
        Rect::new(origin.x, origin.y, r.w * self.scale, r.h * self.scale)
    }

    /// Inverse of [`ViewTransform::apply`].
    pub fn invert(&self, layout: &Layout, p: Point) -> Point {
        Point::new(
            (p.x - layout.offset_x - self.tx) / self.scale,
            (p.y - layout.offset_y - self.ty) / self.scale,
        )
    }
}
