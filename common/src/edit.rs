//! Pointer-driven region editing: drawing new boxes and moving/resizing
//! existing ones.
//!
//! Both sessions work on their own dialog canvas, fitted to the image with
//! [`Layout::fit_within`] and never upscaled. Pointer positions are canvas
//! coordinates; geometry is kept in natural pixels.

use crate::error::{Error, Result};
use crate::layout::{Layout, Point, Rect, Size};
use crate::region::{BoxGeometry, ErrorRegion, RegionStatus};

/// Hit radius around a resize handle, in canvas pixels.
pub const HANDLE_HIT_RADIUS: f64 = 15.0;
/// Drawn size of a handle square.
pub const HANDLE_SIZE: f64 = 10.0;
/// Floor applied to width and height on resize, natural pixels.
pub const MIN_BOX_SIZE: f64 = 20.0;
/// Smallest accepted width/height for a freshly drawn box, natural pixels.
pub const MIN_DRAW_SIZE: f64 = 2.0;

pub const DRAW_CANVAS_MAX: Size = Size { w: 800.0, h: 600.0 };
pub const EDIT_CANVAS_MAX: Size = Size { w: 900.0, h: 650.0 };

pub const DEFAULT_DRAW_LABEL: &str = "Hotspot";
/// Statuses offered when drawing.
pub const DRAW_STATUSES: [RegionStatus; 2] = [RegionStatus::Faulty, RegionStatus::Potential];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    W,
    E,
}

impl Handle {
    /// Hit-test order: corners first, then edge midpoints.
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    /// Handle position on a canvas rectangle.
    pub fn anchor(self, r: &Rect) -> Point {
        let (cx, cy) = (r.x + r.w / 2.0, r.y + r.h / 2.0);
        match self {
            Handle::Nw => Point::new(r.x, r.y),
            Handle::Ne => Point::new(r.right(), r.y),
            Handle::Sw => Point::new(r.x, r.bottom()),
            Handle::Se => Point::new(r.right(), r.bottom()),
            Handle::N => Point::new(cx, r.y),
            Handle::S => Point::new(cx, r.bottom()),
            Handle::W => Point::new(r.x, cy),
            Handle::E => Point::new(r.right(), cy),
        }
    }

    /// Applies a natural-pixel pointer delta to the geometry at drag start.
    ///
    /// Width/height change on the handle's axes and are floored at
    /// [`MIN_BOX_SIZE`]; the centre moves by half the delta on those axes.
    pub fn resize(self, from: BoxGeometry, dx: f64, dy: f64) -> BoxGeometry {
        let mut g = from;
        let (width, height) = match self {
            Handle::Nw => (Some(from.w - dx), Some(from.h - dy)),
            Handle::Ne => (Some(from.w + dx), Some(from.h - dy)),
            Handle::Sw => (Some(from.w - dx), Some(from.h + dy)),
            Handle::Se => (Some(from.w + dx), Some(from.h + dy)),
            Handle::N => (None, Some(from.h - dy)),
            Handle::S => (None, Some(from.h + dy)),
            Handle::W => (Some(from.w - dx), None),
            Handle::E => (Some(from.w + dx), None),
        };
        if let Some(w) = width {
            g.w = w.max(MIN_BOX_SIZE);
            g.cx = from.cx + dx / 2.0;
        }
        if let Some(h) = height {
            g.h = h.max(MIN_BOX_SIZE);
            g.cy = from.cy + dy / 2.0;
        }
        g
    }

    pub fn cursor(self) -> CursorIcon {
        CursorIcon::Resize(self)
    }
}

impl std::str::FromStr for Handle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nw" => Ok(Handle::Nw),
            "ne" => Ok(Handle::Ne),
            "sw" => Ok(Handle::Sw),
            "se" => Ok(Handle::Se),
            "n" => Ok(Handle::N),
            "s" => Ok(Handle::S),
            "w" => Ok(Handle::W),
            "e" => Ok(Handle::E),
            _ => Err(format!("Unknown handle: {}. Use nw, ne, sw, se, n, s, w or e", s)),
        }
    }
}

/// Pointer cursor requested by an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    Default,
    Crosshair,
    Move,
    Resize(Handle),
}

impl CursorIcon {
    /// CSS-style cursor name.
    pub fn name(&self) -> &'static str {
        match self {
            CursorIcon::Default => "default",
            CursorIcon::Crosshair => "crosshair",
            CursorIcon::Move => "move",
            CursorIcon::Resize(h) => match h {
                Handle::Nw => "nw-resize",
                Handle::Ne => "ne-resize",
                Handle::Sw => "sw-resize",
                Handle::Se => "se-resize",
                Handle::N => "n-resize",
                Handle::S => "s-resize",
                Handle::W => "w-resize",
                Handle::E => "e-resize",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Handle(Handle),
    Move,
}

// ---------------------------------------------------------------------------
// Draw
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    Dragging { start: Point, current: Point },
    Drawn { rect: Rect },
    Discarded,
    Committed,
}

/// Drag-to-create session for a new region.
#[derive(Debug, Clone)]
pub struct DrawSession {
    layout: Layout,
    state: DrawState,
    pub status: RegionStatus,
    pub label: String,
    pub comment: String,
}

impl DrawSession {
    pub fn new(natural: Size) -> Self {
        Self {
            layout: Layout::fit_within(DRAW_CANVAS_MAX, natural, false),
            state: DrawState::Idle,
            status: RegionStatus::Faulty,
            label: DEFAULT_DRAW_LABEL.to_string(),
            comment: String::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, DrawState::Discarded | DrawState::Committed)
    }

    pub fn cursor(&self) -> CursorIcon {
        if self.layout.ready && !self.is_finished() {
            CursorIcon::Crosshair
        } else {
            CursorIcon::Default
        }
    }

    /// Starts a drag. Redrawing over a finished rectangle replaces it.
    pub fn pointer_down(&mut self, p: Point) {
        if !self.layout.ready {
            return;
        }
        if matches!(self.state, DrawState::Idle | DrawState::Drawn { .. }) {
            self.state = DrawState::Dragging { start: p, current: p };
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        if let DrawState::Dragging { start, .. } = self.state {
            self.state = DrawState::Dragging { start, current: p };
        }
    }

    pub fn pointer_up(&mut self, p: Point) {
        if let DrawState::Dragging { start, .. } = self.state {
            self.state = DrawState::Drawn {
                rect: Rect::from_corners(start, p),
            };
        }
    }

    /// Rectangle to preview, in canvas coordinates.
    pub fn preview(&self) -> Option<Rect> {
        match self.state {
            DrawState::Dragging { start, current } => Some(Rect::from_corners(start, current)),
            DrawState::Drawn { rect } => Some(rect),
            _ => None,
        }
    }

    /// Natural-pixel geometry of the current rectangle.
    pub fn natural_geometry(&self) -> Option<BoxGeometry> {
        let rect = self.preview()?;
        let to_natural = self.layout.natural_w / self.layout.render_w;
        Some(BoxGeometry::from_corner(
            rect.x * to_natural,
            rect.y * to_natural,
            rect.w * to_natural,
            rect.h * to_natural,
        ))
    }

    pub fn discard(&mut self) {
        self.state = DrawState::Discarded;
    }

    /// Emits a draft region from the finished rectangle.
    ///
    /// Rectangles smaller than [`MIN_DRAW_SIZE`] on either axis are rejected
    /// and the session stays in `Drawn` so the user can redraw.
    pub fn commit(&mut self, user: &str, now: &str) -> Result<ErrorRegion> {
        if !matches!(self.state, DrawState::Drawn { .. }) {
            return Err(Error::Validation("Draw a box on the image first".to_string()));
        }
        let geometry = self
            .natural_geometry()
            .ok_or_else(|| Error::Validation("Image is not loaded".to_string()))?;
        if geometry.w < MIN_DRAW_SIZE || geometry.h < MIN_DRAW_SIZE {
            return Err(Error::Validation(format!(
                "Box is too small ({:.0}×{:.0} px); drag a larger area",
                geometry.w, geometry.h
            )));
        }

        let mut region = ErrorRegion::with_geometry(geometry, self.status);
        region.label = non_blank(&self.label).or_else(|| Some(DEFAULT_DRAW_LABEL.to_string()));
        region.comment = non_blank(&self.comment);
        region.color_rgb = Some(self.status.color_rgb());
        region.is_manual = true;
        let user = non_blank(user).unwrap_or_else(|| ANONYMOUS.to_string());
        region.created_by = Some(user.clone());
        region.created_at = Some(now.to_string());
        region.last_modified_by = Some(user);
        region.last_modified_at = Some(now.to_string());
        self.state = DrawState::Committed;
        Ok(region)
    }
}

const ANONYMOUS: &str = "Anonymous";

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ---------------------------------------------------------------------------
// Move / resize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxEditState {
    Idle,
    DraggingMove { start: Point, from: BoxGeometry },
    DraggingResize { handle: Handle, start: Point, from: BoxGeometry },
}

/// Move/resize session for one existing region.
#[derive(Debug, Clone)]
pub struct BoxEditSession {
    region: ErrorRegion,
    layout: Layout,
    original: BoxGeometry,
    current: BoxGeometry,
    state: BoxEditState,
    pub status: RegionStatus,
    pub comment: String,
    pub user_id: String,
}

impl BoxEditSession {
    /// Opens a session, converting normalized geometry to natural pixels.
    ///
    /// Returns `None` when the image size is unknown or the region has no
    /// usable geometry.
    pub fn open(region: &ErrorRegion, natural: Size, acting_user: Option<&str>) -> Option<Self> {
        if !natural.is_drawable() {
            return None;
        }
        let geometry = region.geometry().resolve(natural)?;
        let user_id = acting_user
            .and_then(non_blank)
            .or_else(|| region.last_modified_by.clone())
            .unwrap_or_default();
        Some(Self {
            region: region.clone(),
            layout: Layout::fit_within(EDIT_CANVAS_MAX, natural, false),
            original: geometry,
            current: geometry,
            state: BoxEditState::Idle,
            status: region.status,
            comment: region.comment.clone().unwrap_or_default(),
            user_id,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> BoxEditState {
        self.state
    }

    pub fn region(&self) -> &ErrorRegion {
        &self.region
    }

    /// Pending geometry, natural pixels.
    pub fn geometry(&self) -> BoxGeometry {
        self.current
    }

    pub fn is_modified(&self) -> bool {
        self.current != self.original
            || self.status != self.region.status
            || non_blank(&self.comment) != self.region.comment.as_deref().and_then(non_blank)
    }

    /// Current box on the canvas.
    pub fn canvas_rect(&self) -> Rect {
        let s = self.layout.render_scale();
        Rect::new(
            self.current.left() * s,
            self.current.top() * s,
            self.current.w * s,
            self.current.h * s,
        )
    }

    /// Handles are tested before the body.
    pub fn hit_test(&self, p: Point) -> Option<Hit> {
        let rect = self.canvas_rect();
        for handle in Handle::ALL {
            let a = handle.anchor(&rect);
            if (p.x - a.x).abs() <= HANDLE_HIT_RADIUS && (p.y - a.y).abs() <= HANDLE_HIT_RADIUS {
                return Some(Hit::Handle(handle));
            }
        }
        rect.contains(p).then_some(Hit::Move)
    }

    pub fn cursor_at(&self, p: Point) -> CursorIcon {
        match self.state {
            BoxEditState::DraggingMove { .. } => CursorIcon::Move,
            BoxEditState::DraggingResize { handle, .. } => handle.cursor(),
            BoxEditState::Idle => match self.hit_test(p) {
                Some(Hit::Handle(h)) => h.cursor(),
                Some(Hit::Move) => CursorIcon::Move,
                None => CursorIcon::Default,
            },
        }
    }

    pub fn pointer_down(&mut self, p: Point) {
        if !self.layout.ready {
            return;
        }
        self.state = match self.hit_test(p) {
            Some(Hit::Handle(handle)) => BoxEditState::DraggingResize {
                handle,
                start: p,
                from: self.current,
            },
            Some(Hit::Move) => BoxEditState::DraggingMove {
                start: p,
                from: self.current,
            },
            None => BoxEditState::Idle,
        };
    }

    /// Applies a drag and returns the cursor to show.
    pub fn pointer_move(&mut self, p: Point) -> CursorIcon {
        let s = self.layout.render_scale();
        let to_natural = |start: Point| ((p.x - start.x) / s, (p.y - start.y) / s);
        match self.state {
            BoxEditState::DraggingMove { start, from } => {
                let (dx, dy) = to_natural(start);
                self.current = BoxGeometry {
                    cx: from.cx + dx,
                    cy: from.cy + dy,
                    ..from
                };
            }
            BoxEditState::DraggingResize { handle, start, from } => {
                let (dx, dy) = to_natural(start);
                self.current = handle.resize(from, dx, dy);
            }
            BoxEditState::Idle => {}
        }
        self.cursor_at(p)
    }

    /// Pointer up or pointer leave; keeps the pending geometry.
    pub fn pointer_up(&mut self) {
        self.state = BoxEditState::Idle;
    }

    /// Sets the pending geometry from typed coordinates, natural pixels.
    pub fn set_geometry(&mut self, geometry: BoxGeometry) {
        self.current = BoxGeometry {
            w: geometry.w.max(MIN_BOX_SIZE),
            h: geometry.h.max(MIN_BOX_SIZE),
            ..geometry
        };
        self.state = BoxEditState::Idle;
    }

    /// Moves the pending box by a natural-pixel offset.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.current.cx += dx;
        self.current.cy += dy;
    }

    /// Drags `handle` by a natural-pixel offset without pointer events.
    pub fn resize_by(&mut self, handle: Handle, dx: f64, dy: f64) {
        self.current = handle.resize(self.current, dx, dy);
    }

    /// Restores the geometry the session opened with.
    pub fn reset(&mut self) {
        self.current = self.original;
        self.state = BoxEditState::Idle;
    }

    pub fn can_save(&self) -> bool {
        non_blank(&self.user_id).is_some()
    }

    /// Builds the updated region. Requires a non-blank user id.
    pub fn save(&self, now: &str) -> Result<ErrorRegion> {
        let user = non_blank(&self.user_id)
            .ok_or_else(|| Error::Validation("User ID is required to save changes".to_string()))?;
        let mut updated = self.region.clone();
        updated.set_geometry(self.current);
        updated.status = self.status;
        updated.comment = non_blank(&self.comment);
        updated.stamp_manual_edit(&user, now);
        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Status/label/comment edit without geometry changes.
#[derive(Debug, Clone)]
pub struct PropertyEdit {
    region: ErrorRegion,
    pub status: RegionStatus,
    pub label: String,
    pub comment: String,
    pub user_id: String,
}

impl PropertyEdit {
    pub fn open(region: &ErrorRegion, acting_user: Option<&str>) -> Self {
        Self {
            region: region.clone(),
            status: region.status,
            label: region.label.clone().unwrap_or_default(),
            comment: region.comment.clone().unwrap_or_default(),
            user_id: acting_user
                .and_then(non_blank)
                .or_else(|| region.last_modified_by.clone())
                .unwrap_or_default(),
        }
    }

    pub fn can_save(&self) -> bool {
        non_blank(&self.user_id).is_some()
    }

    pub fn save(&self, now: &str) -> Result<ErrorRegion> {
        let user = non_blank(&self.user_id)
            .ok_or_else(|| Error::Validation("User ID is required to save changes".to_string()))?;
        let mut updated = self.region.clone();
        updated.status = self.status;
        updated.label = non_blank(&self.label);
        updated.comment = non_blank(&self.comment);
        updated.stamp_manual_edit(&user, now);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2025-06-01T12:00:00Z";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn box_region(cx: f64, cy: f64, w: f64, h: f64) -> ErrorRegion {
        let mut r = ErrorRegion::with_geometry(BoxGeometry::new(cx, cy, w, h), RegionStatus::Potential);
        r.id = Some("42".into());
        r.confidence = Some(0.73);
        r
    }

    #[test]
    fn test_draw_commit_converts_to_natural_pixels() {
        // 1600x1200 image on an 800x600 canvas: scale 0.5
        let mut s = DrawSession::new(Size::new(1600.0, 1200.0));
        s.pointer_down(Point::new(100.0, 50.0));
        s.pointer_move(Point::new(150.0, 80.0));
        s.pointer_up(Point::new(200.0, 150.0));
        assert!(matches!(s.state(), DrawState::Drawn { .. }));
        let r = s.commit("eng-01", NOW).unwrap();
        assert!(r.id.is_none());
        assert!(r.is_manual);
        assert_eq!(r.status, RegionStatus::Faulty);
        assert_eq!(r.label.as_deref(), Some("Hotspot"));
        assert_eq!(r.created_by.as_deref(), Some("eng-01"));
        assert_eq!(r.geometry(), BoxGeometry::new(300.0, 200.0, 200.0, 200.0));
        assert_eq!(s.state(), DrawState::Committed);
    }

    #[test]
    fn test_draw_any_direction() {
        let mut s = DrawSession::new(Size::new(400.0, 300.0));
        s.pointer_down(Point::new(200.0, 150.0));
        s.pointer_up(Point::new(100.0, 100.0));
        let r = s.commit("", NOW).unwrap();
        assert_eq!(r.geometry(), BoxGeometry::new(150.0, 125.0, 100.0, 50.0));
        assert_eq!(r.created_by.as_deref(), Some("Anonymous"));
    }

    #[test]
    fn test_draw_rejects_degenerate_box() {
        let mut s = DrawSession::new(Size::new(400.0, 300.0));
        s.pointer_down(Point::new(20.0, 20.0));
        s.pointer_up(Point::new(20.5, 90.0));
        assert!(matches!(s.commit("eng", NOW), Err(Error::Validation(_))));
        assert!(matches!(s.state(), DrawState::Drawn { .. }));
        // redraw over the rejected rectangle
        s.pointer_down(Point::new(20.0, 20.0));
        s.pointer_up(Point::new(60.0, 90.0));
        assert!(s.commit("eng", NOW).is_ok());
    }

    #[test]
    fn test_draw_commit_requires_drawn_state() {
        let mut s = DrawSession::new(Size::new(400.0, 300.0));
        assert!(s.commit("eng", NOW).is_err());
        s.pointer_down(Point::new(1.0, 1.0));
        assert!(s.commit("eng", NOW).is_err());
        s.discard();
        assert!(s.is_finished());
        s.pointer_down(Point::new(1.0, 1.0));
        assert_eq!(s.state(), DrawState::Discarded);
    }

    #[test]
    fn test_resize_se_clamps_to_minimum() {
        let from = BoxGeometry::new(200.0, 200.0, 100.0, 100.0);
        let g = Handle::Se.resize(from, -500.0, -500.0);
        assert_eq!(g.w, MIN_BOX_SIZE);
        assert_eq!(g.h, MIN_BOX_SIZE);
    }

    #[test]
    fn test_resize_rule_table() {
        let from = BoxGeometry::new(100.0, 100.0, 60.0, 40.0);
        let (dx, dy) = (10.0, 6.0);
        assert_eq!(Handle::Nw.resize(from, dx, dy), BoxGeometry::new(105.0, 103.0, 50.0, 34.0));
        assert_eq!(Handle::Ne.resize(from, dx, dy), BoxGeometry::new(105.0, 103.0, 70.0, 34.0));
        assert_eq!(Handle::Sw.resize(from, dx, dy), BoxGeometry::new(105.0, 103.0, 50.0, 46.0));
        assert_eq!(Handle::Se.resize(from, dx, dy), BoxGeometry::new(105.0, 103.0, 70.0, 46.0));
        assert_eq!(Handle::N.resize(from, dx, dy), BoxGeometry::new(100.0, 103.0, 60.0, 34.0));
        assert_eq!(Handle::S.resize(from, dx, dy), BoxGeometry::new(100.0, 103.0, 60.0, 46.0));
        assert_eq!(Handle::W.resize(from, dx, dy), BoxGeometry::new(105.0, 100.0, 50.0, 40.0));
        assert_eq!(Handle::E.resize(from, dx, dy), BoxGeometry::new(105.0, 100.0, 70.0, 40.0));
    }

    #[test]
    fn test_session_se_drag_through_pointer_events() {
        // 900x650 image fits at scale 1
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let mut s = BoxEditSession::open(&region, Size::new(900.0, 650.0), Some("eng")).unwrap();
        s.pointer_down(Point::new(350.0, 350.0));
        assert!(matches!(s.state(), BoxEditState::DraggingResize { handle: Handle::Se, .. }));
        let cursor = s.pointer_move(Point::new(0.0, 0.0));
        assert_eq!(cursor.name(), "se-resize");
        s.pointer_up();
        assert_eq!(s.geometry().w, 20.0);
        assert_eq!(s.geometry().h, 20.0);
        assert_eq!(s.state(), BoxEditState::Idle);
    }

    #[test]
    fn test_handles_take_precedence_over_body() {
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let s = BoxEditSession::open(&region, Size::new(900.0, 650.0), Some("eng")).unwrap();
        // inside the box but within 15px of the nw corner
        assert_eq!(s.hit_test(Point::new(260.0, 260.0)), Some(Hit::Handle(Handle::Nw)));
        assert_eq!(s.hit_test(Point::new(300.0, 300.0)), Some(Hit::Move));
        assert_eq!(s.hit_test(Point::new(600.0, 600.0)), None);
        assert_eq!(s.cursor_at(Point::new(300.0, 300.0)), CursorIcon::Move);
        assert_eq!(s.cursor_at(Point::new(350.0, 300.0)).name(), "e-resize");
        assert_eq!(s.cursor_at(Point::new(600.0, 600.0)).name(), "default");
    }

    #[test]
    fn test_move_uses_canvas_scale() {
        // 1800x1300 image on a 900x650 canvas: one canvas px is two natural px
        let region = box_region(600.0, 600.0, 200.0, 200.0);
        let mut s = BoxEditSession::open(&region, Size::new(1800.0, 1300.0), Some("eng")).unwrap();
        s.pointer_down(Point::new(300.0, 300.0));
        s.pointer_move(Point::new(310.0, 295.0));
        s.pointer_up();
        let g = s.geometry();
        assert!(approx(g.cx, 620.0) && approx(g.cy, 590.0));
        assert_eq!(g.w, 200.0);
    }

    #[test]
    fn test_reset_restores_original() {
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let mut s = BoxEditSession::open(&region, Size::new(900.0, 650.0), Some("eng")).unwrap();
        s.pointer_down(Point::new(300.0, 300.0));
        s.pointer_move(Point::new(340.0, 320.0));
        s.pointer_up();
        assert!(s.is_modified());
        s.reset();
        assert_eq!(s.geometry(), BoxGeometry::new(300.0, 300.0, 100.0, 100.0));
        assert!(!s.is_modified());
    }

    #[test]
    fn test_normalized_region_opens_in_pixels() {
        let region = box_region(0.5, 0.5, 0.2, 0.2);
        let s = BoxEditSession::open(&region, Size::new(1000.0, 500.0), None).unwrap();
        let g = s.geometry();
        assert!(approx(g.cx, 500.0) && approx(g.cy, 250.0));
        assert!(approx(g.w, 200.0) && approx(g.h, 100.0));
    }

    #[test]
    fn test_save_requires_user_and_stamps_provenance() {
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let mut s = BoxEditSession::open(&region, Size::new(900.0, 650.0), None).unwrap();
        assert!(!s.can_save());
        assert!(matches!(s.save(NOW), Err(Error::Validation(_))));

        s.user_id = "  eng-07 ".into();
        s.status = RegionStatus::Faulty;
        s.comment = "bushing hot".into();
        let saved = s.save(NOW).unwrap();
        assert_eq!(saved.id.as_deref(), Some("42"));
        assert_eq!(saved.confidence, None);
        assert_eq!(saved.last_modified_by.as_deref(), Some("eng-07"));
        assert_eq!(saved.last_modified_at.as_deref(), Some(NOW));
        assert_eq!(saved.status, RegionStatus::Faulty);
        assert_eq!(saved.color_rgb, Some([255, 0, 0]));
        assert!(saved.is_manual);
    }

    #[test]
    fn test_open_rejects_unusable_geometry() {
        let region = ErrorRegion::default();
        assert!(BoxEditSession::open(&region, Size::new(900.0, 650.0), None).is_none());
        let ok = box_region(1.0, 1.0, 1.0, 1.0);
        assert!(BoxEditSession::open(&ok, Size::new(0.0, 0.0), None).is_none());
    }

    #[test]
    fn test_property_edit() {
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let mut e = PropertyEdit::open(&region, Some("eng"));
        e.status = RegionStatus::Normal;
        e.label = "Clamp".into();
        let saved = e.save(NOW).unwrap();
        assert_eq!(saved.status, RegionStatus::Normal);
        assert_eq!(saved.label.as_deref(), Some("Clamp"));
        assert_eq!(saved.geometry(), region.geometry());
        assert_eq!(saved.confidence, None);

        e.user_id = "   ".into();
        assert!(e.save(NOW).is_err());
    }

    #[test]
    fn test_typed_geometry_and_keyboard_edits() {
        let region = box_region(300.0, 300.0, 100.0, 100.0);
        let mut s = BoxEditSession::open(&region, Size::new(900.0, 650.0), Some("eng")).unwrap();
        s.nudge(10.0, -5.0);
        assert_eq!(s.geometry(), BoxGeometry::new(310.0, 295.0, 100.0, 100.0));
        s.resize_by(Handle::E, 40.0, 0.0);
        assert!(approx(s.geometry().w, 140.0));
        assert!(approx(s.geometry().cx, 330.0));
        s.set_geometry(BoxGeometry::new(50.0, 50.0, 5.0, 30.0));
        assert_eq!(s.geometry().w, MIN_BOX_SIZE);
        assert_eq!("SE".parse::<Handle>(), Ok(Handle::Se));
        assert!("x".parse::<Handle>().is_err());
    }

    #[test]
    fn test_cursor_names() {
        assert_eq!(Handle::Nw.cursor().name(), "nw-resize");
        assert_eq!(Handle::S.cursor().name(), "s-resize");
        assert_eq!(CursorIcon::Move.name(), "move");
    }
}
