//! Region edits driven from typed input rather than pointer gestures.
//!
//! Each helper runs the same edit session the desktop dialogs use, so the
//! validation and provenance rules are identical.

use thermal_inspect_common::edit::{BoxEditSession, DrawSession, Handle, PropertyEdit};
use thermal_inspect_common::layout::{Point, Size};
use thermal_inspect_common::region::{BoxGeometry, ErrorRegion, RegionStatus};

use crate::error::{InspectError, Result};

/// Box given by its top-left corner and size, natural pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl std::str::FromStr for CornerBox {
    type Err = String;

    /// `x,y,w,h`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| format!("Expected x,y,w,h numbers, got: {}", s))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(CornerBox { x: *x, y: *y, w: *w, h: *h }),
            _ => Err(format!("Expected four values x,y,w,h, got: {}", s)),
        }
    }
}

/// Pointer offset `dx,dy` in natural pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl std::str::FromStr for Offset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| format!("Expected dx,dy, got: {}", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("Expected dx,dy numbers, got: {}", s))
        };
        Ok(Offset {
            dx: parse(a)?,
            dy: parse(b)?,
        })
    }
}

/// Draft for a new region.
#[derive(Debug, Clone)]
pub struct DrawInput {
    pub rect: CornerBox,
    pub status: RegionStatus,
    pub label: Option<String>,
    pub comment: Option<String>,
}

/// Draws `input.rect` on the draw canvas and commits it.
pub fn draw_region(natural: Size, input: &DrawInput, user: &str, now: &str) -> Result<ErrorRegion> {
    let mut session = DrawSession::new(natural);
    if !session.layout().ready {
        return Err(InspectError::Validation("Image is not loaded".to_string()));
    }
    session.status = input.status;
    if let Some(label) = &input.label {
        session.label = label.clone();
    }
    session.comment = input.comment.clone().unwrap_or_default();

    let s = session.layout().render_scale();
    let r = input.rect;
    session.pointer_down(Point::new(r.x * s, r.y * s));
    session.pointer_move(Point::new((r.x + r.w) * s, (r.y + r.h) * s));
    session.pointer_up(Point::new((r.x + r.w) * s, (r.y + r.h) * s));
    Ok(session.commit(user, now)?)
}

/// Geometry change for an existing region.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxChange {
    pub set: Option<CornerBox>,
    pub offset: Option<Offset>,
    pub resize: Option<(Handle, Offset)>,
    pub status: Option<RegionStatus>,
}

impl BoxChange {
    pub fn is_empty(&self) -> bool {
        self.set.is_none() && self.offset.is_none() && self.resize.is_none()
    }
}

/// Applies a move/resize through a box-edit session and saves it.
pub fn edit_box(
    region: &ErrorRegion,
    natural: Size,
    change: &BoxChange,
    acting_user: Option<&str>,
    comment: Option<&str>,
    now: &str,
) -> Result<ErrorRegion> {
    let mut session = BoxEditSession::open(region, natural, acting_user)
        .ok_or_else(|| InspectError::Validation("Region has no usable geometry".to_string()))?;
    if let Some(b) = change.set {
        session.set_geometry(BoxGeometry::from_corner(b.x, b.y, b.w, b.h));
    }
    if let Some(o) = change.offset {
        session.nudge(o.dx, o.dy);
    }
    if let Some((handle, o)) = change.resize {
        session.resize_by(handle, o.dx, o.dy);
    }
    if let Some(status) = change.status {
        session.status = status;
    }
    if let Some(comment) = comment {
        session.comment = comment.to_string();
    }
    Ok(session.save(now)?)
}

/// Property change for an existing region.
#[derive(Debug, Clone, Default)]
pub struct PropertyChange {
    pub status: Option<RegionStatus>,
    pub label: Option<String>,
    pub comment: Option<String>,
}

pub fn edit_properties(
    region: &ErrorRegion,
    change: &PropertyChange,
    acting_user: Option<&str>,
    now: &str,
) -> Result<ErrorRegion> {
    let mut edit = PropertyEdit::open(region, acting_user);
    if let Some(status) = change.status {
        edit.status = status;
    }
    if let Some(label) = &change.label {
        edit.label = label.clone();
    }
    if let Some(comment) = &change.comment {
        edit.comment = comment.clone();
    }
    Ok(edit.save(now)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2025-06-01T12:00:00Z";

    #[test]
    fn test_parse_inputs() {
        let b: CornerBox = "10, 20,30,40".parse().unwrap();
        assert_eq!(b, CornerBox { x: 10.0, y: 20.0, w: 30.0, h: 40.0 });
        assert!("1,2,3".parse::<CornerBox>().is_err());
        let o: Offset = "-5,2.5".parse().unwrap();
        assert_eq!(o, Offset { dx: -5.0, dy: 2.5 });
        assert!("5".parse::<Offset>().is_err());
    }

    #[test]
    fn test_draw_region_in_natural_pixels() {
        let input = DrawInput {
            rect: CornerBox { x: 100.0, y: 200.0, w: 300.0, h: 150.0 },
            status: RegionStatus::Faulty,
            label: None,
            comment: Some("hot joint".into()),
        };
        let r = draw_region(Size::new(1920.0, 1080.0), &input, "eng", NOW).unwrap();
        let g = r.geometry();
        assert!((g.cx - 250.0).abs() < 1e-6);
        assert!((g.cy - 275.0).abs() < 1e-6);
        assert!((g.w - 300.0).abs() < 1e-6);
        assert_eq!(r.label.as_deref(), Some("Hotspot"));
        assert_eq!(r.created_by.as_deref(), Some("eng"));
        assert!(r.is_manual && r.is_draft());
    }

    #[test]
    fn test_draw_region_rejects_tiny_box() {
        let input = DrawInput {
            rect: CornerBox { x: 10.0, y: 10.0, w: 1.0, h: 50.0 },
            status: RegionStatus::Potential,
            label: None,
            comment: None,
        };
        let err = draw_region(Size::new(800.0, 600.0), &input, "eng", NOW).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_edit_box_requires_user() {
        let region = ErrorRegion::with_geometry(BoxGeometry::new(100.0, 100.0, 50.0, 50.0), RegionStatus::Potential);
        let change = BoxChange {
            offset: Some(Offset { dx: 10.0, dy: 0.0 }),
            ..Default::default()
        };
        let err = edit_box(&region, Size::new(800.0, 600.0), &change, None, None, NOW).unwrap_err();
        assert!(err.is_validation());
        let saved = edit_box(&region, Size::new(800.0, 600.0), &change, Some("eng"), None, NOW).unwrap();
        assert_eq!(saved.geometry().cx, 110.0);
        assert_eq!(saved.last_modified_by.as_deref(), Some("eng"));
    }

    #[test]
    fn test_edit_properties() {
        let region = ErrorRegion::with_geometry(BoxGeometry::new(0.5, 0.5, 0.1, 0.1), RegionStatus::Potential);
        let change = PropertyChange {
            status: Some(RegionStatus::Faulty),
            comment: Some("confirmed".into()),
            ..Default::default()
        };
        let saved = edit_properties(&region, &change, Some("eng"), NOW).unwrap();
        assert_eq!(saved.status, RegionStatus::Faulty);
        assert_eq!(saved.comment.as_deref(), Some("confirmed"));
    }
}
