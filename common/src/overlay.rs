//! Overlay shapes and list rows for a region set.
//!
//! Shapes are produced in render space (origin at the letterboxed image's
//! top-left). Hosts draw image and shapes through the same
//! [`ViewTransform`](crate::layout::ViewTransform) so they move together.

use crate::layout::{Layout, Point, Rect};
use crate::region::{ErrorRegion, RegionStatus, Units};

/// Badge offset from a box's top-left corner, in render pixels.
pub const BADGE_OFFSET: f64 = 15.0;
/// Render-space side of a point marker.
pub const POINT_MARKER_SIZE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Box,
    Point,
}

/// Colour class of an overlay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Red,
    Yellow,
}

impl Tint {
    pub fn for_status(status: RegionStatus) -> Self {
        match status {
            RegionStatus::Faulty => Tint::Red,
            _ => Tint::Yellow,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayShape {
    /// Position of the region in the input slice.
    pub source: usize,
    pub number: u32,
    pub kind: ShapeKind,
    pub rect: Rect,
    pub tint: Tint,
    pub rgb: [u8; 3],
    pub badge: Point,
}

/// Display numbers for a region slice.
///
/// Ordering is by explicit `idx` (missing last, stable on ties). Deleted
/// regions keep their place in the order but get no number.
pub fn numbering(regions: &[ErrorRegion]) -> Vec<(usize, Option<u32>)> {
    let mut order: Vec<usize> = (0..regions.len()).collect();
    order.sort_by_key(|&i| regions[i].idx.unwrap_or(u32::MAX));
    let mut next = 0u32;
    order
        .into_iter()
        .map(|i| {
            if regions[i].is_deleted {
                (i, None)
            } else {
                next += 1;
                (i, Some(next))
            }
        })
        .collect()
}

/// Render-space rectangle of a region, or `None` when it cannot be placed.
pub fn region_rect(region: &ErrorRegion, layout: &Layout) -> Option<Rect> {
    if !layout.ready {
        return None;
    }
    let px = region.geometry().resolve(layout.natural_size())?;
    let s = layout.render_scale();
    Some(Rect::new(px.left() * s, px.top() * s, px.w * s, px.h * s))
}

/// Shapes for every live region with recognizable geometry.
pub fn render_overlay(regions: &[ErrorRegion], layout: &Layout) -> Vec<OverlayShape> {
    if !layout.ready {
        return Vec::new();
    }
    numbering(regions)
        .into_iter()
        .filter_map(|(i, number)| {
            let number = number?;
            let region = &regions[i];
            let rect = region_rect(region, layout)?;
            let (kind, rect, badge) = if region.is_point {
                let c = rect.center();
                let half = POINT_MARKER_SIZE / 2.0;
                (
                    ShapeKind::Point,
                    Rect::new(c.x - half, c.y - half, POINT_MARKER_SIZE, POINT_MARKER_SIZE),
                    c,
                )
            } else {
                (
                    ShapeKind::Box,
                    rect,
                    Point::new(rect.x - BADGE_OFFSET, rect.y - BADGE_OFFSET),
                )
            };
            Some(OverlayShape {
                source: i,
                number,
                kind,
                rect,
                tint: Tint::for_status(region.status),
                rgb: region.display_rgb(),
                badge,
            })
        })
        .collect()
}

/// One line of the region list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub source: usize,
    pub number: Option<u32>,
    pub tag: &'static str,
    pub tint: Tint,
    pub kind: ShapeKind,
    pub coords: String,
    pub confidence_pct: Option<u32>,
    pub is_manual: bool,
    pub is_deleted: bool,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub deleted_at: Option<String>,
}

/// Every region, deleted ones included and flagged.
pub fn list_rows(regions: &[ErrorRegion]) -> Vec<ListRow> {
    numbering(regions)
        .into_iter()
        .map(|(i, number)| {
            let r = &regions[i];
            ListRow {
                source: i,
                number,
                tag: r.status.tag(),
                tint: Tint::for_status(r.status),
                kind: if r.is_point { ShapeKind::Point } else { ShapeKind::Box },
                coords: coords_text(r),
                confidence_pct: r
                    .confidence
                    .filter(|c| c.is_finite())
                    .map(|c| (c * 100.0).round() as u32),
                is_manual: r.is_manual,
                is_deleted: r.is_deleted,
                label: r.label.clone(),
                comment: r.comment.clone(),
                deleted_at: r.deleted_at.clone(),
            }
        })
        .collect()
}

/// Coordinates as shown in the list: percent for normalized, pixels otherwise.
pub fn coords_text(region: &ErrorRegion) -> String {
    let g = region.geometry();
    match Units::detect(&g) {
        Some(Units::Normalized) => {
            let pct = |v: f64| format!("{:.1}%", v * 100.0);
            if region.is_point {
                format!("({}, {})", pct(g.cx), pct(g.cy))
            } else {
                format!("({}, {}) {}×{}", pct(g.cx), pct(g.cy), pct(g.w), pct(g.h))
            }
        }
        Some(Units::Absolute) => {
            if region.is_point {
                format!("({}, {})", g.cx.round(), g.cy.round())
            } else {
                format!("({}, {}) {}×{}", g.cx.round(), g.cy.round(), g.w.round(), g.h.round())
            }
        }
        None => "-".to_string(),
    }
}

/// Live (non-deleted) regions.
pub fn live_count(regions: &[ErrorRegion]) -> usize {
    regions.iter().filter(|r| !r.is_deleted).count()
}
