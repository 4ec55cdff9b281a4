//! Per-overlay state and the transform engine: drag, resize, rotation,
//! opacity and content zoom.

use crate::geo::{GeoBounds, LatLng, MapViewport};
use crate::intake::{ContentRef, UploadedFile};
use eframe::egui::{self, Pos2, Rect, Vec2, emath::Rot2};
use std::fmt;
use std::ops::RangeInclusive;

/// Smallest width or height an overlay can be resized to.
pub const MIN_SIZE: f32 = 100.0;

/// Step of the rotate buttons, in degrees.
pub const ROTATION_STEP: f32 = 5.0;

pub const OPACITY_RANGE: RangeInclusive<f32> = 0.1..=1.0;
pub const ZOOM_RANGE: RangeInclusive<f32> = 0.5..=3.0;

/// Step used by the opacity and zoom sliders.
pub const SLIDER_STEP: f64 = 0.1;

/// Size of the square remove control in the top-right corner.
pub const REMOVE_CONTROL_SIZE: f32 = 20.0;
/// Inset of the remove control from the overlay edges.
pub const REMOVE_CONTROL_INSET: f32 = 5.0;

/// Normalises an angle into `[0, 360)`.
///
/// Same result as `((deg % 360) + 360) % 360`, without the extra addition for
/// angles that are already non-negative.
pub fn normalize_rotation(deg: f32) -> f32 {
    if !deg.is_finite() {
        return 0.0;
    }
    let r = deg % 360.0;
    let r = if r < 0.0 { r + 360.0 } else { r };
    if r >= 360.0 { 0.0 } else { r }
}

pub fn clamp_opacity(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*OPACITY_RANGE.start(), *OPACITY_RANGE.end())
    } else {
        1.0
    }
}

pub fn clamp_zoom(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end())
    } else {
        1.0
    }
}

/// Identifies an overlay for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// Which end of an axis a resize handle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// Left or top
    Near,
    /// Right or bottom
    Far,
}

/// One of the eight edge and corner resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    fn horizontal(self) -> Option<Edge> {
        match self {
            Self::W | Self::NW | Self::SW => Some(Edge::Near),
            Self::E | Self::NE | Self::SE => Some(Edge::Far),
            Self::N | Self::S => None,
        }
    }

    fn vertical(self) -> Option<Edge> {
        match self {
            Self::N | Self::NE | Self::NW => Some(Edge::Near),
            Self::S | Self::SE | Self::SW => Some(Edge::Far),
            Self::E | Self::W => None,
        }
    }

    /// Handle position relative to the centre, as a fraction of the size.
    pub fn anchor(self) -> Vec2 {
        let axis = |edge: Option<Edge>| match edge {
            Some(Edge::Near) => -0.5,
            Some(Edge::Far) => 0.5,
            None => 0.0,
        };
        egui::vec2(axis(self.horizontal()), axis(self.vertical()))
    }
}

/// What the pointer is over inside an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    Handle(ResizeHandle),
    Remove,
}

/// Geographic anchor the overlay follows when the map moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoAnchor {
    pub center: LatLng,
    /// Map zoom at which one overlay unit equals one screen pixel
    pub zoom: f64,
}

/// A PDF page placed on the map.
#[derive(Debug, Clone)]
pub struct OverlayState {
    pub id: OverlayId,
    pub file_id: String,
    pub name: String,
    pub content: ContentRef,
    center: Pos2,
    size: Vec2,
    scale: f32,
    rotation: f32,
    opacity: f32,
    zoom: f32,
    anchor: Option<GeoAnchor>,
}

impl OverlayState {
    pub fn new(id: OverlayId, file: &UploadedFile, center: Pos2, size: Vec2) -> Self {
        Self {
            id,
            file_id: file.id.clone(),
            name: file.name.clone(),
            content: file.content.clone(),
            center,
            size: size.max(Vec2::splat(MIN_SIZE)),
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            zoom: 1.0,
            anchor: None,
        }
    }

    /// Screen position of the centre.
    pub fn center(&self) -> Pos2 {
        self.center
    }

    /// Width and height in overlay units.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Width and height on screen at the current map zoom.
    pub fn display_size(&self) -> Vec2 {
        self.size * self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn anchor(&self) -> Option<GeoAnchor> {
        self.anchor
    }

    /// Unrotated screen rectangle; left/top are centre minus half the extent.
    pub fn rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.display_size())
    }

    pub fn set_rotation(&mut self, deg: f32) {
        self.rotation = normalize_rotation(deg);
    }

    pub fn rotate_by(&mut self, deg: f32) {
        self.set_rotation(self.rotation + deg);
    }

    pub fn set_opacity(&mut self, value: f32) {
        self.opacity = clamp_opacity(value);
    }

    pub fn set_zoom(&mut self, value: f32) {
        self.zoom = clamp_zoom(value);
    }

    /// Moves the overlay by a pointer movement. Not clamped to the map.
    pub fn drag_by(&mut self, delta: Vec2) {
        self.center += delta;
        self.anchor = None;
    }

    /// Resizes from `handle` by a pointer movement.
    ///
    /// Only the west and north edges shift the centre, by half the movement;
    /// a clamped axis keeps its centre.
    pub fn resize(&mut self, handle: ResizeHandle, delta: Vec2) {
        let units = delta / self.scale;
        match handle.horizontal() {
            Some(Edge::Near) => {
                let width = self.size.x - units.x;
                if width >= MIN_SIZE {
                    self.size.x = width;
                    self.center.x -= delta.x / 2.0;
                } else {
                    self.size.x = MIN_SIZE;
                }
            }
            Some(Edge::Far) => self.size.x = (self.size.x + units.x).max(MIN_SIZE),
            None => {}
        }
        match handle.vertical() {
            Some(Edge::Near) => {
                let height = self.size.y - units.y;
                if height >= MIN_SIZE {
                    self.size.y = height;
                    self.center.y -= delta.y / 2.0;
                } else {
                    self.size.y = MIN_SIZE;
                }
            }
            Some(Edge::Far) => self.size.y = (self.size.y + units.y).max(MIN_SIZE),
            None => {}
        }
        self.anchor = None;
    }

    /// Records the current screen placement as a geographic anchor.
    pub fn anchor_to(&mut self, viewport: &MapViewport) {
        self.anchor = Some(GeoAnchor {
            center: viewport.to_geo(self.center),
            zoom: viewport.zoom() - f64::from(self.scale).log2(),
        });
    }

    /// Re-derives screen position and scale from the anchor after the map moved.
    pub fn follow(&mut self, viewport: &MapViewport) {
        if let Some(anchor) = self.anchor {
            self.center = viewport.to_screen(anchor.center);
            self.scale = (viewport.zoom() - anchor.zoom).exp2() as f32;
        }
    }

    /// Geographic corners of the unrotated rectangle.
    pub fn geo_bounds(&self, viewport: &MapViewport) -> GeoBounds {
        let rect = self.rect();
        GeoBounds {
            north_west: viewport.to_geo(rect.left_top()),
            south_east: viewport.to_geo(rect.right_bottom()),
        }
    }

    fn rotation_rot(&self) -> Rot2 {
        Rot2::from_angle(self.rotation.to_radians())
    }

    /// Maps a screen point into the overlay's unrotated frame, centred at zero.
    pub fn to_local(&self, point: Pos2) -> Vec2 {
        self.rotation_rot().inverse() * (point - self.center)
    }

    /// Maps a point of the overlay's frame back to the screen.
    pub fn to_screen(&self, local: Vec2) -> Pos2 {
        self.center + self.rotation_rot() * local
    }

    /// Screen positions of the resize handles.
    pub fn handle_positions(&self) -> [(ResizeHandle, Pos2); 8] {
        let size = self.display_size();
        ResizeHandle::ALL.map(|handle| (handle, self.to_screen(handle.anchor() * size)))
    }

    /// Local rectangle of the remove control.
    pub fn remove_control_rect(&self) -> Rect {
        let half = self.display_size() / 2.0;
        Rect::from_min_size(
            egui::pos2(
                half.x - REMOVE_CONTROL_INSET - REMOVE_CONTROL_SIZE,
                -half.y + REMOVE_CONTROL_INSET,
            ),
            Vec2::splat(REMOVE_CONTROL_SIZE),
        )
    }

    /// Finds what lies under a screen point, handles first.
    pub fn hit_test(
        &self,
        point: Pos2,
        with_handles: bool,
        handle_radius: f32,
    ) -> Option<HitTarget> {
        let local = self.to_local(point);
        let size = self.display_size();
        if with_handles {
            let handle = ResizeHandle::ALL
                .into_iter()
                .find(|h| (local - h.anchor() * size).length() <= handle_radius);
            if let Some(handle) = handle {
                return Some(HitTarget::Handle(handle));
            }
        }
        if self.remove_control_rect().contains(local.to_pos2()) {
            return Some(HitTarget::Remove);
        }
        let half = size / 2.0;
        (local.x.abs() <= half.x && local.y.abs() <= half.y).then_some(HitTarget::Body)
    }

    /// Visible part of the page in the overlay's local frame and the matching
    /// texture coordinates.
    ///
    /// The page fills the container width, is top-aligned, and is scaled by the
    /// content zoom around the container centre. The result is clipped to the
    /// container; `None` means nothing is visible.
    pub fn content_quad(&self, page_aspect: f32) -> Option<(Rect, Rect)> {
        let size = self.display_size();
        let container = Rect::from_center_size(Pos2::ZERO, size);
        let page = Rect::from_min_size(container.min, egui::vec2(size.x, size.x * page_aspect));
        let zoomed = Rect::from_min_max(
            (page.min.to_vec2() * self.zoom).to_pos2(),
            (page.max.to_vec2() * self.zoom).to_pos2(),
        );
        let visible = zoomed.intersect(container);
        if !visible.is_positive() {
            return None;
        }
        let uv = |p: Pos2| {
            egui::pos2(
                (p.x - zoomed.min.x) / zoomed.width(),
                (p.y - zoomed.min.y) / zoomed.height(),
            )
        };
        Some((visible, Rect::from_min_max(uv(visible.min), uv(visible.max))))
    }
}
