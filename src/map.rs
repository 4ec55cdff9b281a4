//! Map navigation: the viewport plus the set of built-in gestures that the
//! lock switches off and on together.

use crate::geo::{LatLng, MapViewport};
use eframe::egui::{Pos2, Rect, Vec2};

/// Scroll distance in points that changes the zoom by one level.
pub const WHEEL_PX_PER_ZOOM_LEVEL: f32 = 60.0;

/// Pan distance of one arrow-key press, in pixels.
pub const KEYBOARD_PAN_DELTA: f32 = 80.0;

/// Built-in map gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gestures {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub box_zoom: bool,
    pub keyboard: bool,
    pub touch_zoom: bool,
}

impl Gestures {
    pub const ALL_ENABLED: Self = Self::all(true);
    pub const ALL_DISABLED: Self = Self::all(false);

    const fn all(enabled: bool) -> Self {
        Self {
            dragging: enabled,
            scroll_wheel_zoom: enabled,
            double_click_zoom: enabled,
            box_zoom: enabled,
            keyboard: enabled,
            touch_zoom: enabled,
        }
    }
}

impl Default for Gestures {
    fn default() -> Self {
        Self::ALL_ENABLED
    }
}

/// Owns the viewport and routes gestures to it while they are enabled.
#[derive(Debug, Clone)]
pub struct MapController {
    viewport: MapViewport,
    gestures: Gestures,
    box_zoom: Option<(Pos2, Pos2)>,
}

impl MapController {
    pub fn new(center: LatLng, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            viewport: MapViewport::new(center, zoom, min_zoom, max_zoom),
            gestures: Gestures::ALL_ENABLED,
            box_zoom: None,
        }
    }

    pub fn viewport(&self) -> &MapViewport {
        &self.viewport
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.viewport.set_size(size);
    }

    pub fn gestures(&self) -> Gestures {
        self.gestures
    }

    pub fn is_locked(&self) -> bool {
        self.gestures == Gestures::ALL_DISABLED
    }

    /// Disables or re-enables every gesture at once.
    pub fn set_locked(&mut self, locked: bool) {
        self.gestures = if locked {
            self.box_zoom = None;
            Gestures::ALL_DISABLED
        } else {
            Gestures::ALL_ENABLED
        };
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.set_locked(!self.is_locked());
        self.is_locked()
    }

    /// Moves the view to `center`/`zoom` programmatically; ignores the lock.
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.viewport.center = center;
        self.viewport.set_zoom(zoom);
    }

    pub fn drag(&mut self, delta: Vec2) -> bool {
        if !self.gestures.dragging || delta == Vec2::ZERO {
            return false;
        }
        self.viewport.pan_by(delta);
        true
    }

    /// Zooms around the pointer by a scroll amount in points.
    pub fn scroll_zoom(&mut self, anchor: Pos2, scroll: f32) -> bool {
        if !self.gestures.scroll_wheel_zoom || scroll == 0.0 {
            return false;
        }
        let zoom = self.viewport.zoom() + f64::from(scroll / WHEEL_PX_PER_ZOOM_LEVEL);
        self.viewport.zoom_around(anchor, zoom);
        true
    }

    /// One whole level in (or out) around the double-clicked point.
    pub fn double_click_zoom(&mut self, anchor: Pos2, zoom_out: bool) -> bool {
        if !self.gestures.double_click_zoom {
            return false;
        }
        let step = if zoom_out { -1.0 } else { 1.0 };
        let zoom = (self.viewport.zoom() + step).round();
        self.viewport.zoom_around(anchor, zoom);
        true
    }

    /// Pans by whole arrow-key steps; `direction` components are -1, 0 or 1.
    pub fn keyboard_pan(&mut self, direction: Vec2) -> bool {
        if !self.gestures.keyboard || direction == Vec2::ZERO {
            return false;
        }
        self.viewport.pan_by(-direction * KEYBOARD_PAN_DELTA);
        true
    }

    pub fn keyboard_zoom(&mut self, step: f64) -> bool {
        if !self.gestures.keyboard {
            return false;
        }
        let zoom = (self.viewport.zoom() + step).round();
        let center = (self.viewport.size / 2.0).to_pos2();
        self.viewport.zoom_around(center, zoom);
        true
    }

    /// Pinch zoom by a multiplicative factor around the touch centre.
    pub fn touch_zoom(&mut self, anchor: Pos2, factor: f32) -> bool {
        if !self.gestures.touch_zoom || factor <= 0.0 || factor == 1.0 {
            return false;
        }
        let zoom = self.viewport.zoom() + f64::from(factor).log2();
        self.viewport.zoom_around(anchor, zoom);
        true
    }

    pub fn begin_box_zoom(&mut self, start: Pos2) -> bool {
        if !self.gestures.box_zoom {
            return false;
        }
        self.box_zoom = Some((start, start));
        true
    }

    pub fn update_box_zoom(&mut self, current: Pos2) {
        if let Some((_, end)) = &mut self.box_zoom {
            *end = current;
        }
    }

    /// Rectangle being drawn for a box zoom, if any.
    pub fn box_zoom_rect(&self) -> Option<Rect> {
        self.box_zoom.map(|(a, b)| Rect::from_two_pos(a, b))
    }

    /// Zooms to the drawn rectangle and ends the box zoom.
    pub fn finish_box_zoom(&mut self) -> bool {
        let Some(rect) = self.box_zoom_rect() else {
            return false;
        };
        self.box_zoom = None;
        if !self.gestures.box_zoom {
            return false;
        }
        self.viewport.fit_rect(rect);
        true
    }

    pub fn reset_view(&mut self, center: LatLng, zoom: f64) {
        self.box_zoom = None;
        self.set_view(center, zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui;

    fn controller() -> MapController {
        let mut map = MapController::new(LatLng::new(51.505, -0.09), 13.0, 0.0, 19.0);
        map.set_size(egui::vec2(800.0, 600.0));
        map
    }

    #[test]
    fn test_lock_disables_every_gesture() {
        let mut map = controller();
        map.set_locked(true);
        assert!(map.is_locked());
        assert_eq!(map.gestures(), Gestures::ALL_DISABLED);

        let before = map.viewport().clone();
        let anchor = egui::pos2(100.0, 100.0);
        assert!(!map.drag(egui::vec2(10.0, 10.0)));
        assert!(!map.scroll_zoom(anchor, 120.0));
        assert!(!map.double_click_zoom(anchor, false));
        assert!(!map.keyboard_pan(egui::vec2(1.0, 0.0)));
        assert!(!map.keyboard_zoom(1.0));
        assert!(!map.touch_zoom(anchor, 2.0));
        assert!(!map.begin_box_zoom(anchor));
        assert_eq!(map.viewport(), &before);
    }

    #[test]
    fn test_unlock_restores_every_gesture() {
        let mut map = controller();
        assert!(map.toggle_lock());
        assert!(!map.toggle_lock());
        assert_eq!(map.gestures(), Gestures::ALL_ENABLED);
        assert!(map.drag(egui::vec2(10.0, 10.0)));
    }

    #[test]
    fn test_scroll_zoom_in_by_one_level() {
        let mut map = controller();
        assert!(map.scroll_zoom(egui::pos2(400.0, 300.0), WHEEL_PX_PER_ZOOM_LEVEL));
        assert!((map.viewport().zoom() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_double_click_snaps_to_whole_levels() {
        let mut map = controller();
        map.scroll_zoom(egui::pos2(400.0, 300.0), 30.0);
        map.double_click_zoom(egui::pos2(400.0, 300.0), false);
        assert_eq!(map.viewport().zoom(), 15.0);
        map.double_click_zoom(egui::pos2(400.0, 300.0), true);
        assert_eq!(map.viewport().zoom(), 14.0);
    }

    #[test]
    fn test_keyboard_pan_moves_view() {
        let mut map = controller();
        let marker = map.viewport().to_geo(egui::pos2(400.0, 300.0));
        map.keyboard_pan(egui::vec2(1.0, 0.0));
        let p = map.viewport().to_screen(marker);
        assert!((p.x - (400.0 - KEYBOARD_PAN_DELTA)).abs() < 1e-2);
    }

    #[test]
    fn test_touch_zoom_doubles() {
        let mut map = controller();
        map.touch_zoom(egui::pos2(400.0, 300.0), 2.0);
        assert!((map.viewport().zoom() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_box_zoom() {
        let mut map = controller();
        assert!(map.begin_box_zoom(egui::pos2(300.0, 200.0)));
        map.update_box_zoom(egui::pos2(500.0, 350.0));
        assert_eq!(
            map.box_zoom_rect(),
            Some(Rect::from_min_max(egui::pos2(300.0, 200.0), egui::pos2(500.0, 350.0)))
        );
        assert!(map.finish_box_zoom());
        assert_eq!(map.viewport().zoom(), 15.0);
        assert_eq!(map.box_zoom_rect(), None);
    }

    #[test]
    fn test_lock_cancels_box_zoom() {
        let mut map = controller();
        map.begin_box_zoom(egui::pos2(300.0, 200.0));
        map.set_locked(true);
        assert_eq!(map.box_zoom_rect(), None);
        assert!(!map.finish_box_zoom());
    }
}
