//! Web-Mercator projection and the map viewport.
//!
//! Screen positions are relative to the top-left corner of the map panel.

use eframe::egui::{self, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic footprint of an unrotated overlay rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north_west: LatLng,
    pub south_east: LatLng,
}

/// Identifies a single tile in the `z/x/y` scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Width of the world in pixels at the given zoom.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Projects a geographic position to world pixels at the given zoom.
pub fn project(pos: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = pos.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (pos.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE), lng)
}

/// The visible part of the map: centre, zoom and panel size.
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewport {
    pub center: LatLng,
    zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub size: Vec2,
}

impl MapViewport {
    pub fn new(center: LatLng, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let zoom = if zoom.is_finite() { zoom } else { min_zoom };
        Self {
            center,
            zoom: zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            size: Vec2::ZERO,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Clamps to the zoom range; non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    fn half_size(&self) -> (f64, f64) {
        (f64::from(self.size.x) / 2.0, f64::from(self.size.y) / 2.0)
    }

    /// Converts a geographic position to a screen position.
    pub fn to_screen(&self, pos: LatLng) -> Pos2 {
        let (px, py) = project(pos, self.zoom);
        let (cx, cy) = project(self.center, self.zoom);
        let (hw, hh) = self.half_size();
        egui::pos2((px - cx + hw) as f32, (py - cy + hh) as f32)
    }

    /// Converts a screen position to a geographic position.
    pub fn to_geo(&self, point: Pos2) -> LatLng {
        let (cx, cy) = project(self.center, self.zoom);
        let (hw, hh) = self.half_size();
        unproject(
            cx + f64::from(point.x) - hw,
            cy + f64::from(point.y) - hh,
            self.zoom,
        )
    }

    /// Moves the map content by `delta` screen pixels.
    pub fn pan_by(&mut self, delta: Vec2) {
        let (cx, cy) = project(self.center, self.zoom);
        self.center = unproject(
            cx - f64::from(delta.x),
            cy - f64::from(delta.y),
            self.zoom,
        );
    }

    /// Changes zoom while keeping the position under `anchor` fixed on screen.
    pub fn zoom_around(&mut self, anchor: Pos2, zoom: f64) {
        let fixed = self.to_geo(anchor);
        self.set_zoom(zoom);
        let (fx, fy) = project(fixed, self.zoom);
        let (hw, hh) = self.half_size();
        self.center = unproject(
            fx - (f64::from(anchor.x) - hw),
            fy - (f64::from(anchor.y) - hh),
            self.zoom,
        );
    }

    /// Centres on `rect` and picks the largest whole zoom level that shows it entirely.
    pub fn fit_rect(&mut self, rect: Rect) {
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }
        let target = self.to_geo(rect.center());
        let ratio = (self.size.x / rect.width()).min(self.size.y / rect.height());
        let zoom = (self.zoom + f64::from(ratio).log2()).floor();
        self.set_zoom(zoom);
        self.center = target;
    }

    /// Lists the tiles covering the panel with their screen rectangles.
    ///
    /// Tiles come from the nearest whole zoom level and are scaled to the
    /// fractional part. Columns wrap around the antimeridian, rows outside the
    /// world are skipped.
    pub fn visible_tiles(&self) -> Vec<(TileId, Rect)> {
        let level = self.zoom.round().max(0.0);
        let z = level as u8;
        let scale = (self.zoom - level).exp2();
        let (cx, cy) = project(self.center, level);
        let (hw, hh) = self.half_size();
        let (span_x, span_y) = (hw / scale, hh / scale);

        let min_x = ((cx - span_x) / TILE_SIZE).floor() as i64;
        let max_x = ((cx + span_x) / TILE_SIZE).ceil() as i64 - 1;
        let min_y = ((cy - span_y) / TILE_SIZE).floor() as i64;
        let max_y = ((cy + span_y) / TILE_SIZE).ceil() as i64 - 1;
        let count = 1_i64 << z;
        let tile_px = (TILE_SIZE * scale) as f32;

        let mut tiles = Vec::new();
        for ty in min_y.max(0)..=max_y.min(count - 1) {
            for tx in min_x..=max_x {
                let left = (tx as f64 * TILE_SIZE - cx) * scale + hw;
                let top = (ty as f64 * TILE_SIZE - cy) * scale + hh;
                let rect = Rect::from_min_size(
                    egui::pos2(left as f32, top as f32),
                    Vec2::splat(tile_px),
                );
                let id = TileId {
                    z,
                    x: tx.rem_euclid(count) as u32,
                    y: ty as u32,
                };
                tiles.push((id, rect));
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(zoom: f64) -> MapViewport {
        let mut vp = MapViewport::new(LatLng::new(51.505, -0.09), zoom, 0.0, 19.0);
        vp.set_size(egui::vec2(800.0, 600.0));
        vp
    }

    #[test]
    fn test_project_origin() {
        let (x, y) = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let pos = LatLng::new(51.505, -0.09);
        let (x, y) = project(pos, 13.0);
        let back = unproject(x, y, 13.0);
        assert!((back.lat - pos.lat).abs() < 1e-9);
        assert!((back.lng - pos.lng).abs() < 1e-9);
    }

    #[test]
    fn test_center_maps_to_panel_center() {
        let vp = viewport(13.0);
        let p = vp.to_screen(vp.center);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_screen_geo_round_trip() {
        let vp = viewport(15.0);
        let point = egui::pos2(123.0, 456.0);
        let back = vp.to_screen(vp.to_geo(point));
        assert!((back.x - point.x).abs() < 1e-2);
        assert!((back.y - point.y).abs() < 1e-2);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut vp = viewport(13.0);
        let marker = vp.to_geo(egui::pos2(400.0, 300.0));
        vp.pan_by(egui::vec2(50.0, -20.0));
        let p = vp.to_screen(marker);
        assert!((p.x - 450.0).abs() < 1e-2);
        assert!((p.y - 280.0).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_around_keeps_anchor_fixed() {
        let mut vp = viewport(13.0);
        let anchor = egui::pos2(200.0, 150.0);
        let under = vp.to_geo(anchor);
        vp.zoom_around(anchor, 14.0);
        assert_eq!(vp.zoom(), 14.0);
        let p = vp.to_screen(under);
        assert!((p.x - anchor.x).abs() < 1e-2);
        assert!((p.y - anchor.y).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut vp = viewport(13.0);
        vp.set_zoom(42.0);
        assert_eq!(vp.zoom(), 19.0);
        vp.set_zoom(-3.0);
        assert_eq!(vp.zoom(), 0.0);
    }

    #[test]
    fn test_non_finite_zoom_is_ignored() {
        let mut vp = viewport(13.0);
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom(), 13.0);
        vp.set_zoom(f64::INFINITY);
        assert_eq!(vp.zoom(), 13.0);

        let vp = MapViewport::new(LatLng::new(0.0, 0.0), f64::NAN, 2.0, 19.0);
        assert_eq!(vp.zoom(), 2.0);
    }

    #[test]
    fn test_fit_rect_zooms_in_on_box() {
        let mut vp = viewport(13.0);
        let rect = Rect::from_min_size(egui::pos2(300.0, 200.0), egui::vec2(200.0, 150.0));
        let target = vp.to_geo(rect.center());
        vp.fit_rect(rect);
        assert_eq!(vp.zoom(), 15.0);
        assert!((vp.center.lat - target.lat).abs() < 1e-9);
    }

    #[test]
    fn test_single_tile_at_zoom_zero() {
        let mut vp = MapViewport::new(LatLng::new(0.0, 0.0), 0.0, 0.0, 19.0);
        vp.set_size(egui::vec2(256.0, 256.0));
        let tiles = vp.visible_tiles();
        assert_eq!(tiles.len(), 1);
        let (id, rect) = tiles[0];
        assert_eq!(id, TileId { z: 0, x: 0, y: 0 });
        assert_eq!(rect.min, egui::pos2(0.0, 0.0));
        assert_eq!(rect.size(), egui::vec2(256.0, 256.0));
    }

    #[test]
    fn test_visible_tiles_cover_panel() {
        let vp = viewport(13.0);
        let tiles = vp.visible_tiles();
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|(id, _)| id.z == 13));
        let covered = tiles
            .iter()
            .fold(Rect::NOTHING, |acc, (_, rect)| acc.union(*rect));
        assert!(covered.contains_rect(Rect::from_min_size(Pos2::ZERO, vp.size)));
    }
}
