//! Tile map drawing and map gestures.

use crate::SurveyOverlayApp;
use crate::colors;
use eframe::egui;

impl SurveyOverlayApp {
    /// Renders the tile map with the overlays on top.
    pub fn show_map(&mut self, ui: &mut egui::Ui) {
        let (viewport_rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.map.set_size(viewport_rect.size());

        // Overlays get the pointer first; the map only sees what they leave.
        if !self.handle_overlay_pointer(ui, viewport_rect) {
            self.handle_map_gestures(ui, viewport_rect, &response);
        }
        self.store.sync_to_map(self.map.viewport());

        ui.set_clip_rect(viewport_rect);
        let painter = ui.painter_at(viewport_rect);
        let origin = viewport_rect.min.to_vec2();

        self.paint_tiles(ui.ctx(), &painter, origin);
        self.paint_overlays(&painter, origin);

        if let Some(rect) = self.map.box_zoom_rect() {
            painter.rect(
                rect.translate(origin),
                0.0,
                colors::BOX_ZOOM_FILL,
                egui::Stroke::new(1.0, colors::BOX_ZOOM_STROKE),
                egui::StrokeKind::Inside,
            );
        }
    }

    fn paint_tiles(&mut self, ctx: &egui::Context, painter: &egui::Painter, origin: egui::Vec2) {
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        for (tile, rect) in self.map.viewport().visible_tiles() {
            let rect = rect.translate(origin);
            let texture = self
                .tiles
                .as_mut()
                .and_then(|tiles| tiles.get(ctx, tile))
                .map(|texture| texture.id());
            match texture {
                Some(id) => {
                    painter.image(id, rect, uv, egui::Color32::WHITE);
                }
                None => {
                    painter.rect_filled(rect, 0.0, colors::TILE_PLACEHOLDER);
                }
            }
        }
    }

    /// Drives pan, box zoom, wheel zoom, double-click zoom and pinch zoom.
    /// Each gesture is a no-op while the map is locked.
    fn handle_map_gestures(
        &mut self,
        ui: &egui::Ui,
        viewport_rect: egui::Rect,
        response: &egui::Response,
    ) {
        let to_local = |p: egui::Pos2| p - viewport_rect.min.to_vec2();
        let (hover_pos, scroll_delta, shift, multi_touch) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.raw_scroll_delta.y,
                i.modifiers.shift,
                i.multi_touch(),
            )
        });

        if response.clicked() {
            self.store.select(None);
        }

        if response.drag_started()
            && shift
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.map.begin_box_zoom(to_local(pos));
        }

        if self.map.box_zoom_rect().is_some() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.map.update_box_zoom(to_local(pos));
            }
            if response.drag_stopped() {
                self.map.finish_box_zoom();
            }
        } else if response.dragged() {
            self.map.drag(response.drag_delta());
        }

        if let Some(hover) = hover_pos.filter(|p| viewport_rect.contains(*p))
            && ui.rect_contains_pointer(viewport_rect)
        {
            self.map.scroll_zoom(to_local(hover), scroll_delta);
        }

        if response.double_clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.map.double_click_zoom(to_local(pos), shift);
        }

        if let Some(touch) = multi_touch {
            self.map
                .touch_zoom(to_local(touch.center_pos), touch.zoom_delta);
        }
    }
}
