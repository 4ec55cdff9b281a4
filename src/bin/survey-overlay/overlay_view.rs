//! Overlay drawing, pointer routing and the floating overlay controls.

use crate::SurveyOverlayApp;
use crate::colors;
use crate::constants::{HANDLE_RADIUS, HANDLE_SIZE};
use crate::document::DocumentView;
use eframe::egui::emath::Rot2;
use eframe::egui::{self, Color32, Pos2, Rect, Shape, Stroke, Vec2};
use survey_overlay::overlay::{OPACITY_RANGE, ROTATION_STEP, SLIDER_STEP, ZOOM_RANGE};
use survey_overlay::{HitTarget, OverlayId, OverlayState, PlacementMode, ResizeHandle};

const CONTROLS_WIDTH: f32 = 240.0;

impl SurveyOverlayApp {
    /// Routes primary-button presses, drags and releases to the overlays.
    ///
    /// Returns `true` when the pointer belongs to an overlay this frame, in
    /// which case the map must not act on it.
    pub fn handle_overlay_pointer(&mut self, ui: &egui::Ui, viewport_rect: Rect) -> bool {
        let origin = viewport_rect.min.to_vec2();
        let (pressed, down, delta, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.delta(),
                i.pointer.interact_pos(),
            )
        });
        let over_map = ui.rect_contains_pointer(viewport_rect);

        let mut consumed = false;
        let hit = pos
            .filter(|_| over_map)
            .and_then(|p| self.store.hit_test(p - origin, HANDLE_RADIUS));

        if !self.store.interaction().is_active()
            && let Some((_, target)) = hit
        {
            ui.ctx().set_cursor_icon(cursor_for(target));
        }

        if pressed
            && self.map.box_zoom_rect().is_none()
            && let Some((id, target)) = hit
        {
            consumed = true;
            if let Some(event) = self.store.pointer_down(id, target) {
                self.handle_event(event);
            }
        }

        if let Some(overlay) = self.store.interaction().overlay() {
            consumed = true;
            if !pressed && delta != Vec2::ZERO {
                self.store.pointer_move(delta);
            }
            if let Some((_, target)) = hit.filter(|(id, _)| *id == overlay) {
                ui.ctx().set_cursor_icon(cursor_for(target));
            }
            if !down && let Some(event) = self.store.pointer_up() {
                self.handle_event(event);
            }
        }

        consumed
    }

    /// Paints every overlay, bottom to top.
    pub fn paint_overlays(&self, painter: &egui::Painter, origin: Vec2) {
        for overlay in self.store.overlays() {
            let selected = self.store.selected() == Some(overlay.id);
            paint_overlay(
                painter,
                origin,
                overlay,
                self.documents.get(overlay.id),
                selected,
            );
        }
    }

    /// Renders the floating panel for the overlay being placed or selected.
    pub fn show_overlay_controls(&mut self, ctx: &egui::Context, panel_rect: Rect) {
        let placing = self.store.mode() == PlacementMode::Placing;
        let selected = self.store.selected();
        if !placing && selected.is_none() {
            return;
        }

        let margin = 12.0;
        let anchor_pos = egui::pos2(
            panel_rect.right() - CONTROLS_WIDTH - margin,
            panel_rect.top() + margin,
        );

        egui::Area::new(egui::Id::new("overlay_controls"))
            .fixed_pos(anchor_pos)
            .interactable(true)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(CONTROLS_WIDTH);

                    if placing {
                        ui.label("Drag to position the PDF");
                        if ui.button("Place PDF").clicked()
                            && let Some(event) = self.store.place()
                        {
                            self.handle_event(event);
                        }
                        ui.separator();
                    }

                    if let Some(id) = selected {
                        self.show_overlay_adjustments(ui, id);
                    }
                });
            });
    }

    fn show_overlay_adjustments(&mut self, ui: &mut egui::Ui, id: OverlayId) {
        let Some(overlay) = self.store.get_mut(id) else {
            return;
        };

        ui.add(egui::Label::new(egui::RichText::new(&overlay.name).strong()).truncate());

        // Rotation
        let mut rotation = overlay.rotation();
        ui.horizontal(|ui| {
            ui.label("Rotation");
            if ui.small_button(format!("-{ROTATION_STEP}°")).clicked() {
                rotation -= ROTATION_STEP;
            }
            ui.add(
                egui::DragValue::new(&mut rotation)
                    .speed(1.0)
                    .max_decimals(1)
                    .suffix("°"),
            );
            if ui.small_button(format!("+{ROTATION_STEP}°")).clicked() {
                rotation += ROTATION_STEP;
            }
        });
        ui.add(egui::Slider::new(&mut rotation, 0.0..=360.0).show_value(false));
        overlay.set_rotation(rotation);

        let mut opacity = overlay.opacity();
        ui.add(
            egui::Slider::new(&mut opacity, OPACITY_RANGE)
                .step_by(SLIDER_STEP)
                .text("Opacity"),
        );
        overlay.set_opacity(opacity);

        let mut zoom = overlay.zoom();
        ui.add(
            egui::Slider::new(&mut zoom, ZOOM_RANGE)
                .step_by(SLIDER_STEP)
                .text("Zoom"),
        );
        overlay.set_zoom(zoom);

        ui.separator();

        let mut hold = self.store.hold_placement();
        if ui
            .checkbox(&mut hold, "Stay in placement mode after release")
            .changed()
        {
            self.store.set_hold_placement(hold);
        }

        if ui.button("Remove PDF").clicked() {
            self.remove_overlay(id);
        }
    }
}

fn cursor_for(target: HitTarget) -> egui::CursorIcon {
    match target {
        HitTarget::Body => egui::CursorIcon::Move,
        HitTarget::Remove => egui::CursorIcon::PointingHand,
        HitTarget::Handle(handle) => match handle {
            ResizeHandle::N | ResizeHandle::S => egui::CursorIcon::ResizeVertical,
            ResizeHandle::E | ResizeHandle::W => egui::CursorIcon::ResizeHorizontal,
            ResizeHandle::NE | ResizeHandle::SW => egui::CursorIcon::ResizeNeSw,
            ResizeHandle::NW | ResizeHandle::SE => egui::CursorIcon::ResizeNwSe,
        },
    }
}

/// Corners of a local rectangle mapped to the screen.
fn screen_quad(overlay: &OverlayState, local: Rect, origin: Vec2) -> Vec<Pos2> {
    [
        local.left_top(),
        local.right_top(),
        local.right_bottom(),
        local.left_bottom(),
    ]
    .into_iter()
    .map(|corner| overlay.to_screen(corner.to_vec2()) + origin)
    .collect()
}

fn paint_overlay(
    painter: &egui::Painter,
    origin: Vec2,
    overlay: &OverlayState,
    view: Option<&DocumentView>,
    selected: bool,
) {
    let center = overlay.center() + origin;
    let rot = Rot2::from_angle(overlay.rotation().to_radians());
    let alpha = overlay.opacity();
    let local = Rect::from_center_size(Pos2::ZERO, overlay.display_size());

    // Container
    let mut container = egui::Mesh::default();
    container.add_colored_rect(
        local.translate(center.to_vec2()),
        Color32::WHITE.gamma_multiply(alpha),
    );
    container.rotate(rot, center);
    painter.add(Shape::mesh(container));

    match view {
        Some(DocumentView::Ready {
            texture, aspect, ..
        }) => {
            if let Some((visible, uv)) = overlay.content_quad(*aspect) {
                let mut mesh = egui::Mesh::with_texture(texture.id());
                mesh.add_rect_with_uv(
                    visible.translate(center.to_vec2()),
                    uv,
                    Color32::WHITE.gamma_multiply(alpha),
                );
                mesh.rotate(rot, center);
                painter.add(Shape::mesh(mesh));
            }
        }
        Some(DocumentView::Failed(msg)) => {
            paint_placeholder(painter, center, "Failed to load PDF file.", colors::ERROR_TEXT);
            painter.text(
                center + Vec2::new(0.0, 18.0),
                egui::Align2::CENTER_TOP,
                msg,
                egui::FontId::proportional(11.0),
                colors::ERROR_TEXT.gamma_multiply(0.8),
            );
        }
        Some(DocumentView::Loading(_)) | None => {
            paint_placeholder(painter, center, "Loading PDF...", colors::PLACEHOLDER_TEXT);
        }
    }

    let outline = if selected {
        Stroke::new(2.0, colors::SELECTED_OUTLINE)
    } else {
        Stroke::new(1.0, colors::OVERLAY_OUTLINE.gamma_multiply(alpha))
    };
    painter.add(Shape::closed_line(
        screen_quad(overlay, local, origin),
        outline,
    ));

    // Remove control
    let remove = overlay.remove_control_rect();
    painter.add(Shape::convex_polygon(
        screen_quad(overlay, remove, origin),
        colors::REMOVE_FILL,
        Stroke::NONE,
    ));
    painter.text(
        overlay.to_screen(remove.center().to_vec2()) + origin,
        egui::Align2::CENTER_CENTER,
        "✕",
        egui::FontId::proportional(12.0),
        Color32::WHITE,
    );

    if selected {
        for (_, pos) in overlay.handle_positions() {
            painter.rect(
                Rect::from_center_size(pos + origin, Vec2::splat(HANDLE_SIZE)),
                1.0,
                colors::HANDLE_FILL,
                Stroke::new(1.5, colors::HANDLE_STROKE),
                egui::StrokeKind::Middle,
            );
        }
    }
}

fn paint_placeholder(painter: &egui::Painter, center: Pos2, text: &str, color: Color32) {
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(14.0),
        color,
    );
}
