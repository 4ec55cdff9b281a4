//! The overlay store and its placement / pointer-interaction state machine.
//!
//! Placement: `Idle` -> `Placing` when a file is selected, back to `Idle`
//! when the pointer is released after editing the placed overlay or when
//! placement is confirmed explicitly. Orthogonally, the pointer is either
//! idle, dragging an overlay body or resizing from one handle.

use crate::geo::MapViewport;
use crate::intake::UploadedFile;
use crate::overlay::{HitTarget, OverlayId, OverlayState, ResizeHandle};
use eframe::egui::{Pos2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    #[default]
    Idle,
    Placing,
}

/// Pointer interaction in progress, carrying the overlay it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    None,
    Dragging {
        overlay: OverlayId,
    },
    Resizing {
        overlay: OverlayId,
        handle: ResizeHandle,
    },
}

impl Interaction {
    pub fn overlay(self) -> Option<OverlayId> {
        match self {
            Self::None => None,
            Self::Dragging { overlay } | Self::Resizing { overlay, .. } => Some(overlay),
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::None
    }
}

/// Notifications for the shell, which owns render resources and toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementEvent {
    Started(OverlayId),
    /// `old` was still being placed and has been destroyed
    Replaced {
        old: OverlayId,
        new: OverlayId,
    },
    Completed(OverlayId),
    Removed(OverlayId),
}

/// All overlays on the map, in drawing order (last is topmost).
#[derive(Debug)]
pub struct OverlayStore {
    overlays: Vec<OverlayState>,
    next_id: u64,
    mode: PlacementMode,
    placing: Option<OverlayId>,
    selected: Option<OverlayId>,
    interaction: Interaction,
    hold_placement: bool,
    initial_size: Vec2,
}

impl OverlayStore {
    pub fn new(initial_size: Vec2) -> Self {
        Self {
            overlays: Vec::new(),
            next_id: 1,
            mode: PlacementMode::Idle,
            placing: None,
            selected: None,
            interaction: Interaction::None,
            hold_placement: false,
            initial_size,
        }
    }

    pub fn overlays(&self) -> &[OverlayState] {
        &self.overlays
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayState> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: OverlayId) -> Option<&mut OverlayState> {
        self.overlays.iter_mut().find(|o| o.id == id)
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    /// The overlay currently being placed.
    pub fn placing(&self) -> Option<OverlayId> {
        self.placing
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.selected
    }

    pub fn select(&mut self, id: Option<OverlayId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn hold_placement(&self) -> bool {
        self.hold_placement
    }

    /// When set, releasing the pointer does not end placement.
    pub fn set_hold_placement(&mut self, hold: bool) {
        self.hold_placement = hold;
    }

    /// Creates an overlay for `file` centred at `center` and enters placement.
    ///
    /// An overlay of a different file that is still being placed is destroyed
    /// first. Returns `None` when `file` is already being placed.
    pub fn begin_placement(
        &mut self,
        file: &UploadedFile,
        center: Pos2,
    ) -> Option<PlacementEvent> {
        let mut replaced = None;
        if self.mode == PlacementMode::Placing
            && let Some(current) = self.placing
        {
            if self.get(current).is_some_and(|o| o.file_id == file.id) {
                return None;
            }
            self.remove(current);
            replaced = Some(current);
        }

        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays
            .push(OverlayState::new(id, file, center, self.initial_size));
        self.mode = PlacementMode::Placing;
        self.placing = Some(id);
        self.selected = Some(id);

        Some(match replaced {
            Some(old) => PlacementEvent::Replaced { old, new: id },
            None => PlacementEvent::Started(id),
        })
    }

    /// Starts an interaction on `id`. The remove control removes the overlay.
    pub fn pointer_down(&mut self, id: OverlayId, target: HitTarget) -> Option<PlacementEvent> {
        let index = self.overlays.iter().position(|o| o.id == id)?;
        if target == HitTarget::Remove {
            self.remove(id);
            return Some(PlacementEvent::Removed(id));
        }

        let overlay = self.overlays.remove(index);
        self.overlays.push(overlay);
        self.selected = Some(id);
        self.interaction = match target {
            HitTarget::Handle(handle) => Interaction::Resizing {
                overlay: id,
                handle,
            },
            _ => Interaction::Dragging { overlay: id },
        };
        None
    }

    /// Applies a pointer movement to the current interaction.
    pub fn pointer_move(&mut self, delta: Vec2) -> Option<OverlayId> {
        let interaction = self.interaction;
        let id = interaction.overlay()?;
        let overlay = self.get_mut(id)?;
        match interaction {
            Interaction::Dragging { .. } => overlay.drag_by(delta),
            Interaction::Resizing { handle, .. } => overlay.resize(handle, delta),
            Interaction::None => {}
        }
        Some(id)
    }

    /// Ends the current interaction, completing placement unless it is held.
    pub fn pointer_up(&mut self) -> Option<PlacementEvent> {
        let released = self.interaction.overlay();
        self.interaction = Interaction::None;
        let released = released?;
        if self.hold_placement || self.placing != Some(released) {
            return None;
        }
        self.finish_placement()
    }

    /// Confirms placement regardless of any interaction in progress.
    pub fn place(&mut self) -> Option<PlacementEvent> {
        self.interaction = Interaction::None;
        self.finish_placement()
    }

    fn finish_placement(&mut self) -> Option<PlacementEvent> {
        if self.mode != PlacementMode::Placing {
            return None;
        }
        self.mode = PlacementMode::Idle;
        self.placing.take().map(PlacementEvent::Completed)
    }

    /// Removes an overlay and any state that refers to it.
    pub fn remove(&mut self, id: OverlayId) -> Option<OverlayState> {
        let index = self.overlays.iter().position(|o| o.id == id)?;
        if self.placing == Some(id) {
            self.placing = None;
            self.mode = PlacementMode::Idle;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.interaction.overlay() == Some(id) {
            self.interaction = Interaction::None;
        }
        Some(self.overlays.remove(index))
    }

    /// Finds the topmost overlay under `point`. Handles are only live on the
    /// selected overlay.
    pub fn hit_test(&self, point: Pos2, handle_radius: f32) -> Option<(OverlayId, HitTarget)> {
        self.overlays.iter().rev().find_map(|overlay| {
            let with_handles = self.selected == Some(overlay.id);
            overlay
                .hit_test(point, with_handles, handle_radius)
                .map(|target| (overlay.id, target))
        })
    }

    /// Keeps overlays glued to the map: freshly edited overlays are anchored
    /// at their screen position, the rest follow the viewport.
    pub fn sync_to_map(&mut self, viewport: &MapViewport) {
        for overlay in &mut self.overlays {
            if overlay.anchor().is_some() {
                overlay.follow(viewport);
            } else {
                overlay.anchor_to(viewport);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::intake::{FileIntake, IncomingFile};
    use crate::map::MapController;
    use eframe::egui;
    use std::sync::Arc;

    fn intake(names: &[&str]) -> FileIntake {
        let mut intake = FileIntake::new();
        intake.accept(names.iter().map(|name| IncomingFile {
            name: (*name).to_owned(),
            mime: Some("application/pdf".to_owned()),
            bytes: Arc::from(&b"%PDF"[..]),
        }));
        intake
    }

    fn store() -> OverlayStore {
        OverlayStore::new(egui::vec2(300.0, 400.0))
    }

    #[test]
    fn test_selecting_file_starts_placement() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        assert_eq!(store.mode(), PlacementMode::Idle);
        let event = store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;
        assert_eq!(event, Some(PlacementEvent::Started(id)));
        assert_eq!(store.mode(), PlacementMode::Placing);
        assert_eq!(store.placing(), Some(id));
        assert_eq!(store.overlays()[0].name, "site.pdf");
    }

    #[test]
    fn test_drag_scenario_completes_on_release() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;
        let start = store.overlays()[0].center();

        store.pointer_down(id, HitTarget::Body);
        assert_eq!(store.interaction(), Interaction::Dragging { overlay: id });
        store.pointer_move(egui::vec2(20.0, 15.0));
        store.pointer_move(egui::vec2(-5.0, -5.0));
        let event = store.pointer_up();

        assert_eq!(store.get(id).unwrap().center() - start, egui::vec2(15.0, 10.0));
        assert_eq!(event, Some(PlacementEvent::Completed(id)));
        assert_eq!(store.mode(), PlacementMode::Idle);
        assert_eq!(store.interaction(), Interaction::None);
    }

    #[test]
    fn test_hold_placement_keeps_placing() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        store.set_hold_placement(true);
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;
        store.pointer_down(id, HitTarget::Body);
        store.pointer_move(egui::vec2(5.0, 5.0));
        assert_eq!(store.pointer_up(), None);
        assert_eq!(store.mode(), PlacementMode::Placing);
        assert_eq!(store.place(), Some(PlacementEvent::Completed(id)));
        assert_eq!(store.mode(), PlacementMode::Idle);
    }

    #[test]
    fn test_place_button_mid_drag() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;
        store.pointer_down(id, HitTarget::Body);
        assert_eq!(store.place(), Some(PlacementEvent::Completed(id)));
        assert_eq!(store.interaction(), Interaction::None);
        assert_eq!(store.pointer_up(), None);
        assert_eq!(store.place(), None);
    }

    #[test]
    fn test_resize_through_store() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;
        store.pointer_down(id, HitTarget::Handle(ResizeHandle::NW));
        store.pointer_move(egui::vec2(-10.0, -10.0));
        let overlay = store.get(id).unwrap();
        assert_eq!(overlay.size(), egui::vec2(310.0, 410.0));
        assert_eq!(overlay.center(), egui::pos2(405.0, 305.0));
    }

    #[test]
    fn test_new_file_replaces_overlay_being_placed() {
        let files = intake(&["a.pdf", "b.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(0.0, 0.0));
        let old = store.overlays()[0].id;
        let event = store.begin_placement(&files.files()[1], egui::pos2(0.0, 0.0));
        let new = store.overlays()[0].id;
        assert_eq!(event, Some(PlacementEvent::Replaced { old, new }));
        assert_eq!(store.overlays().len(), 1);
        assert_eq!(store.overlays()[0].name, "b.pdf");
    }

    #[test]
    fn test_same_file_while_placing_is_noop() {
        let files = intake(&["a.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(0.0, 0.0));
        assert_eq!(store.begin_placement(&files.files()[0], egui::pos2(9.0, 9.0)), None);
        assert_eq!(store.overlays().len(), 1);
    }

    #[test]
    fn test_placed_overlays_persist() {
        let files = intake(&["a.pdf", "b.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(0.0, 0.0));
        store.place();
        let event = store.begin_placement(&files.files()[1], egui::pos2(0.0, 0.0));
        assert!(matches!(event, Some(PlacementEvent::Started(_))));
        assert_eq!(store.overlays().len(), 2);
    }

    #[test]
    fn test_dragging_placed_overlay_does_not_end_other_placement() {
        let files = intake(&["a.pdf", "b.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(100.0, 100.0));
        store.place();
        let placed = store.overlays()[0].id;
        store.begin_placement(&files.files()[1], egui::pos2(900.0, 900.0));
        store.pointer_down(placed, HitTarget::Body);
        store.pointer_move(egui::vec2(1.0, 1.0));
        assert_eq!(store.pointer_up(), None);
        assert_eq!(store.mode(), PlacementMode::Placing);
    }

    #[test]
    fn test_remove_control() {
        let files = intake(&["a.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(0.0, 0.0));
        let id = store.overlays()[0].id;
        assert_eq!(
            store.pointer_down(id, HitTarget::Remove),
            Some(PlacementEvent::Removed(id))
        );
        assert!(store.overlays().is_empty());
        assert_eq!(store.mode(), PlacementMode::Idle);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let files = intake(&["a.pdf", "b.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        store.place();
        store.begin_placement(&files.files()[1], egui::pos2(420.0, 300.0));
        let top = store.overlays()[1].id;
        let hit = store.hit_test(egui::pos2(410.0, 300.0), 6.0);
        assert_eq!(hit, Some((top, HitTarget::Body)));
    }

    #[test]
    fn test_pointer_down_brings_to_front() {
        let files = intake(&["a.pdf", "b.pdf"]);
        let mut store = store();
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        store.place();
        let bottom = store.overlays()[0].id;
        store.begin_placement(&files.files()[1], egui::pos2(420.0, 300.0));
        store.pointer_down(bottom, HitTarget::Body);
        assert_eq!(store.overlays().last().unwrap().id, bottom);
        assert_eq!(store.selected(), Some(bottom));
    }

    #[test]
    fn test_lock_mid_drag_does_not_cancel_drag() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        let mut map = MapController::new(LatLng::new(51.505, -0.09), 13.0, 0.0, 19.0);
        map.set_size(egui::vec2(800.0, 600.0));
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        let id = store.overlays()[0].id;

        store.pointer_down(id, HitTarget::Body);
        store.pointer_move(egui::vec2(10.0, 0.0));
        map.set_locked(true);
        assert!(store.interaction().is_active());
        store.pointer_move(egui::vec2(10.0, 5.0));
        assert!(!map.drag(egui::vec2(10.0, 5.0)));

        assert_eq!(store.get(id).unwrap().center(), egui::pos2(420.0, 305.0));
        assert_eq!(store.pointer_up(), Some(PlacementEvent::Completed(id)));
    }

    #[test]
    fn test_sync_to_map_anchors_then_follows() {
        let files = intake(&["site.pdf"]);
        let mut store = store();
        let mut map = MapController::new(LatLng::new(51.505, -0.09), 13.0, 0.0, 19.0);
        map.set_size(egui::vec2(800.0, 600.0));
        store.begin_placement(&files.files()[0], egui::pos2(400.0, 300.0));
        store.sync_to_map(map.viewport());
        assert!(store.overlays()[0].anchor().is_some());

        map.drag(egui::vec2(-100.0, 0.0));
        store.sync_to_map(map.viewport());
        let center = store.overlays()[0].center();
        assert!((center.x - 300.0).abs() < 1e-2);
        assert!((center.y - 300.0).abs() < 1e-2);
    }
}
