//! Panels and keyboard handling for the survey overlay application.

use crate::SurveyOverlayApp;
use crate::colors;
use crate::constants::SIDEBAR_WIDTH;
use eframe::egui;
use survey_overlay::OverlayId;

const INSTRUCTIONS: [&str; 5] = [
    "Drop PDF files on the window or click the drop zone",
    "Press Place next to a PDF to put it on the map",
    "Drag the PDF into position and release to place it",
    "Select a placed PDF to resize, rotate or fade it",
    "Lock the map to stop it moving while you work",
];

impl SurveyOverlayApp {
    /// Handles keyboard shortcuts for the map and the selected overlay.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        ctx.input(|i| {
            let mut direction = egui::Vec2::ZERO;
            if i.key_pressed(egui::Key::ArrowLeft) {
                direction.x -= 1.0;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                direction.x += 1.0;
            }
            if i.key_pressed(egui::Key::ArrowUp) {
                direction.y -= 1.0;
            }
            if i.key_pressed(egui::Key::ArrowDown) {
                direction.y += 1.0;
            }
            self.map.keyboard_pan(direction);

            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                self.map.keyboard_zoom(1.0);
            }
            if i.key_pressed(egui::Key::Minus) {
                self.map.keyboard_zoom(-1.0);
            }
            if i.key_pressed(egui::Key::Num0) && self.map.gestures().keyboard {
                self.reset_view();
            }
            if i.key_pressed(egui::Key::L) {
                self.toggle_lock();
            }
        });

        if ctx.input(|i| i.key_pressed(egui::Key::Delete))
            && let Some(id) = self.store.selected()
        {
            self.remove_overlay(id);
        }
    }

    /// Renders the title bar with the lock toggle.
    pub fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Survey Map Overlay Tool");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let (text, fill) = if self.map.is_locked() {
                        ("Unlock Map", colors::LOCKED_BUTTON)
                    } else {
                        ("Lock Map", colors::UNLOCKED_BUTTON)
                    };
                    let button = egui::Button::new(
                        egui::RichText::new(text).strong().color(egui::Color32::WHITE),
                    )
                    .fill(fill);
                    if ui.add(button).on_hover_text("Toggle map lock (L)").clicked() {
                        self.toggle_lock();
                    }
                });
            });
        });
    }

    /// Renders the bottom status bar with controls hint and tile attribution.
    pub fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    "Drag: Pan | Scroll: Zoom | Shift+Drag: Box zoom | 0: Reset | L: Lock | Del: Remove",
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(&self.settings.tiles.attribution);
                    ui.separator();
                    ui.label(format!("Zoom {:.1}", self.map.viewport().zoom()));
                    if !self.documents.is_empty() {
                        ui.separator();
                        ui.label(format!("{} PDF(s) on map", self.documents.len()));
                    }
                });
            });
        });
    }

    /// Renders the left sidebar panel.
    pub fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_sidebar_content(ui);
                });
            });
    }

    /// Renders the sidebar content: drop zone, file lists and instructions.
    fn show_sidebar_content(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);

        ui.strong("Survey Map Controls");
        ui.separator();
        self.show_drop_zone(ui);

        ui.add_space(12.0);

        // Uploaded files
        ui.strong("Available PDFs");
        ui.separator();
        self.show_file_list(ui);

        ui.add_space(12.0);

        ui.strong("Placed overlays");
        ui.separator();
        self.show_overlay_list(ui);

        ui.add_space(12.0);

        ui.strong("Instructions");
        ui.separator();
        for (n, step) in INSTRUCTIONS.iter().enumerate() {
            ui.label(format!("{}. {step}", n + 1));
        }
    }

    /// Drop target that also opens a file dialog when clicked.
    fn show_drop_zone(&mut self, ui: &mut egui::Ui) {
        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let edge = if hovering {
            colors::DROP_ZONE_ACTIVE
        } else {
            colors::DROP_ZONE_IDLE
        };

        let response = egui::Frame::new()
            .stroke(egui::Stroke::new(2.0, edge))
            .corner_radius(4.0)
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label("Drop PDF survey maps here");
                    ui.weak("or click to select files");
                });
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);

        if response.clicked()
            && let Some(paths) = rfd::FileDialog::new()
                .add_filter("PDF", &["pdf"])
                .pick_files()
        {
            self.add_paths(&paths);
        }
    }

    fn show_file_list(&mut self, ui: &mut egui::Ui) {
        if self.intake.is_empty() {
            ui.weak("No PDFs uploaded yet");
            return;
        }

        let mut place = None;
        let mut forget = None;
        for file in self.intake.files() {
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .small_button("✕")
                        .on_hover_text("Remove from list")
                        .clicked()
                    {
                        forget = Some(file.id.clone());
                    }
                    if ui.small_button("Place").clicked() {
                        place = Some(file.id.clone());
                    }
                    ui.add(egui::Label::new(&file.name).truncate())
                        .on_hover_text(format!(
                            "{} ({:.1} KiB)",
                            file.content.locator(),
                            file.content.len() as f64 / 1024.0
                        ));
                });
            });
        }

        if let Some(id) = place {
            self.place_file(&id);
        }
        if let Some(id) = forget {
            self.intake.remove(&id);
        }
    }

    fn show_overlay_list(&mut self, ui: &mut egui::Ui) {
        if self.store.overlays().is_empty() {
            ui.weak("Nothing placed yet");
            return;
        }

        let mut select = None;
        let mut remove: Option<OverlayId> = None;
        for overlay in self.store.overlays() {
            let selected = self.store.selected() == Some(overlay.id);
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").on_hover_text("Remove").clicked() {
                        remove = Some(overlay.id);
                    }
                    if ui.selectable_label(selected, &overlay.name).clicked() {
                        select = Some(overlay.id);
                    }
                });
            });

            let view = self.documents.get(overlay.id);
            let pages = view.and_then(|view| view.page_count());
            let error = view.and_then(|view| view.error());
            let bounds = overlay.geo_bounds(self.map.viewport());
            ui.indent(overlay.id, |ui| {
                if let Some(pages) = pages {
                    ui.small(format!("{pages} page(s)"));
                }
                if let Some(error) = error {
                    ui.label(egui::RichText::new(error).small().color(colors::ERROR_TEXT));
                }
                ui.small(format!(
                    "NW {:.5}, {:.5}",
                    bounds.north_west.lat, bounds.north_west.lng
                ));
                ui.small(format!(
                    "SE {:.5}, {:.5}",
                    bounds.south_east.lat, bounds.south_east.lng
                ));
            });
        }

        if let Some(id) = select {
            self.store.select(Some(id));
        }
        if let Some(id) = remove {
            self.remove_overlay(id);
        }
    }

    /// Renders the central panel containing the map view.
    pub fn show_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::MAP_BACKGROUND))
            .show(ctx, |ui| {
                let panel_rect = ui.max_rect();
                self.show_map(ui);
                self.show_lock_banner(ctx, panel_rect);
                self.show_zoom_controls(ctx, panel_rect);
                self.show_overlay_controls(ctx, panel_rect);
            });
    }

    fn show_lock_banner(&self, ctx: &egui::Context, panel_rect: egui::Rect) {
        if !self.map.is_locked() {
            return;
        }

        let margin = 12.0;
        egui::Area::new(egui::Id::new("lock_banner"))
            .fixed_pos(panel_rect.left_top() + egui::vec2(margin, margin))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(colors::LOCK_BANNER_FILL)
                    .stroke(egui::Stroke::new(1.0, colors::LOCK_BANNER_EDGE))
                    .corner_radius(4.0)
                    .inner_margin(egui::Margin::symmetric(10, 6))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new("Map is locked")
                                .strong()
                                .color(colors::LOCK_BANNER_TEXT),
                        );
                    });
            });
    }

    /// Renders the floating zoom buttons. They obey the lock like the
    /// keyboard shortcuts do.
    fn show_zoom_controls(&mut self, ctx: &egui::Context, panel_rect: egui::Rect) {
        let margin = 12.0;
        let panel_width = 120.0;
        let panel_height = 36.0;

        let anchor_pos = egui::pos2(
            panel_rect.right() - panel_width - margin,
            panel_rect.bottom() - panel_height - margin,
        );

        egui::Area::new(egui::Id::new("zoom_controls"))
            .fixed_pos(anchor_pos)
            .interactable(true)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(ui.style().visuals.window_fill.gamma_multiply(0.95))
                    .show(ui, |ui| {
                        ui.add_enabled_ui(!self.map.is_locked(), |ui| {
                            ui.horizontal(|ui| {
                                if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                                    self.map.keyboard_zoom(1.0);
                                }
                                if ui.button("-").on_hover_text("Zoom out (-)").clicked() {
                                    self.map.keyboard_zoom(-1.0);
                                }
                                if ui.button("Reset").on_hover_text("Reset view (0)").clicked() {
                                    self.reset_view();
                                }
                            });
                        });
                    });
            });
    }
}
