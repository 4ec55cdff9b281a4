#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod assets;
mod cli;
mod colors;
mod constants;
mod document;
mod map_view;
mod overlay_view;
mod tiles;
mod ui;

use assets::{SettingsSource, load_settings};
use clap::Parser;
use cli::Args;
use constants::VIEW_STORAGE_KEY;
use document::{DocumentRenderer, DocumentView};
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use survey_overlay::intake::accepts;
use survey_overlay::{
    FileIntake, IncomingFile, LatLng, MapController, OverlayId, OverlayStore, PlacementEvent,
    RenderSlots, Settings,
};
use thiserror::Error;
use tiles::TileCache;

/// Errors that can occur when reading a file from disk into the intake.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Map view remembered between runs.
#[derive(Serialize, Deserialize)]
struct SavedView {
    center: LatLng,
    zoom: f64,
}

/// Everything resolved before the window opens.
struct Startup {
    settings: Settings,
    files: Vec<PathBuf>,
    errors: Vec<String>,
}

/// Main application state for the survey overlay tool.
pub struct SurveyOverlayApp {
    settings: Settings,
    intake: FileIntake,
    store: OverlayStore,
    map: MapController,
    tiles: Option<TileCache>,
    renderer: DocumentRenderer,
    documents: RenderSlots<DocumentView>,
    /// Largest texture side the GPU accepts, refreshed every frame
    max_texture_side: usize,
    toasts: Toasts,
}

impl SurveyOverlayApp {
    fn new(cc: &eframe::CreationContext<'_>, startup: Startup) -> Self {
        let Startup {
            settings,
            files,
            errors,
        } = startup;

        let toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_BOTTOM, (-10.0, -40.0))
            .direction(egui::Direction::BottomUp);

        let mut map = MapController::new(
            settings.center,
            settings.zoom,
            settings.min_zoom,
            settings.max_zoom,
        );
        if settings.remember_view
            && let Some(storage) = cc.storage
            && let Some(view) = eframe::get_value::<SavedView>(storage, VIEW_STORAGE_KEY)
            && view.center.lat.is_finite()
            && view.center.lng.is_finite()
        {
            map.set_view(view.center, view.zoom);
        }

        let mut app = Self {
            intake: FileIntake::new(),
            store: OverlayStore::new(egui::vec2(
                settings.overlay_size[0],
                settings.overlay_size[1],
            )),
            map,
            tiles: None,
            renderer: DocumentRenderer::spawn(cc.egui_ctx.clone()),
            documents: RenderSlots::new(),
            max_texture_side: cc.egui_ctx.input(|i| i.max_texture_side),
            toasts,
            settings,
        };

        for err in errors {
            app.notify_error(err);
        }

        match TileCache::new(app.settings.tiles.clone()) {
            Ok(tiles) => app.tiles = Some(tiles),
            Err(err) => app.notify_error(err.to_string()),
        }

        app.add_paths(&files);
        app
    }

    fn notify_error(&mut self, text: String) {
        self.toasts.add(Toast {
            kind: ToastKind::Error,
            text: text.into(),
            options: ToastOptions::default()
                .duration_in_seconds(8.0)
                .show_icon(true),
            ..Default::default()
        });
    }

    /// Reads PDF files from disk into the intake; other files are skipped.
    fn add_paths(&mut self, paths: &[PathBuf]) {
        let mut incoming = Vec::new();
        for path in paths {
            let name = file_name(path);
            if !accepts(&name, None) {
                log::debug!("Ignoring {}", path.display());
                continue;
            }
            match read_file(path, name) {
                Ok(file) => incoming.push(file),
                Err(err) => {
                    log::warn!("{err}");
                    self.notify_error(err.to_string());
                }
            }
        }
        self.intake.accept(incoming);
    }

    /// Accepts files dropped onto the window this frame.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }

        let mut incoming = Vec::new();
        for file in dropped {
            let name = match (&file.path, file.name.is_empty()) {
                (Some(path), true) => file_name(path),
                _ => file.name.clone(),
            };
            let mime = (!file.mime.is_empty()).then(|| file.mime.clone());
            if !accepts(&name, mime.as_deref()) {
                log::debug!("Ignoring dropped file {name}");
                continue;
            }
            let result = match (file.bytes, &file.path) {
                (Some(bytes), _) => Ok(IncomingFile { name, mime, bytes }),
                (None, Some(path)) => read_file(path, name),
                (None, None) => continue,
            };
            match result {
                Ok(file) => incoming.push(file),
                Err(err) => {
                    log::warn!("{err}");
                    self.notify_error(err.to_string());
                }
            }
        }

        let added = self.intake.accept(incoming);
        log::info!("Accepted {added} dropped file(s)");
    }

    /// Starts placing the given file at the centre of the map.
    fn place_file(&mut self, file_id: &str) {
        let Some(file) = self.intake.get(file_id).cloned() else {
            return;
        };
        let center = (self.map.viewport().size / 2.0).to_pos2();
        if let Some(event) = self.store.begin_placement(&file, center) {
            self.handle_event(event);
        }
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        if self.store.remove(id).is_some() {
            self.teardown_document(id);
        }
    }

    fn handle_event(&mut self, event: PlacementEvent) {
        match event {
            PlacementEvent::Started(id) => self.mount_document(id),
            PlacementEvent::Replaced { old, new } => self.replace_document(old, new),
            PlacementEvent::Completed(id) => {
                if let Some(overlay) = self.store.get(id) {
                    let bounds = overlay.geo_bounds(self.map.viewport());
                    log::info!("Placed {} at {:?}", overlay.name, bounds);
                }
            }
            PlacementEvent::Removed(id) => self.teardown_document(id),
        }
    }

    fn request_document(&self, id: OverlayId) -> Option<DocumentView> {
        let overlay = self.store.get(id)?;
        Some(
            self.renderer.request(
                &overlay.content,
                self.settings.render_width,
                self.max_texture_side,
            ),
        )
    }

    fn mount_document(&mut self, id: OverlayId) {
        let Some(view) = self.request_document(id) else {
            return;
        };
        if let Err(err) = self.documents.mount(id, view) {
            log::warn!("{err}");
        }
    }

    fn replace_document(&mut self, old: OverlayId, new: OverlayId) {
        let Some(view) = self.request_document(new) else {
            return;
        };
        match self.documents.replace(old, new, view) {
            Ok(None) => {}
            Ok(Some(teardown_err)) => log::warn!("{teardown_err}"),
            Err(err) => log::warn!("{err}"),
        }
    }

    fn teardown_document(&mut self, id: OverlayId) {
        if let Err(err) = self.documents.unmount(id) {
            log::warn!("{err}");
        }
    }

    /// Polls the renderer for finished pages.
    fn poll_documents(&mut self, ctx: &egui::Context) {
        for (id, view) in self.documents.iter_mut() {
            view.poll(ctx, &id.to_string());
        }
    }

    fn toggle_lock(&mut self) {
        let locked = self.map.toggle_lock();
        log::info!("Map {}", if locked { "locked" } else { "unlocked" });
    }

    fn reset_view(&mut self) {
        self.map
            .reset_view(self.settings.center, self.settings.zoom);
    }
}

impl eframe::App for SurveyOverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.max_texture_side = ctx.input(|i| i.max_texture_side);
        self.poll_documents(ctx);
        self.handle_dropped_files(ctx);
        self.handle_keyboard_input(ctx);

        self.show_header(ctx);
        self.show_status_bar(ctx);
        self.show_sidebar(ctx);
        self.show_central_panel(ctx);

        if let Some(tiles) = &mut self.tiles {
            tiles.end_frame();
        }

        // Show toasts
        self.toasts.show(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if self.settings.remember_view {
            let view = SavedView {
                center: self.map.viewport().center,
                zoom: self.map.viewport().zoom(),
            };
            eframe::set_value(storage, VIEW_STORAGE_KEY, &view);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_file(path: &Path, name: String) -> Result<IncomingFile, IntakeError> {
    let bytes = std::fs::read(path).map_err(|source| IntakeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(IncomingFile {
        name,
        mime: None,
        bytes: Arc::from(bytes),
    })
}

/// Loads settings and applies command line overrides, falling back to the
/// defaults when either step fails.
fn resolve_startup(args: Args) -> Startup {
    let mut errors = Vec::new();

    let mut settings = match load_settings(args.config.as_deref()) {
        Ok((settings, source)) => {
            match source {
                SettingsSource::File(path) => {
                    log::info!("Using settings from {}", path.display())
                }
                SettingsSource::Embedded => log::info!("Using default settings"),
            }
            settings
        }
        Err(err) => {
            log::error!("{err}");
            errors.push(err.to_string());
            Settings::default()
        }
    };

    args.apply(&mut settings);
    if let Err(err) = settings.validate() {
        log::error!("{err}");
        errors.push(err.to_string());
        settings = Settings::default();
    }

    Startup {
        settings,
        files: args.files,
        errors,
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let startup = resolve_startup(Args::parse());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Survey Map Overlay Tool",
        options,
        Box::new(|cc| Ok(Box::new(SurveyOverlayApp::new(cc, startup)))),
    )
}
