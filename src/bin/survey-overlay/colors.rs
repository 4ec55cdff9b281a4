//! Color constants for the map, overlays and UI elements.

use eframe::egui::Color32;

// Lock toggle
pub const LOCKED_BUTTON: Color32 = Color32::from_rgb(239, 68, 68);
pub const UNLOCKED_BUTTON: Color32 = Color32::from_rgb(34, 197, 94);

// Lock banner
pub const LOCK_BANNER_FILL: Color32 = Color32::from_rgb(254, 226, 226);
pub const LOCK_BANNER_EDGE: Color32 = Color32::from_rgb(239, 68, 68);
pub const LOCK_BANNER_TEXT: Color32 = Color32::from_rgb(185, 28, 28);

// Overlays
pub const OVERLAY_OUTLINE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 120);
pub const SELECTED_OUTLINE: Color32 = Color32::from_rgb(59, 130, 246);
pub const HANDLE_FILL: Color32 = Color32::WHITE;
pub const HANDLE_STROKE: Color32 = Color32::from_rgb(59, 130, 246);
pub const REMOVE_FILL: Color32 = Color32::from_rgba_premultiplied(178, 0, 0, 178);
pub const PLACEHOLDER_TEXT: Color32 = Color32::from_rgb(75, 85, 99);
pub const ERROR_TEXT: Color32 = Color32::from_rgb(185, 28, 28);

// Map
pub const MAP_BACKGROUND: Color32 = Color32::from_rgb(221, 221, 221);
pub const TILE_PLACEHOLDER: Color32 = Color32::from_rgb(232, 232, 232);
pub const BOX_ZOOM_FILL: Color32 = Color32::from_rgba_premultiplied(30, 30, 30, 40);
pub const BOX_ZOOM_STROKE: Color32 = Color32::from_rgb(51, 51, 51);

// Sidebar drop zone
pub const DROP_ZONE_IDLE: Color32 = Color32::from_rgb(209, 213, 219);
pub const DROP_ZONE_ACTIVE: Color32 = Color32::from_rgb(59, 130, 246);
