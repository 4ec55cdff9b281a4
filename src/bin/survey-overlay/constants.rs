/// Width of the sidebar panel in pixels.
pub const SIDEBAR_WIDTH: f32 = 256.0;

/// Radius around a resize handle that picks it up.
pub const HANDLE_RADIUS: f32 = 7.0;

/// Drawn size of a resize handle square.
pub const HANDLE_SIZE: f32 = 8.0;

/// Tiles not drawn for this many frames may be evicted.
pub const TILE_IDLE_FRAMES: u64 = 600;

/// Soft limit on cached tile textures.
pub const MAX_CACHED_TILES: usize = 512;

/// User agent sent with tile requests.
pub const USER_AGENT: &str = concat!("survey-overlay/", env!("CARGO_PKG_VERSION"));

/// Storage key for the last map view.
pub const VIEW_STORAGE_KEY: &str = "map_view";
