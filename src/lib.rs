//! State and geometry for placing PDF survey diagrams on top of a tiled map.
//!
//! Everything here is independent of the UI toolkit's frame loop so it can be
//! driven by pointer events in the app and by plain unit tests alike.

pub mod config;
pub mod geo;
pub mod intake;
pub mod map;
pub mod overlay;
pub mod placement;
pub mod slots;

pub use config::{Settings, SettingsError, TileSource};
pub use geo::{GeoBounds, LatLng, MapViewport, TileId};
pub use intake::{ContentRef, FileIntake, IncomingFile, UploadedFile};
pub use map::{Gestures, MapController};
pub use overlay::{HitTarget, OverlayId, OverlayState, ResizeHandle};
pub use placement::{Interaction, OverlayStore, PlacementEvent, PlacementMode};
pub use slots::{RenderSlots, SlotError};
