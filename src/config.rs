//! User settings, stored as RON.

use crate::geo::{LatLng, TileId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Widest page raster the renderer is asked for.
pub const MAX_RENDER_WIDTH: u32 = 16_384;

/// Errors that can occur when loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] ron::de::SpannedError),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Where map tiles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSource {
    /// URL with `{z}`, `{x}`, `{y}` and optionally `{s}` placeholders
    pub url_template: String,
    /// Values substituted for `{s}`, picked per tile
    pub subdomains: Vec<String>,
    /// Static attribution text shown under the map
    pub attribution: String,
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned(),
            subdomains: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            attribution: "© OpenStreetMap contributors".to_owned(),
        }
    }
}

impl TileSource {
    /// Builds the request URL for a tile.
    pub fn url(&self, tile: TileId) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string());
        if !self.subdomains.is_empty() {
            let index = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[index]);
        }
        url
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initial map centre
    pub center: LatLng,
    /// Initial map zoom
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub tiles: TileSource,
    /// Size of a newly placed overlay [width, height]
    pub overlay_size: [f32; 2],
    /// Pixel width the first PDF page is rasterised at
    pub render_width: u32,
    /// Restore the last map view on startup instead of `center`/`zoom`
    pub remember_view: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            center: LatLng::new(51.505, -0.09),
            zoom: 13.0,
            min_zoom: 0.0,
            max_zoom: 19.0,
            tiles: TileSource::default(),
            overlay_size: [300.0, 400.0],
            render_width: 1200,
            remember_view: false,
        }
    }
}

impl Settings {
    /// Parses and validates settings from a RON string.
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a RON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.zoom.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "zoom {} must be a finite number",
                self.zoom
            )));
        }
        if !self.center.lat.is_finite() || !self.center.lng.is_finite() {
            return Err(SettingsError::Invalid(format!(
                "center ({}, {}) must be finite coordinates",
                self.center.lat, self.center.lng
            )));
        }
        if !(0.0..=24.0).contains(&self.min_zoom)
            || !(0.0..=24.0).contains(&self.max_zoom)
            || self.min_zoom > self.max_zoom
        {
            return Err(SettingsError::Invalid(format!(
                "zoom range {}..={} must be ordered and within 0..=24",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.overlay_size.iter().any(|v| *v < crate::overlay::MIN_SIZE) {
            return Err(SettingsError::Invalid(format!(
                "overlay_size {:?} is below the minimum of {}",
                self.overlay_size,
                crate::overlay::MIN_SIZE
            )));
        }
        if !(1..=MAX_RENDER_WIDTH).contains(&self.render_width) {
            return Err(SettingsError::Invalid(format!(
                "render_width {} must be within 1..={MAX_RENDER_WIDTH}",
                self.render_width
            )));
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tiles.url_template.contains(placeholder) {
                return Err(SettingsError::Invalid(format!(
                    "tile url_template is missing {placeholder}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let settings = Settings::from_ron("(zoom: 10.0, remember_view: true)").unwrap();
        assert_eq!(settings.zoom, 10.0);
        assert!(settings.remember_view);
        assert_eq!(settings.center, LatLng::new(51.505, -0.09));
        assert_eq!(settings.overlay_size, [300.0, 400.0]);
    }

    #[test]
    fn test_tile_source_override() {
        let settings = Settings::from_ron(
            r#"(tiles: (url_template: "https://{s}.example.com/{z}/{x}/{y}.png", subdomains: ["a", "b"], attribution: "Example"))"#,
        )
        .unwrap();
        let url = settings.tiles.url(TileId { z: 3, x: 1, y: 2 });
        assert_eq!(url, "https://b.example.com/3/1/2.png");
        assert_eq!(settings.tiles.attribution, "Example");
    }

    #[test]
    fn test_default_tile_url() {
        let url = TileSource::default().url(TileId { z: 13, x: 4093, y: 2723 });
        assert_eq!(url, "https://tile.openstreetmap.org/13/4093/2723.png");
    }

    #[test]
    fn test_rejects_undersized_overlay() {
        let err = Settings::from_ron("(overlay_size: (50.0, 400.0))").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_non_finite_zoom() {
        let err = Settings::from_ron("(zoom: NaN)").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let mut settings = Settings::default();
        settings.zoom = f64::INFINITY;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_center() {
        let err = Settings::from_ron("(center: (lat: NaN, lng: 0.0))").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let mut settings = Settings::default();
        settings.center = LatLng::new(0.0, f64::NEG_INFINITY);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_render_width_bounds() {
        let err = Settings::from_ron("(render_width: 3000000000)").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert!(Settings::from_ron("(render_width: 0)").is_err());

        let settings = Settings::from_ron("(render_width: 16384)").unwrap();
        assert_eq!(settings.render_width, MAX_RENDER_WIDTH);
    }

    #[test]
    fn test_rejects_inverted_zoom_range() {
        let err = Settings::from_ron("(min_zoom: 12.0, max_zoom: 4.0)").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_rejects_template_without_placeholders() {
        let err =
            Settings::from_ron(r#"(tiles: (url_template: "https://example.com/tile.png"))"#)
                .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Settings::from_ron("(zoom: \"high\")"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/settings.ron")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }
}
