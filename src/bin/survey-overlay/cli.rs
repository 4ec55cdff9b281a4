//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;
use survey_overlay::{LatLng, Settings};

/// Place PDF survey diagrams on an interactive map.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// PDF files to add to the file list on startup
    pub files: Vec<PathBuf>,

    /// Settings file (RON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial map latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Initial map longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Initial map zoom level
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Tile URL template with {z}, {x} and {y} placeholders
    #[arg(long)]
    pub tile_url: Option<String>,
}

impl Args {
    /// Applies command line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            settings.center = LatLng::new(lat, lon);
        }
        if let Some(zoom) = self.zoom {
            settings.zoom = zoom;
        }
        if let Some(url) = &self.tile_url {
            settings.tiles.url_template = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_files_and_view() {
        let args = Args::try_parse_from([
            "survey-overlay",
            "--lat",
            "-33.86",
            "--lon",
            "151.21",
            "--zoom",
            "16",
            "site.pdf",
            "plan.pdf",
        ])
        .unwrap();
        assert_eq!(args.files, [PathBuf::from("site.pdf"), PathBuf::from("plan.pdf")]);

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.center, LatLng::new(-33.86, 151.21));
        assert_eq!(settings.zoom, 16.0);
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Args::try_parse_from(["survey-overlay", "--lat", "10"]).is_err());
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let args = Args::try_parse_from(["survey-overlay"]).unwrap();
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_tile_url_override() {
        let args = Args::try_parse_from([
            "survey-overlay",
            "--tile-url",
            "https://tiles.example.com/{z}/{x}/{y}.png",
        ])
        .unwrap();
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(
            settings.tiles.url_template,
            "https://tiles.example.com/{z}/{x}/{y}.png"
        );
    }
}
