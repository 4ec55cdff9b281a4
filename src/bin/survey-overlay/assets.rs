//! Embedded default settings and settings file discovery.

use rust_embed::RustEmbed;
use std::path::{Path, PathBuf};
use survey_overlay::{Settings, SettingsError};

/// Embeds all assets from the assets/ directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

const SETTINGS_FILE: &str = "settings.ron";

/// Where the settings in use came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    Embedded,
}

/// Loads the embedded default settings.
pub fn embedded_settings() -> Result<Settings, SettingsError> {
    let file = Assets::get(SETTINGS_FILE)
        .ok_or_else(|| SettingsError::Invalid(format!("{SETTINGS_FILE} not embedded")))?;
    let text = std::str::from_utf8(&file.data)
        .map_err(|err| SettingsError::Invalid(format!("{SETTINGS_FILE}: {err}")))?;
    Settings::from_ron(text)
}

/// Per-user settings file, e.g. `~/.config/survey-overlay/settings.ron`.
fn user_settings_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("survey-overlay").join(SETTINGS_FILE))
}

/// Resolves settings from an explicit path, the user file, or the embedded
/// default, in that order. A file that exists but fails to load is an error.
pub fn load_settings(
    explicit: Option<&Path>,
) -> Result<(Settings, SettingsSource), SettingsError> {
    if let Some(path) = explicit {
        return Ok((Settings::load(path)?, SettingsSource::File(path.to_path_buf())));
    }
    if let Some(path) = user_settings_path().filter(|p| p.is_file()) {
        let settings = Settings::load(&path)?;
        return Ok((settings, SettingsSource::File(path)));
    }
    Ok((embedded_settings()?, SettingsSource::Embedded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_settings_match_defaults() {
        assert_eq!(embedded_settings().unwrap(), Settings::default());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = load_settings(Some(Path::new("/nonexistent/settings.ron")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
