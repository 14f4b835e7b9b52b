// Persisted user settings (interface language)

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the settings file location
pub const CONFIG_ENV: &str = "WININFO_CONFIG";

/// File name used next to the executable when no override is given
pub const CONFIG_FILE_NAME: &str = "wininfo.toml";

/// Interface language. The chosen value is stored by its locale code and
/// only takes effect on the next start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-GB")]
    EnglishGb,
    #[serde(rename = "nb-NO")]
    NorwegianBokmal,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::EnglishGb, Language::NorwegianBokmal];

    /// Locale code written to the settings file.
    pub fn code(&self) -> &'static str {
        match self {
            Language::EnglishGb => "en-GB",
            Language::NorwegianBokmal => "nb-NO",
        }
    }

    /// Name of the language in that language, for the menu.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::EnglishGb => "English (UK)",
            Language::NorwegianBokmal => "Norsk bokmål",
        }
    }
}

/// Contents of the settings file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: Language,
}

impl Settings {
    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(AppError::ReadSettings {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(toml::from_str(&text)?)
    }

    /// Like [`Settings::load`] but logs and falls back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "using default settings");
            Self::default()
        })
    }

    /// Writes settings to `path`, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)?;
        let write_err = |source| AppError::WriteSettings {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)
    }
}

/// Resolves the settings file: CLI flag, then environment, then next to the executable.
///
/// # Arguments
/// * `cli_path` - value of `--config`, if given
pub fn resolve_settings_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(CONFIG_FILE_NAME)
}
