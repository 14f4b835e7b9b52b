// Error types shared by the application layers

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop the application or a settings operation.
/// OS queries never produce these; they fold failures into placeholder values.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read settings from {}: {source}", .path.display())]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {}: {source}", .path.display())]
    WriteSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    ParseSettings(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    SerializeSettings(#[from] toml::ser::Error),

    #[error("elevation failed: {0}")]
    Elevation(String),

    #[error("failed to start the window: {0}")]
    Gui(#[from] eframe::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
