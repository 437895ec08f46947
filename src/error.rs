use std::path::PathBuf;

use thiserror::Error;

use crate::grid::Position;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum GridError {
    #[error("position (row {}, col {}) is outside the grid", .0.row, .0.col)]
    OutOfBounds(Position),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to create window: {0}")]
    Window(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}
