use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::constants::*;
use crate::error::GameError;

#[derive(Debug, Parser)]
#[command(name = "blocktris_rs", about = "A falling-block puzzle game")]
pub struct Args {
    /// TOML file with game settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Seed for shape selection
    #[arg(long)]
    pub seed: Option<u64>,
    /// Gravity tick interval in milliseconds
    #[arg(long = "tick-ms")]
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub playfield_width: u32,
    pub playfield_height: u32,
    pub cell_size: u32,
    pub tick_interval_ms: u64,
    pub assets_dir: PathBuf,
    pub seed: Option<u64>,
    pub check_top_boundary: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playfield_width: DEFAULT_PLAYFIELD_SIZE.0,
            playfield_height: DEFAULT_PLAYFIELD_SIZE.1,
            cell_size: DEFAULT_CELL_SIZE,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            seed: None,
            check_top_boundary: true,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, GameError> {
        let content = fs::read_to_string(path).map_err(|source| GameError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, GameError> {
        let settings = Self::parse(content, Path::new(""))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Deserializes without validating, so later overrides can still fix a bad value.
    fn parse(content: &str, path: &Path) -> Result<Self, GameError> {
        toml::from_str(content).map_err(|source| GameError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config file named on the command line, if any, and applies flag overrides.
    pub fn load(args: &Args) -> Result<Self, GameError> {
        let mut settings = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(seed) = args.seed {
            settings.seed = Some(seed);
        }
        if let Some(tick_ms) = args.tick_ms {
            settings.tick_interval_ms = tick_ms;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.cell_size == 0 {
            return Err(GameError::Config("cell_size must be positive".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(GameError::Config("tick_interval_ms must be positive".into()));
        }
        if self.rows() == 0 || self.cols() == 0 {
            return Err(GameError::Config(format!(
                "playfield {}x{} is smaller than one {}px cell",
                self.playfield_width, self.playfield_height, self.cell_size
            )));
        }
        self.window_size()?;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        (self.playfield_height / self.cell_size) as usize
    }

    pub fn cols(&self) -> usize {
        (self.playfield_width / self.cell_size) as usize
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Playfield plus the preview panel, in pixels.
    pub fn window_size(&self) -> Result<(u32, u32), GameError> {
        let width = PREVIEW_PANEL_CELLS
            .checked_mul(self.cell_size)
            .and_then(|panel| panel.checked_add(self.playfield_width))
            .ok_or_else(|| {
                GameError::Config(format!(
                    "window for a {}px playfield with {}px cells is too wide",
                    self.playfield_width, self.cell_size
                ))
            })?;
        Ok((width, self.playfield_height))
    }
}
