use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use enum_map::EnumMap;
use image::{imageops, io::Reader as ImageReader, RgbaImage};
use log::{info, warn};

use crate::constants::Style;
use crate::error::AssetError;

/// Per-style cell tiles, scaled to the cell size. Styles whose image could not be loaded have
/// no tile and are drawn as flat colour.
#[derive(Debug, Clone)]
pub struct Assets {
    cell_size: u32,
    tiles: EnumMap<Style, Option<RgbaImage>>,
}

impl Assets {
    pub fn load(dir: &Path, cell_size: u32) -> Self {
        let tiles = EnumMap::from_fn(|style: Style| {
            let path = dir.join(format!("{}.png", style.asset_name()));
            match load_tile(&path, cell_size) {
                Ok(tile) => Some(tile),
                Err(err) => {
                    warn!("using flat colour for {:?}: {}", style, err);
                    None
                }
            }
        });
        Self { cell_size, tiles }
    }

    pub fn tile(&self, style: Style, size: u32) -> Option<&RgbaImage> {
        if size != self.cell_size {
            return None;
        }
        self.tiles[style].as_ref()
    }

    pub fn loaded(&self) -> usize {
        self.tiles.values().filter(|tile| tile.is_some()).count()
    }
}

fn load_tile(path: &Path, cell_size: u32) -> Result<RgbaImage, AssetError> {
    let image = ImageReader::open(path)
        .map_err(|source| AssetError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgba8();
    Ok(imageops::resize(
        &image,
        cell_size,
        cell_size,
        imageops::FilterType::Nearest,
    ))
}

/// One-shot readiness barrier: assets are decoded off the main thread and handed over exactly
/// once.
#[derive(Debug)]
pub struct AssetGate {
    receiver: Option<Receiver<Assets>>,
}

impl AssetGate {
    pub fn spawn(dir: PathBuf, cell_size: u32) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let assets = Assets::load(&dir, cell_size);
            info!("loaded {} of {} tile images", assets.loaded(), assets.tiles.len());
            // The receiver is gone only if the window closed first.
            let _ = sender.send(assets);
        });
        Self {
            receiver: Some(receiver),
        }
    }

    /// Returns the assets the first time they are available, `None` before and after.
    pub fn poll(&mut self) -> Option<Assets> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(assets) => {
                self.receiver = None;
                Some(assets)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("asset loader exited without reporting");
                self.receiver = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blocktris_rs-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_images_fall_back() {
        let assets = Assets::load(Path::new("/nonexistent/assets"), 35);
        assert_eq!(assets.loaded(), 0);
        assert!(assets.tile(Style::Red, 35).is_none());
    }

    #[test]
    fn tiles_are_scaled_to_cell_size() {
        let dir = scratch_dir("tiles");
        RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]))
            .save(dir.join("Red.png"))
            .unwrap();
        let assets = Assets::load(&dir, 35);
        assert_eq!(assets.loaded(), 1);
        let tile = assets.tile(Style::Red, 35).unwrap();
        assert_eq!(tile.dimensions(), (35, 35));
        assert!(assets.tile(Style::Red, 20).is_none());
        assert!(assets.tile(Style::Blue, 35).is_none());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn load_errors_name_the_file() {
        let dir = scratch_dir("errors");
        let broken = dir.join("Green.png");
        std::fs::write(&broken, b"not a png").unwrap();

        let missing = dir.join("Blue.png");
        assert!(matches!(
            load_tile(&missing, 35),
            Err(AssetError::Open { path, .. }) if path == missing
        ));
        assert!(matches!(
            load_tile(&broken, 35),
            Err(AssetError::Decode { path, .. }) if path == broken
        ));
        assert_eq!(Assets::load(&dir, 35).loaded(), 0);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn gate_opens_once() {
        let mut gate = AssetGate::spawn(PathBuf::from("/nonexistent/assets"), 35);
        let mut assets = None;
        for _ in 0..200 {
            if let Some(loaded) = gate.poll() {
                assets = Some(loaded);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(assets.is_some());
        assert!(gate.poll().is_none());
    }
}
