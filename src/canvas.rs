use derivative::Derivative;
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing;
use imageproc::rect::Rect;
use log::warn;
use piston_window::graphics;
use piston_window::prelude::*;

use crate::assets::Assets;
use crate::constants::{Style, GRID_LINE_COLOR, PLAYFIELD_COLOR};

/// Drawing primitives the game needs from a renderer. Coordinates are pixels.
pub trait Surface {
    fn draw_cell(&mut self, style: Style, x: u32, y: u32, size: u32);
    fn clear_cell(&mut self, x: u32, y: u32, size: u32);
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Canvas {
    #[derivative(Debug = "ignore")]
    texture_context: G2dTextureContext,
    dims: (u32, u32),
    buffer: RgbaImage,
    assets: Option<Assets>,
}

impl Canvas {
    pub fn new(window: &mut PistonWindow) -> Self {
        let dims = (window.size().width as u32, window.size().height as u32);
        Self {
            texture_context: window.create_texture_context(),
            dims,
            buffer: RgbaImage::new(dims.0, dims.1),
            assets: None,
        }
    }

    pub fn set_assets(&mut self, assets: Assets) {
        self.assets = Some(assets);
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        self.buffer = RgbaImage::from_pixel(self.dims.0, self.dims.1, color);
    }

    /// Draws cell borders over a `width` x `height` pixel area anchored at the origin.
    pub fn draw_grid_lines(&mut self, width: u32, height: u32, cell_size: u32) {
        let (w, h) = (width as f32, height as f32);
        for x in (0..=width).step_by(cell_size as usize) {
            let x = x.min(width.saturating_sub(1)) as f32;
            drawing::draw_line_segment_mut(&mut self.buffer, (x, 0.0), (x, h), GRID_LINE_COLOR);
        }
        for y in (0..=height).step_by(cell_size as usize) {
            let y = y.min(height.saturating_sub(1)) as f32;
            drawing::draw_line_segment_mut(&mut self.buffer, (0.0, y), (w, y), GRID_LINE_COLOR);
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, size: u32, color: Rgba<u8>) {
        drawing::draw_filled_rect_mut(
            &mut self.buffer,
            Rect::at(x as i32, y as i32).of_size(size, size),
            color,
        );
    }

    fn texture(&mut self) -> Option<G2dTexture> {
        Texture::from_image(
            &mut self.texture_context,
            &self.buffer,
            &TextureSettings::new(),
        )
        .ok()
    }

    pub fn render(&mut self, context: graphics::Context, g: &mut G2d) {
        match self.texture() {
            Some(texture) => graphics::image(&texture, context.transform, g),
            None => warn!("failed to upload frame texture"),
        }
    }
}

impl Surface for Canvas {
    fn draw_cell(&mut self, style: Style, x: u32, y: u32, size: u32) {
        if let Some(tile) = self.assets.as_ref().and_then(|assets| assets.tile(style, size)) {
            imageops::replace(&mut self.buffer, tile, x as i64, y as i64);
            return;
        }
        self.fill_rect(x, y, size, style.pixel_color());
    }

    fn clear_cell(&mut self, x: u32, y: u32, size: u32) {
        self.fill_rect(x, y, size, PLAYFIELD_COLOR);
    }
}
