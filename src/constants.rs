use enum_map::{Enum, EnumMap};
use image::Rgba;
use lazy_static::lazy_static;
use nanorand::{RandomGen, Rng};
use ndarray::{Array2, ArrayView2};

use crate::grid::Position;

pub const DEFAULT_PLAYFIELD_SIZE: (u32, u32) = (350, 700);
pub const DEFAULT_CELL_SIZE: u32 = 35;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const WINDOW_TITLE: &str = "blocktris_rs";

/// Width of the side panel holding the next-piece preview, in cells.
pub const PREVIEW_PANEL_CELLS: u32 = 6;
/// The preview area is large enough for any catalog shape.
pub const PREVIEW_SIZE: (usize, usize) = (2, 4);

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const PLAYFIELD_COLOR: Rgba<u8> = Rgba([0xa2, 0x9b, 0xfe, 255]);
pub const PANEL_COLOR: Rgba<u8> = Rgba([89, 92, 102, 255]);
pub const GRID_LINE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[rustfmt::skip]
lazy_static! {
    static ref SHAPES: EnumMap<Shape, Array2<bool>> = EnumMap::from_array([
        // I
        Array2::from_shape_vec((1, 4), vec![
            true , true , true , true ,
        ]).unwrap(),
        // J
        Array2::from_shape_vec((2, 3), vec![
            true , false, false,
            true , true , true ,
        ]).unwrap(),
        // L
        Array2::from_shape_vec((2, 3), vec![
            false, false, true ,
            true , true , true ,
        ]).unwrap(),
        // O
        Array2::from_shape_vec((2, 2), vec![
            true , true ,
            true , true ,
        ]).unwrap(),
        // S
        Array2::from_shape_vec((2, 3), vec![
            false, true , true ,
            true , true , false,
        ]).unwrap(),
        // T
        Array2::from_shape_vec((2, 3), vec![
            false, true , false,
            true , true , true ,
        ]).unwrap(),
        // Z
        Array2::from_shape_vec((2, 3), vec![
            true , true , false,
            false, true , true ,
        ]).unwrap(),
    ]);
}

/// The seven tetrominoes. Masks are stored row-major, `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum Shape {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::I,
        Shape::J,
        Shape::L,
        Shape::O,
        Shape::S,
        Shape::T,
        Shape::Z,
    ];

    pub fn mask(&self) -> ArrayView2<'static, bool> {
        SHAPES[*self].view()
    }

    pub fn width(&self) -> usize {
        self.mask().dim().1
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::I => "I-Block",
            Shape::J => "J-Block",
            Shape::L => "L-Block",
            Shape::O => "O-Block",
            Shape::S => "S-Block",
            Shape::T => "T-Block",
            Shape::Z => "Z-Block",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Shape::I => Style::LightBlue,
            Shape::J => Style::Blue,
            Shape::L => Style::Orange,
            Shape::O => Style::Yellow,
            Shape::S => Style::Green,
            Shape::T => Style::Purple,
            Shape::Z => Style::Red,
        }
    }

    /// Grid positions of the filled mask cells with the mask's top-left corner at `origin`,
    /// in row-major order.
    pub fn coords(&self, origin: Position) -> impl Iterator<Item = Position> {
        SHAPES[*self]
            .indexed_iter()
            .filter_map(move |((row, col), v)| {
                v.then_some(Position::new(
                    origin.row + row as i32,
                    origin.col + col as i32,
                ))
            })
    }

    /// Column at which the shape's left edge sits when spawned on a grid `grid_cols` wide.
    pub fn spawn_col(&self, grid_cols: usize) -> i32 {
        (grid_cols / 2) as i32 - self.width().div_ceil(2) as i32
    }
}

impl<Generator: Rng<OUTPUT>, const OUTPUT: usize> RandomGen<Generator, OUTPUT> for Shape {
    fn random(rng: &mut Generator) -> Self {
        Shape::ALL[rng.generate_range(0..Shape::ALL.len())]
    }
}

/// Opaque visual style of a filled cell. Each style has a tile image in the assets directory
/// and a flat colour used when the image is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum Style {
    Blue,
    Green,
    LightBlue,
    Orange,
    Purple,
    Red,
    Yellow,
}

impl Style {
    const COLORS: EnumMap<Style, [u8; 4]> = EnumMap::from_array([
        [61, 133, 198, 255],
        [106, 168, 79, 255],
        [0, 204, 230, 255],
        [230, 145, 56, 255],
        [142, 68, 173, 255],
        [204, 0, 0, 255],
        [241, 194, 50, 255],
    ]);

    pub fn pixel_color(&self) -> Rgba<u8> {
        Rgba(Self::COLORS[*self])
    }

    pub fn asset_name(&self) -> &'static str {
        match self {
            Style::Blue => "Blue",
            Style::Green => "Green",
            Style::LightBlue => "LightBlue",
            Style::Orange => "Orange",
            Style::Purple => "Purple",
            Style::Red => "Red",
            Style::Yellow => "Yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Left,
    Right,
    HardDrop,
    Spawn,
}

impl Direction {
    /// `(row, col)` delta of a single step. A hard drop is a sequence of `Down` steps.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::Down | Direction::HardDrop => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Spawn => (0, 0),
        }
    }
}

/// Discrete player actions delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Down,
    Left,
    Right,
    HardDrop,
    Rotate,
}
