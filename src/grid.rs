use ndarray::Array2;

use crate::constants::Style;
use crate::error::GridError;

/// A `(row, col)` lookup key. Signed so that candidate moves past the left edge are
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, (d_row, d_col): (i32, i32)) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }
}

/// One grid unit. `x` and `y` are the pixel coordinates of its top-left corner and never
/// change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    filled: Option<Style>,
    falling: bool,
    x: u32,
    y: u32,
}

impl Cell {
    fn new(x: u32, y: u32) -> Self {
        Self {
            filled: None,
            falling: false,
            x,
            y,
        }
    }

    pub fn filled(&self) -> Option<Style> {
        self.filled
    }

    pub fn falling(&self) -> bool {
        self.falling
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn is_locked(&self) -> bool {
        self.filled.is_some() && !self.falling
    }
}

/// The playfield occupancy grid, indexed `[row, col]`.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Array2<Cell>,
    cell_size: u32,
    check_top: bool,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, cell_size: u32) -> Self {
        Self {
            cells: Array2::from_shape_fn((rows, cols), |(row, col)| {
                Cell::new(col as u32 * cell_size, row as u32 * cell_size)
            }),
            cell_size,
            check_top: true,
        }
    }

    /// Controls whether positions above row 0 count as outside the grid.
    pub fn with_top_boundary(mut self, check_top: bool) -> Self {
        self.check_top = check_top;
        self
    }

    pub fn rows(&self) -> usize {
        self.cells.dim().0
    }

    pub fn cols(&self) -> usize {
        self.cells.dim().1
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    fn index(&self, position: Position) -> Option<[usize; 2]> {
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        (row < self.rows() && col < self.cols()).then_some([row, col])
    }

    pub fn get(&self, position: Position) -> Result<&Cell, GridError> {
        self.index(position)
            .map(|ix| &self.cells[ix])
            .ok_or(GridError::OutOfBounds(position))
    }

    fn get_mut(&mut self, position: Position) -> Result<&mut Cell, GridError> {
        let ix = self
            .index(position)
            .ok_or(GridError::OutOfBounds(position))?;
        Ok(&mut self.cells[ix])
    }

    pub fn is_outside(&self, position: Position) -> bool {
        position.row > self.rows() as i32 - 1
            || position.col < 0
            || position.col > self.cols() as i32 - 1
            || (self.check_top && position.row < 0)
    }

    /// True for locked cells only: cells of the falling piece never block.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.get(position).is_ok_and(Cell::is_locked)
    }

    /// Marks a cell as part of the falling piece.
    pub fn fill(&mut self, position: Position, style: Style) -> Result<(), GridError> {
        let cell = self.get_mut(position)?;
        cell.filled = Some(style);
        cell.falling = true;
        Ok(())
    }

    pub fn clear(&mut self, position: Position) -> Result<(), GridError> {
        let cell = self.get_mut(position)?;
        cell.filled = None;
        cell.falling = false;
        Ok(())
    }

    /// Turns a falling cell into a permanently filled one.
    pub fn lock(&mut self, position: Position) -> Result<(), GridError> {
        self.get_mut(position)?.falling = false;
        Ok(())
    }

    pub fn cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((row, col), cell)| (Position::new(row as i32, col as i32), cell))
    }

    #[cfg(test)]
    pub fn falling_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter(|(_, cell)| cell.falling)
            .map(|(pos, _)| pos)
    }
}
