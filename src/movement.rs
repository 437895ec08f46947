use log::debug;

use crate::constants::{Direction, Shape};
use crate::error::GridError;
use crate::grid::{Grid, Position};

/// Outcome of resolving a direction against the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Movement {
    /// Every candidate cell is inside the grid and free of locked cells.
    Permitted(Vec<Position>),
    Rejected,
}

/// Applies a single step of `direction` to every position. Any candidate that leaves the grid
/// or lands on a locked cell rejects the whole step.
fn step(grid: &Grid, positions: &[Position], direction: Direction) -> Option<Vec<Position>> {
    let offset = direction.offset();
    positions
        .iter()
        .map(|pos| {
            let next = pos.offset(offset);
            (!grid.is_outside(next) && !grid.is_occupied(next)).then_some(next)
        })
        .collect()
}

/// Computes where `positions` would end up under `direction` without touching the grid.
pub fn resolve(grid: &Grid, positions: &[Position], direction: Direction) -> Movement {
    match direction {
        Direction::HardDrop => {
            let Some(mut ground) = step(grid, positions, Direction::Spawn) else {
                return Movement::Rejected;
            };
            while let Some(next) = step(grid, &ground, Direction::Down) {
                ground = next;
            }
            Movement::Permitted(ground)
        }
        _ => step(grid, positions, direction).map_or(Movement::Rejected, Movement::Permitted),
    }
}

/// The piece currently under gravity and player control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    shape: Shape,
    positions: Vec<Position>,
}

impl ActivePiece {
    /// Places `shape` centred on the top row. Returns `None` when locked cells (or the grid
    /// edges) leave no room for it.
    pub fn spawn(grid: &mut Grid, shape: Shape) -> Result<Option<Self>, GridError> {
        let origin = Position::new(0, shape.spawn_col(grid.cols()));
        let positions = shape.coords(origin).collect::<Vec<_>>();
        let Movement::Permitted(positions) = resolve(grid, &positions, Direction::Spawn) else {
            return Ok(None);
        };
        for pos in &positions {
            grid.fill(*pos, shape.style())?;
        }
        Ok(Some(Self { shape, positions }))
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Moves the piece if the grid allows it. A rejected move leaves both the grid and the
    /// piece untouched.
    pub fn apply(&mut self, grid: &mut Grid, direction: Direction) -> Result<bool, GridError> {
        let Movement::Permitted(next) = resolve(grid, &self.positions, direction) else {
            debug!("{} {:?} rejected", self.shape.name(), direction);
            return Ok(false);
        };
        if next != self.positions {
            for pos in &self.positions {
                grid.clear(*pos)?;
            }
            for pos in &next {
                grid.fill(*pos, self.shape.style())?;
            }
            self.positions = next;
        }
        Ok(true)
    }

    /// Freezes the piece's cells in place.
    pub fn lock(self, grid: &mut Grid) -> Result<Vec<Position>, GridError> {
        for pos in &self.positions {
            grid.lock(*pos)?;
        }
        Ok(self.positions)
    }
}
