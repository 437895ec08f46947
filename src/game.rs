use derivative::Derivative;
use log::{debug, info};
use nanorand::{Rng, WyRand};

use crate::canvas::Surface;
use crate::config::Settings;
use crate::constants::*;
use crate::error::GameError;
use crate::grid::{Grid, Position};
use crate::movement::ActivePiece;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Waiting for visual assets; no ticks, no input.
    Loading,
    Spawning,
    Falling,
    Locking,
    GameOver,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Game {
    #[derivative(Debug = "ignore")]
    rng: WyRand,
    grid: Grid,
    state: GameState,
    piece: Option<ActivePiece>,
    next: Shape,
    elapsed_time: f64,
    tick_interval: f64,
    /// Time of the next gravity tick. `None` while loading and after the game ends.
    next_tick: Option<f64>,
}

impl Game {
    pub fn new(settings: &Settings) -> Self {
        let rng = match settings.seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };
        Self::with_rng(settings, rng)
    }

    pub fn with_rng(settings: &Settings, mut rng: WyRand) -> Self {
        let grid = Grid::new(settings.rows(), settings.cols(), settings.cell_size)
            .with_top_boundary(settings.check_top_boundary);
        let next = rng.generate();
        Self {
            rng,
            grid,
            state: GameState::Loading,
            piece: None,
            next,
            elapsed_time: 0.0,
            tick_interval: settings.tick_interval().as_secs_f64(),
            next_tick: None,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece(&self) -> Option<&ActivePiece> {
        self.piece.as_ref()
    }

    pub fn next_shape(&self) -> Shape {
        self.next
    }

    /// Leaves the loading state once assets are ready: spawns the first piece and starts the
    /// gravity timer. Has no effect after the first call.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.state != GameState::Loading {
            return Ok(());
        }
        info!(
            "starting game on a {}x{} grid",
            self.grid.cols(),
            self.grid.rows()
        );
        self.next_tick = Some(self.elapsed_time + self.tick_interval);
        self.spawn_next()
    }

    fn spawn_next(&mut self) -> Result<(), GameError> {
        let shape = self.next;
        self.next = self.rng.generate();
        self.spawn(shape)
    }

    /// Places `shape` at the top of the grid. If locked cells are in the way the game is over.
    pub fn spawn(&mut self, shape: Shape) -> Result<(), GameError> {
        if self.state == GameState::GameOver {
            return Ok(());
        }
        self.state = GameState::Spawning;
        match ActivePiece::spawn(&mut self.grid, shape)? {
            Some(piece) => {
                info!("spawned {}, next is {}", shape.name(), self.next.name());
                self.piece = Some(piece);
                self.state = GameState::Falling;
            }
            None => {
                info!("no room to spawn {}", shape.name());
                self.game_over();
            }
        }
        Ok(())
    }

    fn game_over(&mut self) {
        self.state = GameState::GameOver;
        self.piece = None;
        if self.next_tick.take().is_some() {
            info!("game over, gravity stopped");
        }
    }

    /// One gravity step. A piece that cannot fall any further is locked and replaced.
    pub fn tick(&mut self) -> Result<(), GameError> {
        if self.state != GameState::Falling {
            return Ok(());
        }
        let Some(piece) = self.piece.as_mut() else {
            return Ok(());
        };
        if piece.apply(&mut self.grid, Direction::Down)? {
            return Ok(());
        }

        self.state = GameState::Locking;
        if let Some(piece) = self.piece.take() {
            let shape = piece.shape();
            let locked = piece.lock(&mut self.grid)?;
            info!("locked {} at {:?}", shape.name(), locked);
        }
        self.spawn_next()
    }

    /// Player input. Rejected moves are ignored; only gravity locks a piece.
    pub fn handle_input(&mut self, input: Input) -> Result<(), GameError> {
        if self.state != GameState::Falling {
            debug!("ignoring {:?} while {:?}", input, self.state);
            return Ok(());
        }
        let direction = match input {
            Input::Down => Direction::Down,
            Input::Left => Direction::Left,
            Input::Right => Direction::Right,
            Input::HardDrop => Direction::HardDrop,
            Input::Rotate => {
                debug!("rotation is not supported");
                return Ok(());
            }
        };
        if let Some(piece) = self.piece.as_mut() {
            piece.apply(&mut self.grid, direction)?;
        }
        Ok(())
    }

    /// Advances the clock by `dt` seconds. At most one gravity tick runs per call; a late tick
    /// restarts the interval from now instead of catching up.
    pub fn update(&mut self, dt: f64) -> Result<(), GameError> {
        self.elapsed_time += dt;
        if self.next_tick.is_some_and(|due| self.elapsed_time >= due) {
            self.tick()?;
            let now = self.elapsed_time;
            self.next_tick = self.next_tick.map(|_| now + self.tick_interval);
        }
        Ok(())
    }

    pub fn render(&self, surface: &mut impl Surface) {
        let size = self.grid.cell_size();
        for (_, cell) in self.grid.cells() {
            match cell.filled() {
                Some(style) => surface.draw_cell(style, cell.x(), cell.y(), size),
                None => surface.clear_cell(cell.x(), cell.y(), size),
            }
        }
    }

    /// Draws the next shape into a preview area whose top-left pixel is `origin`.
    pub fn render_preview(&self, surface: &mut impl Surface, origin: (u32, u32)) {
        let size = self.grid.cell_size();
        let pixel = |row: u32, col: u32| (origin.0 + col * size, origin.1 + row * size);
        for row in 0..PREVIEW_SIZE.0 as u32 {
            for col in 0..PREVIEW_SIZE.1 as u32 {
                let (x, y) = pixel(row, col);
                surface.clear_cell(x, y, size);
            }
        }
        if self.state == GameState::GameOver {
            return;
        }
        for Position { row, col } in self.next.coords(Position::new(0, 0)) {
            let (x, y) = pixel(row as u32, col as u32);
            surface.draw_cell(self.next.style(), x, y, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::tests::RecordingSurface;

    fn game() -> Game {
        Game::with_rng(&Settings::default(), WyRand::new_seed(42))
    }

    fn lock_cells(game: &mut Game, positions: &[Position]) {
        for pos in positions {
            game.grid.fill(*pos, Style::Red).unwrap();
            game.grid.lock(*pos).unwrap();
        }
    }

    fn rows_of(game: &Game) -> Vec<i32> {
        game.piece().unwrap().positions().iter().map(|p| p.row).collect()
    }

    #[test]
    fn waits_for_assets() {
        let mut game = game();
        assert_eq!(game.state(), GameState::Loading);
        game.update(10.0).unwrap();
        game.handle_input(Input::Left).unwrap();
        assert!(game.piece().is_none());
        assert_eq!(game.grid().falling_positions().count(), 0);

        let next = game.next_shape();
        game.start().unwrap();
        assert_eq!(game.state(), GameState::Falling);
        assert_eq!(game.piece().unwrap().shape(), next);
    }

    #[test]
    fn o_piece_reaches_floor_and_respawns() {
        let mut game = game();
        game.state = GameState::Falling;
        game.spawn(Shape::O).unwrap();
        let next = game.next_shape();

        for _ in 0..18 {
            game.tick().unwrap();
            assert_eq!(game.piece().unwrap().shape(), Shape::O);
        }
        assert_eq!(rows_of(&game), vec![18, 18, 19, 19]);

        game.tick().unwrap();
        assert_eq!(game.state(), GameState::Falling);
        for col in 4..=5 {
            for row in 18..=19 {
                assert!(game.grid().is_occupied(Position::new(row, col)));
            }
        }
        let piece = game.piece().unwrap();
        assert_eq!(piece.shape(), next);
        assert_eq!(piece.positions().iter().map(|p| p.row).min(), Some(0));
    }

    #[test]
    fn blocked_spawn_ends_game() {
        let mut game = game();
        game.start().unwrap();
        let top = game.piece().unwrap().positions().to_vec();
        game.piece = None;
        for pos in &top {
            game.grid.clear(*pos).unwrap();
        }
        lock_cells(&mut game, &[Position::new(0, 4), Position::new(1, 4)]);
        game.state = GameState::Falling;

        game.spawn(Shape::O).unwrap();
        assert_eq!(game.state(), GameState::GameOver);
        assert!(game.next_tick.is_none());
        assert!(game.piece().is_none());
    }

    #[test]
    fn stacked_board_stops_gravity() {
        let mut game = game();
        game.start().unwrap();
        game.piece = None;
        let spawned: Vec<_> = game.grid().falling_positions().collect();
        for pos in spawned {
            game.grid.clear(pos).unwrap();
        }
        // Everything below the top two rows is locked, so whatever comes next overlaps the O.
        let cols = game.grid().cols() as i32;
        let rows = game.grid().rows() as i32;
        let stack: Vec<_> = (2..rows)
            .flat_map(|row| (0..cols).map(move |col| Position::new(row, col)))
            .collect();
        lock_cells(&mut game, &stack);
        game.spawn(Shape::O).unwrap();

        game.update(0.1).unwrap();
        assert_eq!(game.state(), GameState::GameOver);
        assert!(game.next_tick.is_none());

        let snapshot: Vec<_> = game.grid().cells().map(|(_, c)| *c).collect();
        game.update(100.0).unwrap();
        for input in [Input::Left, Input::Right, Input::Down, Input::HardDrop] {
            game.handle_input(input).unwrap();
        }
        let after: Vec<_> = game.grid().cells().map(|(_, c)| *c).collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn gravity_follows_tick_interval() {
        let settings = Settings {
            tick_interval_ms: 125,
            ..Settings::default()
        };
        let mut game = Game::with_rng(&settings, WyRand::new_seed(3));
        game.start().unwrap();
        let start = rows_of(&game);

        game.update(0.0625).unwrap();
        assert_eq!(rows_of(&game), start);

        game.update(0.0625).unwrap();
        let once: Vec<_> = start.iter().map(|r| r + 1).collect();
        assert_eq!(rows_of(&game), once);

        // Overdue by two intervals, still a single step; the next one is due 0.125s later.
        game.update(0.375).unwrap();
        let twice: Vec<_> = start.iter().map(|r| r + 2).collect();
        assert_eq!(rows_of(&game), twice);

        game.update(0.0625).unwrap();
        assert_eq!(rows_of(&game), twice);
        game.update(0.0625).unwrap();
        let thrice: Vec<_> = start.iter().map(|r| r + 3).collect();
        assert_eq!(rows_of(&game), thrice);
    }

    #[test]
    fn long_frame_runs_one_tick() {
        let mut game = game();
        game.start().unwrap();
        let shape = game.piece().unwrap().shape();
        let start = rows_of(&game);

        game.update(5.0).unwrap();
        let once: Vec<_> = start.iter().map(|r| r + 1).collect();
        assert_eq!(game.piece().unwrap().shape(), shape);
        assert_eq!(rows_of(&game), once);
        assert!(game.grid().cells().all(|(_, cell)| !cell.is_locked()));
    }

    #[test]
    fn rejected_input_does_not_lock() {
        let mut game = game();
        game.state = GameState::Falling;
        game.spawn(Shape::O).unwrap();
        game.handle_input(Input::HardDrop).unwrap();
        assert_eq!(rows_of(&game), vec![18, 18, 19, 19]);

        game.handle_input(Input::Down).unwrap();
        game.handle_input(Input::HardDrop).unwrap();
        assert_eq!(game.piece().unwrap().shape(), Shape::O);
        assert_eq!(game.grid().falling_positions().count(), 4);

        for _ in 0..6 {
            game.handle_input(Input::Left).unwrap();
        }
        let cols: Vec<_> = game.piece().unwrap().positions().iter().map(|p| p.col).collect();
        assert_eq!(cols, vec![0, 1, 0, 1]);
    }

    #[test]
    fn rotation_is_ignored() {
        let mut game = game();
        game.start().unwrap();
        let before = game.piece().unwrap().clone();
        game.handle_input(Input::Rotate).unwrap();
        assert_eq!(game.piece().unwrap(), &before);
    }

    #[test]
    fn render_draws_filled_and_clears_empty() {
        let mut game = game();
        game.state = GameState::Falling;
        game.spawn(Shape::O).unwrap();
        let mut surface = RecordingSurface::default();
        game.render(&mut surface);

        assert_eq!(surface.drawn.len(), 4);
        assert_eq!(surface.cleared.len(), 196);
        assert!(surface.drawn.contains(&(Style::Yellow, 140, 0, 35)));
        assert!(surface.drawn.contains(&(Style::Yellow, 175, 35, 35)));
    }

    #[test]
    fn preview_shows_next_shape() {
        let game = game();
        let mut surface = RecordingSurface::default();
        game.render_preview(&mut surface, (400, 35));

        let next = game.next_shape();
        assert_eq!(surface.cleared.len(), 8);
        assert_eq!(surface.drawn.len(), 4);
        assert!(surface
            .drawn
            .iter()
            .all(|(style, x, y, _)| *style == next.style() && *x >= 400 && *y >= 35));
    }
}
