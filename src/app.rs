use log::{error, info};
use piston_window::graphics;
use piston_window::prelude::*;
use piston_window::AdvancedWindow;

use crate::assets::AssetGate;
use crate::canvas::{Canvas, Surface};
use crate::config::Settings;
use crate::constants::{Input, CLEAR_COLOR, PANEL_COLOR, WINDOW_TITLE};
use crate::error::GameError;
use crate::game::{Game, GameState};

/// Window-side wrapper: feeds piston events into the game and draws it onto the canvas.
#[derive(Debug)]
pub struct App {
    game: Game,
    canvas: Canvas,
    assets: AssetGate,
    settings: Settings,
    title_shows_game_over: bool,
}

impl App {
    pub fn new(window: &mut PistonWindow, settings: Settings) -> Self {
        Self {
            game: Game::new(&settings),
            canvas: Canvas::new(window),
            assets: AssetGate::spawn(settings.assets_dir.clone(), settings.cell_size),
            settings,
            title_shows_game_over: false,
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Result<(), GameError> {
        let Some(Button::Keyboard(key)) = event.press_args() else {
            return Ok(());
        };
        let input = match key {
            Key::Left => Input::Left,
            Key::Right => Input::Right,
            Key::Down => Input::Down,
            Key::Space => Input::HardDrop,
            Key::Up => Input::Rotate,
            _ => return Ok(()),
        };
        self.game.handle_input(input)
    }

    pub fn update(&mut self, window: &mut PistonWindow, args: &UpdateArgs) -> Result<(), GameError> {
        if let Some(assets) = self.assets.poll() {
            self.canvas.set_assets(assets);
            self.game.start()?;
        }

        self.game.update(args.dt)?;

        if self.game.state() == GameState::GameOver && !self.title_shows_game_over {
            window.set_title(format!("{}: game over", WINDOW_TITLE));
            self.title_shows_game_over = true;
        }
        Ok(())
    }

    pub fn render(&mut self, context: graphics::Context, g: &mut G2d) {
        let cell_size = self.settings.cell_size;
        let (width, height) = (
            self.settings.cols() as u32 * cell_size,
            self.settings.rows() as u32 * cell_size,
        );

        graphics::clear(CLEAR_COLOR, g);
        self.canvas.clear(PANEL_COLOR);
        if self.game.state() == GameState::Loading {
            for row in 0..self.settings.rows() as u32 {
                for col in 0..self.settings.cols() as u32 {
                    self.canvas.clear_cell(col * cell_size, row * cell_size, cell_size);
                }
            }
        } else {
            self.game.render(&mut self.canvas);
            self.game
                .render_preview(&mut self.canvas, (width + cell_size, cell_size));
        }
        self.canvas.draw_grid_lines(width, height, cell_size);
        self.canvas.render(context, g);
    }
}

pub fn run(settings: Settings) -> Result<(), GameError> {
    let opengl = OpenGL::V3_2;
    let mut window: PistonWindow = WindowSettings::new(WINDOW_TITLE, settings.window_size()?)
        .exit_on_esc(true)
        .graphics_api(opengl)
        .build()
        .map_err(|err| GameError::Window(err.to_string()))?;

    let mut app = App::new(&mut window, settings);
    info!("window open, waiting for assets");

    while let Some(e) = window.next() {
        if let Err(err) = app.handle_event(&e) {
            error!("input failed: {}", err);
        }
        if let Some(args) = e.update_args() {
            app.update(&mut window, &args)?;
        }
        window.draw_2d(&e, |c, g, _| {
            app.render(c, g);
        });
    }
    Ok(())
}
