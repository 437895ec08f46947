mod app;
mod assets;
mod canvas;
mod config;
mod constants;
mod error;
mod game;
mod grid;
mod movement;

use clap::Parser;
use log::error;

use crate::config::{Args, Settings};

fn main() {
    env_logger::init();

    let args = Args::parse();
    let result = Settings::load(&args).and_then(app::run);
    if let Err(err) = result {
        error!("{}", err);
        eprintln!("blocktris_rs: {}", err);
        std::process::exit(1);
    }
}
