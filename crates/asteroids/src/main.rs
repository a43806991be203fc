//! Asteroids
//!
//! Runs the game loop against the headless backend for a configured number
//! of fixed steps, feeding it a scripted key timeline.

mod config;
mod game;
mod input;

use asteroids_engine::config::Config;
use asteroids_engine::foundation::logging;
use asteroids_engine::foundation::time::Stopwatch;
use asteroids_engine::render::{HeadlessDevice, HeadlessLoader};

use crate::config::GameConfig;
use crate::game::{Game, GameError, SceneState};
use crate::input::ScriptedInput;

const DEFAULT_CONFIG: &str = "config/game.toml";

fn main() -> Result<(), GameError> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = GameConfig::load_or_default(&config_path)?;
    logging::init_with_level(logging::parse_level(&config.run.log_level));

    log::info!("Starting {} ({})", config.window.title, config_path);
    let run = config.run.clone();
    let mut input = ScriptedInput::new(run.script);
    let mut game = Game::new(HeadlessDevice::new(), config);
    game.init(&mut HeadlessLoader::new())?;

    let stopwatch = Stopwatch::start_new();
    let mut time = 0.0;
    let mut draw_calls = 0;
    for frame in 0..run.frames {
        input.set_time(time);
        game.update(run.timestep, &input)?;
        game.draw()?;
        time += run.timestep;

        draw_calls += game.device().draw_calls().len();
        game.device_mut().clear_draw_calls();

        if game.should_quit() {
            log::info!("Stopping at frame {}", frame);
            break;
        }
    }

    let outcome = match game.state() {
        SceneState::Main => "never started",
        SceneState::Game => "still playing",
        SceneState::GameOver => "game over",
    };
    log::info!(
        "Simulated {:.1}s in {:.1}ms: {} after {} round(s), {} entities left, {} draw call(s)",
        time,
        stopwatch.elapsed_millis(),
        outcome,
        game.rounds(),
        game.registry().entity_count(),
        draw_calls
    );

    game.shutdown()
}
