use std::process::ExitCode;

use starfield::prelude::*;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StarfieldConfig::default();
    let (width, height) = config.window_size;
    // The real viewport arrives with the first resize once the window exists.
    let viewport = Viewport::new(width as f32, height as f32);

    let result = Starfield::new(config, Palette::default(), viewport, 0.0)
        .map_err(SimulationError::from)
        .and_then(Starfield::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
