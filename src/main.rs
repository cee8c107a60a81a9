// In src/main.rs

use anyhow::Context;
use log::{error, info};
use tile_loop::{
    app,
    config::Config,
    platform::{FrameClock, HeadlessPlatform, Platform},
};

/// Main entry point for the `tile-loop` binary.
fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting tile-loop...");

    // --- Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration: {:?}", config);

    // --- Setup (any failure here aborts before the loop starts) ---
    let mut orchestrator =
        app::build_orchestrator(&config).context("Failed to set up the frame orchestrator")?;

    let mut platform = HeadlessPlatform::new(config.resolution());
    if let Some(frames) = config.app.max_frames {
        platform = platform.with_max_frames(frames);
    }
    if let Some(path) = &config.app.snapshot_path {
        platform = platform.with_snapshot(path);
    }
    let mut clock = FrameClock::new(config.app.name.clone());

    // --- Main Loop ---
    info!("Starting main loop...");
    let summary = match app::run(&mut platform, &mut orchestrator, &mut clock) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Fatal error in render loop: {:#}. Exiting.", e);
            return Err(e);
        }
    };
    info!(
        "Rendered {} frames (last window {:.2} fps)",
        summary.frames, summary.last_fps
    );

    // --- Cleanup ---
    platform.shutdown().context("Failed to shutdown platform")?;
    info!("tile-loop exited successfully.");
    Ok(())
}
