// src/app.rs
//! Host event loop.
//!
//! Pending platform events are always drained first; a frame is rendered only
//! when the queue is empty, so rendering never overlaps event handling.

use crate::config::{Config, ShaderKind};
use crate::platform::{FrameClock, KeySymbol, Platform, PlatformEvent};
use crate::pool::build_pool;
use crate::scheduler::{FrameOrchestrator, GenerationStamp, Gradient, SolidFill, TileShader};
use anyhow::{Context, Result};
use log::{debug, info};

/// Represents the status of the loop after handling one event or frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LoopStatus {
    Running,
    Shutdown,
}

/// Summary returned when the loop exits.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub last_fps: f64,
}

pub fn make_shader(config: &Config) -> Box<dyn TileShader> {
    match config.render.shader {
        ShaderKind::Solid => Box::new(SolidFill::default()),
        ShaderKind::Gradient => Box::new(Gradient {
            width: config.render.width,
            height: config.render.height,
        }),
        ShaderKind::Generation => Box::new(GenerationStamp),
    }
}

/// Resolve the worker count, start the pool and allocate the frame buffer.
///
/// Every failure here is a setup failure and should end the process.
pub fn build_orchestrator(config: &Config) -> Result<FrameOrchestrator> {
    config.validate()?;
    let grid = config.tile_grid()?;
    let workers = config
        .workers
        .policy
        .resolve()
        .context("Failed to determine worker count")?;
    let pool = build_pool(
        config.workers.backend,
        workers,
        &config.workers.thread_name_prefix,
    )?;
    info!(
        "Orchestrator ready: {}x{} px, {} tiles of {}px, {} workers",
        grid.resolution().width,
        grid.resolution().height,
        grid.tile_count(),
        grid.tile_size(),
        workers
    );
    Ok(FrameOrchestrator::new(grid, pool, make_shader(config)))
}

fn handle_event(event: PlatformEvent) -> LoopStatus {
    match event {
        PlatformEvent::CloseRequested => {
            info!("Close requested. Signaling shutdown.");
            LoopStatus::Shutdown
        }
        PlatformEvent::KeyPressed(KeySymbol::Escape) => {
            info!("Escape pressed. Signaling shutdown.");
            LoopStatus::Shutdown
        }
        PlatformEvent::KeyPressed(other) => {
            debug!("Ignoring key {:?}", other);
            LoopStatus::Running
        }
    }
}

/// Run until the platform asks to close. Errors are fatal.
pub fn run<P: Platform>(
    platform: &mut P,
    orchestrator: &mut FrameOrchestrator,
    clock: &mut FrameClock,
) -> Result<RunSummary> {
    let start_frame = orchestrator.frame_index();
    loop {
        if let Some(event) = platform.poll_event()? {
            if handle_event(event) == LoopStatus::Shutdown {
                break;
            }
            continue;
        }

        let timing = clock.tick();
        if let Some(title) = &timing.title {
            platform.set_title(title)?;
        }
        orchestrator.tick(platform, timing.time, timing.delta)?;
    }

    Ok(RunSummary {
        frames: orchestrator.frame_index() - start_frame,
        last_fps: clock.last_fps(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessPlatform;
    use crate::pool::{PoolBackend, WorkerCountPolicy};
    use crate::scheduler::PLACEHOLDER_FILL;
    use test_log::test;

    fn small_config(backend: PoolBackend) -> Config {
        let mut config = Config::default();
        config.render.width = 128;
        config.render.height = 64;
        config.workers.policy = WorkerCountPolicy::Fixed(3);
        config.workers.backend = backend;
        config
    }

    #[test]
    fn test_runs_exactly_max_frames() {
        for backend in [PoolBackend::Transient, PoolBackend::Persistent] {
            let config = small_config(backend);
            let mut orch = build_orchestrator(&config).unwrap();
            let mut platform = HeadlessPlatform::new(config.resolution()).with_max_frames(3);
            let mut clock = FrameClock::new(config.app.name.clone());

            let summary = run(&mut platform, &mut orch, &mut clock).unwrap();
            assert_eq!(summary.frames, 3);
            assert_eq!(platform.presented_frames(), 3);
            assert!(orch
                .framebuffer()
                .pixels()
                .iter()
                .all(|&p| p == PLACEHOLDER_FILL));
        }
    }

    #[test]
    fn test_pending_events_are_drained_before_rendering() {
        let config = small_config(PoolBackend::Transient);
        let mut orch = build_orchestrator(&config).unwrap();
        let mut platform = HeadlessPlatform::new(config.resolution());
        platform.push_event(PlatformEvent::KeyPressed(KeySymbol::Other(32)));
        platform.push_event(PlatformEvent::KeyPressed(KeySymbol::Escape));
        let mut clock = FrameClock::new("test");

        let summary = run(&mut platform, &mut orch, &mut clock).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(platform.presented_frames(), 0);
    }

    #[test]
    fn test_build_orchestrator_rejects_bad_tiling() {
        let mut config = small_config(PoolBackend::Persistent);
        config.render.tile_size = 24;
        assert!(build_orchestrator(&config).is_err());
    }

    #[test]
    fn test_generation_shader_from_config() {
        let mut config = small_config(PoolBackend::Persistent);
        config.render.shader = ShaderKind::Generation;
        let mut orch = build_orchestrator(&config).unwrap();
        let mut platform = HeadlessPlatform::new(config.resolution()).with_max_frames(4);
        let mut clock = FrameClock::new("test");
        run(&mut platform, &mut orch, &mut clock).unwrap();
        assert!(orch.framebuffer().pixels().iter().all(|&p| p == 3));
    }
}
