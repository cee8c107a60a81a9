// src/config.rs

//! Configuration for the render loop.
//!
//! Deserialized from JSON. Every section carries `#[serde(default)]`, so a
//! file only has to mention the values it changes. The defaults reproduce the
//! classic 1280x720 skeleton: 16 pixel tiles, one worker per core, transient
//! work items.

use crate::pool::{PoolBackend, WorkerCountPolicy};
use crate::tiles::{Resolution, TileGrid};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "TILE_LOOP_CONFIG";

// --- Top-Level Configuration Structure ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Output buffer and tiling.
    pub render: RenderConfig,
    /// Worker pool sizing and execution model.
    pub workers: WorkerConfig,
    /// Host loop settings.
    pub app: AppConfig,
}

// --- Render Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Tile edge length in pixels. Must divide both width and height.
    pub tile_size: u32,
    /// Per-tile fill routine.
    pub shader: ShaderKind,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1280,
            height: 720,
            tile_size: 16,
            shader: ShaderKind::Solid,
        }
    }
}

/// Which built-in tile shader to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderKind {
    /// Constant placeholder fill.
    #[default]
    Solid,
    /// Animated gradient.
    Gradient,
    /// Frame index stamped into every pixel.
    Generation,
}

// --- Worker Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// How many workers to start relative to the core count.
    pub policy: WorkerCountPolicy,
    pub backend: PoolBackend,
    /// Worker threads are named "{prefix}-{id}".
    pub thread_name_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            policy: WorkerCountPolicy::AllCores,
            backend: PoolBackend::default(),
            thread_name_prefix: "tile-worker".to_string(),
        }
    }
}

// --- App Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Shown after the FPS readout in the title.
    pub name: String,
    /// Stop after this many frames. `None` runs until closed.
    pub max_frames: Option<u64>,
    /// Write the last frame as PNG on exit.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: "Skeleton (CPU, tiles)".to_string(),
            max_frames: None,
            snapshot_path: None,
        }
    }
}

impl Config {
    /// Parse a JSON document and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text).context("Invalid configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Load from the file named by `TILE_LOOP_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.render.width, self.render.height)
    }

    /// Tile grid for the configured resolution; fails if it does not divide.
    pub fn tile_grid(&self) -> Result<TileGrid> {
        TileGrid::new(self.resolution(), self.render.tile_size)
    }

    pub fn validate(&self) -> Result<()> {
        self.tile_grid().context("Invalid render configuration")?;
        if let WorkerCountPolicy::Fixed(n) = self.workers.policy {
            ensure!(n > 0, "workers.policy fixed count must be >= 1");
        }
        ensure!(
            !self.workers.thread_name_prefix.is_empty(),
            "workers.thread_name_prefix must not be empty"
        );
        ensure!(
            self.app.max_frames != Some(0),
            "app.max_frames must be >= 1 when set"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        let grid = config.tile_grid().unwrap();
        assert_eq!(grid.tile_count(), 3600);
        assert_eq!(config.workers.backend, PoolBackend::Transient);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = Config::from_json(
            r#"{ "workers": { "policy": "reserve_orchestrator", "backend": "persistent" } }"#,
        )
        .unwrap();
        assert_eq!(config.workers.policy, WorkerCountPolicy::ReserveOrchestrator);
        assert_eq!(config.workers.backend, PoolBackend::Persistent);
        assert_eq!(config.workers.thread_name_prefix, "tile-worker");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_fixed_policy_json() {
        let config = Config::from_json(r#"{ "workers": { "policy": { "fixed": 3 } } }"#).unwrap();
        assert_eq!(config.workers.policy, WorkerCountPolicy::Fixed(3));
    }

    #[test]
    fn test_rejects_indivisible_resolution() {
        let err = Config::from_json(r#"{ "render": { "width": 1000 } }"#).unwrap_err();
        assert!(format!("{:#}", err).contains("not divisible"));
    }

    #[test]
    fn test_rejects_zero_fixed_workers_and_frames() {
        assert!(Config::from_json(r#"{ "workers": { "policy": { "fixed": 0 } } }"#).is_err());
        assert!(Config::from_json(r#"{ "app": { "max_frames": 0 } }"#).is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut config = Config::default();
        config.render.shader = ShaderKind::Gradient;
        config.app.max_frames = Some(10);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&text).unwrap(), config);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/tile-loop.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
