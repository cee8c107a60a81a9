// src/platform/headless.rs
//! Window-less platform: keeps presented frames in memory.

use super::{Platform, PlatformEvent, Presenter};
use crate::framebuffer::FrameBuffer;
use crate::tiles::Resolution;
use anyhow::{anyhow, ensure, Context, Result};
use log::{debug, info, trace};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// In-memory stand-in for a window.
///
/// Presents are counted and fingerprinted. With `max_frames` set, a
/// `CloseRequested` event is queued once that many frames were presented. With
/// a snapshot path set, the last presented frame is written as PNG on
/// shutdown.
pub struct HeadlessPlatform {
    resolution: Resolution,
    events: VecDeque<PlatformEvent>,
    max_frames: Option<u64>,
    snapshot_path: Option<PathBuf>,
    presented: u64,
    last_checksum: Option<u64>,
    last_frame: Option<FrameBuffer>,
    title: String,
}

impl HeadlessPlatform {
    pub fn new(resolution: Resolution) -> Self {
        info!(
            "HeadlessPlatform: {}x{} px",
            resolution.width, resolution.height
        );
        Self {
            resolution,
            events: VecDeque::new(),
            max_frames: None,
            snapshot_path: None,
            presented: 0,
            last_checksum: None,
            last_frame: None,
            title: String::new(),
        }
    }

    /// Request close after `frames` presents.
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Save the last presented frame as PNG on shutdown.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Queue an event for the next `poll_event`.
    pub fn push_event(&mut self, event: PlatformEvent) {
        self.events.push_back(event);
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn last_checksum(&self) -> Option<u64> {
        self.last_checksum
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn save_snapshot(&self, path: &Path) -> Result<()> {
        let frame = self
            .last_frame
            .as_ref()
            .ok_or_else(|| anyhow!("no frame was presented"))?;
        let res = frame.resolution();
        let image = image::RgbaImage::from_raw(res.width, res.height, frame.to_rgba8())
            .ok_or_else(|| anyhow!("frame size does not match {}x{}", res.width, res.height))?;
        image
            .save(path)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        info!("HeadlessPlatform: snapshot written to {}", path.display());
        Ok(())
    }
}

impl Presenter for HeadlessPlatform {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        ensure!(
            frame.resolution() == self.resolution,
            "frame {:?} does not match platform {:?}",
            frame.resolution(),
            self.resolution
        );
        self.presented += 1;
        self.last_checksum = Some(frame.checksum());
        if self.snapshot_path.is_some() {
            match self.last_frame.as_mut() {
                Some(last) => last.clone_from(frame),
                None => self.last_frame = Some(frame.clone()),
            }
        }
        trace!("HeadlessPlatform: present #{}", self.presented);

        if self.max_frames == Some(self.presented) {
            debug!("HeadlessPlatform: frame limit reached, requesting close");
            self.events.push_back(PlatformEvent::CloseRequested);
        }
        Ok(())
    }
}

impl Platform for HeadlessPlatform {
    fn poll_event(&mut self) -> Result<Option<PlatformEvent>> {
        Ok(self.events.pop_front())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        info!("HeadlessPlatform: SetTitle '{}'", title);
        self.title = title.to_string();
        Ok(())
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(path) = self.snapshot_path.clone() {
            self.save_snapshot(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::KeySymbol;
    use test_log::test;

    #[test]
    fn test_close_requested_after_frame_limit() {
        let res = Resolution::new(16, 16);
        let mut platform = HeadlessPlatform::new(res).with_max_frames(2);
        let frame = FrameBuffer::new(res);

        platform.present(&frame).unwrap();
        assert_eq!(platform.poll_event().unwrap(), None);
        platform.present(&frame).unwrap();
        assert_eq!(
            platform.poll_event().unwrap(),
            Some(PlatformEvent::CloseRequested)
        );
        assert_eq!(platform.presented_frames(), 2);
    }

    #[test]
    fn test_rejects_mismatched_resolution() {
        let mut platform = HeadlessPlatform::new(Resolution::new(16, 16));
        let frame = FrameBuffer::new(Resolution::new(32, 16));
        assert!(platform.present(&frame).is_err());
    }

    #[test]
    fn test_events_are_fifo() {
        let mut platform = HeadlessPlatform::new(Resolution::new(16, 16));
        platform.push_event(PlatformEvent::KeyPressed(KeySymbol::Other(65)));
        platform.push_event(PlatformEvent::CloseRequested);
        assert!(matches!(
            platform.poll_event().unwrap(),
            Some(PlatformEvent::KeyPressed(_))
        ));
        assert_eq!(
            platform.poll_event().unwrap(),
            Some(PlatformEvent::CloseRequested)
        );
        assert_eq!(platform.poll_event().unwrap(), None);
    }

    #[test]
    fn test_snapshot_without_frame_fails() {
        let path = std::env::temp_dir().join("tile-loop-empty-snapshot.png");
        let mut platform = HeadlessPlatform::new(Resolution::new(16, 16)).with_snapshot(&path);
        assert!(platform.shutdown().is_err());
    }

    #[test]
    fn test_snapshot_written_on_shutdown() {
        let res = Resolution::new(16, 16);
        let path = std::env::temp_dir().join(format!(
            "tile-loop-snapshot-{}.png",
            std::process::id()
        ));
        let mut platform = HeadlessPlatform::new(res).with_snapshot(&path);
        let mut frame = FrameBuffer::new(res);
        frame.fill(0xff00_ff00);
        platform.present(&frame).unwrap();
        platform.shutdown().unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(img.get_pixel(3, 3).0, [0x00, 0xff, 0x00, 0xff]);
        let _ = std::fs::remove_file(&path);
    }
}
