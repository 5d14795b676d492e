use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Audio callback request size in sample frames
pub const DEFAULT_AUDIO_BUFFER_FRAMES: u32 = 512;
/// Capacity of the decoded audio scratch buffer in bytes
pub const DEFAULT_AUDIO_SCRATCH_BYTES: usize = 192_000;
pub const DEFAULT_AUDIO_QUEUE_CAPACITY: usize = 240;
pub const DEFAULT_VIDEO_QUEUE_CAPACITY: usize = 120;

/**
    Tunables for one playback session.

    Every field has a default, so a config file only needs to name the
    values it changes. A queue capacity of `null` makes that queue unbounded.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Frames per hardware audio request.
    pub audio_buffer_frames: u32,
    /// Size of the decoded audio scratch buffer.
    pub audio_scratch_bytes: usize,
    /// Maximum queued audio packets before the demuxer blocks.
    pub audio_queue_capacity: Option<usize>,
    /// Maximum queued video packets before the demuxer blocks.
    pub video_queue_capacity: Option<usize>,
    /// Delay before the first display tick, in milliseconds.
    pub initial_refresh_ms: u64,
    /// Frame delay assumed before two clock readings exist, in seconds.
    pub initial_frame_delay: f64,
    /// Frame-to-frame delays at or above this are treated as discontinuities.
    pub max_frame_delay: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_buffer_frames: DEFAULT_AUDIO_BUFFER_FRAMES,
            audio_scratch_bytes: DEFAULT_AUDIO_SCRATCH_BYTES,
            audio_queue_capacity: Some(DEFAULT_AUDIO_QUEUE_CAPACITY),
            video_queue_capacity: Some(DEFAULT_VIDEO_QUEUE_CAPACITY),
            initial_refresh_ms: 10,
            initial_frame_delay: 0.04,
            max_frame_delay: 1.0,
        }
    }
}

impl PlayerConfig {
    /**
        Parse a config from JSON and validate it.
    */
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /**
        Load a config file from disk.
    */
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /**
        Make both packet queues unbounded.
    */
    pub fn with_unbounded_queues(mut self) -> Self {
        self.audio_queue_capacity = None;
        self.video_queue_capacity = None;
        self
    }

    pub fn initial_refresh(&self) -> Duration {
        Duration::from_millis(self.initial_refresh_ms)
    }

    /**
        Reject values that would stall or break the pipeline.
    */
    pub fn validate(&self) -> Result<()> {
        if self.audio_buffer_frames == 0 {
            return Err(Error::Config("audio_buffer_frames must be positive".into()));
        }
        if self.audio_scratch_bytes < 4 {
            return Err(Error::Config("audio_scratch_bytes is too small".into()));
        }
        if self.audio_queue_capacity == Some(0) || self.video_queue_capacity == Some(0) {
            return Err(Error::Config("queue capacity must be positive or null".into()));
        }
        if !(self.max_frame_delay > 0.0) {
            return Err(Error::Config("max_frame_delay must be positive".into()));
        }
        if !(self.initial_frame_delay >= 0.0 && self.initial_frame_delay < self.max_frame_delay) {
            return Err(Error::Config(
                "initial_frame_delay must be within [0, max_frame_delay)".into(),
            ));
        }
        Ok(())
    }
}
