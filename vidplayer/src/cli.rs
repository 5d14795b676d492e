use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use vidsync::PlayerConfig;

#[derive(Parser, Debug)]
#[command(name = "vidplayer")]
#[command(about = "Play a media file with audio-driven video synchronization")]
pub struct Args {
    /// Media file to play
    pub source: PathBuf,

    /// JSON config file (defaults to <config dir>/vidsync/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Audio callback size in sample frames
    #[arg(long)]
    pub audio_buffer: Option<u32>,

    /// Never block the demuxer on full packet queues
    #[arg(long)]
    pub unbounded_queues: bool,

    /// Play without a window, counting presented pictures
    #[arg(long)]
    pub headless: bool,

    /// Write luma snapshots of presented pictures into this directory
    #[arg(long, requires = "headless")]
    pub snapshot_dir: Option<PathBuf>,

    /// Snapshot every Nth presented picture
    #[arg(long, default_value = "25")]
    pub snapshot_every: u64,

    /// Play video only, even if the source has audio
    #[arg(long)]
    pub no_audio: bool,
}

impl Args {
    /**
        Parse the command line. Usage errors print to stderr and exit with
        code 1; help and version exit with 0.
    */
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) => {
                let code = if e.use_stderr() { 1 } else { 0 };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }

    /**
        Load the config file, if any, and apply command line overrides.

        An explicitly named file must exist; the default location is optional.
    */
    pub fn player_config(&self) -> Result<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => load(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => load(&path)?,
                _ => PlayerConfig::default(),
            },
        };

        if let Some(frames) = self.audio_buffer {
            config.audio_buffer_frames = frames;
        }
        if self.unbounded_queues {
            config = config.with_unbounded_queues();
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn load(path: &Path) -> Result<PlayerConfig> {
    let config = PlayerConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    log::info!("[config] loaded {}", path.display());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vidsync").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["vidplayer", "movie.mkv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn source_is_required() {
        let err = Args::try_parse_from(["vidplayer"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn window_is_the_default_output() {
        assert!(!args(&[]).headless);
        assert!(args(&["--headless"]).headless);
    }

    #[test]
    fn snapshots_need_headless_output() {
        let argv = ["vidplayer", "movie.mkv", "--snapshot-dir", "shots"];
        assert!(Args::try_parse_from(argv).is_err());

        let parsed = args(&["--headless", "--snapshot-dir", "shots"]);
        assert_eq!(parsed.snapshot_dir, Some(PathBuf::from("shots")));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "audio_buffer_frames": 1024, "video_queue_capacity": 8 }"#)
            .unwrap();

        let path = path.to_string_lossy().into_owned();
        let config = args(&["--config", &path, "--audio-buffer", "256"])
            .player_config()
            .unwrap();
        assert_eq!(config.audio_buffer_frames, 256);
        assert_eq!(config.video_queue_capacity, Some(8));

        let config = args(&["--config", &path, "--unbounded-queues"])
            .player_config()
            .unwrap();
        assert_eq!(config.audio_buffer_frames, 1024);
        assert_eq!(config.video_queue_capacity, None);
        assert_eq!(config.audio_queue_capacity, None);
    }

    #[test]
    fn missing_explicit_config_fails() {
        let result = args(&["--config", "/nonexistent/vidsync.json"]).player_config();
        assert!(result.is_err());
    }

    #[test]
    fn zero_audio_buffer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let path = path.to_string_lossy().into_owned();
        let result = args(&["--config", &path, "--audio-buffer", "0"]).player_config();
        assert!(result.is_err());
    }
}
