use std::sync::OnceLock;

use ffmpeg_types::{Error, Result};

static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/**
    Initialize FFmpeg for this process.

    Registers codecs and formats and lowers FFmpeg's own log level so that
    only errors reach stderr. Runs once; later calls return the first
    outcome. Call before any thread touches FFmpeg.
*/
pub fn init() -> Result<()> {
    INIT.get_or_init(|| {
        ffmpeg_next::init().map_err(|e| e.to_string())?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
        log::debug!("[ffmpeg] initialized");
        Ok(())
    })
    .clone()
    .map_err(|message| Error::source_failure(format!("ffmpeg init failed: {message}")))
}
