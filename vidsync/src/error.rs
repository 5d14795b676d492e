use std::io;

use ffmpeg_types::MediaType;
use thiserror::Error;

/**
    Errors produced by the playback core.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Media(#[from] ffmpeg_types::Error),
    #[error("queue or picture slot was closed")]
    Closed,
    #[error("source has no {0:?} stream")]
    MissingStream(MediaType),
    #[error("source has neither an audio nor a video stream")]
    NoPlayableStreams,
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
