/*!
    Stream descriptors exposed by a media source.
*/

use crate::Rational;

/**
    Media type tag of a container stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
    /// Subtitles, data, attachments and anything else the player ignores.
    Other,
}

/**
    Audio stream parameters.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioParams {
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Native channel count.
    pub channels: u16,
}

/**
    Video stream parameters.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    /// Average frame rate as reported by the container (may be 0/0).
    pub frame_rate: Rational,
}

impl VideoParams {
    /**
        Nominal duration of one frame in seconds.

        Uses the frame rate when known, then the stream time base, then 25 fps.
    */
    pub fn frame_duration(&self, time_base: Rational) -> f64 {
        self.frame_rate
            .invert()
            .and_then(Rational::checked_to_f64)
            .or_else(|| time_base.checked_to_f64().filter(|d| *d < 1.0))
            .unwrap_or(1.0 / 25.0)
    }
}

/**
    Descriptor of one elementary stream in a container.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// Container stream index; packets carry this as `stream_index`.
    pub index: usize,
    pub media_type: MediaType,
    /// Time base converting this stream's timestamps to seconds.
    pub time_base: Rational,
    /// Present for audio streams.
    pub audio: Option<AudioParams>,
    /// Present for video streams.
    pub video: Option<VideoParams>,
}

impl StreamInfo {
    pub fn audio(index: usize, time_base: Rational, params: AudioParams) -> Self {
        Self {
            index,
            media_type: MediaType::Audio,
            time_base,
            audio: Some(params),
            video: None,
        }
    }

    pub fn video(index: usize, time_base: Rational, params: VideoParams) -> Self {
        Self {
            index,
            media_type: MediaType::Video,
            time_base,
            audio: None,
            video: Some(params),
        }
    }

    pub fn other(index: usize, time_base: Rational) -> Self {
        Self {
            index,
            media_type: MediaType::Other,
            time_base,
            audio: None,
            video: None,
        }
    }
}
