/*!
    Decoded frame types.
*/

use crate::{ChannelLayout, PixelFormat, Pts, Rational, SampleFormat};

/**
    A decoded video frame.

    Planes are stored back to back without row padding, in the layout
    reported by [`PixelFormat::planes`].
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format of the data.
    pub format: PixelFormat,
    /// Presentation timestamp (None for frames without timing).
    pub pts: Option<Pts>,
    /// Decode timestamp of the packet that completed this frame.
    pub dts: Option<Pts>,
    /// Number of extra fields this frame asks to be repeated for.
    pub repeat_fields: u32,
    /// Time base for interpreting the timestamps.
    pub time_base: Rational,
}

impl VideoFrame {
    /**
        Create a new video frame without decode timestamp or repeated fields.
    */
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            pts,
            dts: None,
            repeat_fields: 0,
            time_base,
        }
    }

    /**
        Set the decode timestamp.
    */
    pub fn with_dts(mut self, dts: Option<Pts>) -> Self {
        self.dts = dts;
        self
    }

    /**
        Set the number of repeated fields.
    */
    pub fn with_repeat_fields(mut self, repeat_fields: u32) -> Self {
        self.repeat_fields = repeat_fields;
        self
    }

    /**
        Returns the presentation time in seconds, if PTS is set.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts.map(|pts| pts.to_seconds(self.time_base))
    }

    /**
        Returns the decode time in seconds, if DTS is set.
    */
    pub fn decode_seconds(&self) -> Option<f64> {
        self.dts.map(|dts| dts.to_seconds(self.time_base))
    }
}

/**
    A decoded audio frame.

    Contains raw sample data in the format specified by `format`.
    Samples are interleaved for multi-channel audio.
*/
#[derive(Clone, Debug)]
pub struct AudioFrame {
    /**
        Raw sample data as bytes.

        Interpret according to `format` and `channels`.
        For interleaved stereo S16: [L0, R0, L1, R1, ...]
    */
    pub data: Vec<u8>,
    /**
        Number of samples per channel.
    */
    pub samples: usize,
    /**
        Sample rate in Hz.
    */
    pub sample_rate: u32,
    /**
        Channel layout.
    */
    pub channels: ChannelLayout,
    /**
        Sample format.
    */
    pub format: SampleFormat,
    /**
        Presentation timestamp (None for frames without timing).
    */
    pub pts: Option<Pts>,
    /**
        Time base for interpreting the PTS.
    */
    pub time_base: Rational,
}

impl AudioFrame {
    /**
        Create a new audio frame.
    */
    pub fn new(
        data: Vec<u8>,
        samples: usize,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        Self {
            data,
            samples,
            sample_rate,
            channels,
            format,
            pts,
            time_base,
        }
    }

    /**
        Returns the presentation time in seconds, if PTS is set.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts.map(|pts| pts.to_seconds(self.time_base))
    }

    /**
        Returns the total number of samples (samples per channel * channels).
    */
    pub fn total_samples(&self) -> usize {
        self.samples * self.channels.channels() as usize
    }

    /**
        Returns the expected data length in bytes.
    */
    pub fn expected_data_len(&self) -> usize {
        self.total_samples() * self.format.bytes_per_sample()
    }
}

/**
    A display-ready picture.

    This is what the video engine publishes to the display thread and what a
    renderer draws. `pitch` is the byte stride of the first plane.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub format: PixelFormat,
}

impl Picture {
    /**
        Wrap a tightly packed buffer as a picture.
    */
    pub fn packed(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        let pitch = format
            .planes(width, height)
            .first()
            .map(|p| p.row_bytes)
            .unwrap_or(0);
        Self {
            data,
            width,
            height,
            pitch,
            format,
        }
    }
}

// Frames and pictures cross thread boundaries
static_assertions::assert_impl_all!(VideoFrame: Send, Sync);
static_assertions::assert_impl_all!(AudioFrame: Send, Sync);
static_assertions::assert_impl_all!(Picture: Send, Sync);
