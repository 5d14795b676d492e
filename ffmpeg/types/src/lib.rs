/*!
    Shared types for the ffmpeg crate ecosystem.

    This crate defines the vocabulary of the ecosystem: the types that cross crate
    boundaries. It has no dependency on FFmpeg, so the playback core can depend on
    it (and be tested) without pulling in FFmpeg bindings.

    # Core Types

    - [`Rational`] - Rational numbers for time bases and frame rates
    - [`Pts`] and [`MediaDuration`] - Timestamps in time_base units
    - [`Packet`] - One encoded access unit of a single elementary stream
    - [`VideoFrame`] and [`AudioFrame`] - Decoded frame data
    - [`Picture`] - A display-ready picture handed to a renderer

    # Format Types

    - [`PixelFormat`] - Video pixel formats
    - [`SampleFormat`] - Audio sample formats
    - [`ChannelLayout`] - Audio channel layouts

    # Stream Information

    - [`StreamInfo`] and [`MediaType`] - Per-stream descriptors exposed by a source
    - [`AudioParams`] and [`VideoParams`] - Media-specific stream parameters

    # Clocks

    - [`Clock`] - Trait for presentation clocks read by the synchronizer
    - [`AtomicF64`] - Lock-free scalar used to publish clock readings

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
*/

mod clock;
mod error;
mod format;
mod frame;
mod packet;
mod rational;
mod stream;
mod timestamp;

pub use clock::{AtomicF64, Clock};
pub use error::{Error, Result};
pub use format::{ChannelLayout, PixelFormat, PlaneLayout, SampleFormat};
pub use frame::{AudioFrame, Picture, VideoFrame};
pub use packet::Packet;
pub use rational::Rational;
pub use stream::{AudioParams, MediaType, StreamInfo, VideoParams};
pub use timestamp::{MediaDuration, Pts};
