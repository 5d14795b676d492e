/*!
    Audio/video synchronization core of the player.

    A demux thread feeds one packet queue per elementary stream. Audio is
    decoded on demand by the output device's callback, which also drives the
    audio clock. Video is decoded on its own thread into a single picture
    slot. A display loop ticks on a timer whose every interval is computed
    by the synchronizer from the drift between the two clocks.

    Demultiplexing, decoding, pixel conversion and drawing are delegated to
    the collaborators in [`collab`].
*/

mod audio;
mod config;
mod demux;
mod error;
mod queue;
mod quit;
mod session;
mod sync;
mod video;

pub mod collab;

pub use self::audio::{
    AudioClock, AudioEngine, AudioHandle, AudioState, DecodedChunk, OUTPUT_BYTES_PER_SAMPLE,
    to_s16_interleaved,
};
pub use self::config::{
    DEFAULT_AUDIO_BUFFER_FRAMES, DEFAULT_AUDIO_QUEUE_CAPACITY, DEFAULT_AUDIO_SCRATCH_BYTES,
    DEFAULT_VIDEO_QUEUE_CAPACITY, PlayerConfig,
};
pub use self::demux::{DemuxOutcome, Demuxer, StreamSelection};
pub use self::error::{Error, Result};
pub use self::queue::PacketQueue;
pub use self::quit::QuitSignal;
pub use self::session::{QuitHandle, Session, SessionBuilder, SessionEnd, SessionEvent};
pub use self::sync::{SyncState, Synchronizer, frame_delay};
pub use self::video::{PictureSlot, VideoClock, VideoEngine};
