mod chunk;
mod clock;
mod convert;
mod engine;

pub use chunk::DecodedChunk;
pub use clock::AudioClock;
pub use convert::{OUTPUT_BYTES_PER_SAMPLE, to_s16_interleaved};
pub use engine::{AudioEngine, AudioHandle, AudioState};
