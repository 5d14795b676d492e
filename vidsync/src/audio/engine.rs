use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crossbeam::channel::Sender;
use ffmpeg_types::{AudioFrame, AudioParams, Packet, Rational};

use super::chunk::DecodedChunk;
use super::clock::AudioClock;
use super::convert::to_s16_interleaved;
use crate::collab::AudioDecode;
use crate::queue::PacketQueue;
use crate::session::SessionEvent;

/**
    Audio engine lifecycle. Transitions only move forward.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioState {
    Idle = 0,
    Playing = 1,
    Stopped = 2,
}

impl AudioState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Playing,
            _ => Self::Stopped,
        }
    }
}

struct Shared {
    state: AtomicU8,
    finished: AtomicBool,
    clock: AudioClock,
}

/**
    Control side of the audio engine, usable from any thread.
*/
#[derive(Clone)]
pub struct AudioHandle {
    shared: Arc<Shared>,
    queue: Arc<PacketQueue>,
}

impl AudioHandle {
    /**
        Move from `Idle` to `Playing`. Has no effect in any other state.
    */
    pub fn start(&self) {
        let _ = self.shared.state.compare_exchange(
            AudioState::Idle as u8,
            AudioState::Playing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /**
        Stop the engine for good. A callback blocked waiting for packets is
        woken by aborting the audio queue.
    */
    pub fn quit(&self) {
        self.shared
            .state
            .store(AudioState::Stopped as u8, Ordering::Release);
        self.queue.abort();
    }

    pub fn state(&self) -> AudioState {
        AudioState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /**
        True once every queued packet has been decoded and played out.
    */
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn clock(&self) -> &AudioClock {
        &self.shared.clock
    }
}

/**
    Pull-driven audio engine, owned by the output device's callback.

    Every device request is satisfied in full: data is copied from the
    scratch chunk, and whenever the chunk runs dry the next packet is pulled
    from the queue (blocking if none is ready) and decoded into it. While the
    engine is not playing, or once the stream is exhausted, the remainder of
    the request is silence.
*/
pub struct AudioEngine {
    chunk: DecodedChunk,
    queue: Arc<PacketQueue>,
    decoder: Box<dyn AudioDecode>,
    shared: Arc<Shared>,
    params: AudioParams,
    time_base: Rational,
    events: Option<Sender<SessionEvent>>,
    flushed: bool,
    exhausted: bool,
}

impl AudioEngine {
    /**
        Create an engine and its control handle.

        `scratch_bytes` is the capacity of the decoded PCM scratch buffer.
    */
    pub fn new(
        params: AudioParams,
        time_base: Rational,
        queue: Arc<PacketQueue>,
        decoder: Box<dyn AudioDecode>,
        scratch_bytes: usize,
    ) -> (Self, AudioHandle) {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(AudioState::Idle as u8),
            finished: AtomicBool::new(false),
            clock: AudioClock::new(params.sample_rate, params.channels),
        });

        let engine = Self {
            chunk: DecodedChunk::new(scratch_bytes),
            queue: Arc::clone(&queue),
            decoder,
            shared: Arc::clone(&shared),
            params,
            time_base,
            events: None,
            flushed: false,
            exhausted: false,
        };
        let handle = AudioHandle { shared, queue };
        (engine, handle)
    }

    /**
        Report [`SessionEvent::AudioFinished`] on this channel.
    */
    pub fn with_events(mut self, events: Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn params(&self) -> AudioParams {
        self.params
    }

    pub fn chunk(&self) -> &DecodedChunk {
        &self.chunk
    }

    /**
        Fill one device request of signed 16-bit interleaved bytes.
    */
    pub fn fill(&mut self, out: &mut [u8]) {
        let mut written = 0;

        while written < out.len() {
            if self.state() != AudioState::Playing || self.exhausted {
                break;
            }
            if self.chunk.is_drained() {
                self.refill();
                continue;
            }
            written += self.chunk.copy_to(&mut out[written..]);
        }

        out[written..].fill(0);
        self.shared.clock.set_buffered(self.chunk.remaining());
    }

    fn state(&self) -> AudioState {
        AudioState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /**
        Decode one packet into the scratch chunk. A packet that yields no
        frames leaves the chunk drained, and the fill loop asks again.
    */
    fn refill(&mut self) {
        let Some(packet) = self.queue.get() else {
            self.drain_decoder();
            return;
        };

        match self.decoder.decode(&packet) {
            Ok(frames) => self.store(&frames, Some(&packet)),
            Err(e) => log::warn!("[audio] dropping undecodable packet: {e}"),
        }
    }

    /**
        Flush the decoder once the queue has ended, then mark the stream
        exhausted when nothing is left.
    */
    fn drain_decoder(&mut self) {
        if self.state() == AudioState::Stopped {
            self.exhausted = true;
            return;
        }

        if !self.flushed {
            self.flushed = true;
            match self.decoder.flush() {
                Ok(frames) if !frames.is_empty() => {
                    self.store(&frames, None);
                    return;
                }
                Ok(_) => {}
                Err(e) => log::warn!("[audio] decoder flush failed: {e}"),
            }
        }

        self.exhausted = true;
        self.shared.finished.store(true, Ordering::Release);
        log::debug!("[audio] stream exhausted");
        if let Some(events) = &self.events {
            let _ = events.send(SessionEvent::AudioFinished);
        }
    }

    fn store(&mut self, frames: &[AudioFrame], packet: Option<&Packet>) {
        let channels = self.params.channels;
        let mut pcm = Vec::new();
        for frame in frames {
            if frame.channels.channels() != channels {
                log::warn!(
                    "[audio] skipping frame with {} channels, device expects {channels}",
                    frame.channels.channels()
                );
                continue;
            }
            pcm.extend(to_s16_interleaved(frame));
        }
        if pcm.is_empty() {
            return;
        }

        let stored = self.chunk.refill(&pcm);
        if stored < pcm.len() {
            log::warn!(
                "[audio] decoded {} bytes, scratch buffer holds {stored}; truncating",
                pcm.len()
            );
        }

        self.update_clock(packet, frames.first(), stored);
    }

    /**
        Prefer the packet's decode timestamp, then the frame's own timestamp,
        and otherwise extrapolate from the amount of audio just decoded. The
        whole refill becomes the clock's backlog at the same time.
    */
    fn update_clock(&self, packet: Option<&Packet>, frame: Option<&AudioFrame>, bytes: usize) {
        let timestamp = packet
            .and_then(|p| p.dts.map(|dts| dts.to_seconds(self.time_base)))
            .or_else(|| frame.and_then(AudioFrame::presentation_seconds));

        self.shared.clock.refilled(timestamp, bytes);
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("params", &self.params)
            .field("size", &self.chunk.size())
            .field("index", &self.chunk.index())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
