use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;
use ffmpeg_types::VideoFrame;

use super::clock::VideoClock;
use super::slot::PictureSlot;
use crate::collab::{PictureConvert, Render, VideoDecode};
use crate::error::{Error, Result};
use crate::queue::PacketQueue;
use crate::session::SessionEvent;

/**
    Video branch of a session.

    Owns the decode thread, which pulls packets from the video queue,
    decodes and converts them, and publishes each picture into the
    [`PictureSlot`]. Publishing blocks until the display thread has rendered
    the previous picture, which paces decoding to display.
*/
pub struct VideoEngine {
    queue: Arc<PacketQueue>,
    slot: Arc<PictureSlot>,
    clock: Arc<VideoClock>,
    thread: Option<JoinHandle<()>>,
}

impl VideoEngine {
    /**
        Start the decode thread.
    */
    pub fn spawn(
        queue: Arc<PacketQueue>,
        decoder: Box<dyn VideoDecode>,
        converter: Box<dyn PictureConvert>,
        frame_duration: f64,
        events: Sender<SessionEvent>,
    ) -> Result<Self> {
        let slot = Arc::new(PictureSlot::new());
        let clock = Arc::new(VideoClock::new(frame_duration));

        let worker = DecodeLoop {
            queue: Arc::clone(&queue),
            slot: Arc::clone(&slot),
            clock: Arc::clone(&clock),
            decoder,
            converter,
        };

        let thread = thread::Builder::new()
            .name("video".into())
            .spawn(move || {
                if worker.run() {
                    let _ = events.send(SessionEvent::VideoFinished);
                }
            })
            .map_err(|source| Error::ThreadSpawn {
                name: "video",
                source,
            })?;

        Ok(Self {
            queue,
            slot,
            clock,
            thread: Some(thread),
        })
    }

    /**
        Block until a picture is ready, render it, and release the slot.

        Returns `Ok(false)` once the stream is finished or the engine quit.
    */
    pub fn render_picture<R: Render + ?Sized>(&self, renderer: &mut R) -> Result<bool> {
        self.slot.render_picture(renderer)
    }

    pub fn clock(&self) -> &VideoClock {
        &self.clock
    }

    pub fn slot(&self) -> &Arc<PictureSlot> {
        &self.slot
    }

    pub fn queue(&self) -> &Arc<PacketQueue> {
        &self.queue
    }

    /**
        Wake and stop the decode thread, discarding pending packets.
    */
    pub fn quit(&self) {
        self.queue.abort();
        self.slot.close();
    }

    /**
        Wait for the decode thread to exit.
    */
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("[video] decode thread panicked");
            }
        }
    }
}

impl Drop for VideoEngine {
    fn drop(&mut self) {
        self.quit();
        self.join();
    }
}

struct DecodeLoop {
    queue: Arc<PacketQueue>,
    slot: Arc<PictureSlot>,
    clock: Arc<VideoClock>,
    decoder: Box<dyn VideoDecode>,
    converter: Box<dyn PictureConvert>,
}

impl DecodeLoop {
    /**
        Returns true when the stream ran to its end, false when stopped.
    */
    fn run(mut self) -> bool {
        let mut decoded = 0usize;

        while let Some(packet) = self.queue.get() {
            let frames = match self.decoder.decode(&packet) {
                Ok(frames) => frames,
                Err(e) => {
                    log::warn!("[video] dropping undecodable packet: {e}");
                    continue;
                }
            };
            for frame in frames {
                if !self.present(&frame) {
                    log::debug!("[video] stopped after {decoded} frames");
                    return false;
                }
                decoded += 1;
            }
        }

        if self.slot.is_finished() {
            log::debug!("[video] stopped after {decoded} frames");
            return false;
        }

        match self.decoder.flush() {
            Ok(frames) => {
                for frame in frames {
                    if !self.present(&frame) {
                        return false;
                    }
                    decoded += 1;
                }
            }
            Err(e) => log::warn!("[video] decoder flush failed: {e}"),
        }

        self.slot.finish();
        log::debug!("[video] end of stream after {decoded} frames");
        true
    }

    /**
        Update the clock, convert and publish one frame. Returns false once
        the slot is closed.
    */
    fn present(&mut self, frame: &VideoFrame) -> bool {
        self.clock.update(frame);

        let picture = match self.converter.convert(frame) {
            Ok(picture) => picture,
            Err(e) => {
                log::warn!("[video] skipping frame that failed to convert: {e}");
                return true;
            }
        };

        self.slot.publish(picture).is_ok()
    }
}
