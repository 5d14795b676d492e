/*!
    Session orchestration: wires a source, the two engines and the
    synchronizer together, and runs the display loop.

    Threads of a running session:
    - Demux thread: reads packets and routes them to the packet queues
    - Video decode thread: decodes, converts and publishes pictures
    - Audio callback: owned by the output device, pulls from the audio queue
    - The caller's thread: runs the timer-driven display loop
*/

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use ffmpeg_types::{Clock, MediaType};

use crate::audio::{AudioEngine, AudioHandle};
use crate::collab::{AudioDecode, MediaSource, PictureConvert, Render, VideoDecode};
use crate::config::PlayerConfig;
use crate::demux::{Demuxer, StreamSelection};
use crate::error::{Error, Result};
use crate::queue::PacketQueue;
use crate::quit::QuitSignal;
use crate::sync::Synchronizer;
use crate::video::{PictureSlot, VideoEngine};

/**
    Events posted to the display loop by the other threads of a session.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The source reached its end; queues drain from here.
    DemuxFinished,
    /// Reading the source failed; the session ends.
    SourceFailed(String),
    /// Every audio packet has been played out.
    AudioFinished,
    /// Every video picture has been published.
    VideoFinished,
    /// Quit was requested.
    Quit,
}

/**
    Why a session's display loop returned.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Playback ran to the end of the source.
    Finished,
    /// Quit was requested.
    Quit,
    /// The source could not be read any further.
    SourceFailed(String),
}

struct VideoParts {
    decoder: Box<dyn VideoDecode>,
    converter: Box<dyn PictureConvert>,
    frame_duration: f64,
}

/**
    Assembles a session.

    Streams are chosen once, up front. Engines are attached per stream with
    [`SessionBuilder::with_audio`] and [`SessionBuilder::with_video`]; a
    stream without an engine is dropped by the demuxer and the session plays
    whatever remains.
*/
pub struct SessionBuilder {
    source: Box<dyn MediaSource>,
    config: PlayerConfig,
    selection: StreamSelection,
    quit: QuitSignal,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    audio: Option<(Arc<PacketQueue>, AudioHandle)>,
    video: Option<VideoParts>,
}

impl SessionBuilder {
    /**
        Select the first audio and first video stream of `source`.

        Fails with [`Error::NoPlayableStreams`] if it has neither.
    */
    pub fn new(source: Box<dyn MediaSource>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let selection = StreamSelection::select(source.streams());
        if selection.is_empty() {
            return Err(Error::NoPlayableStreams);
        }

        let (events_tx, events_rx) = channel::unbounded();
        Ok(Self {
            source,
            config,
            selection,
            quit: QuitSignal::new(),
            events_tx,
            events_rx,
            audio: None,
            video: None,
        })
    }

    pub fn selection(&self) -> &StreamSelection {
        &self.selection
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /**
        Attach an audio decoder, returning the engine to hand to the output
        device's callback together with its control handle.

        The engine stays `Idle`, emitting silence, until the session starts.
    */
    pub fn with_audio(
        &mut self,
        decoder: Box<dyn AudioDecode>,
    ) -> Result<(AudioEngine, AudioHandle)> {
        let stream = self
            .selection
            .audio
            .ok_or(Error::MissingStream(MediaType::Audio))?;
        let params = stream
            .audio
            .ok_or(Error::MissingStream(MediaType::Audio))?;

        let queue = Arc::new(PacketQueue::new(self.config.audio_queue_capacity));
        let (engine, handle) = AudioEngine::new(
            params,
            stream.time_base,
            Arc::clone(&queue),
            decoder,
            self.config.audio_scratch_bytes,
        );
        let engine = engine.with_events(self.events_tx.clone());

        self.audio = Some((queue, handle.clone()));
        Ok((engine, handle))
    }

    /**
        Detach a previously attached audio engine, e.g. because the output
        device could not be opened. Audio packets are dropped from then on.
    */
    pub fn without_audio(&mut self) {
        if let Some((_, handle)) = self.audio.take() {
            handle.quit();
        }
    }

    /**
        Attach a video decoder and the converter producing display-ready
        pictures. Both move onto the video decode thread at start.
    */
    pub fn with_video(
        &mut self,
        decoder: Box<dyn VideoDecode>,
        converter: Box<dyn PictureConvert>,
    ) -> Result<()> {
        let stream = self
            .selection
            .video
            .ok_or(Error::MissingStream(MediaType::Video))?;
        let params = stream
            .video
            .ok_or(Error::MissingStream(MediaType::Video))?;

        self.video = Some(VideoParts {
            decoder,
            converter,
            frame_duration: params.frame_duration(stream.time_base),
        });
        Ok(())
    }

    /**
        Spawn the video decode and demux threads and start audio playback.
    */
    pub fn start(self) -> Result<Session> {
        let Self {
            source,
            config,
            selection,
            quit,
            events_tx,
            events_rx,
            audio,
            video,
        } = self;

        if audio.is_none() && video.is_none() {
            return Err(Error::NoPlayableStreams);
        }

        let video = match video {
            Some(parts) => {
                let queue = Arc::new(PacketQueue::new(config.video_queue_capacity));
                Some(VideoEngine::spawn(
                    queue,
                    parts.decoder,
                    parts.converter,
                    parts.frame_duration,
                    events_tx.clone(),
                )?)
            }
            None => None,
        };
        let (audio_queue, audio) = audio.unzip();
        let video_queue = video.as_ref().map(|v| Arc::clone(v.queue()));

        let quit_handle = QuitHandle {
            quit: quit.clone(),
            events: events_tx.clone(),
            audio: audio.clone(),
            queues: [audio_queue.clone(), video_queue.clone()]
                .into_iter()
                .flatten()
                .collect(),
            slot: video.as_ref().map(|v| Arc::clone(v.slot())),
        };

        let demuxer = Demuxer::new(source, selection, audio_queue, video_queue, quit);
        let demux = match demuxer.spawn(events_tx) {
            Ok(handle) => handle,
            Err(e) => {
                quit_handle.quit();
                return Err(e);
            }
        };

        if let Some(audio) = &audio {
            audio.start();
        }

        log::info!(
            "[session] started (audio: {}, video: {})",
            audio.is_some(),
            video.is_some()
        );

        Ok(Session {
            sync: Synchronizer::new(&config),
            config,
            quit_handle,
            events: events_rx,
            audio,
            video,
            demux: Some(demux),
            presented: 0,
        })
    }
}

/**
    Requests quit from any thread, e.g. a signal handler.

    Quitting wakes every blocked thread of the session: both packet queues
    are aborted, the picture slot is closed and audio goes silent.
*/
#[derive(Clone)]
pub struct QuitHandle {
    quit: QuitSignal,
    events: Sender<SessionEvent>,
    audio: Option<AudioHandle>,
    queues: Vec<Arc<PacketQueue>>,
    slot: Option<Arc<PictureSlot>>,
}

impl QuitHandle {
    pub fn quit(&self) {
        self.stop();
        let _ = self.events.send(SessionEvent::Quit);
    }

    pub fn is_quit(&self) -> bool {
        self.quit.is_quit()
    }

    fn stop(&self) {
        self.quit.quit();
        if let Some(audio) = &self.audio {
            audio.quit();
        }
        for queue in &self.queues {
            queue.abort();
        }
        if let Some(slot) = &self.slot {
            slot.close();
        }
    }
}

static_assertions::assert_impl_all!(QuitHandle: Send, Sync);

/**
    A running playback session.
*/
pub struct Session {
    config: PlayerConfig,
    quit_handle: QuitHandle,
    events: Receiver<SessionEvent>,
    audio: Option<AudioHandle>,
    video: Option<VideoEngine>,
    demux: Option<JoinHandle<()>>,
    sync: Synchronizer,
    presented: u64,
}

impl Session {
    pub fn quit_handle(&self) -> QuitHandle {
        self.quit_handle.clone()
    }

    pub fn audio(&self) -> Option<&AudioHandle> {
        self.audio.as_ref()
    }

    pub fn video(&self) -> Option<&VideoEngine> {
        self.video.as_ref()
    }

    /**
        Number of pictures rendered so far.
    */
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /**
        Run the display loop on the calling thread until playback ends.

        The first tick fires after the configured initial refresh. Each tick
        asks the synchronizer for the next delay, arms the timer with it and
        then renders one picture, so time spent rendering counts against the
        delay. Without video the loop just waits for audio to finish.

        Every thread of the session is stopped and joined before returning.
        A render failure ends the session with that error.
    */
    pub fn run<R: Render + ?Sized>(&mut self, renderer: &mut R) -> Result<SessionEnd> {
        let result = self.event_loop(renderer);
        self.shutdown();

        match &result {
            Ok(end) => log::info!(
                "[session] ended: {end:?} after {} pictures",
                self.presented
            ),
            Err(e) => log::error!("[session] ended with error: {e}"),
        }
        result
    }

    fn event_loop<R: Render + ?Sized>(&mut self, renderer: &mut R) -> Result<SessionEnd> {
        let mut deadline = self
            .video
            .is_some()
            .then(|| Instant::now() + self.config.initial_refresh());

        loop {
            let tick = deadline.map_or_else(channel::never, channel::at);

            crossbeam::select! {
                recv(self.events) -> event => {
                    // The quit handle keeps a sender alive, so this never disconnects
                    let Ok(event) = event else {
                        return Ok(SessionEnd::Finished);
                    };
                    match event {
                        SessionEvent::Quit => return Ok(SessionEnd::Quit),
                        SessionEvent::SourceFailed(message) => {
                            return Ok(SessionEnd::SourceFailed(message));
                        }
                        SessionEvent::DemuxFinished => {
                            log::debug!("[session] source exhausted, draining queues");
                        }
                        SessionEvent::VideoFinished => {
                            log::debug!("[session] last picture published");
                        }
                        SessionEvent::AudioFinished => {
                            log::debug!("[session] audio played out");
                            if self.video.is_none() {
                                return Ok(SessionEnd::Finished);
                            }
                        }
                    }
                }
                recv(tick) -> _ => {
                    let Some(video) = &self.video else {
                        continue;
                    };

                    let audio_clock = self.audio.as_ref().map(|a| a.clock() as &dyn Clock);
                    let delay = self.sync.next_delay(video.clock(), audio_clock);
                    deadline = Some(Instant::now() + delay);

                    if !video.render_picture(renderer)? {
                        return Ok(self.end_of_pictures());
                    }
                    self.presented += 1;
                }
            }
        }
    }

    /**
        Decide why the picture stream ended. A failure or quit that raced
        with the last picture is still pending in the event channel.
    */
    fn end_of_pictures(&self) -> SessionEnd {
        for event in self.events.try_iter() {
            match event {
                SessionEvent::SourceFailed(message) => return SessionEnd::SourceFailed(message),
                SessionEvent::Quit => return SessionEnd::Quit,
                _ => {}
            }
        }
        if self.quit_handle.is_quit() {
            SessionEnd::Quit
        } else {
            SessionEnd::Finished
        }
    }

    /**
        Stop every thread and wait for the ones this session owns.
    */
    fn shutdown(&mut self) {
        self.quit_handle.stop();

        if let Some(mut video) = self.video.take() {
            video.join();
        }
        if let Some(demux) = self.demux.take() {
            if demux.join().is_err() {
                log::error!("[session] demux thread panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// A windowed player runs the session off the main thread
static_assertions::assert_impl_all!(Session: Send);
