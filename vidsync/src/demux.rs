use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;
use ffmpeg_types::{MediaType, Packet, StreamInfo};

use crate::collab::MediaSource;
use crate::error::{Error, Result};
use crate::queue::PacketQueue;
use crate::quit::QuitSignal;
use crate::session::SessionEvent;

/**
    The audio and video streams chosen for playback.

    The first stream of each media type wins. A missing type is a valid
    composition; the matching engine is simply never created.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSelection {
    pub audio: Option<StreamInfo>,
    pub video: Option<StreamInfo>,
}

impl StreamSelection {
    pub fn select(streams: &[StreamInfo]) -> Self {
        let first = |kind| streams.iter().find(|s| s.media_type == kind).copied();
        Self {
            audio: first(MediaType::Audio),
            video: first(MediaType::Video),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

/**
    How the demux loop ended.
*/
#[derive(Debug)]
pub enum DemuxOutcome {
    /// The source reported end of stream.
    EndOfStream,
    /// Quit was requested or every consumer went away.
    Stopped,
    /// The source failed to read; demuxing is over for this session.
    Failed(ffmpeg_types::Error),
}

/**
    Reads packets from a source and routes them to the per-stream queues.
*/
pub struct Demuxer {
    source: Box<dyn MediaSource>,
    selection: StreamSelection,
    audio_queue: Option<Arc<PacketQueue>>,
    video_queue: Option<Arc<PacketQueue>>,
    quit: QuitSignal,
}

impl Demuxer {
    /**
        Create a demuxer. A queue of `None` drops that stream's packets.
    */
    pub fn new(
        source: Box<dyn MediaSource>,
        selection: StreamSelection,
        audio_queue: Option<Arc<PacketQueue>>,
        video_queue: Option<Arc<PacketQueue>>,
        quit: QuitSignal,
    ) -> Self {
        Self {
            source,
            selection,
            audio_queue,
            video_queue,
            quit,
        }
    }

    /**
        Run the demux loop on the current thread until the source ends,
        fails, or quit is requested.

        On end of stream both queues are closed so the consumers drain what
        is left and then stop. On failure or quit they are aborted instead,
        discarding whatever is still queued.
    */
    pub fn run(mut self) -> DemuxOutcome {
        let outcome = self.pump();
        self.release_queues(&outcome);
        outcome
    }

    /**
        Run the demux loop on a dedicated thread, reporting the outcome as a
        session event.

        A failure is reported before the queues are released, so by the time
        a consumer sees its queue end the event is already pending.
    */
    pub fn spawn(mut self, events: Sender<SessionEvent>) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("demux".into())
            .spawn(move || {
                let outcome = self.pump();
                if let DemuxOutcome::Failed(e) = &outcome {
                    log::error!("[demux] read failed, ending session: {e}");
                    let _ = events.send(SessionEvent::SourceFailed(e.to_string()));
                }
                self.release_queues(&outcome);
                if let DemuxOutcome::EndOfStream = outcome {
                    let _ = events.send(SessionEvent::DemuxFinished);
                }
            })
            .map_err(|source| Error::ThreadSpawn {
                name: "demux",
                source,
            })
    }

    fn pump(&mut self) -> DemuxOutcome {
        let mut routed = 0usize;
        let mut dropped = 0usize;

        let outcome = loop {
            if self.quit.is_quit() {
                break DemuxOutcome::Stopped;
            }

            let packet = match self.source.next_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => break DemuxOutcome::EndOfStream,
                Err(e) => break DemuxOutcome::Failed(e),
            };

            match self.queue_for(&packet) {
                Some(queue) => {
                    if let Err(Error::Closed) = queue.put(packet) {
                        break DemuxOutcome::Stopped;
                    }
                    routed += 1;
                }
                None => dropped += 1,
            }
        };

        log::debug!("[demux] finished: {outcome:?} ({routed} routed, {dropped} dropped)");
        outcome
    }

    fn release_queues(&self, outcome: &DemuxOutcome) {
        for queue in [&self.audio_queue, &self.video_queue].into_iter().flatten() {
            match outcome {
                DemuxOutcome::EndOfStream => queue.close(),
                DemuxOutcome::Stopped | DemuxOutcome::Failed(_) => queue.abort(),
            }
        }
    }

    fn queue_for(&self, packet: &Packet) -> Option<&Arc<PacketQueue>> {
        let is = |stream: Option<StreamInfo>| stream.is_some_and(|s| s.index == packet.stream_index);

        if is(self.selection.video) {
            self.video_queue.as_ref()
        } else if is(self.selection.audio) {
            self.audio_queue.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use ffmpeg_types::{AudioParams, Pts, Rational, VideoParams};

    const TB: Rational = Rational { num: 1, den: 1000 };

    struct ScriptedSource {
        streams: Vec<StreamInfo>,
        script: VecDeque<ffmpeg_types::Result<Packet>>,
    }

    impl MediaSource for ScriptedSource {
        fn streams(&self) -> &[StreamInfo] {
            &self.streams
        }

        fn next_packet(&mut self) -> ffmpeg_types::Result<Option<Packet>> {
            self.script.pop_front().transpose()
        }
    }

    fn streams() -> Vec<StreamInfo> {
        vec![
            StreamInfo::other(0, TB),
            StreamInfo::video(
                1,
                TB,
                VideoParams {
                    width: 16,
                    height: 16,
                    frame_rate: Rational::new(25, 1),
                },
            ),
            StreamInfo::audio(
                2,
                TB,
                AudioParams {
                    sample_rate: 48000,
                    channels: 2,
                },
            ),
            StreamInfo::audio(
                3,
                TB,
                AudioParams {
                    sample_rate: 44100,
                    channels: 1,
                },
            ),
        ]
    }

    fn packet(stream: usize, seq: i64) -> ffmpeg_types::Result<Packet> {
        Ok(Packet::new(stream, vec![1, 2, 3], TB).with_timestamps(Some(Pts(seq)), None))
    }

    fn drain(queue: &PacketQueue) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(p) = queue.get() {
            out.push(p.pts.unwrap().0);
        }
        out
    }

    #[test]
    fn selects_first_stream_of_each_type() {
        let selection = StreamSelection::select(&streams());
        assert_eq!(selection.video.map(|s| s.index), Some(1));
        assert_eq!(selection.audio.map(|s| s.index), Some(2));
        assert!(!selection.is_empty());
        assert!(StreamSelection::select(&[StreamInfo::other(0, TB)]).is_empty());
    }

    #[test]
    fn routes_by_stream_index_and_drops_the_rest() {
        let streams = streams();
        let selection = StreamSelection::select(&streams);
        let source = ScriptedSource {
            streams,
            script: VecDeque::from(vec![
                packet(1, 0),
                packet(2, 0),
                packet(0, 99),
                packet(3, 99),
                packet(1, 1),
                packet(2, 1),
            ]),
        };

        let audio = Arc::new(PacketQueue::new(None));
        let video = Arc::new(PacketQueue::new(None));
        let demuxer = Demuxer::new(
            Box::new(source),
            selection,
            Some(Arc::clone(&audio)),
            Some(Arc::clone(&video)),
            QuitSignal::new(),
        );

        assert!(matches!(demuxer.run(), DemuxOutcome::EndOfStream));
        assert!(audio.is_closed() && video.is_closed());
        assert_eq!(drain(&video), vec![0, 1]);
        assert_eq!(drain(&audio), vec![0, 1]);
    }

    #[test]
    fn missing_audio_consumer_drops_audio() {
        let streams = streams();
        let selection = StreamSelection::select(&streams);
        let source = ScriptedSource {
            streams,
            script: VecDeque::from(vec![packet(2, 0), packet(1, 5)]),
        };

        let video = Arc::new(PacketQueue::new(None));
        let demuxer = Demuxer::new(
            Box::new(source),
            selection,
            None,
            Some(Arc::clone(&video)),
            QuitSignal::new(),
        );

        assert!(matches!(demuxer.run(), DemuxOutcome::EndOfStream));
        assert_eq!(drain(&video), vec![5]);
    }

    #[test]
    fn read_error_ends_demuxing() {
        let streams = streams();
        let selection = StreamSelection::select(&streams);
        let source = ScriptedSource {
            streams,
            script: VecDeque::from(vec![
                packet(1, 0),
                Err(ffmpeg_types::Error::source_failure("truncated file")),
                packet(1, 1),
            ]),
        };

        let video = Arc::new(PacketQueue::new(None));
        let demuxer = Demuxer::new(
            Box::new(source),
            selection,
            None,
            Some(Arc::clone(&video)),
            QuitSignal::new(),
        );

        assert!(matches!(demuxer.run(), DemuxOutcome::Failed(_)));
        // Already queued units are discarded so the decoder stops at once
        assert!(video.is_closed());
        assert_eq!(drain(&video), Vec::<i64>::new());
    }

    #[test]
    fn quit_stops_before_reading() {
        let streams = streams();
        let selection = StreamSelection::select(&streams);
        let source = ScriptedSource {
            streams,
            script: VecDeque::from(vec![packet(1, 0)]),
        };

        let quit = QuitSignal::new();
        quit.quit();
        let video = Arc::new(PacketQueue::new(None));
        let demuxer = Demuxer::new(Box::new(source), selection, None, Some(Arc::clone(&video)), quit);

        assert!(matches!(demuxer.run(), DemuxOutcome::Stopped));
        assert!(video.is_empty());
    }
}
