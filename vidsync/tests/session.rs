use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ffmpeg_types::{
    AudioFrame, AudioParams, ChannelLayout, Clock, Packet, Picture, PixelFormat, Pts, Rational,
    SampleFormat, StreamInfo, VideoFrame, VideoParams,
};
use vidsync::collab::{AudioDecode, MediaSource, PictureConvert, Render, VideoDecode};
use vidsync::{AudioEngine, AudioHandle, AudioState, PlayerConfig, SessionBuilder, SessionEnd};

const TB: Rational = Rational { num: 1, den: 1000 };
const SAMPLE_RATE: u32 = 8000;
// 20 ms of mono S16 at 8 kHz
const AUDIO_PACKET_BYTES: usize = 320;

const VIDEO: usize = 0;
const AUDIO: usize = 1;

fn streams() -> Vec<StreamInfo> {
    vec![
        StreamInfo::video(
            VIDEO,
            TB,
            VideoParams {
                width: 4,
                height: 2,
                frame_rate: Rational::new(25, 1),
            },
        ),
        StreamInfo::audio(
            AUDIO,
            TB,
            AudioParams {
                sample_rate: SAMPLE_RATE,
                channels: 1,
            },
        ),
    ]
}

/**
    A 25 fps video stream interleaved with 20 ms audio packets, in the order
    a muxer would write them.
*/
fn interleaved(video_frames: usize) -> VecDeque<ffmpeg_types::Result<Packet>> {
    let mut script = VecDeque::new();
    for frame in 0..video_frames {
        let ms = frame as i64 * 40;
        script.push_back(Ok(Packet::new(VIDEO, vec![frame as u8], TB)
            .with_timestamps(Some(Pts(ms)), Some(Pts(ms)))));
        for half in 0..2 {
            let ms = ms + half * 20;
            script.push_back(Ok(Packet::new(AUDIO, vec![0u8; AUDIO_PACKET_BYTES], TB)
                .with_timestamps(Some(Pts(ms)), Some(Pts(ms)))));
        }
    }
    script
}

struct ScriptedSource {
    streams: Vec<StreamInfo>,
    script: VecDeque<ffmpeg_types::Result<Packet>>,
    endless: bool,
    next: i64,
}

impl ScriptedSource {
    fn new(script: VecDeque<ffmpeg_types::Result<Packet>>) -> Self {
        Self {
            streams: streams(),
            script,
            endless: false,
            next: 0,
        }
    }

    fn endless() -> Self {
        Self {
            endless: true,
            ..Self::new(VecDeque::new())
        }
    }
}

impl MediaSource for ScriptedSource {
    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn next_packet(&mut self) -> ffmpeg_types::Result<Option<Packet>> {
        if self.endless {
            let ms = self.next * 40;
            self.next += 1;
            return Ok(Some(
                Packet::new(VIDEO, vec![0], TB).with_timestamps(None, Some(Pts(ms))),
            ));
        }
        self.script.pop_front().transpose()
    }
}

struct FrameDecoder;

impl VideoDecode for FrameDecoder {
    fn decode(&mut self, packet: &Packet) -> ffmpeg_types::Result<Vec<VideoFrame>> {
        let tag = packet.data[0];
        Ok(vec![
            VideoFrame::new(vec![tag; 12], 4, 2, PixelFormat::Yuv420p, packet.pts, TB)
                .with_dts(packet.dts),
        ])
    }
}

struct PcmDecoder;

impl AudioDecode for PcmDecoder {
    fn decode(&mut self, packet: &Packet) -> ffmpeg_types::Result<Vec<AudioFrame>> {
        Ok(vec![AudioFrame::new(
            packet.data.clone(),
            packet.data.len() / 2,
            SAMPLE_RATE,
            ChannelLayout::Mono,
            SampleFormat::S16,
            packet.pts,
            TB,
        )])
    }
}

struct Passthrough;

impl PictureConvert for Passthrough {
    fn convert(&mut self, frame: &VideoFrame) -> ffmpeg_types::Result<Picture> {
        Ok(Picture::packed(
            frame.data.clone(),
            frame.width,
            frame.height,
            frame.format,
        ))
    }
}

#[derive(Default)]
struct Recorder {
    tags: Vec<u8>,
}

impl Render for Recorder {
    fn render(&mut self, picture: &Picture) -> ffmpeg_types::Result<()> {
        assert_eq!(picture.pitch, 4);
        self.tags.push(picture.data[0]);
        Ok(())
    }
}

/**
    Stand-in for the output device: pulls one 20 ms buffer every 20 ms until
    the engine is stopped.
*/
fn spawn_device(mut engine: AudioEngine, handle: AudioHandle) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let mut buffer = vec![0u8; AUDIO_PACKET_BYTES];
        let mut pulls = 0;
        while handle.state() != AudioState::Stopped {
            engine.fill(&mut buffer);
            pulls += 1;
            thread::sleep(Duration::from_millis(20));
        }
        pulls
    })
}

#[test]
fn plays_audio_and_video_to_the_end() {
    const FRAMES: usize = 12;

    let source = ScriptedSource::new(interleaved(FRAMES));
    let mut builder = SessionBuilder::new(Box::new(source), PlayerConfig::default()).unwrap();
    let (engine, handle) = builder.with_audio(Box::new(PcmDecoder)).unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();
    let device = spawn_device(engine, handle.clone());

    let mut session = builder.start().unwrap();
    assert_eq!(handle.state(), AudioState::Playing);

    let mut recorder = Recorder::default();
    let end = session.run(&mut recorder).unwrap();

    assert_eq!(end, SessionEnd::Finished);
    assert_eq!(
        recorder.tags,
        (0..FRAMES as u8).collect::<Vec<_>>(),
        "every picture is rendered exactly once, in order"
    );
    assert_eq!(session.presented(), FRAMES as u64);
    assert!(handle.clock().seconds() > 0.0);

    // Shutdown stops the device side as well
    assert_eq!(handle.state(), AudioState::Stopped);
    assert!(device.join().unwrap() > 0);
}

#[test]
fn audio_only_session_ends_when_audio_is_played_out() {
    let script = interleaved(5)
        .into_iter()
        .filter(|p| p.as_ref().is_ok_and(|p| p.stream_index == AUDIO))
        .collect();
    let mut source = ScriptedSource::new(script);
    source.streams.retain(|s| s.index == AUDIO);

    let mut builder = SessionBuilder::new(Box::new(source), PlayerConfig::default()).unwrap();
    let (engine, handle) = builder.with_audio(Box::new(PcmDecoder)).unwrap();
    let device = spawn_device(engine, handle.clone());

    let mut session = builder.start().unwrap();
    let end = session.run(&mut Recorder::default()).unwrap();

    assert_eq!(end, SessionEnd::Finished);
    assert!(handle.is_finished());
    assert_eq!(session.presented(), 0);
    // Ten 20 ms packets put the clock at the last packet's timestamp
    assert!((handle.clock().decoded_seconds() - 0.18).abs() < 1e-9);
    device.join().unwrap();
}

#[test]
fn video_without_audio_engine_still_plays() {
    const FRAMES: usize = 6;

    let source = ScriptedSource::new(interleaved(FRAMES));
    let mut builder = SessionBuilder::new(Box::new(source), PlayerConfig::default()).unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();

    let mut session = builder.start().unwrap();
    let mut recorder = Recorder::default();
    let end = session.run(&mut recorder).unwrap();

    assert_eq!(end, SessionEnd::Finished);
    assert_eq!(recorder.tags.len(), FRAMES);
    assert!(session.audio().is_none());
}

#[test]
fn quit_from_another_thread_ends_the_session_promptly() {
    let config = PlayerConfig::default();
    let mut builder = SessionBuilder::new(Box::new(ScriptedSource::endless()), config).unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();

    let mut session = builder.start().unwrap();
    let quit = session.quit_handle();
    let requested = Arc::new(AtomicBool::new(false));
    let quitter = {
        let requested = Arc::clone(&requested);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            requested.store(true, Ordering::SeqCst);
            quit.quit();
        })
    };

    let start = Instant::now();
    let end = session.run(&mut Recorder::default()).unwrap();

    assert_eq!(end, SessionEnd::Quit);
    assert!(requested.load(Ordering::SeqCst));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(session.presented() > 0);
    quitter.join().unwrap();
}

#[test]
fn read_failure_ends_the_session() {
    let mut script = interleaved(3);
    script.push_back(Err(ffmpeg_types::Error::source_failure("disk went away")));
    script.extend(interleaved(30));

    let mut builder =
        SessionBuilder::new(Box::new(ScriptedSource::new(script)), PlayerConfig::default())
            .unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();

    let mut session = builder.start().unwrap();
    let end = session.run(&mut Recorder::default()).unwrap();

    match end {
        SessionEnd::SourceFailed(message) => assert!(message.contains("disk went away")),
        other => panic!("unexpected end: {other:?}"),
    }
}

#[test]
fn read_failure_while_waiting_for_a_picture_is_not_a_clean_finish() {
    /// Yields one picture, then fails only after the display loop has
    /// rendered it and gone back to waiting for the next one.
    struct FailsLate {
        streams: Vec<StreamInfo>,
        reads: usize,
    }

    impl MediaSource for FailsLate {
        fn streams(&self) -> &[StreamInfo] {
            &self.streams
        }

        fn next_packet(&mut self) -> ffmpeg_types::Result<Option<Packet>> {
            self.reads += 1;
            if self.reads == 1 {
                return Ok(Some(
                    Packet::new(VIDEO, vec![7], TB).with_timestamps(Some(Pts(0)), Some(Pts(0))),
                ));
            }
            thread::sleep(Duration::from_millis(200));
            Err(ffmpeg_types::Error::source_failure("disk went away"))
        }
    }

    let mut streams = streams();
    streams.retain(|s| s.index == VIDEO);
    let source = FailsLate { streams, reads: 0 };

    let mut builder = SessionBuilder::new(Box::new(source), PlayerConfig::default()).unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();

    let mut session = builder.start().unwrap();
    let mut recorder = Recorder::default();
    let end = session.run(&mut recorder).unwrap();

    match end {
        SessionEnd::SourceFailed(message) => assert!(message.contains("disk went away")),
        other => panic!("read failure reported as {other:?}"),
    }
    assert_eq!(recorder.tags, vec![7]);
}

#[test]
fn render_failure_is_returned() {
    struct Broken;

    impl Render for Broken {
        fn render(&mut self, _picture: &Picture) -> ffmpeg_types::Result<()> {
            Err(ffmpeg_types::Error::invalid_data("surface lost"))
        }
    }

    let source = ScriptedSource::new(interleaved(4));
    let mut builder = SessionBuilder::new(Box::new(source), PlayerConfig::default()).unwrap();
    builder
        .with_video(Box::new(FrameDecoder), Box::new(Passthrough))
        .unwrap();

    let mut session = builder.start().unwrap();
    assert!(session.run(&mut Broken).is_err());
}
