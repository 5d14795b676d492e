/*!
    File-backed media source.
*/

use std::path::{Path, PathBuf};

use ffmpeg_next::{ffi, format, media};

use ffmpeg_types::{
    AudioParams, Error, MediaDuration, Packet, Pts, Rational, Result, StreamInfo,
    VideoParams,
};

use crate::codec::CodecConfig;
use crate::init::init;

/**
    An opened container.

    Streams are described once at open time. Packets are read strictly in
    container order; routing them by stream is up to the caller.
*/
pub struct Source {
    input: format::context::Input,
    streams: Vec<StreamInfo>,
    path: PathBuf,
}

impl Source {
    /**
        Open a media file, initializing FFmpeg first if needed.
    */
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        init()?;

        let path = path.as_ref().to_path_buf();
        let input = format::input(&path)
            .map_err(|e| Error::source_failure(format!("{}: {e}", path.display())))?;

        let streams: Vec<StreamInfo> = input.streams().map(|s| describe(&s)).collect();
        log::info!(
            "[source] opened {} ({} streams, duration {:?}s)",
            path.display(),
            streams.len(),
            duration_seconds(&input)
        );
        for stream in &streams {
            log::debug!("[source] {stream:?}");
        }

        Ok(Self {
            input,
            streams,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /**
        All streams of the container, in index order.
    */
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /**
        Container duration in seconds, if known.
    */
    pub fn duration(&self) -> Option<f64> {
        duration_seconds(&self.input)
    }

    /**
        Codec configuration of the stream at `index`, for opening a decoder.
    */
    pub fn codec_config(&self, index: usize) -> Option<CodecConfig> {
        let info = self.streams.iter().find(|s| s.index == index)?;
        let stream = self.input.stream(index)?;
        Some(CodecConfig::new(
            stream.parameters().clone(),
            info.media_type,
            index,
        ))
    }

    /**
        Read the next packet. `None` means end of stream.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        let mut packet = ffmpeg_next::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) => break,
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::util::error::EAGAIN =>
                {
                    continue;
                }
                Err(e) => return Err(Error::source_failure(e.to_string())),
            }
        }
        Ok(Some(self.convert(&packet)))
    }

    fn convert(&self, packet: &ffmpeg_next::Packet) -> Packet {
        let index = packet.stream();
        let time_base = self
            .streams
            .iter()
            .find(|s| s.index == index)
            .map(|s| s.time_base)
            .unwrap_or(Rational::new(0, 1));
        let data = packet.data().map(<[u8]>::to_vec).unwrap_or_default();

        Packet::new(index, data, time_base)
            .with_timestamps(packet.pts().map(Pts), packet.dts().map(Pts))
            .with_duration(MediaDuration(packet.duration()))
            .with_keyframe(packet.is_key())
    }
}

// SAFETY: the format context is owned exclusively by this value and is only
// used by the thread that currently owns it (the demux thread once a session
// has started); nothing else holds a pointer into it.
unsafe impl Send for Source {}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("path", &self.path)
            .field("streams", &self.streams)
            .finish_non_exhaustive()
    }
}

fn rational(value: ffmpeg_next::Rational) -> Rational {
    Rational::new(value.numerator(), value.denominator())
}

fn duration_seconds(input: &format::context::Input) -> Option<f64> {
    let duration = input.duration();
    (duration > 0).then(|| duration as f64 / ffi::AV_TIME_BASE as f64)
}

fn describe(stream: &format::stream::Stream) -> StreamInfo {
    let index = stream.index();
    let time_base = rational(stream.time_base());
    let parameters = stream.parameters();

    match parameters.medium() {
        media::Type::Video => {
            // SAFETY: the parameters point into the live stream
            let (width, height) = unsafe {
                let ptr = parameters.as_ptr();
                ((*ptr).width, (*ptr).height)
            };
            StreamInfo::video(
                index,
                time_base,
                VideoParams {
                    width: width.max(0) as u32,
                    height: height.max(0) as u32,
                    frame_rate: rational(stream.avg_frame_rate()),
                },
            )
        }
        media::Type::Audio => {
            // SAFETY: the parameters point into the live stream
            let (sample_rate, channels) = unsafe {
                let ptr = parameters.as_ptr();
                ((*ptr).sample_rate, (*ptr).ch_layout.nb_channels)
            };
            StreamInfo::audio(
                index,
                time_base,
                AudioParams {
                    sample_rate: sample_rate.max(0) as u32,
                    channels: channels.clamp(0, u16::MAX as i32) as u16,
                },
            )
        }
        _ => StreamInfo::other(index, time_base),
    }
}
