/*!
    FFmpeg-backed collaborators for the playback core.
*/

use ffmpeg_decode::{AudioDecoder, VideoDecoder};
use ffmpeg_source::Source;
use ffmpeg_transform::VideoTransform;
use ffmpeg_types::{AudioFrame, Packet, Picture, Result, StreamInfo, VideoFrame};
use vidsync::collab::{AudioDecode, MediaSource, PictureConvert, VideoDecode};

pub struct FfmpegSource(pub Source);

impl MediaSource for FfmpegSource {
    fn streams(&self) -> &[StreamInfo] {
        self.0.streams()
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        self.0.next_packet()
    }
}

pub struct FfmpegAudio(pub AudioDecoder);

impl AudioDecode for FfmpegAudio {
    fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>> {
        self.0.decode(packet)
    }

    fn flush(&mut self) -> Result<Vec<AudioFrame>> {
        self.0.flush()
    }
}

pub struct FfmpegVideo(pub VideoDecoder);

impl VideoDecode for FfmpegVideo {
    fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
        self.0.decode(packet)
    }

    fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        self.0.flush()
    }
}

pub struct Yuv420Converter(pub VideoTransform);

impl PictureConvert for Yuv420Converter {
    fn convert(&mut self, frame: &VideoFrame) -> Result<Picture> {
        self.0.transform(frame)
    }
}

/**
    Open the audio decoder for the selected stream.
*/
pub fn open_audio(source: &Source, stream: &StreamInfo) -> Result<FfmpegAudio> {
    let config = codec_config(source, stream)?;
    AudioDecoder::new(config, stream.time_base).map(FfmpegAudio)
}

/**
    Open the video decoder for the selected stream.
*/
pub fn open_video(source: &Source, stream: &StreamInfo) -> Result<FfmpegVideo> {
    let config = codec_config(source, stream)?;
    VideoDecoder::new(config, stream.time_base).map(FfmpegVideo)
}

fn codec_config(source: &Source, stream: &StreamInfo) -> Result<ffmpeg_source::CodecConfig> {
    source.codec_config(stream.index).ok_or_else(|| {
        ffmpeg_types::Error::source_failure(format!("stream {} has no codec", stream.index))
    })
}
