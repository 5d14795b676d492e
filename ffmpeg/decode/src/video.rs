/*!
    Video decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Video as VideoDecoderFFmpeg},
    ffi,
    format::Pixel,
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_source::CodecConfig;
use ffmpeg_types::{Error, Packet, PixelFormat, Pts, Rational, Result, VideoFrame};

use crate::packet::{Receive, codec_error, receive, to_ffmpeg};

/**
    Video decoder.

    Decodes video packets into tightly packed frames, keeping the decode
    timestamp and repeated-field count the presentation clock needs.
*/
pub struct VideoDecoder {
    decoder: VideoDecoderFFmpeg,
    time_base: Rational,
}

impl VideoDecoder {
    /**
        Open a video decoder.

        # Arguments

        * `codec_config` - Codec configuration from the source
        * `time_base` - Time base for the video stream
    */
    pub fn new(codec_config: CodecConfig, time_base: Rational) -> Result<Self> {
        ffmpeg_source::init()?;

        let parameters = codec_config.into_parameters();

        let decoder_ctx =
            codec::context::Context::from_parameters(parameters).map_err(codec_error)?;

        let decoder = decoder_ctx.decoder().video().map_err(codec_error)?;

        log::debug!(
            "[video_decode] opened {:?}: {}x{} {:?}",
            decoder.id(),
            decoder.width(),
            decoder.height(),
            decoder.format()
        );

        Ok(Self { decoder, time_base })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /**
        Decode a packet, returning decoded frames.

        An empty result means the codec needs more input.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
        self.decoder
            .send_packet(&to_ffmpeg(packet))
            .map_err(codec_error)?;

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this once at end of stream.
    */
    pub fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        self.decoder.send_eof().map_err(codec_error)?;

        self.receive_frames()
    }

    fn receive_frames(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = VideoFrameFFmpeg::empty();

        while let Receive::Frame = receive(self.decoder.receive_frame(&mut decoded_frame))? {
            match self.convert_frame(&decoded_frame) {
                Ok(frame) => frames.push(frame),
                Err(e) => log::warn!("[video_decode] frame conversion error: {e}"),
            }
        }

        Ok(frames)
    }

    /**
        Convert an FFmpeg video frame to our VideoFrame type.
    */
    fn convert_frame(&self, frame: &VideoFrameFFmpeg) -> Result<VideoFrame> {
        let ffmpeg_format = frame.format();
        let format = pixel_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported_format(format!("unsupported pixel format: {ffmpeg_format:?}"))
        })?;

        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Err(Error::invalid_data("video frame has no pixels"));
        }

        // SAFETY: the frame was just filled by the decoder and is not shared
        let (pkt_dts, repeat_pict) = unsafe {
            let ptr = frame.as_ptr();
            ((*ptr).pkt_dts, (*ptr).repeat_pict)
        };
        let dts = (pkt_dts != ffi::AV_NOPTS_VALUE).then_some(Pts(pkt_dts));

        let data = copy_planes(frame, format, width, height)?;

        Ok(
            VideoFrame::new(data, width, height, format, frame.pts().map(Pts), self.time_base)
                .with_dts(dts)
                .with_repeat_fields(repeat_pict.max(0) as u32),
        )
    }
}

// SAFETY: the codec context was opened from a private copy of the stream
// parameters and is owned exclusively by this decoder; it is only used by
// the thread that currently owns the decoder (the video decode thread).
unsafe impl Send for VideoDecoder {}

/**
    Copy each plane row by row, dropping the codec's line padding.
*/
fn copy_planes(
    frame: &VideoFrameFFmpeg,
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let planes = format.planes(width, height);
    let mut output = Vec::with_capacity(format.buffer_size(width, height));

    for (index, plane) in planes.iter().enumerate() {
        let stride = frame.stride(index);
        let data = frame.data(index);
        for row in 0..plane.rows {
            let start = row * stride;
            let end = start + plane.row_bytes;
            let line = data
                .get(start..end)
                .ok_or_else(|| Error::invalid_data("video plane shorter than its rows"))?;
            output.extend_from_slice(line);
        }
    }

    Ok(output)
}

/**
    Convert FFmpeg pixel format to our PixelFormat.

    Full-range JPEG variants share the layout of their video-range
    counterparts.
*/
fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P | Pixel::YUVJ420P => Some(PixelFormat::Yuv420p),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::YUV422P | Pixel::YUVJ422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P | Pixel::YUVJ444P => Some(PixelFormat::Yuv444p),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        _ => None,
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .field("width", &self.decoder.width())
            .field("height", &self.decoder.height())
            .finish_non_exhaustive()
    }
}
