/*!
    Audio decoder implementation.
*/

use ffmpeg_next::{
    codec::{self, decoder::Audio as AudioDecoderFFmpeg},
    util::frame::audio::Audio as AudioFrameFFmpeg,
};

use ffmpeg_source::CodecConfig;
use ffmpeg_types::{AudioFrame, ChannelLayout, Error, Packet, Pts, Rational, Result, SampleFormat};

use crate::packet::{Receive, codec_error, receive, to_ffmpeg};

/**
    Audio decoder.

    Decodes audio packets into interleaved frames in the codec's native
    sample format.
*/
pub struct AudioDecoder {
    decoder: AudioDecoderFFmpeg,
    time_base: Rational,
}

impl AudioDecoder {
    /**
        Open an audio decoder.

        # Arguments

        * `codec_config` - Codec configuration from the source
        * `time_base` - Time base for the audio stream
    */
    pub fn new(codec_config: CodecConfig, time_base: Rational) -> Result<Self> {
        ffmpeg_source::init()?;

        let parameters = codec_config.into_parameters();

        let decoder_ctx =
            codec::context::Context::from_parameters(parameters).map_err(codec_error)?;

        let decoder = decoder_ctx.decoder().audio().map_err(codec_error)?;

        log::debug!(
            "[audio_decode] opened {:?}: {} Hz, {} channels",
            decoder.id(),
            decoder.rate(),
            decoder.channels()
        );

        Ok(Self { decoder, time_base })
    }

    /**
        Get the time base for this decoder.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
        Get the sample rate of the decoded audio.
    */
    pub fn sample_rate(&self) -> u32 {
        self.decoder.rate()
    }

    /**
        Get the number of channels.
    */
    pub fn channels(&self) -> u16 {
        self.decoder.channels() as u16
    }

    /**
        Decode a packet, returning decoded frames.

        May return zero, one, or multiple frames depending on codec.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>> {
        self.decoder
            .send_packet(&to_ffmpeg(packet))
            .map_err(codec_error)?;

        self.receive_frames()
    }

    /**
        Flush the decoder to get any remaining buffered frames.

        Call this once at end of stream.
    */
    pub fn flush(&mut self) -> Result<Vec<AudioFrame>> {
        self.decoder.send_eof().map_err(codec_error)?;

        self.receive_frames()
    }

    /**
        Receive all available frames from the decoder.
    */
    fn receive_frames(&mut self) -> Result<Vec<AudioFrame>> {
        let mut frames = Vec::new();
        let mut decoded_frame = AudioFrameFFmpeg::empty();

        while let Receive::Frame = receive(self.decoder.receive_frame(&mut decoded_frame))? {
            match self.convert_frame(&decoded_frame) {
                Ok(frame) => frames.push(frame),
                Err(e) => log::warn!("[audio_decode] frame conversion error: {e}"),
            }
        }

        Ok(frames)
    }

    /**
        Convert an FFmpeg audio frame to our AudioFrame type.
    */
    fn convert_frame(&self, frame: &AudioFrameFFmpeg) -> Result<AudioFrame> {
        let samples = frame.samples();
        let sample_rate = frame.rate();
        let channel_count = frame.channels() as u16;

        if samples == 0 {
            return Err(Error::invalid_data("audio frame has zero samples"));
        }
        if channel_count == 0 {
            return Err(Error::invalid_data("audio frame has no channels"));
        }

        let ffmpeg_format = frame.format();
        let format = sample_format_from_ffmpeg(ffmpeg_format).ok_or_else(|| {
            Error::unsupported_format(format!("unsupported sample format: {ffmpeg_format:?}"))
        })?;

        let data = copy_audio_data(frame, format, samples, channel_count)?;

        Ok(AudioFrame::new(
            data,
            samples,
            sample_rate,
            ChannelLayout::from_count(channel_count),
            format,
            frame.pts().map(Pts),
            self.time_base,
        ))
    }
}

// SAFETY: the codec context was opened from a private copy of the stream
// parameters and is owned exclusively by this decoder; it is only used by
// the thread that currently owns the decoder (the audio callback).
unsafe impl Send for AudioDecoder {}

/**
    Copy audio data from an FFmpeg frame, interleaving planar layouts.
*/
fn copy_audio_data(
    frame: &AudioFrameFFmpeg,
    format: SampleFormat,
    samples: usize,
    channels: u16,
) -> Result<Vec<u8>> {
    let bytes_per_sample = format.bytes_per_sample();
    let channels = channels as usize;
    let total_bytes = samples * channels * bytes_per_sample;

    if frame.is_planar() {
        let mut output = vec![0u8; total_bytes];
        let plane_bytes = samples * bytes_per_sample;

        for ch in 0..channels {
            let plane_data = frame.data(ch);
            if plane_data.len() < plane_bytes {
                return Err(Error::invalid_data("audio plane shorter than its samples"));
            }
            for s in 0..samples {
                let src_offset = s * bytes_per_sample;
                let dst_offset = (s * channels + ch) * bytes_per_sample;
                output[dst_offset..dst_offset + bytes_per_sample]
                    .copy_from_slice(&plane_data[src_offset..src_offset + bytes_per_sample]);
            }
        }

        Ok(output)
    } else {
        let plane_data = frame.data(0);
        if plane_data.len() < total_bytes {
            return Err(Error::invalid_data("audio buffer shorter than its samples"));
        }
        Ok(plane_data[..total_bytes].to_vec())
    }
}

/**
    Convert FFmpeg sample format to our SampleFormat.
*/
fn sample_format_from_ffmpeg(format: ffmpeg_next::format::Sample) -> Option<SampleFormat> {
    use ffmpeg_next::format::Sample;

    match format {
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::U8(_) => Some(SampleFormat::U8),
        _ => None,
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("time_base", &self.time_base)
            .field("sample_rate", &self.decoder.rate())
            .field("channels", &self.decoder.channels())
            .finish_non_exhaustive()
    }
}
