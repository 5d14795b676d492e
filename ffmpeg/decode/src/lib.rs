/*!
    Media decoding for the ffmpeg crate ecosystem.

    This crate transforms encoded packets into raw frames, in software.
    Decoders are opened from a stream's [`CodecConfig`] and closed when
    dropped.

    # Example

    ```ignore
    use ffmpeg_source::Source;
    use ffmpeg_decode::VideoDecoder;

    let mut source = Source::open("video.mp4")?;
    let stream = source.streams().iter().find(|s| s.video.is_some()).copied().unwrap();
    let codec_config = source.codec_config(stream.index).unwrap();
    let mut decoder = VideoDecoder::new(codec_config, stream.time_base)?;

    while let Some(packet) = source.next_packet()? {
        if packet.stream_index == stream.index {
            for frame in decoder.decode(&packet)? {
                // Process frame
            }
        }
    }

    // Drain frames still buffered inside the codec
    let remaining = decoder.flush()?;
    ```
*/

pub use ffmpeg_source::CodecConfig;
pub use ffmpeg_types::{AudioFrame, Error, Packet, Result, VideoFrame};

mod audio;
mod packet;
mod video;

pub use audio::AudioDecoder;
pub use video::VideoDecoder;
