/*!
    Media sources and demuxing for the ffmpeg crate ecosystem.

    This crate opens a container, describes its streams, and reads encoded
    packets in container order. Decoding happens elsewhere: each stream's
    [`CodecConfig`] is handed to a decoder from `ffmpeg-decode`.

    # Example

    ```ignore
    use ffmpeg_source::Source;

    let mut source = Source::open("video.mp4")?;
    for stream in source.streams() {
        println!("{stream:?}");
    }

    while let Some(packet) = source.next_packet()? {
        // Route packet by packet.stream_index
    }
    ```
*/

pub use ffmpeg_types::{Error, MediaType, Packet, Result, StreamInfo};

mod codec;
mod init;
mod source;

pub use codec::CodecConfig;
pub use init::init;
pub use source::Source;
