/*!
    Conversions shared by the decoders.
*/

use ffmpeg_next::{ffi, packet::Mut as PacketMut};

use ffmpeg_types::{Error, Packet};

/**
    Copy one of our packets into an FFmpeg packet, timing included.
*/
pub(crate) fn to_ffmpeg(packet: &Packet) -> ffmpeg_next::Packet {
    let mut ffmpeg_pkt = if packet.data.is_empty() {
        ffmpeg_next::Packet::empty()
    } else {
        ffmpeg_next::Packet::copy(&packet.data)
    };

    // SAFETY: the packet was just allocated and is exclusively ours
    unsafe {
        let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
        (*pkt_ptr).pts = packet.pts.map_or(ffi::AV_NOPTS_VALUE, |pts| pts.0);
        (*pkt_ptr).dts = packet.dts.map_or(ffi::AV_NOPTS_VALUE, |dts| dts.0);
        (*pkt_ptr).duration = packet.duration.0;
    }

    ffmpeg_pkt
}

/**
    Outcome of asking a codec for one more frame.
*/
pub(crate) enum Receive {
    Frame,
    /// The codec needs more input (or has been fully drained).
    Done,
}

/**
    Map a `receive_frame` result, treating EAGAIN and EOF as "no more frames".
*/
pub(crate) fn receive(result: Result<(), ffmpeg_next::Error>) -> ffmpeg_types::Result<Receive> {
    match result {
        Ok(()) => Ok(Receive::Frame),
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
            Ok(Receive::Done)
        }
        Err(ffmpeg_next::Error::Eof) => Ok(Receive::Done),
        Err(e) => Err(Error::codec(e.to_string())),
    }
}

/**
    Map a `send_packet`/`send_eof` error.
*/
pub(crate) fn codec_error(e: ffmpeg_next::Error) -> Error {
    Error::codec(e.to_string())
}
