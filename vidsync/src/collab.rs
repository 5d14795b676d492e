/*!
    Interfaces to the collaborators the playback core delegates to.

    Demultiplexing, decoding, pixel conversion and drawing are plain data
    transforms; the core only schedules them. Dropping a decoder closes it.
*/

use ffmpeg_types::{AudioFrame, Packet, Picture, Result, StreamInfo, VideoFrame};

/**
    A demultiplexed media source.
*/
pub trait MediaSource: Send {
    /// All streams of the container, in index order.
    fn streams(&self) -> &[StreamInfo];

    /// Read the next packet in container order. `None` means end of stream.
    fn next_packet(&mut self) -> Result<Option<Packet>>;
}

/**
    An opened audio decoder.
*/
pub trait AudioDecode: Send {
    /// Decode one packet. An empty result means more input is needed.
    fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>>;

    /// Drain frames still buffered inside the decoder at end of stream.
    fn flush(&mut self) -> Result<Vec<AudioFrame>> {
        Ok(Vec::new())
    }
}

/**
    An opened video decoder.
*/
pub trait VideoDecode: Send {
    /// Decode one packet. An empty result means more input is needed.
    fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>>;

    /// Drain frames still buffered inside the decoder at end of stream.
    fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        Ok(Vec::new())
    }
}

/**
    Converts decoded frames into the layout the renderer expects.

    Implementations own their scratch state (scaler contexts, pixel buffers);
    the value lives on the video decode thread for the whole session.
*/
pub trait PictureConvert: Send {
    fn convert(&mut self, frame: &VideoFrame) -> Result<Picture>;
}

/**
    Draws a picture to the output surface. Has no notion of timing.
*/
pub trait Render {
    fn render(&mut self, picture: &Picture) -> Result<()>;
}

impl<T: Render + ?Sized> Render for &mut T {
    fn render(&mut self, picture: &Picture) -> Result<()> {
        (**self).render(picture)
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&mut self, picture: &Picture) -> Result<()> {
        (**self).render(picture)
    }
}
