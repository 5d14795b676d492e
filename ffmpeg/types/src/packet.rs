/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    An encoded media packet: one access unit of a single elementary stream.

    Packets are the unit of data between demuxer and decoder. They are not
    modified after the demuxer produces them; ownership moves from the
    demuxer, through a packet queue, to the engine that decodes them.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    /// Index of the container stream this packet belongs to.
    pub stream_index: usize,
    /// Compressed data.
    pub data: Vec<u8>,
    /// Presentation timestamp (when to display/play).
    pub pts: Option<Pts>,
    /// Decode timestamp (when to decode; may differ from PTS for B-frames).
    pub dts: Option<Pts>,
    /// Duration of this packet's content.
    pub duration: MediaDuration,
    /// Time base for interpreting timestamps.
    pub time_base: Rational,
    /// Whether this is a keyframe (can be decoded independently).
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a new packet for the given stream with no timing information.
    */
    pub fn new(stream_index: usize, data: Vec<u8>, time_base: Rational) -> Self {
        Self {
            stream_index,
            data,
            pts: None,
            dts: None,
            duration: MediaDuration(0),
            time_base,
            is_keyframe: false,
        }
    }

    /**
        Set presentation and decode timestamps.
    */
    pub fn with_timestamps(mut self, pts: Option<Pts>, dts: Option<Pts>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /**
        Set the packet duration.
    */
    pub fn with_duration(mut self, duration: MediaDuration) -> Self {
        self.duration = duration;
        self
    }

    /**
        Mark the packet as a keyframe.
    */
    pub fn with_keyframe(mut self, is_keyframe: bool) -> Self {
        self.is_keyframe = is_keyframe;
        self
    }

    /**
        Returns the presentation time in seconds, if PTS is set.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts.map(|pts| pts.to_seconds(self.time_base))
    }

    /**
        Returns the decode time in seconds, if DTS is set.
    */
    pub fn decode_seconds(&self) -> Option<f64> {
        self.dts.map(|dts| dts.to_seconds(self.time_base))
    }

    /**
        Returns the payload size in bytes.
    */
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

// Packets move between the demux thread and the decode threads
static_assertions::assert_impl_all!(Packet: Send, Sync);
