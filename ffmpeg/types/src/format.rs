/*!
    Pixel and sample format types.
*/

/**
    Video pixel formats.

    This is the subset of formats the decoders hand out and the display path
    understands. Frames in any other format are rejected by the decoder.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format, and the display format)
    Yuv420p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed BGRA, 32bpp
    Bgra,
}

/**
    Size of one plane of a tightly packed picture.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Bytes per row, without padding.
    pub row_bytes: usize,
    /// Number of rows.
    pub rows: usize,
}

impl PlaneLayout {
    /// Total bytes of the plane.
    pub const fn len(self) -> usize {
        self.row_bytes * self.rows
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl PixelFormat {
    /**
        Returns the plane layout of a tightly packed picture of the given size.

        Chroma dimensions round up, matching how FFmpeg sizes odd-sized frames.
    */
    pub fn planes(self, width: u32, height: u32) -> Vec<PlaneLayout> {
        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);

        let plane = |row_bytes, rows| PlaneLayout { row_bytes, rows };
        match self {
            Self::Yuv420p => vec![plane(w, h), plane(half_w, half_h), plane(half_w, half_h)],
            Self::Nv12 => vec![plane(w, h), plane(half_w * 2, half_h)],
            Self::Yuv422p => vec![plane(w, h), plane(half_w, h), plane(half_w, h)],
            Self::Yuv444p => vec![plane(w, h), plane(w, h), plane(w, h)],
            Self::Rgb24 | Self::Bgr24 => vec![plane(w * 3, h)],
            Self::Rgba | Self::Bgra => vec![plane(w * 4, h)],
        }
    }

    /**
        Returns the total size in bytes of a tightly packed picture.
    */
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        self.planes(width, height).iter().map(|p| p.len()).sum()
    }
}

/**
    Audio sample formats.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 32-bit floating point, range [-1.0, 1.0]
    F32,
    /// 64-bit floating point
    F64,
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// Unsigned 8-bit integer
    U8,
}

impl SampleFormat {
    /**
        Returns the number of bytes per sample.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/**
    Audio channel layout.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Single channel
    Mono,
    /// Left and right channels
    Stereo,
    /// Any other channel count, in native interleaving order
    Discrete(u16),
}

impl ChannelLayout {
    /**
        Returns the layout for a channel count.
    */
    pub const fn from_count(count: u16) -> Self {
        match count {
            1 => Self::Mono,
            2 => Self::Stereo,
            n => Self::Discrete(n),
        }
    }

    /**
        Returns the number of channels.
    */
    pub const fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Discrete(n) => n,
        }
    }
}
