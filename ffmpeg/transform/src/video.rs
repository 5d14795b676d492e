/*!
    Video pixel-format conversion.
*/

use ffmpeg_next::{
    format::Pixel,
    software::scaling::{Context as Scaler, Flags},
    util::frame::video::Video as VideoFrameFFmpeg,
};

use ffmpeg_types::{Error, Picture, PixelFormat, Result, VideoFrame};

/// Output format of every transformed picture
const TARGET: PixelFormat = PixelFormat::Yuv420p;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct InputShape {
    format: PixelFormat,
    width: u32,
    height: u32,
}

struct Conversion {
    shape: InputShape,
    scaler: Scaler,
    source: VideoFrameFFmpeg,
    target: VideoFrameFFmpeg,
}

/**
    Converts decoded frames to planar YUV 4:2:0 pictures at the source size.

    Owns its scaling context and scratch frames for the whole session.
*/
#[derive(Default)]
pub struct VideoTransform {
    conversion: Option<Conversion>,
}

impl VideoTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Convert one frame into a display-ready picture.
    */
    pub fn transform(&mut self, frame: &VideoFrame) -> Result<Picture> {
        let expected = frame.format.buffer_size(frame.width, frame.height);
        if frame.data.len() < expected {
            return Err(Error::invalid_data(format!(
                "frame holds {} bytes, {}x{} {:?} needs {expected}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format
            )));
        }

        if frame.format == TARGET {
            return Ok(Picture::packed(
                frame.data[..expected].to_vec(),
                frame.width,
                frame.height,
                TARGET,
            ));
        }

        let shape = InputShape {
            format: frame.format,
            width: frame.width,
            height: frame.height,
        };
        let conversion = self.conversion_for(shape)?;

        unpack_into(&frame.data, &mut conversion.source, shape);
        conversion
            .scaler
            .run(&conversion.source, &mut conversion.target)
            .map_err(|e| Error::codec(format!("scaling failed: {e}")))?;

        Ok(Picture::packed(
            pack_from(&conversion.target, TARGET, shape.width, shape.height),
            shape.width,
            shape.height,
            TARGET,
        ))
    }

    fn conversion_for(&mut self, shape: InputShape) -> Result<&mut Conversion> {
        let stale = self.conversion.as_ref().is_none_or(|c| c.shape != shape);
        if stale {
            let format = ffmpeg_pixel(shape.format);
            let scaler = Scaler::get(
                format,
                shape.width,
                shape.height,
                ffmpeg_pixel(TARGET),
                shape.width,
                shape.height,
                Flags::BILINEAR,
            )
            .map_err(|e| Error::codec(format!("failed to create scaler: {e}")))?;

            log::debug!(
                "[transform] scaling {:?} {}x{} to {TARGET:?}",
                shape.format,
                shape.width,
                shape.height
            );

            self.conversion = Some(Conversion {
                shape,
                scaler,
                source: VideoFrameFFmpeg::new(format, shape.width, shape.height),
                target: VideoFrameFFmpeg::new(ffmpeg_pixel(TARGET), shape.width, shape.height),
            });
        }

        self.conversion
            .as_mut()
            .ok_or_else(|| Error::codec("scaler unavailable"))
    }
}

// SAFETY: the scaling context and scratch frames are allocated by and owned
// exclusively through this value, and only the thread that owns it (the
// video decode thread) ever calls into them.
unsafe impl Send for VideoTransform {}

/**
    Copy tightly packed planes into an FFmpeg frame with padded strides.
*/
fn unpack_into(data: &[u8], frame: &mut VideoFrameFFmpeg, shape: InputShape) {
    let mut offset = 0;
    for (index, plane) in shape.format.planes(shape.width, shape.height).iter().enumerate() {
        let stride = frame.stride(index);
        let dst = frame.data_mut(index);
        for row in 0..plane.rows {
            let src = &data[offset..offset + plane.row_bytes];
            dst[row * stride..row * stride + plane.row_bytes].copy_from_slice(src);
            offset += plane.row_bytes;
        }
    }
}

/**
    Copy the planes of an FFmpeg frame into one tightly packed buffer.
*/
fn pack_from(frame: &VideoFrameFFmpeg, format: PixelFormat, width: u32, height: u32) -> Vec<u8> {
    let mut output = Vec::with_capacity(format.buffer_size(width, height));
    for (index, plane) in format.planes(width, height).iter().enumerate() {
        let stride = frame.stride(index);
        let src = frame.data(index);
        for row in 0..plane.rows {
            output.extend_from_slice(&src[row * stride..row * stride + plane.row_bytes]);
        }
    }
    output
}

fn ffmpeg_pixel(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::Rational;

    fn frame(format: PixelFormat, width: u32, height: u32, data: Vec<u8>) -> VideoFrame {
        VideoFrame::new(data, width, height, format, None, Rational::new(1, 25))
    }

    #[test]
    fn yuv420p_passes_through() {
        let data: Vec<u8> = (0..24).collect();
        let picture = VideoTransform::new()
            .transform(&frame(PixelFormat::Yuv420p, 4, 4, data.clone()))
            .unwrap();

        assert_eq!(picture.data, data);
        assert_eq!(picture.pitch, 4);
        assert_eq!(picture.format, PixelFormat::Yuv420p);
    }

    #[test]
    fn short_frames_are_rejected() {
        let result = VideoTransform::new().transform(&frame(PixelFormat::Rgba, 4, 4, vec![0; 10]));
        assert!(matches!(result, Err(Error::InvalidData { .. })));
    }

    #[test]
    fn pixel_formats_map_one_to_one() {
        assert_eq!(ffmpeg_pixel(PixelFormat::Yuv420p), Pixel::YUV420P);
        assert_eq!(ffmpeg_pixel(PixelFormat::Bgra), Pixel::BGRA);
        assert_eq!(ffmpeg_pixel(PixelFormat::Nv12), Pixel::NV12);
    }
}
