/*!
    Media frame transformation for the ffmpeg crate ecosystem.

    This crate converts decoded video frames into the planar YUV 4:2:0
    pictures the display path draws. Decoders output frames in whatever
    format the codec specifies; this crate converts them to that one format.

    # Video Transformation

    ```ignore
    use ffmpeg_transform::VideoTransform;

    let mut transform = VideoTransform::new();

    // Scaler lazily initialized on first non-YUV420P frame
    for frame in decoded_frames {
        let picture = transform.transform(&frame)?;
        // Hand picture to the renderer
    }
    ```

    # Lazy Initialization

    The scaling context and its scratch frames are created on first use and
    rebuilt only if the input format or size changes mid-stream. They belong
    to the transform value, so one decode session owns exactly one set.
    Frames already in YUV 4:2:0 pass through without touching swscale.
*/

pub use ffmpeg_types::{Error, Picture, PixelFormat, Result, VideoFrame};

mod video;

pub use video::VideoTransform;
