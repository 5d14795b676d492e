/*!
    Windowed output: pictures from the session are shown in a gpui window.

    The session's display thread renders into a [`WindowRenderer`], which
    converts each picture to a [`RenderImage`] and parks it in a shared
    [`FrameShelf`]. The window's [`PlayerView`] runs on the main thread,
    repaints on a short timer and always shows the newest image.
*/

use std::sync::Arc;
use std::time::Duration;

use gpui::{
    App, Application, Bounds, Context, IntoElement, Render as GpuiRender, RenderImage,
    TitlebarOptions, Window, WindowBounds, WindowOptions, div, img, prelude::*, px, rgb, size,
};
use image::{Frame, RgbaImage};
use parking_lot::Mutex;

use ffmpeg_types::{Error, Picture, PixelFormat, Result};
use vidsync::QuitHandle;
use vidsync::collab::Render;

/// How often the window checks for a new picture
const REPAINT_INTERVAL: Duration = Duration::from_millis(8);

/// Largest initial window edge, in logical pixels
const MAX_INITIAL_EDGE: f32 = 1280.0;

#[derive(Default)]
struct ShelfState {
    current: Option<Arc<RenderImage>>,
    retired: Vec<Arc<RenderImage>>,
    finished: bool,
}

/**
    Hand-off point between the display thread and the window.

    Replaced images are kept until the window has released their GPU
    textures.
*/
#[derive(Default)]
pub struct FrameShelf {
    state: Mutex<ShelfState>,
}

impl FrameShelf {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn put(&self, image: RenderImage) {
        let mut state = self.state.lock();
        if let Some(old) = state.current.replace(Arc::new(image)) {
            state.retired.push(old);
        }
    }

    /**
        The image to paint now, plus every image it replaced since the last call.
    */
    fn take_for_paint(&self) -> (Option<Arc<RenderImage>>, Vec<Arc<RenderImage>>) {
        let mut state = self.state.lock();
        let retired = std::mem::take(&mut state.retired);
        (state.current.clone(), retired)
    }

    /**
        Mark playback as over; the window closes on its next repaint tick.
    */
    pub fn finish(&self) {
        self.state.lock().finished = true;
    }

    fn is_finished(&self) -> bool {
        self.state.lock().finished
    }
}

static_assertions::assert_impl_all!(FrameShelf: Send, Sync);

/**
    Renderer publishing pictures to a window.
*/
pub struct WindowRenderer {
    shelf: Arc<FrameShelf>,
    rendered: u64,
}

impl WindowRenderer {
    pub fn new(shelf: Arc<FrameShelf>) -> Self {
        Self { shelf, rendered: 0 }
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }
}

impl Render for WindowRenderer {
    fn render(&mut self, picture: &Picture) -> Result<()> {
        let bgra = yuv420p_to_bgra(picture)?;
        // gpui expects BGRA bytes even though the buffer type says RGBA
        let image = RgbaImage::from_raw(picture.width, picture.height, bgra)
            .ok_or_else(|| Error::invalid_data("converted picture does not match its size"))?;
        self.shelf.put(RenderImage::new(vec![Frame::new(image)]));
        self.rendered += 1;
        Ok(())
    }
}

/**
    Convert a planar 4:2:0 picture to packed BGRA using BT.601 limited range.

    Chroma rows use half the luma pitch, rounded up, matching how the
    converter packs its planes.
*/
fn yuv420p_to_bgra(picture: &Picture) -> Result<Vec<u8>> {
    if picture.format != PixelFormat::Yuv420p {
        return Err(Error::unsupported_format(format!(
            "window output needs Yuv420p, got {:?}",
            picture.format
        )));
    }

    let width = picture.width as usize;
    let height = picture.height as usize;
    let luma_pitch = picture.pitch;
    let chroma_pitch = luma_pitch.div_ceil(2);
    let chroma_rows = height.div_ceil(2);

    let u_start = luma_pitch * height;
    let v_start = u_start + chroma_pitch * chroma_rows;
    if luma_pitch < width || picture.data.len() < v_start + chroma_pitch * chroma_rows {
        return Err(Error::invalid_data(format!(
            "{}x{} picture with pitch {} has only {} bytes",
            width,
            height,
            luma_pitch,
            picture.data.len()
        )));
    }

    let data = &picture.data;
    let mut out = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        let luma = &data[row * luma_pitch..][..width];
        let u = &data[u_start + (row / 2) * chroma_pitch..];
        let v = &data[v_start + (row / 2) * chroma_pitch..];
        for (col, &y) in luma.iter().enumerate() {
            let [b, g, r] = bt601(y, u[col / 2], v[col / 2]);
            out.extend_from_slice(&[b, g, r, 0xff]);
        }
    }
    Ok(out)
}

fn bt601(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = 298 * (y as i32 - 16);
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(c + 516 * d),
        clamp(c - 100 * d - 208 * e),
        clamp(c + 409 * e),
    ]
}

/**
    Root view of the player window.
*/
struct PlayerView {
    shelf: Arc<FrameShelf>,
}

impl PlayerView {
    fn new(shelf: Arc<FrameShelf>, cx: &mut Context<Self>) -> Self {
        let ticker = Arc::clone(&shelf);
        cx.spawn(async move |this, cx| {
            loop {
                cx.background_executor().timer(REPAINT_INTERVAL).await;
                if ticker.is_finished() {
                    let _ = cx.update(|cx| cx.quit());
                    break;
                }
                if this.update(cx, |_, cx| cx.notify()).is_err() {
                    break;
                }
            }
        })
        .detach();

        Self { shelf }
    }
}

impl GpuiRender for PlayerView {
    fn render(&mut self, window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        let (current, retired) = self.shelf.take_for_paint();
        for old in retired {
            if let Err(e) = window.drop_image(old) {
                log::debug!("[window] failed to release picture texture: {e}");
            }
        }

        div()
            .id("player")
            .size_full()
            .bg(rgb(0x000000))
            .children(current.map(|image| img(image).size_full()))
    }
}

/**
    Initial window size: the video's size, scaled down to fit on screen.
*/
fn initial_size(width: u32, height: u32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (MAX_INITIAL_EDGE, MAX_INITIAL_EDGE * 9.0 / 16.0);
    }
    let (w, h) = (width as f32, height as f32);
    let scale = (MAX_INITIAL_EDGE / w.max(h)).min(1.0);
    (w * scale, h * scale)
}

/**
    Open the player window and run the UI loop on the calling thread.

    Returns once the shelf is finished or the window is closed. Closing the
    window asks the session to quit.
*/
pub fn run_window(title: String, video_size: (u32, u32), shelf: Arc<FrameShelf>, quit: QuitHandle) {
    Application::new().run(move |cx: &mut App| {
        let (width, height) = initial_size(video_size.0, video_size.1);
        let bounds = Bounds::centered(None, size(px(width), px(height)), cx);
        let options = WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(bounds)),
            titlebar: Some(TitlebarOptions {
                title: Some(title.into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let on_close = quit.clone();
        cx.on_window_closed(move |cx| {
            log::info!("[window] closed, stopping playback");
            on_close.quit();
            cx.quit();
        })
        .detach();

        if let Err(e) = cx.open_window(options, |_, cx| cx.new(|cx| PlayerView::new(shelf, cx))) {
            log::error!("[window] failed to open: {e:#}");
            quit.quit();
            cx.quit();
            return;
        }
        cx.activate(true);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, y: u8, u: u8, v: u8) -> Picture {
        let planes = PixelFormat::Yuv420p.planes(width, height);
        let mut data = vec![y; planes[0].len()];
        data.extend(std::iter::repeat_n(u, planes[1].len()));
        data.extend(std::iter::repeat_n(v, planes[2].len()));
        Picture::packed(data, width, height, PixelFormat::Yuv420p)
    }

    #[test]
    fn black_and_white_map_to_full_range() {
        let black = yuv420p_to_bgra(&solid(2, 2, 16, 128, 128)).unwrap();
        assert_eq!(black, [0u8, 0, 0, 255].repeat(4));

        let white = yuv420p_to_bgra(&solid(2, 2, 235, 128, 128)).unwrap();
        assert_eq!(white, [255u8, 255, 255, 255].repeat(4));
    }

    #[test]
    fn red_lands_in_the_third_byte() {
        // BT.601 red: Y=81, U=90, V=240
        let red = yuv420p_to_bgra(&solid(2, 2, 81, 90, 240)).unwrap();
        let [b, g, r, a] = [red[0], red[1], red[2], red[3]];
        assert!(r > 250, "r = {r}");
        assert!(g < 5 && b < 5, "g = {g}, b = {b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn odd_sizes_and_padded_rows_convert() {
        // 3x3 with luma pitch 4: chroma is 2x2 with pitch 2
        let mut data = vec![16u8; 4 * 3];
        data.extend([128u8; 2 * 2]);
        data.extend([128u8; 2 * 2]);
        // Padding bytes must not leak into the output
        for row in 0..3 {
            data[row * 4 + 3] = 235;
        }
        let picture = Picture {
            data,
            width: 3,
            height: 3,
            pitch: 4,
            format: PixelFormat::Yuv420p,
        };
        let bgra = yuv420p_to_bgra(&picture).unwrap();
        assert_eq!(bgra, [0u8, 0, 0, 255].repeat(9));
    }

    #[test]
    fn short_or_foreign_pictures_are_rejected() {
        let mut short = solid(4, 4, 16, 128, 128);
        short.data.truncate(10);
        assert!(matches!(yuv420p_to_bgra(&short), Err(Error::InvalidData { .. })));

        let rgba = Picture::packed(vec![0; 16], 2, 2, PixelFormat::Rgba);
        assert!(matches!(
            yuv420p_to_bgra(&rgba),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn renderer_keeps_newest_and_retires_the_rest() {
        let shelf = FrameShelf::new();
        let mut renderer = WindowRenderer::new(Arc::clone(&shelf));
        for _ in 0..3 {
            renderer.render(&solid(2, 2, 16, 128, 128)).unwrap();
        }
        assert_eq!(renderer.rendered(), 3);

        let (current, retired) = shelf.take_for_paint();
        assert!(current.is_some());
        assert_eq!(retired.len(), 2);

        let (again, retired) = shelf.take_for_paint();
        assert!(Arc::ptr_eq(&current.unwrap(), &again.unwrap()));
        assert!(retired.is_empty());
    }

    #[test]
    fn failed_render_leaves_shelf_untouched() {
        let shelf = FrameShelf::new();
        let mut renderer = WindowRenderer::new(Arc::clone(&shelf));
        let rgba = Picture::packed(vec![0; 16], 2, 2, PixelFormat::Rgba);
        assert!(renderer.render(&rgba).is_err());
        assert_eq!(renderer.rendered(), 0);
        assert!(shelf.take_for_paint().0.is_none());
    }

    #[test]
    fn finish_is_visible_to_the_window() {
        let shelf = FrameShelf::new();
        assert!(!shelf.is_finished());
        shelf.finish();
        assert!(shelf.is_finished());
    }

    #[test]
    fn large_videos_open_scaled_down() {
        assert_eq!(initial_size(640, 360), (640.0, 360.0));
        assert_eq!(initial_size(3840, 2160), (1280.0, 720.0));
        assert_eq!(initial_size(0, 0), (1280.0, 720.0));
    }
}
