/*!
    Headless renderer: counts pictures and optionally snapshots them.
*/

use std::path::PathBuf;

use ffmpeg_types::{Error, Picture, PixelFormat, Result};
use image::GrayImage;
use vidsync::collab::Render;

/**
    Renderer without an output surface.

    When a snapshot directory is set, the luma plane of every `every`-th
    picture is written there as `frame-NNNNNN.png`.
*/
#[derive(Debug)]
pub struct HeadlessRenderer {
    rendered: u64,
    snapshots: Option<Snapshots>,
}

#[derive(Debug)]
struct Snapshots {
    dir: PathBuf,
    every: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            rendered: 0,
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>, every: u64) -> Self {
        self.snapshots = Some(Snapshots {
            dir: dir.into(),
            every: every.max(1),
        });
        self
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    fn snapshot(&self, dir: &std::path::Path, picture: &Picture) -> Result<()> {
        let Some(luma) = luma_plane(picture) else {
            log::debug!("[render] no luma plane in {:?}, skipping snapshot", picture.format);
            return Ok(());
        };

        let image = GrayImage::from_raw(picture.width, picture.height, luma)
            .ok_or_else(|| Error::invalid_data("luma plane does not match picture size"))?;
        let path = dir.join(format!("frame-{:06}.png", self.rendered));
        image
            .save(&path)
            .map_err(|e| Error::Io(std::io::Error::other(format!("{}: {e}", path.display()))))?;

        log::debug!("[render] wrote {}", path.display());
        Ok(())
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for HeadlessRenderer {
    fn render(&mut self, picture: &Picture) -> Result<()> {
        if let Some(snapshots) = &self.snapshots {
            if self.rendered % snapshots.every == 0 {
                self.snapshot(&snapshots.dir, picture)?;
            }
        }
        self.rendered += 1;
        Ok(())
    }
}

/**
    Copy out the first plane of a YUV picture, dropping any pitch padding.
*/
fn luma_plane(picture: &Picture) -> Option<Vec<u8>> {
    match picture.format {
        PixelFormat::Yuv420p | PixelFormat::Yuv422p | PixelFormat::Yuv444p | PixelFormat::Nv12 => {}
        _ => return None,
    }

    let width = picture.width as usize;
    let height = picture.height as usize;
    if picture.pitch < width {
        return None;
    }

    let mut luma = Vec::with_capacity(width * height);
    for row in picture.data.chunks(picture.pitch).take(height) {
        luma.extend_from_slice(row.get(..width)?);
    }
    (luma.len() == width * height).then_some(luma)
}
