use ffmpeg_types::Picture;
use parking_lot::{Condvar, Mutex};

use crate::collab::Render;
use crate::error::{Error, Result};

#[derive(Default)]
struct SlotState {
    picture: Option<Picture>,
    ready: bool,
    finished: bool,
    closed: bool,
}

/**
    Single-picture handoff between the video decode thread and the display
    thread.

    `ready` is true from the moment a picture is published until the display
    side has finished rendering it. The producer never writes while `ready`
    is set and the consumer never reads while it is clear, so every
    published picture is rendered exactly once before it can be replaced.
*/
pub struct PictureSlot {
    state: Mutex<SlotState>,
    changed: Condvar,
}

impl PictureSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            changed: Condvar::new(),
        }
    }

    /**
        Publish a picture, blocking until the previous one has been consumed.

        Fails with [`Error::Closed`] if the slot is closed while waiting.
    */
    pub fn publish(&self, picture: Picture) -> Result<()> {
        let mut state = self.state.lock();
        while state.ready && !state.closed {
            self.changed.wait(&mut state);
        }
        if state.closed {
            return Err(Error::Closed);
        }
        state.picture = Some(picture);
        state.ready = true;
        self.changed.notify_all();
        Ok(())
    }

    /**
        Mark that no more pictures will be published. A picture that is
        already ready is still handed out.
    */
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.finished = true;
        self.changed.notify_all();
    }

    /**
        Close the slot for good, discarding any pending picture and waking
        both sides.
    */
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.picture = None;
        state.ready = false;
        self.changed.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /**
        True once nothing more will ever be handed out.
    */
    pub fn is_finished(&self) -> bool {
        let state = self.state.lock();
        state.closed || (state.finished && !state.ready)
    }

    /**
        Wait for a ready picture and render it.

        The picture is taken out under the lock but drawn outside it, so the
        decode thread is never stalled on the lock by a slow renderer; it
        stays stalled on `ready` until the draw completes.

        Returns `Ok(false)` once the slot is finished and drained, or closed.
    */
    pub fn render_picture<R: Render + ?Sized>(&self, renderer: &mut R) -> Result<bool> {
        let picture = {
            let mut state = self.state.lock();
            loop {
                if state.closed {
                    return Ok(false);
                }
                if state.ready {
                    break state.picture.take();
                }
                if state.finished {
                    return Ok(false);
                }
                self.changed.wait(&mut state);
            }
        };

        let result = match &picture {
            Some(picture) => renderer.render(picture),
            None => Ok(()),
        };

        let mut state = self.state.lock();
        state.ready = false;
        self.changed.notify_all();
        drop(state);

        result?;
        Ok(true)
    }
}

impl Default for PictureSlot {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(PictureSlot: Send, Sync);
