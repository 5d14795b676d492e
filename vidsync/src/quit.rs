use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/**
    Shared quit flag for every thread of a session.

    Threads check it at the top of their loops. Setting it does not wake
    anything by itself; the session pairs it with aborting the packet queues
    and closing the picture slot so that blocked threads return promptly.
*/
#[derive(Clone, Debug, Default)]
pub struct QuitSignal {
    flag: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quit(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_quit(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
