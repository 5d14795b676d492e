mod clock;
mod engine;
mod slot;

pub use clock::VideoClock;
pub use engine::VideoEngine;
pub use slot::PictureSlot;
