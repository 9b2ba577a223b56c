//! Time subsystem.
//!
//! Variable-timestep frame timing. One `FrameClock` per render loop; call
//! `tick()` once per presented frame to obtain a `FrameTime`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
