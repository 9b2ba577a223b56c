//! Input subsystem.
//!
//! The demo reacts to exactly one semantic event, a quit request. Runtime
//! code translates platform events and drops everything else.

mod frame;
pub mod platform;
mod types;

pub use frame::InputFrame;
pub use types::InputEvent;
