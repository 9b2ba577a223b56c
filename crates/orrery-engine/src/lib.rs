//! Orrery engine crate.
//!
//! Owns the platform + GPU runtime pieces, the shader program abstraction
//! and the sprite transform pipeline used by the demo binary.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod sprite;
