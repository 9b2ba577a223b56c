//! Color model shared by the clear pass and shader uniforms.

pub mod color;

pub use color::Color;
