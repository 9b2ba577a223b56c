//! Animated sprites.
//!
//! A sprite is a textured unit quad with authoritative transform state
//! (position, angle) and a model matrix derived from it every frame.

mod draw;
mod animated;

pub use draw::draw_sprites;
pub use animated::{Composition, Motion, Sprite};
