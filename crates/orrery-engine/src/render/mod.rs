//! GPU rendering subsystem.
//!
//! `GpuBackend` is the seam between shader programs / the sprite loop and
//! an actual GPU. `WgpuBackend` drives wgpu; `RecordingBackend` records
//! commands headlessly.
//!
//! Convention: sprite geometry lives in world units, the vertex shader
//! applies `projection * view * model`.

mod backend;
mod ctx;
pub mod quad;
mod recording;
pub mod texture;
mod wgpu_backend;

pub use backend::{GpuBackend, ProgramId, StageId, TextureId};
pub use ctx::{RenderCtx, RenderTarget};
pub use recording::{RecordedCommand, RecordedDraw, RecordingBackend};
pub use texture::{load_texture, TextureError};
pub use wgpu_backend::WgpuBackend;
