use crate::input::InputEvent;
use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Call order: `on_init` once after the window and GPU exist, then
/// `on_input`/`on_frame` for every loop iteration, then `on_exit` once.
/// `on_exit` is skipped when `on_init` failed.
pub trait App {
    /// Loads GPU resources. An error stops the runtime before the first
    /// frame and is returned from `Runtime::run`.
    fn on_init(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()>;

    /// Called for each translated input event as it arrives.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        match event {
            InputEvent::QuitRequested => AppControl::Exit,
        }
    }

    /// Called once per loop iteration, after the quit check.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Releases resources while the GPU context is still alive.
    fn on_exit(&mut self) {}
}
