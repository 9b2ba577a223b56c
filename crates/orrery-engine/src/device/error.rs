/// What the frame loop does after `get_current_texture` fails.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated surface was reconfigured; the next frame can render.
    Reconfigured,
    /// Timeout or transient failure; this frame is dropped.
    SkipFrame,
    /// Out of memory. The runtime exits.
    Fatal,
}
