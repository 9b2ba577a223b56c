/// Platform-agnostic input event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputEvent {
    /// The user closed the window or the platform asked the app to stop.
    QuitRequested,
}
