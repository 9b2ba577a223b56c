use winit::event::WindowEvent;

use crate::input::InputEvent;

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Only close/destroy map to `QuitRequested`; every other event is ignored.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested | WindowEvent::Destroyed => Some(InputEvent::QuitRequested),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_is_quit() {
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(InputEvent::QuitRequested)
        );
        assert_eq!(
            translate_window_event(&WindowEvent::Destroyed),
            Some(InputEvent::QuitRequested)
        );
    }

    #[test]
    fn other_events_are_ignored() {
        assert_eq!(translate_window_event(&WindowEvent::Focused(true)), None);
        assert_eq!(translate_window_event(&WindowEvent::RedrawRequested), None);
    }
}
