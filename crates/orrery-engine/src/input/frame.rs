use super::types::InputEvent;

/// Events collected between two frames.
///
/// The runtime pushes translated events as they arrive and inspects the
/// frame once per loop iteration, before the update step.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Events in arrival order.
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub fn quit_requested(&self) -> bool {
        self.events.contains(&InputEvent::QuitRequested)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_does_not_quit() {
        assert!(!InputFrame::default().quit_requested());
    }

    #[test]
    fn quit_survives_until_cleared() {
        let mut frame = InputFrame::default();
        frame.push_event(InputEvent::QuitRequested);
        assert!(frame.quit_requested());
        frame.clear();
        assert!(!frame.quit_requested());
    }
}
