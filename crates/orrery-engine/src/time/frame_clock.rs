use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick (since clock start for the first tick).
    pub dt: f32,

    /// Seconds since the clock was created.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// `dt` is the difference between the current elapsed wall time and the
/// elapsed time recorded at the previous tick. It is deliberately not
/// clamped: a stall produces one large step, and the first tick reports the
/// whole time since the clock started.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last_elapsed: f32,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a clock whose baseline is "now".
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_elapsed: 0.0,
            frame_index: 0,
        }
    }

    /// Advances the clock to the current wall time.
    pub fn tick(&mut self) -> FrameTime {
        let elapsed = self.start.elapsed().as_secs_f32();
        self.advance_to(elapsed)
    }

    /// Advances the clock to an explicit elapsed time (seconds since start).
    ///
    /// A value earlier than the previous tick yields `dt = 0` rather than a
    /// negative step.
    pub fn advance_to(&mut self, elapsed: f32) -> FrameTime {
        let dt = (elapsed - self.last_elapsed).max(0.0);
        self.last_elapsed = self.last_elapsed.max(elapsed);

        let ft = FrameTime {
            dt,
            elapsed: self.last_elapsed,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_reports_time_since_start() {
        let mut clock = FrameClock::new();
        let ft = clock.advance_to(1.5);
        assert_eq!(ft.dt, 1.5);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn dt_is_difference_between_ticks() {
        let mut clock = FrameClock::new();
        clock.advance_to(1.0);
        let ft = clock.advance_to(1.25);
        assert_eq!(ft.dt, 0.25);
        assert_eq!(ft.elapsed, 1.25);
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn large_gap_is_not_clamped() {
        let mut clock = FrameClock::new();
        clock.advance_to(0.5);
        let ft = clock.advance_to(10.5);
        assert_eq!(ft.dt, 10.0);
    }

    #[test]
    fn time_going_backwards_yields_zero_dt() {
        let mut clock = FrameClock::new();
        clock.advance_to(2.0);
        let ft = clock.advance_to(1.0);
        assert_eq!(ft.dt, 0.0);
        assert_eq!(ft.elapsed, 2.0);
    }

    #[test]
    fn wall_clock_tick_is_non_negative() {
        let mut clock = FrameClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(a.dt >= 0.0);
        assert!(b.dt >= 0.0);
        assert!(b.elapsed >= a.elapsed);
    }
}
