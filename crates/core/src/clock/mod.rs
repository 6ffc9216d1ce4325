#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    Running,
    Paused,
}

/// Elapsed effect time. Only frames spent running move it forward.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    time_seconds: f32,
    state: ClockState,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the `animate` flag for this frame, then advances by `delta` if
    /// running. Returns the time to render with.
    pub fn tick(&mut self, animate: bool, delta: f32) -> f32 {
        let next = if animate {
            ClockState::Running
        } else {
            ClockState::Paused
        };
        if next != self.state {
            tracing::debug!(?next, time = self.time_seconds, "frame clock state changed");
            self.state = next;
        }

        if self.state == ClockState::Running && delta.is_finite() {
            self.time_seconds += delta.max(0.0);
        }
        self.time_seconds
    }

    pub fn time_seconds(&self) -> f32 {
        self.time_seconds
    }

    pub fn state(&self) -> ClockState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_while_running() {
        let mut clock = FrameClock::new();
        clock.tick(true, 0.5);
        assert_eq!(clock.tick(true, 0.25), 0.75);
        assert_eq!(clock.state(), ClockState::Running);
    }

    #[test]
    fn pause_freezes_and_resume_continues_from_frozen_value() {
        let mut clock = FrameClock::new();
        clock.tick(true, 1.0);

        for _ in 0..10 {
            assert_eq!(clock.tick(false, 0.016), 1.0);
        }
        assert_eq!(clock.state(), ClockState::Paused);

        let resumed = clock.tick(true, 0.5);
        assert_eq!(resumed, 1.5);
        assert!(clock.tick(true, 0.1) > resumed);
    }

    #[test]
    fn negative_and_nan_deltas_never_rewind() {
        let mut clock = FrameClock::new();
        clock.tick(true, 1.0);
        assert_eq!(clock.tick(true, -3.0), 1.0);
        assert_eq!(clock.tick(true, f32::NAN), 1.0);
        assert_eq!(clock.time_seconds(), 1.0);
    }
}
