use std::time::Duration;

use crate::Timestamp;

/// Countable interval with an active and an inactive state.
///
/// [`Timer::start`] records an absolute deadline; [`Timer::tick`] deactivates
/// the timer once the clock reaches it. A changed duration applies from the
/// next start. The owner polls [`Timer::is_active`] once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    duration: Duration,
    deadline: Option<Timestamp>,
}

impl Timer {
    /// Creates an inactive timer.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// Activates the timer with a deadline of `now + duration`.
    pub fn start(&mut self, now: Timestamp) {
        self.deadline = Some(now.saturating_add(self.duration));
    }

    /// Deactivates the timer once `now` reaches the deadline.
    pub fn tick(&mut self, now: Timestamp) {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                self.deadline = None;
            }
        }
    }

    /// Deactivates the timer immediately.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Reports whether the deadline is still pending.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// Interval applied by the next [`Timer::start`].
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Changes the interval used by the next [`Timer::start`].
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Absolute deadline while active.
    #[must_use]
    pub const fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Time left until the deadline, zero when inactive.
    #[must_use]
    pub fn remaining(&self, now: Timestamp) -> Duration {
        self.deadline.map_or(Duration::ZERO, |deadline| {
            deadline.saturating_duration_since(now)
        })
    }
}
