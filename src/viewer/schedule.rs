use std::time::{Duration, Instant};

/// Longest tick period; slower refresh rates are clamped to it.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Tick period for a refresh rate, never shorter than `min_interval_ms` and never longer than
/// [`MAX_TICK_PERIOD`].
pub fn tick_period(refresh_rate_hz: f64, min_interval_ms: u64) -> Duration {
    let floor = Duration::from_millis(min_interval_ms).min(MAX_TICK_PERIOD);
    if !refresh_rate_hz.is_finite() || refresh_rate_hz <= 0.0 {
        return floor;
    }
    let period = Duration::try_from_secs_f64(1.0 / refresh_rate_hz)
        .unwrap_or(MAX_TICK_PERIOD)
        .min(MAX_TICK_PERIOD);
    period.max(floor)
}

/// Fixed-period deadline tracker.
///
/// A late tick pushes the next deadline to `now + period` instead of firing missed ticks back to back.
#[derive(Clone, Debug)]
pub struct TickSchedule {
    period: Duration,
    next: Option<Instant>,
}

impl TickSchedule {
    pub fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Next deadline after a tick that finished at `now`.
    pub fn advance(&mut self, now: Instant) -> Instant {
        let next = match self.next {
            Some(prev) if prev + self.period > now => prev + self.period,
            _ => now + self.period,
        };
        self.next = Some(next);
        next
    }

    /// Sleep until the next deadline.
    pub fn wait(&mut self) {
        let deadline = self.advance(Instant::now());
        if let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            std::thread::sleep(remaining);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/schedule.rs"]
mod tests;
