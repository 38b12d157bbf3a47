use std::cell::Cell;
use std::time::{Duration, Instant};

/// Millisecond clock stamping input events and pick requests.
///
/// Readings never decrease. While stopped, the clock only moves when
/// [`LogicalClock::advance`] is called.
#[derive(Debug)]
pub struct LogicalClock {
    /// Time accumulated by previous running periods and manual advances
    elapsed: Duration,
    /// Start of the current running period
    started: Option<Instant>,
    last_ms: Cell<i64>,
}

impl LogicalClock {
    pub fn new(running: bool) -> Self {
        let mut clock = Self { elapsed: Duration::ZERO, started: None, last_ms: Cell::new(0) };
        if running {
            clock.start();
        }
        clock
    }

    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn advance(&mut self, ms: u64) {
        self.elapsed += Duration::from_millis(ms);
    }

    pub fn time_ms(&self) -> i64 {
        let running = self.started.map(|s| s.elapsed()).unwrap_or_default();
        let now = i64::try_from((self.elapsed + running).as_millis()).unwrap_or(i64::MAX);

        let ms = now.max(self.last_ms.get());
        self.last_ms.set(ms);
        ms
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_clock_only_moves_on_advance() {
        let mut clock = LogicalClock::new(false);
        assert!(!clock.is_running());
        assert_eq!(clock.time_ms(), 0);

        clock.advance(16);
        clock.advance(16);
        assert_eq!(clock.time_ms(), 32);
        assert_eq!(clock.time_ms(), 32);
    }

    #[test]
    fn readings_never_decrease() {
        let mut clock = LogicalClock::new(true);
        let mut last = clock.time_ms();
        for i in 0..200 {
            if i % 50 == 0 {
                clock.stop();
            } else if i % 50 == 25 {
                clock.start();
            }
            let now = clock.time_ms();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn stop_keeps_elapsed_time() {
        let mut clock = LogicalClock::new(true);
        std::thread::sleep(Duration::from_millis(5));
        clock.stop();
        let frozen = clock.time_ms();
        assert!(frozen >= 5);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.time_ms(), frozen);
    }
}
