use std::thread;
use std::time::{Duration, Instant};

use log::debug;

/// Fixed-period wake-ups for control loops.
///
/// Each deadline is the previous one plus the period, so jitter in one
/// cycle does not shift the following ones. A deadline that has already
/// passed counts as an overrun: the schedule restarts from now and the
/// wait still lasts one full period.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    deadline: Instant,
    cycles: u64,
    overruns: u64,
}

impl Ticker {
    /// The first deadline is one period from now.
    pub fn new(period: Duration) -> Self {
        Ticker {
            period,
            deadline: Instant::now() + period,
            cycles: 0,
            overruns: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period, effective from the next deadline on.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Sleep until the current deadline, then schedule the next one.
    pub fn wait_period(&mut self) {
        let now = Instant::now();
        if self.deadline <= now {
            self.overruns += 1;
            debug!("period overrun by {:?}", now - self.deadline);
            self.deadline = now + self.period;
        }
        thread::sleep(self.deadline - now);
        self.deadline += self.period;
        self.cycles += 1;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_period() {
        let period = Duration::from_millis(20);
        let start = Instant::now();
        let mut ticker = Ticker::new(period);
        for _ in 0..3 {
            ticker.wait_period();
        }
        assert!(start.elapsed() >= period * 3);
        assert_eq!(ticker.cycles(), 3);
    }

    #[test]
    fn counts_overrun() {
        let period = Duration::from_millis(50);
        let mut ticker = Ticker::new(period);
        thread::sleep(Duration::from_millis(120));
        let start = Instant::now();
        ticker.wait_period();
        assert!(start.elapsed() >= period);
        assert_eq!(ticker.overruns(), 1);
        ticker.wait_period();
        assert_eq!(ticker.overruns(), 1);
        assert_eq!(ticker.cycles(), 2);
    }
}
