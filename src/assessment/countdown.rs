//! Repeating countdown timer owned by a run task.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Fires once per period. `restart` discards the pending tick so a question
/// that was just left can never receive a stale timeout.
pub struct Countdown {
    interval: Interval,
}

impl Countdown {
    pub fn new(period: Duration) -> Self {
        // First tick one full period from now, not immediately.
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn restart(&mut self) {
        self.interval.reset();
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let start = Instant::now();
        let mut countdown = Countdown::new(Duration::from_secs(1));
        countdown.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        countdown.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pushes_the_next_tick_out() {
        let start = Instant::now();
        let mut countdown = Countdown::new(Duration::from_secs(1));
        time::sleep(Duration::from_millis(700)).await;
        countdown.restart();
        countdown.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1700));
    }
}
