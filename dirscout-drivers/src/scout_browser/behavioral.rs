use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Default)]
/// Produces human-like delays to reduce automation timing signals.
pub struct BehavioralEngine {}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Pick a uniformly random duration between `min` and `max` milliseconds.
    /// Bounds given in the wrong order are swapped.
    pub fn pick_delay(&self, min: u64, max: u64) -> Duration {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let mut rng = OsRng;
        Duration::from_millis(rng.gen_range(lo..=hi))
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) -> Duration {
        let wait = self.pick_delay(min, max);
        sleep(wait).await;
        wait
    }
}
