use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer for one analysis or CLI step. Logs when it starts and
/// again when dropped, with any recorded stage laps in the closing line.
pub struct Timer {
    label: String,
    start: Instant,
    last_lap: Instant,
    laps: Vec<(&'static str, Duration)>,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  {}", label);
        let now = Instant::now();
        Self {
            label,
            start: now,
            last_lap: now,
            laps: Vec::new(),
        }
    }

    /// Close the current stage: records the time since the previous lap
    /// (or since start) under `stage` and returns it.
    pub fn lap(&mut self, stage: &'static str) -> Duration {
        let now = Instant::now();
        let took = now - self.last_lap;
        self.last_lap = now;
        self.laps.push((stage, took));
        took
    }

    pub fn laps(&self) -> &[(&'static str, Duration)] {
        &self.laps
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.laps.is_empty() {
            info!("⏱  {} took {:.2?}", self.label, self.elapsed());
            return;
        }
        let stages = self
            .laps
            .iter()
            .map(|(stage, took)| format!("{} {:.2?}", stage, took))
            .collect::<Vec<_>>()
            .join(", ");
        info!("⏱  {} took {:.2?} ({})", self.label, self.elapsed(), stages);
    }
}
