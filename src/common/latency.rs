use std::fmt;
use std::time::Duration;

/// Latency samples collected by one client run
///
/// Only measured round trips are recorded; the warm-up round trip never
/// reaches the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatencyReport {
    samples: Vec<Duration>,
    last_response: Vec<u8>,
}

impl LatencyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one measured round trip and the payload it returned
    pub fn record(&mut self, elapsed: Duration, response: Vec<u8>) {
        self.samples.push(elapsed);
        self.last_response = response;
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    /// Mean latency, `None` when nothing was measured
    pub fn mean(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let nanos = self.total().as_nanos() / self.samples.len() as u128;
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Mean latency in microseconds with sub-microsecond precision
    pub fn mean_micros(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.total().as_secs_f64() * 1_000_000.0 / self.samples.len() as f64)
    }

    /// Payload echoed by the last measured round trip
    pub fn last_response(&self) -> &[u8] {
        &self.last_response
    }
}

impl fmt::Display for LatencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mean_micros() {
            Some(mean) => write!(f, "{:8}: elapsed: {:7.2} µs", self.count(), mean),
            None => write!(f, "{:8}: elapsed: n/a", self.count()),
        }
    }
}
