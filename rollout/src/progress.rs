use std::time::{Duration, Instant};

use model::EquityVector;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateProgress {
    pub trials: usize,
    pub mean: EquityVector,
    pub std_error: EquityVector,
    pub live: bool,
}

/// The state of a running rollout.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RolloutSnapshot {
    pub candidates: Vec<CandidateProgress>,
    pub elapsed: Duration,
    /// Set on the last snapshot of a run.
    pub finished: bool,
}

pub trait RolloutProgress {
    fn report(&mut self, snapshot: &RolloutSnapshot);
}

impl<F: FnMut(&RolloutSnapshot)> RolloutProgress for F {
    fn report(&mut self, snapshot: &RolloutSnapshot) {
        self(snapshot)
    }
}

pub struct NoProgress;

impl RolloutProgress for NoProgress {
    fn report(&mut self, _snapshot: &RolloutSnapshot) {}
}

/// Lets a report through at most once per interval.
pub(crate) struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(Duration::from_millis(100));

        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_millis(50)));
        assert!(throttle.ready(start + Duration::from_millis(100)));
        assert!(!throttle.ready(start + Duration::from_millis(150)));
    }

    #[test]
    fn test_zero_interval_always_reports() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(Duration::ZERO);

        assert!(throttle.ready(start));
        assert!(throttle.ready(start));
    }
}
