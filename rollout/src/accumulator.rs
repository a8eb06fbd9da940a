use model::{EquityVector, NUM_OUTPUTS};
use serde::{Deserialize, Serialize};

/// Running mean and variance of the trial results of one candidate (Welford's update).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialAccumulator {
    n: usize,
    mean: [f64; NUM_OUTPUTS],
    m2: [f64; NUM_OUTPUTS],
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, trial: &EquityVector) {
        self.n += 1;
        let n = self.n as f64;

        for (i, &x) in trial.as_array().iter().enumerate() {
            let delta = x - self.mean[i];
            self.mean[i] += delta / n;
            self.m2[i] += delta * (x - self.mean[i]);
        }
    }

    pub fn count(&self) -> usize {
        self.n
    }

    pub fn mean(&self) -> EquityVector {
        EquityVector::from_array(self.mean)
    }

    /// Sample variance per output, zero until there are two observations.
    pub fn variance(&self) -> EquityVector {
        if self.n < 2 {
            return EquityVector::from_array([0.0; NUM_OUTPUTS]);
        }

        let n = self.n as f64;
        EquityVector::from_array(self.m2.map(|m2| m2 / (n - 1.0)))
    }

    pub fn std_error(&self) -> EquityVector {
        if self.n == 0 {
            return EquityVector::from_array([0.0; NUM_OUTPUTS]);
        }

        let n = self.n as f64;
        self.variance().map(|v| (v / n).sqrt())
    }
}
