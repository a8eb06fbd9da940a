use common::ConfigError;
use log::debug;
use model::Output;
use serde::{Deserialize, Serialize};

use super::accumulator::TrialAccumulator;

/// Early stopping parameters. Both rules are optional.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoppingRule {
    pub stop_on_std: bool,
    /// Relative standard error at or below which an equity counts as settled.
    pub std_limit: f64,
    pub min_games_std: usize,
    /// Below this magnitude a mean is treated as zero and its standard error is compared to
    /// `std_limit` directly.
    pub std_mean_floor: f64,

    pub stop_on_jsd: bool,
    /// Number of joint standard deviations beyond which a candidate is dropped.
    pub jsd_limit: f64,
    pub min_games_jsd: usize,
    /// Whether a dropped candidate may come back when the best candidate's estimate moves.
    pub jsd_reactivate: bool,
}

impl Default for StoppingRule {
    fn default() -> Self {
        Self {
            stop_on_std: false,
            std_limit: 0.01,
            min_games_std: 144,
            std_mean_floor: 1e-3,
            stop_on_jsd: false,
            jsd_limit: 2.33,
            min_games_jsd: 144,
            jsd_reactivate: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Every live candidate's equities are within the standard error limit.
    StdLimit,
    /// All other candidates were separated from the best one.
    SingleCandidate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopVerdict {
    Continue,
    Stop(StopReason),
}

/// Which candidates remain live after a check, and whether the rollout should go on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopDecision {
    pub live: Vec<bool>,
    pub verdict: StopVerdict,
}

impl StopDecision {
    pub fn should_continue(&self) -> bool {
        self.verdict == StopVerdict::Continue
    }
}

impl StoppingRule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("std_limit", self.std_limit, 0.0, f64::MAX)?;
        ConfigError::check_range("std_mean_floor", self.std_mean_floor, 0.0, f64::MAX)?;
        ConfigError::check_range("jsd_limit", self.jsd_limit, 0.0, f64::MAX)?;
        Ok(())
    }

    /// Checks both rules against the accumulators. `key` is the equity the candidates are ranked
    /// by, cubeful or cubeless, and is the only equity the std rule looks at besides the cubeless
    /// one.
    pub fn should_continue(
        &self,
        accumulators: &[TrialAccumulator],
        live: &[bool],
        key: Output,
    ) -> StopDecision {
        let mut live = live.to_vec();

        if self.stop_on_jsd {
            self.apply_jsd(accumulators, &mut live, key);

            if accumulators.len() > 1 && live.iter().filter(|l| **l).count() <= 1 {
                return StopDecision {
                    live,
                    verdict: StopVerdict::Stop(StopReason::SingleCandidate),
                };
            }
        }

        if self.stop_on_std && self.std_satisfied(accumulators, &live, key) {
            return StopDecision {
                live,
                verdict: StopVerdict::Stop(StopReason::StdLimit),
            };
        }

        StopDecision {
            live,
            verdict: StopVerdict::Continue,
        }
    }

    fn std_satisfied(&self, accumulators: &[TrialAccumulator], live: &[bool], key: Output) -> bool {
        let dimensions = if key == Output::CubelessEquity {
            vec![Output::CubelessEquity]
        } else {
            vec![Output::CubelessEquity, key]
        };

        accumulators.iter().zip(live).filter(|(_, live)| **live).all(|(acc, _)| {
            if acc.count() < self.min_games_std {
                return false;
            }

            let mean = acc.mean();
            let std_error = acc.std_error();
            dimensions.iter().all(|&d| {
                let magnitude = mean[d].abs();
                if magnitude < self.std_mean_floor {
                    std_error[d] <= self.std_limit
                } else {
                    std_error[d] / magnitude <= self.std_limit
                }
            })
        })
    }

    fn apply_jsd(&self, accumulators: &[TrialAccumulator], live: &mut [bool], key: Output) {
        let best = accumulators
            .iter()
            .enumerate()
            .filter(|(_, acc)| acc.count() > 0)
            .max_by(|(_, a), (_, b)| a.mean()[key].total_cmp(&b.mean()[key]))
            .map(|(i, _)| i);

        let best = match best {
            Some(best) => best,
            None => return,
        };

        let b = &accumulators[best];
        for (i, c) in accumulators.iter().enumerate() {
            if i == best || c.count() < self.min_games_jsd || b.count() < self.min_games_jsd {
                continue;
            }

            let jsd = joint_std_devs(b, c, key);
            if jsd > self.jsd_limit {
                if live[i] {
                    debug!("Candidate {} dropped at {:.2} joint standard deviations", i, jsd);
                }
                live[i] = false;
            } else if !live[i] && self.jsd_reactivate {
                debug!("Candidate {} reactivated at {:.2} joint standard deviations", i, jsd);
                live[i] = true;
            }
        }

        live[best] = true;
    }
}

/// How many joint standard deviations separate `candidate` from `best`. A zero denominator means
/// both estimates are exact: any difference separates them completely.
pub fn joint_std_devs(best: &TrialAccumulator, candidate: &TrialAccumulator, key: Output) -> f64 {
    let diff = (best.mean()[key] - candidate.mean()[key]).abs();
    let denominator = (best.std_error()[key].powi(2) + candidate.std_error()[key].powi(2)).sqrt();

    if denominator == 0.0 {
        if diff > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        diff / denominator
    }
}
