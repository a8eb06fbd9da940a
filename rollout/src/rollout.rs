use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use common::CancellationToken;
use crossbeam::channel::{Receiver, Sender};
use engine::{DiceSourceFactory, GameEngine};
use log::{debug, error, info, warn};
use model::{CubeInfo, EquityVector, Evaluator, MatchEquity, Output};
use serde::{Deserialize, Serialize};

use super::accumulator::TrialAccumulator;
use super::config::RolloutConfig;
use super::error::RolloutError;
use super::progress::{CandidateProgress, ProgressThrottle, RolloutProgress, RolloutSnapshot};
use super::stopping::{StopReason, StopVerdict};
use super::trial::TrialContext;

/// A position to roll out, seen from the player on roll.
#[derive(Clone, Debug)]
pub struct RolloutCandidate<B> {
    pub board: B,
    pub cube_info: CubeInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub mean: EquityVector,
    pub std_error: EquityVector,
    /// Trials that contributed to the mean.
    pub trials: usize,
    pub eliminated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutStatus {
    Completed,
    StoppedEarly(StopReason),
    /// Cancelled. The statistics cover the trials finished before the cancellation.
    Interrupted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RolloutResult {
    pub candidates: Vec<CandidateResult>,
    pub status: RolloutStatus,
}

impl RolloutResult {
    /// A stopping rule ended the rollout before the trials ran out. False when cancelled.
    pub fn stopped_early(&self) -> bool {
        matches!(self.status, RolloutStatus::StoppedEarly(_))
    }

    pub fn is_complete(&self) -> bool {
        self.status != RolloutStatus::Interrupted
    }
}

#[derive(Clone, Copy, Debug)]
struct Task {
    candidate: usize,
    trial: usize,
}

type TrialOutcome = (Task, Result<Option<EquityVector>, RolloutError>);

pub struct Rollout<'a, G, E, M> {
    engine: &'a G,
    evaluator: &'a E,
    met: &'a M,
    config: &'a RolloutConfig,
}

impl<'a, G, E, M> Rollout<'a, G, E, M>
where
    G: GameEngine + Sync,
    G::Board: Sync,
    E: Evaluator<Board = G::Board> + Sync,
    M: MatchEquity + Sync,
{
    pub fn new(
        engine: &'a G,
        evaluator: &'a E,
        met: &'a M,
        config: &'a RolloutConfig,
    ) -> Result<Self, RolloutError> {
        config.validate()?;

        Ok(Self {
            engine,
            evaluator,
            met,
            config,
        })
    }

    /// Rolls out every candidate with the same dice per trial until the trials run out, a stopping
    /// rule fires or `cancel` is set. A failing or panicking trial fails the whole rollout.
    pub fn run<D, P>(
        &self,
        candidates: &[RolloutCandidate<G::Board>],
        dice: &D,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<RolloutResult, RolloutError>
    where
        D: DiceSourceFactory + Sync,
        P: RolloutProgress,
    {
        let trial_context = TrialContext {
            engine: self.engine,
            evaluator: self.evaluator,
            met: self.met,
            config: self.config,
            cancel,
        };

        let (task_tx, task_rx) = crossbeam::channel::unbounded::<Task>();
        let (result_tx, result_rx) = crossbeam::channel::unbounded::<TrialOutcome>();

        let outcome = crossbeam::scope(|s| {
            for worker in 0..self.config.parallelism {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let trial_context = &trial_context;

                s.spawn(move |_| {
                    debug!("Starting rollout worker: {}", worker);

                    for task in task_rx.iter() {
                        let candidate = &candidates[task.candidate];
                        let mut source = dice.for_trial(task.trial);
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                            trial_context.play(&candidate.board, &candidate.cube_info, &mut source)
                        }))
                        .unwrap_or_else(|_| {
                            error!("Rollout worker {} panicked on trial {}", worker, task.trial);
                            Err(RolloutError::Worker(format!("worker {} panicked", worker)))
                        });

                        if result_tx.send((task, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(task_rx);
            drop(result_tx);

            let outcome =
                self.orchestrate(candidates.len(), &task_tx, &result_rx, progress, cancel);
            drop(task_tx);
            outcome
        });

        outcome.map_err(|_| RolloutError::Worker("a rollout worker panicked".to_string()))?
    }

    fn orchestrate<P: RolloutProgress>(
        &self,
        num_candidates: usize,
        tasks: &Sender<Task>,
        results: &Receiver<TrialOutcome>,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<RolloutResult, RolloutError> {
        let config = self.config;
        let key = if config.cubeful {
            Output::CubefulEquity
        } else {
            Output::CubelessEquity
        };
        let started = Instant::now();
        let mut throttle = ProgressThrottle::new(config.progress_interval);

        let mut accumulators = vec![TrialAccumulator::new(); num_candidates];
        let mut unpaired: Vec<Option<(usize, EquityVector)>> = vec![None; num_candidates];
        let mut live = vec![true; num_candidates];
        let mut next_trial = 0;

        info!(
            "Starting rollout: candidates: {}, trials: {}, parallelism: {}",
            num_candidates, config.trials, config.parallelism
        );

        let status = loop {
            if cancel.is_cancelled() {
                break RolloutStatus::Interrupted;
            }

            if next_trial >= config.trials {
                break RolloutStatus::Completed;
            }

            let batch_end = (next_trial + config.batch_size).min(config.trials);
            let mut dispatched = 0;
            for trial in next_trial..batch_end {
                for candidate in (0..num_candidates).filter(|c| live[*c]) {
                    tasks
                        .send(Task { candidate, trial })
                        .map_err(|_| RolloutError::Worker("rollout workers hung up".to_string()))?;
                    dispatched += 1;
                }
            }
            next_trial = batch_end;

            let mut finished = Vec::with_capacity(dispatched);
            let mut interrupted = false;
            let mut failure = None;
            for _ in 0..dispatched {
                let (task, outcome) = results
                    .recv()
                    .map_err(|_| RolloutError::Worker("rollout workers hung up".to_string()))?;

                match outcome {
                    Ok(Some(equity)) => finished.push((task, equity)),
                    Ok(None) => interrupted = true,
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
            }

            if let Some(err) = failure {
                error!("Rollout failed, discarding all trials: {:?}", err);
                return Err(err);
            }

            finished.sort_by_key(|(task, _)| (task.trial, task.candidate));
            for (task, equity) in finished {
                let accumulator = &mut accumulators[task.candidate];

                if !config.antithetic {
                    accumulator.update(&equity);
                } else if task.trial % 2 == 0 {
                    unpaired[task.candidate] = Some((task.trial, equity));
                } else if let Some((first, first_equity)) = unpaired[task.candidate].take() {
                    if first + 1 == task.trial {
                        accumulator.update(&first_equity.zip_with(&equity, |a, b| (a + b) / 2.0));
                    }
                }
            }

            if interrupted {
                break RolloutStatus::Interrupted;
            }

            let decision = config.stopping.should_continue(&accumulators, &live, key);
            for (c, (was, is)) in live.iter().zip(&decision.live).enumerate() {
                if was != is {
                    debug!("Candidate {} is {}", c, if *is { "live again" } else { "eliminated" });
                }
            }
            live = decision.live;

            if throttle.ready(Instant::now()) {
                let snapshot = self.snapshot(&accumulators, &live, started, false);
                info!(
                    "Rollout progress: trials: {}, elapsed: {:.1}s",
                    next_trial,
                    snapshot.elapsed.as_secs_f64()
                );
                progress.report(&snapshot);
            }

            if let StopVerdict::Stop(reason) = decision.verdict {
                break RolloutStatus::StoppedEarly(reason);
            }
        };

        match status {
            RolloutStatus::Interrupted => warn!("Rollout interrupted after {} trials", next_trial),
            RolloutStatus::StoppedEarly(reason) => {
                info!("Rollout stopped early after {} trials: {:?}", next_trial, reason)
            }
            RolloutStatus::Completed => info!("Rollout completed: {} trials", next_trial),
        }

        progress.report(&self.snapshot(&accumulators, &live, started, true));

        Ok(RolloutResult {
            candidates: accumulators
                .iter()
                .zip(&live)
                .map(|(acc, live)| CandidateResult {
                    mean: acc.mean(),
                    std_error: acc.std_error(),
                    trials: self.trials_counted(acc),
                    eliminated: !live,
                })
                .collect(),
            status,
        })
    }

    fn trials_counted(&self, accumulator: &TrialAccumulator) -> usize {
        if self.config.antithetic {
            accumulator.count() * 2
        } else {
            accumulator.count()
        }
    }

    fn snapshot(
        &self,
        accumulators: &[TrialAccumulator],
        live: &[bool],
        started: Instant,
        finished: bool,
    ) -> RolloutSnapshot {
        RolloutSnapshot {
            candidates: accumulators
                .iter()
                .zip(live)
                .map(|(acc, live)| CandidateProgress {
                    trials: self.trials_counted(acc),
                    mean: acc.mean(),
                    std_error: acc.std_error(),
                    live: *live,
                })
                .collect(),
            elapsed: started.elapsed(),
            finished,
        }
    }
}
