use common::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("evaluator failed during a rollout trial")]
    Evaluator(#[source] anyhow::Error),
    #[error("dice source failed during a rollout trial")]
    Dice(#[source] anyhow::Error),
    #[error("rollout worker failed: {0}")]
    Worker(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
