use std::time::Duration;

use anyhow::Result;
use common::{get_env_usize, Config, ConfigError, ConfigLoader};
use engine::{PerPlayer, Player};
use model::{EvalContext, MAX_PLIES};
use serde::{Deserialize, Serialize};

use super::stopping::StoppingRule;

/// Breadth limit for one search depth: the `accept` best moves at 0-ply are always kept, plus up to
/// `extra` more within `threshold` of the best.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveFilter {
    pub accept: usize,
    pub extra: usize,
    pub threshold: f64,
}

impl Default for MoveFilter {
    fn default() -> Self {
        Self {
            accept: 0,
            extra: 8,
            threshold: 0.16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Trials per candidate.
    pub trials: usize,
    /// Trials dispatched per candidate between stopping checks.
    pub batch_size: usize,
    pub parallelism: usize,

    pub seed: u64,
    pub rotate_dice: bool,
    pub antithetic: bool,
    /// The rolled out position is the opening position, so the first roll cannot be a double.
    pub initial_position: bool,

    /// Play the cube inside trials and report cubeful equities.
    pub cubeful: bool,
    /// Allow a cube action before the first roll of a trial. Off when the candidates are the two
    /// sides of a cube decision that has already been made.
    pub cube_at_start: bool,
    pub chequer: PerPlayer<EvalContext>,
    pub cube: PerPlayer<EvalContext>,
    pub late: PerPlayer<EvalContext>,
    pub late_cube: PerPlayer<EvalContext>,
    /// Ply from which the late contexts are used.
    pub late_after: Option<usize>,
    /// Subtract the luck of every roll from the trial result.
    pub variance_reduction: bool,

    pub truncation: EvalContext,
    /// Ply at which a trial is cut short and evaluated.
    pub truncate_at: Option<usize>,
    /// Cut a trial short once the position is covered by a bearoff database.
    pub truncate_bearoff: bool,

    pub stopping: StoppingRule,
    /// Indexed by search depth minus one.
    pub move_filters: Vec<MoveFilter>,
    pub progress_interval: Duration,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        let chequer = EvalContext::default();

        Self {
            trials: 1296,
            batch_size: 36,
            parallelism: 4,
            seed: 0,
            rotate_dice: true,
            antithetic: false,
            initial_position: false,
            cubeful: true,
            cube_at_start: true,
            chequer: PerPlayer::splat(chequer),
            cube: PerPlayer::splat(chequer),
            late: PerPlayer::splat(chequer),
            late_cube: PerPlayer::splat(chequer),
            late_after: None,
            variance_reduction: false,
            truncation: chequer,
            truncate_at: None,
            truncate_bearoff: true,
            stopping: StoppingRule::default(),
            move_filters: vec![MoveFilter::default(); MAX_PLIES as usize],
            progress_interval: Duration::from_millis(500),
        }
    }
}

impl RolloutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("trials", self.trials),
            ("batch_size", self.batch_size),
            ("parallelism", self.parallelism),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::invalid(name, "must be positive"));
            }
        }

        let contexts = [&self.chequer, &self.cube, &self.late, &self.late_cube];
        for ctx in contexts.into_iter().flat_map(|phase| phase.iter()).map(|(_, ctx)| ctx) {
            ctx.validate()?;
        }
        self.truncation.validate()?;

        if self.truncate_at == Some(0) {
            return Err(ConfigError::invalid("truncate_plies", "must be positive"));
        }

        for filter in &self.move_filters {
            ConfigError::check_range("move_filter_threshold", filter.threshold, 0.0, f64::MAX)?;
        }

        self.stopping.validate()
    }

    pub fn eval_context(&self, player: Player, ply: usize) -> &EvalContext {
        match self.late_after {
            Some(late_after) if ply >= late_after => &self.late[player],
            _ => &self.chequer[player],
        }
    }

    pub fn cube_context(&self, player: Player, ply: usize) -> &EvalContext {
        match self.late_after {
            Some(late_after) if ply >= late_after => &self.late_cube[player],
            _ => &self.cube[player],
        }
    }

    pub fn move_filter(&self, plies: u8) -> Option<&MoveFilter> {
        (plies as usize).checked_sub(1).and_then(|i| self.move_filters.get(i))
    }
}

impl Config for RolloutConfig {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let default = Self::default();
        let usize_or = |name: &str, default: usize| {
            config.get(name).and_then(|v| v.as_usize()).unwrap_or(default)
        };
        let f64_or = |name: &str, default: f64| {
            config.get(name).and_then(|v| v.as_f64()).unwrap_or(default)
        };
        let bool_or = |name: &str, default: bool| {
            config.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
        };

        let chequer =
            EvalContext::load_with_prefix(config, "chequer", default.chequer[Player::Zero])?;
        let cube = EvalContext::load_with_prefix(config, "cube", chequer)?;
        let late = EvalContext::load_with_prefix(config, "late", chequer)?;
        let late_cube = EvalContext::load_with_prefix(config, "late_cube", cube)?;
        let per_player = |phase: &str, default: EvalContext| -> Result<PerPlayer<EvalContext>> {
            Ok(PerPlayer([
                EvalContext::load_with_prefix(config, &format!("player_0.{}", phase), default)?,
                EvalContext::load_with_prefix(config, &format!("player_1.{}", phase), default)?,
            ]))
        };

        let parallelism = match get_env_usize("ROLLOUT_PARALLELISM")? {
            Some(parallelism) => parallelism,
            None => usize_or("parallelism", default.parallelism),
        };

        let filter = MoveFilter {
            accept: usize_or("move_filter_accept", MoveFilter::default().accept),
            extra: usize_or("move_filter_extra", MoveFilter::default().extra),
            threshold: f64_or("move_filter_threshold", MoveFilter::default().threshold),
        };

        let rollout = Self {
            trials: usize_or("trials", default.trials),
            batch_size: usize_or("batch_size", default.batch_size),
            parallelism,
            seed: config.get("seed").and_then(|v| v.as_u64()).unwrap_or(default.seed),
            rotate_dice: bool_or("rotate_dice", default.rotate_dice),
            antithetic: bool_or("antithetic", default.antithetic),
            initial_position: bool_or("initial_position", default.initial_position),
            cubeful: bool_or("cubeful", default.cubeful),
            cube_at_start: bool_or("cube_at_start", default.cube_at_start),
            chequer: per_player("chequer", chequer)?,
            cube: per_player("cube", cube)?,
            late: per_player("late", late)?,
            late_cube: per_player("late_cube", late_cube)?,
            late_after: bool_or("late_evals", false).then(|| usize_or("late_after", 5)),
            variance_reduction: bool_or("variance_reduction", default.variance_reduction),
            truncation: EvalContext::load_with_prefix(config, "truncation", chequer)?,
            truncate_at: bool_or("truncate", false).then(|| usize_or("truncate_plies", 10)),
            truncate_bearoff: bool_or("truncate_bearoff", default.truncate_bearoff),
            stopping: StoppingRule {
                stop_on_std: bool_or("stop_on_std", default.stopping.stop_on_std),
                std_limit: f64_or("std_limit", default.stopping.std_limit),
                min_games_std: usize_or("min_games_std", default.stopping.min_games_std),
                std_mean_floor: f64_or("std_mean_floor", default.stopping.std_mean_floor),
                stop_on_jsd: bool_or("stop_on_jsd", default.stopping.stop_on_jsd),
                jsd_limit: f64_or("jsd_limit", default.stopping.jsd_limit),
                min_games_jsd: usize_or("min_games_jsd", default.stopping.min_games_jsd),
                jsd_reactivate: bool_or("jsd_reactivate", default.stopping.jsd_reactivate),
            },
            move_filters: vec![filter; MAX_PLIES as usize],
            progress_interval: Duration::from_millis(
                config
                    .get("progress_interval_ms")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(default.progress_interval.as_millis() as u64),
            ),
        };

        rollout.validate()?;
        Ok(rollout)
    }
}
