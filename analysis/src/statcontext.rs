use std::ops::{Add, AddAssign, Index, IndexMut};

use common::{div_or_none, sample_variance};
use engine::{PerPlayer, Player};
use log::debug;
use model::{mwc_after_game, mwc_at_score, CubeEquitySet, CubeInfo};
use serde::{Deserialize, Serialize};

use super::context::AnalysisContext;
use super::cube_decision::{
    classify, cube_error_for, is_close_verdict, CubeAction, CubeClassification, CubeDecision,
    CubeError, CubeErrorKind,
};
use super::skill::{LuckType, SkillType};

/// An error or luck amount kept in both normalised equity and unnormalised units (points or match
/// winning chance).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPair {
    pub normalized: f64,
    pub unnormalized: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorUnit {
    Normalized,
    Unnormalized,
}

impl ErrorPair {
    pub fn get(&self, unit: ErrorUnit) -> f64 {
        match unit {
            ErrorUnit::Normalized => self.normalized,
            ErrorUnit::Unnormalized => self.unnormalized,
        }
    }
}

impl Add for ErrorPair {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            normalized: self.normalized + rhs.normalized,
            unnormalized: self.unnormalized + rhs.unnormalized,
        }
    }
}

impl AddAssign for ErrorPair {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCounts([u32; 4]);

impl Index<SkillType> for SkillCounts {
    type Output = u32;

    fn index(&self, skill: SkillType) -> &u32 {
        &self.0[skill.index()]
    }
}

impl IndexMut<SkillType> for SkillCounts {
    fn index_mut(&mut self, skill: SkillType) -> &mut u32 {
        &mut self.0[skill.index()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuckCounts([u32; 5]);

impl Index<LuckType> for LuckCounts {
    type Output = u32;

    fn index(&self, luck: LuckType) -> &u32 {
        &self.0[luck.index()]
    }
}

impl IndexMut<LuckType> for LuckCounts {
    fn index_mut(&mut self, luck: LuckType) -> &mut u32 {
        &mut self.0[luck.index()]
    }
}

/// Count and summed cost of each kind of cube error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CubeErrorTally {
    counts: [u32; 6],
    errors: [ErrorPair; 6],
}

impl CubeErrorTally {
    pub fn count(&self, kind: CubeErrorKind) -> u32 {
        self.counts[kind.index()]
    }

    pub fn error(&self, kind: CubeErrorKind) -> ErrorPair {
        self.errors[kind.index()]
    }

    pub fn total(&self) -> ErrorPair {
        self.errors.iter().fold(ErrorPair::default(), |acc, e| acc + *e)
    }

    fn add(&mut self, kind: CubeErrorKind, error: ErrorPair) {
        self.counts[kind.index()] += 1;
        self.errors[kind.index()] += error;
    }

    fn merge(&self, other: &Self) -> Self {
        let mut merged = *self;
        for kind in CubeErrorKind::ALL {
            merged.counts[kind.index()] += other.counts[kind.index()];
            merged.errors[kind.index()] += other.errors[kind.index()];
        }
        merged
    }
}

/// Per game results with enough moments for a mean and a sample variance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub games: u32,
    pub sum: f64,
    pub sum_sq: f64,
}

impl ResultSummary {
    fn record(&mut self, value: f64) {
        self.games += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn mean(&self) -> Option<f64> {
        div_or_none(self.sum, self.games as f64)
    }

    pub fn variance(&self) -> Option<f64> {
        sample_variance(self.games, self.sum, self.sum_sq)
    }

    fn merge(&self, other: &Self) -> Self {
        Self {
            games: self.games + other.games,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
        }
    }
}

/// One chequer play decision to be recorded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: Player,
    /// Equity of the chosen move against the best move, `None` when the move was not analysed.
    pub equity_loss: Option<f64>,
    pub legal_moves: usize,
}

/// Accumulated statistics for a game, a match or a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatContext {
    pub moves_analysed: bool,
    pub cube_analysed: bool,
    pub dice_analysed: bool,

    pub total_moves: PerPlayer<u32>,
    pub unforced_moves: PerPlayer<u32>,
    pub moves_by_skill: PerPlayer<SkillCounts>,
    pub checker_error: PerPlayer<ErrorPair>,

    pub rolls_by_luck: PerPlayer<LuckCounts>,
    pub luck: PerPlayer<ErrorPair>,

    pub total_cube: PerPlayer<u32>,
    pub close_cube: PerPlayer<u32>,
    pub doubles: PerPlayer<u32>,
    pub takes: PerPlayer<u32>,
    pub passes: PerPlayer<u32>,
    pub cube_errors: PerPlayer<CubeErrorTally>,

    pub games: u32,
    pub actual_result: PerPlayer<ResultSummary>,
    pub luck_adjusted_result: PerPlayer<ResultSummary>,
    /// Unnormalised luck since the last recorded game result.
    open_game_luck: PerPlayer<f64>,
}

/// Error totals and rates for one player in one unit. Rates are `None` when there was nothing to
/// divide by.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorRates {
    pub checker_total: f64,
    pub checker_per_move: Option<f64>,
    pub cube_total: f64,
    pub cube_per_decision: Option<f64>,
    pub combined_total: f64,
    pub combined_per_decision: Option<f64>,
}

impl StatContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a chequer play decision and returns its skill.
    pub fn record_move(
        &mut self,
        ctx: &AnalysisContext,
        cube_info: &CubeInfo,
        mv: &MoveRecord,
    ) -> SkillType {
        let p = mv.player;
        self.total_moves[p] += 1;

        let loss = match mv.equity_loss {
            Some(loss) if ctx.options.analyse_moves => loss.abs(),
            _ => {
                self.moves_by_skill[p][SkillType::None] += 1;
                return SkillType::None;
            }
        };

        self.moves_analysed = true;

        let skill = ctx.skill(loss);
        self.moves_by_skill[p][skill] += 1;

        if mv.legal_moves > 1 {
            self.unforced_moves[p] += 1;
            self.checker_error[p] += ErrorPair {
                normalized: loss,
                unnormalized: ctx.unnormalize(loss, cube_info),
            };
        }

        skill
    }

    /// Records a cube action by `player`. `cube_info` is the doubler's view; for takes and passes
    /// `player` is the opponent answering the double. Returns the error made, if any.
    pub fn record_cube_decision(
        &mut self,
        ctx: &AnalysisContext,
        cube_info: &CubeInfo,
        player: Player,
        equities: &CubeEquitySet,
        action: CubeAction,
    ) -> Option<CubeError> {
        if !ctx.options.analyse_cube {
            return None;
        }

        let verdict = match classify(equities, cube_info, ctx) {
            CubeClassification::Classified(verdict) => verdict,
            CubeClassification::NotClassifiable => return None,
        };

        let unavailable = matches!(
            verdict.decision,
            CubeDecision::NotAvailable
                | CubeDecision::NoDoubleDeadCube
                | CubeDecision::NoRedoubleDeadCube
        );
        if action == CubeAction::NoDouble && unavailable {
            debug!("Skipping no-double record: {}", verdict.decision);
            return None;
        }

        self.cube_analysed = true;
        self.total_cube[player] += 1;

        match action {
            CubeAction::NoDouble => {
                if is_close_verdict(equities, &verdict, ctx) {
                    self.close_cube[player] += 1;
                }
            }
            CubeAction::Double => {
                self.doubles[player] += 1;
                self.close_cube[player] += 1;
            }
            CubeAction::Take => {
                self.takes[player] += 1;
                self.close_cube[player] += 1;
            }
            CubeAction::Pass => {
                self.passes[player] += 1;
                self.close_cube[player] += 1;
            }
        }

        let error = cube_error_for(equities, &verdict, ctx, action)?;
        self.cube_errors[player].add(
            error.kind,
            ErrorPair {
                normalized: error.cost,
                unnormalized: ctx.unnormalize(error.cost, cube_info),
            },
        );

        Some(error)
    }

    /// Records the luck of a roll for `player` and returns its classification.
    pub fn record_luck(
        &mut self,
        ctx: &AnalysisContext,
        cube_info: &CubeInfo,
        player: Player,
        luck: f64,
    ) -> LuckType {
        let luck_type = ctx.luck(luck);

        if !ctx.options.analyse_dice {
            return luck_type;
        }

        let unnormalized = ctx.unnormalize(luck, cube_info);

        self.dice_analysed = true;
        self.rolls_by_luck[player][luck_type] += 1;
        self.luck[player] += ErrorPair {
            normalized: luck,
            unnormalized,
        };
        self.open_game_luck[player] += unnormalized;

        luck_type
    }

    /// Closes a game. `cube_info` holds the score and Crawford state at the start of the game.
    pub fn record_game_result(
        &mut self,
        ctx: &AnalysisContext,
        cube_info: &CubeInfo,
        winner: Player,
        points: u32,
    ) {
        let gain = if cube_info.is_money() {
            points as f64
        } else {
            let ci = CubeInfo {
                on_roll: winner,
                ..*cube_info
            };
            mwc_after_game(ctx.met, &ci, winner, points) - mwc_at_score(ctx.met, &ci)
        };

        let luck = self.open_game_luck;
        for p in Player::ALL {
            let actual = if p == winner { gain } else { -gain };

            self.actual_result[p].record(actual);
            self.luck_adjusted_result[p].record(actual - luck[p] + luck[p.opponent()]);
        }

        self.open_game_luck = PerPlayer::default();
        self.games += 1;
    }

    /// Combines two contexts. Associative and commutative, with the empty context as identity.
    pub fn merge(&self, other: &Self) -> Self {
        let add = |a: &PerPlayer<u32>, b: &PerPlayer<u32>| *a + *b;
        let add_errors =
            |a: &PerPlayer<ErrorPair>, b: &PerPlayer<ErrorPair>| a.zip_with(b, |x, y| *x + *y);

        Self {
            moves_analysed: self.moves_analysed || other.moves_analysed,
            cube_analysed: self.cube_analysed || other.cube_analysed,
            dice_analysed: self.dice_analysed || other.dice_analysed,

            total_moves: add(&self.total_moves, &other.total_moves),
            unforced_moves: add(&self.unforced_moves, &other.unforced_moves),
            moves_by_skill: self.moves_by_skill.zip_with(&other.moves_by_skill, |a, b| {
                let mut merged = *a;
                for skill in SkillType::ALL {
                    merged[skill] += b[skill];
                }
                merged
            }),
            checker_error: add_errors(&self.checker_error, &other.checker_error),

            rolls_by_luck: self.rolls_by_luck.zip_with(&other.rolls_by_luck, |a, b| {
                let mut merged = *a;
                for luck in LuckType::ALL {
                    merged[luck] += b[luck];
                }
                merged
            }),
            luck: add_errors(&self.luck, &other.luck),

            total_cube: add(&self.total_cube, &other.total_cube),
            close_cube: add(&self.close_cube, &other.close_cube),
            doubles: add(&self.doubles, &other.doubles),
            takes: add(&self.takes, &other.takes),
            passes: add(&self.passes, &other.passes),
            cube_errors: self.cube_errors.zip_with(&other.cube_errors, CubeErrorTally::merge),

            games: self.games + other.games,
            actual_result: self.actual_result.zip_with(&other.actual_result, ResultSummary::merge),
            luck_adjusted_result: self
                .luck_adjusted_result
                .zip_with(&other.luck_adjusted_result, ResultSummary::merge),
            open_game_luck: self.open_game_luck + other.open_game_luck,
        }
    }

    pub fn error_rates(&self, player: Player, unit: ErrorUnit) -> ErrorRates {
        let unforced = self.unforced_moves[player] as f64;
        let close = self.close_cube[player] as f64;

        let checker_total = self.checker_error[player].get(unit);
        let cube_total = self.cube_errors[player].total().get(unit);
        let combined_total = checker_total + cube_total;

        ErrorRates {
            checker_total,
            checker_per_move: div_or_none(checker_total, unforced),
            cube_total,
            cube_per_decision: div_or_none(cube_total, close),
            combined_total,
            combined_per_decision: div_or_none(combined_total, unforced + close),
        }
    }

    /// Total error divided by the moves made by both players.
    pub fn snowie_error_rate(&self, player: Player, unit: ErrorUnit) -> Option<f64> {
        let moves = Player::ALL.iter().map(|&p| self.total_moves[p]).sum::<u32>();
        div_or_none(self.error_rates(player, unit).combined_total, moves as f64)
    }

    pub fn luck_per_move(&self, player: Player, unit: ErrorUnit) -> Option<f64> {
        div_or_none(self.luck[player].get(unit), self.total_moves[player] as f64)
    }

    pub fn cube_error_count(&self, player: Player) -> u32 {
        CubeErrorKind::ALL.iter().map(|&k| self.cube_errors[player].count(k)).sum()
    }
}
