use std::fmt;

use engine::Player;
use serde::{Deserialize, Serialize};

use super::context::AnalysisContext;
use super::skill::LuckType;
use super::statcontext::{ErrorUnit, StatContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingCategory {
    Undefined,
    Awful,
    Beginner,
    CasualPlayer,
    Intermediate,
    Advanced,
    Expert,
    WorldClass,
    Supernatural,
}

/// Upper bounds (exclusive) on the normalised error per move, best category first.
const RATING_THRESHOLDS: [(RatingCategory, f64); 8] = [
    (RatingCategory::Supernatural, 0.002),
    (RatingCategory::WorldClass, 0.005),
    (RatingCategory::Expert, 0.008),
    (RatingCategory::Advanced, 0.012),
    (RatingCategory::Intermediate, 0.018),
    (RatingCategory::CasualPlayer, 0.026),
    (RatingCategory::Beginner, 0.035),
    (RatingCategory::Awful, 1e38),
];

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RatingCategory::Undefined => "Undefined",
            RatingCategory::Awful => "Awful!",
            RatingCategory::Beginner => "Beginner",
            RatingCategory::CasualPlayer => "Casual player",
            RatingCategory::Intermediate => "Intermediate",
            RatingCategory::Advanced => "Advanced",
            RatingCategory::Expert => "Expert",
            RatingCategory::WorldClass => "World class",
            RatingCategory::Supernatural => "Supernatural",
        };
        f.write_str(name)
    }
}

pub fn rating(error_per_move: f64) -> RatingCategory {
    RATING_THRESHOLDS
        .iter()
        .find(|(_, threshold)| error_per_move < *threshold)
        .map_or(RatingCategory::Undefined, |(category, _)| *category)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LuckRating {
    GoToHell,
    BadDice,
    None,
    GoodDice,
    Cheater,
}

/// Rates average luck per move by scaling it onto the per-roll luck thresholds.
pub fn luck_rating(ctx: &AnalysisContext, luck_per_move: f64) -> LuckRating {
    match ctx.luck(luck_per_move * 10.0) {
        LuckType::VeryBad => LuckRating::GoToHell,
        LuckType::Bad => LuckRating::BadDice,
        LuckType::None => LuckRating::None,
        LuckType::Good => LuckRating::GoodDice,
        LuckType::VeryGood => LuckRating::Cheater,
    }
}

/// Affine calibration of error rates onto the FIBS rating scale for an `n` point match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FibsCalibration {
    pub chequer_base: f64,
    pub chequer_per_length: f64,
    pub cube_base: f64,
    pub cube_per_length: f64,
}

impl Default for FibsCalibration {
    fn default() -> Self {
        Self {
            chequer_base: 8798.0,
            chequer_per_length: 25526.0,
            cube_base: 863.0,
            cube_per_length: -519.0,
        }
    }
}

impl FibsCalibration {
    pub fn chequer_loss(&self, error_per_move: f64, match_to: u32) -> f64 {
        error_per_move * (self.chequer_base + self.chequer_per_length / match_to as f64)
    }

    pub fn cube_loss(&self, error_per_decision: f64, match_to: u32) -> f64 {
        error_per_decision * (self.cube_base + self.cube_per_length / match_to as f64)
    }
}

/// Rating points lost to chequer play errors; `None` for money play or without unforced moves.
pub fn chequer_rating_loss(sc: &StatContext, player: Player, match_to: u32) -> Option<f64> {
    if match_to == 0 {
        return None;
    }

    let per_move = sc.error_rates(player, ErrorUnit::Normalized).checker_per_move?;
    Some(FibsCalibration::default().chequer_loss(per_move, match_to))
}

/// Rating points lost to cube errors; `None` for money play or without close cube decisions.
pub fn cube_rating_loss(sc: &StatContext, player: Player, match_to: u32) -> Option<f64> {
    if match_to == 0 {
        return None;
    }

    let per_decision = sc.error_rates(player, ErrorUnit::Normalized).cube_per_decision?;
    Some(FibsCalibration::default().cube_loss(per_decision, match_to))
}

/// Estimated absolute FIBS rating from the error rates. A missing chequer or cube rate counts as no
/// error, but at least one decision must have been made.
pub fn absolute_fibs_rating(
    ctx: &AnalysisContext,
    sc: &StatContext,
    player: Player,
    match_to: u32,
) -> Option<f64> {
    if match_to == 0 || sc.unforced_moves[player] + sc.close_cube[player] == 0 {
        return None;
    }

    let rates = sc.error_rates(player, ErrorUnit::Normalized);
    let calibration = FibsCalibration::default();
    let loss = calibration.chequer_loss(rates.checker_per_move.unwrap_or(0.0), match_to)
        + calibration.cube_loss(rates.cube_per_decision.unwrap_or(0.0), match_to);

    Some(ctx.options.fibs_rating_offset - loss)
}

/// The rating difference implied by a match winning chance `r` over an `n` point match.
pub fn relative_fibs_rating(r: f64, match_to: u32) -> Option<f64> {
    if match_to == 0 || !(r > 0.0 && r < 1.0) {
        return None;
    }

    let x = -2000.0 / (match_to as f64).sqrt() * (1.0 / r - 1.0).log10();
    Some(x.max(-2100.0))
}

/// Rating difference between the players once luck is taken out of the match result.
pub fn luck_based_fibs_rating(sc: &StatContext, match_to: u32) -> Option<f64> {
    let actual = sc.actual_result[Player::Zero].sum;
    let r = 0.5 + actual - sc.luck[Player::Zero].unnormalized + sc.luck[Player::One].unnormalized;

    relative_fibs_rating(r, match_to)
}
