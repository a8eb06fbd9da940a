use serde::{Deserialize, Serialize};

use super::options::{LuckThresholds, SkillThresholds, ThresholdComparison};

/// Quality of a decision, ordered worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillType {
    VeryBad,
    Bad,
    Doubtful,
    None,
}

impl SkillType {
    pub const ALL: [SkillType; 4] = [
        SkillType::VeryBad,
        SkillType::Bad,
        SkillType::Doubtful,
        SkillType::None,
    ];

    pub fn index(&self) -> usize {
        match self {
            SkillType::VeryBad => 0,
            SkillType::Bad => 1,
            SkillType::Doubtful => 2,
            SkillType::None => 3,
        }
    }
}

/// Luck of a roll, ordered unluckiest to luckiest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LuckType {
    VeryBad,
    Bad,
    None,
    Good,
    VeryGood,
}

impl LuckType {
    pub const ALL: [LuckType; 5] = [
        LuckType::VeryBad,
        LuckType::Bad,
        LuckType::None,
        LuckType::Good,
        LuckType::VeryGood,
    ];

    pub fn index(&self) -> usize {
        match self {
            LuckType::VeryBad => 0,
            LuckType::Bad => 1,
            LuckType::None => 2,
            LuckType::Good => 3,
            LuckType::VeryGood => 4,
        }
    }

    /// Distance from an ordinary roll, ignoring direction.
    pub fn magnitude(&self) -> u8 {
        match self {
            LuckType::None => 0,
            LuckType::Bad | LuckType::Good => 1,
            LuckType::VeryBad | LuckType::VeryGood => 2,
        }
    }
}

/// Classifies an equity loss by its magnitude.
pub fn classify_skill(
    equity_loss: f64,
    thresholds: &SkillThresholds,
    comparison: ThresholdComparison,
) -> SkillType {
    let loss = equity_loss.abs();

    if comparison.exceeds(loss, thresholds.very_bad) {
        SkillType::VeryBad
    } else if comparison.exceeds(loss, thresholds.bad) {
        SkillType::Bad
    } else if comparison.exceeds(loss, thresholds.doubtful) {
        SkillType::Doubtful
    } else {
        SkillType::None
    }
}

/// Classifies a luck value; the sign picks the lucky or unlucky side.
pub fn classify_luck(
    luck: f64,
    thresholds: &LuckThresholds,
    comparison: ThresholdComparison,
) -> LuckType {
    if luck > 0.0 {
        if comparison.exceeds(luck, thresholds.very_good) {
            LuckType::VeryGood
        } else if comparison.exceeds(luck, thresholds.good) {
            LuckType::Good
        } else {
            LuckType::None
        }
    } else if luck < 0.0 {
        if comparison.exceeds(-luck, thresholds.very_bad) {
            LuckType::VeryBad
        } else if comparison.exceeds(-luck, thresholds.bad) {
            LuckType::Bad
        } else {
            LuckType::None
        }
    } else {
        LuckType::None
    }
}
