use anyhow::Result;
use common::{Config, ConfigError, ConfigLoader};
use serde::{Deserialize, Serialize};

/// Equity losses beyond which a move is doubtful, bad or very bad.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillThresholds {
    pub doubtful: f64,
    pub bad: f64,
    pub very_bad: f64,
}

impl Default for SkillThresholds {
    fn default() -> Self {
        Self {
            doubtful: 0.04,
            bad: 0.08,
            very_bad: 0.16,
        }
    }
}

/// Luck magnitudes, symmetric around zero, beyond which a roll is lucky or unlucky.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LuckThresholds {
    pub very_bad: f64,
    pub bad: f64,
    pub good: f64,
    pub very_good: f64,
}

impl Default for LuckThresholds {
    fn default() -> Self {
        Self {
            very_bad: 0.6,
            bad: 0.3,
            good: 0.3,
            very_good: 0.6,
        }
    }
}

/// Whether a value exactly at a threshold falls into the worse category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdComparison {
    /// Only values beyond the threshold move to the worse category.
    #[default]
    Strict,
    Inclusive,
}

impl ThresholdComparison {
    pub fn exceeds(&self, magnitude: f64, threshold: f64) -> bool {
        match self {
            ThresholdComparison::Strict => magnitude > threshold,
            ThresholdComparison::Inclusive => magnitude >= threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub skill: SkillThresholds,
    pub luck: LuckThresholds,
    pub comparison: ThresholdComparison,
    /// A cube decision is close when doubling loses less than this against the optimal action.
    pub close_cube: f64,
    /// Equities closer than this are treated as equal.
    pub equity_epsilon: f64,
    pub fibs_rating_offset: f64,
    pub analyse_moves: bool,
    pub analyse_cube: bool,
    pub analyse_dice: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            skill: SkillThresholds::default(),
            luck: LuckThresholds::default(),
            comparison: ThresholdComparison::default(),
            close_cube: 0.16,
            equity_epsilon: 1e-5,
            fibs_rating_offset: 2050.0,
            analyse_moves: true,
            analyse_cube: true,
            analyse_dice: true,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let SkillThresholds {
            doubtful,
            bad,
            very_bad,
        } = self.skill;
        for (name, value) in [
            ("skill_doubtful", doubtful),
            ("skill_bad", bad),
            ("skill_very_bad", very_bad),
        ] {
            positive(name, value)?;
        }
        if !(doubtful <= bad && bad <= very_bad) {
            return Err(ConfigError::invalid(
                "skill",
                "thresholds must ascend from doubtful to very bad",
            ));
        }

        let luck = self.luck;
        for (name, value) in [
            ("luck_very_bad", luck.very_bad),
            ("luck_bad", luck.bad),
            ("luck_good", luck.good),
            ("luck_very_good", luck.very_good),
        ] {
            positive(name, value)?;
        }
        if luck.bad > luck.very_bad || luck.good > luck.very_good {
            return Err(ConfigError::invalid(
                "luck",
                "very good/bad thresholds must not be below good/bad",
            ));
        }

        positive("close_cube_threshold", self.close_cube)?;
        ConfigError::check_range("equity_epsilon", self.equity_epsilon, 0.0, 0.01)?;

        if !self.fibs_rating_offset.is_finite() {
            return Err(ConfigError::invalid("fibs_rating_offset", "must be finite"));
        }

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("{} must be positive", value)))
    }
}

impl Config for AnalysisOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let default = Self::default();
        let f64_or = |name: &str, default: f64| {
            config.get(name).and_then(|v| v.as_f64()).unwrap_or(default)
        };
        let bool_or = |name: &str, default: bool| {
            config.get(name).and_then(|v| v.as_bool()).unwrap_or(default)
        };

        let comparison = match config.get("threshold_comparison").and_then(|v| v.as_string()) {
            None => default.comparison,
            Some(s) if s.eq_ignore_ascii_case("strict") => ThresholdComparison::Strict,
            Some(s) if s.eq_ignore_ascii_case("inclusive") => ThresholdComparison::Inclusive,
            Some(s) => {
                let reason = format!("unknown mode `{}`", s);
                return Err(ConfigError::invalid("threshold_comparison", reason).into());
            }
        };

        let options = Self {
            skill: SkillThresholds {
                doubtful: f64_or("skill_doubtful", default.skill.doubtful),
                bad: f64_or("skill_bad", default.skill.bad),
                very_bad: f64_or("skill_very_bad", default.skill.very_bad),
            },
            luck: LuckThresholds {
                very_bad: f64_or("luck_very_bad", default.luck.very_bad),
                bad: f64_or("luck_bad", default.luck.bad),
                good: f64_or("luck_good", default.luck.good),
                very_good: f64_or("luck_very_good", default.luck.very_good),
            },
            comparison,
            close_cube: f64_or("close_cube_threshold", default.close_cube),
            equity_epsilon: f64_or("equity_epsilon", default.equity_epsilon),
            fibs_rating_offset: f64_or("fibs_rating_offset", default.fibs_rating_offset),
            analyse_moves: bool_or("analyse_moves", default.analyse_moves),
            analyse_cube: bool_or("analyse_cube", default.analyse_cube),
            analyse_dice: bool_or("analyse_dice", default.analyse_dice),
        };

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(contents: &str) -> Result<AnalysisOptions> {
        ConfigLoader::from_string(contents, "analysis".to_string())?.load::<AnalysisOptions>()
    }

    #[test]
    fn test_defaults() {
        let options = load("analysis {}").unwrap();

        assert_eq!(options, AnalysisOptions::default());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let options = load(
            r#"analysis {
                skill_very_bad = 0.2
                luck_very_good = 0.3
                threshold_comparison = "inclusive"
                fibs_rating_offset = 1500
            }"#,
        )
        .unwrap();

        assert_eq!(options.skill.very_bad, 0.2);
        assert_eq!(options.luck.very_good, 0.3);
        assert_eq!(options.comparison, ThresholdComparison::Inclusive);
        assert_eq!(options.fibs_rating_offset, 1500.0);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(load("analysis { skill_doubtful = 0.5 }").is_err());
        assert!(load("analysis { luck_good = -0.1 }").is_err());
        assert!(load("analysis { luck_very_good = 0.1 }").is_err());
        assert!(load("analysis { close_cube_threshold = 0 }").is_err());
        assert!(load(r#"analysis { threshold_comparison = "sometimes" }"#).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let options = AnalysisOptions::default();
        let json = serde_json::to_string(&options).unwrap();

        assert_eq!(serde_json::from_str::<AnalysisOptions>(&json).unwrap(), options);
    }
}
