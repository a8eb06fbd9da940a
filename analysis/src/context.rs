use model::{normalized_equity, se_equity_to_mwc, CubeInfo, EquityVector, MatchEquity};

use super::options::AnalysisOptions;
use super::skill::{classify_luck, classify_skill, LuckType, SkillType};

/// Everything the classifiers and accumulators read besides the decision itself.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub options: AnalysisOptions,
    pub met: &'a dyn MatchEquity,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(options: AnalysisOptions, met: &'a dyn MatchEquity) -> Self {
        Self { options, met }
    }

    pub fn skill(&self, equity_loss: f64) -> SkillType {
        classify_skill(equity_loss, &self.options.skill, self.options.comparison)
    }

    pub fn luck(&self, luck: f64) -> LuckType {
        classify_luck(luck, &self.options.luck, self.options.comparison)
    }

    /// Converts a normalised equity difference into points at the current cube (money) or match
    /// winning chance.
    pub fn unnormalize(&self, equity: f64, cube_info: &CubeInfo) -> f64 {
        if cube_info.is_money() {
            cube_info.cube as f64 * equity
        } else {
            se_equity_to_mwc(self.met, cube_info, equity)
        }
    }

    pub fn normalized_equity(&self, ev: &EquityVector, cube_info: &CubeInfo, cubeful: bool) -> f64 {
        normalized_equity(self.met, cube_info, ev, cubeful)
    }

    pub fn is_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.options.equity_epsilon
    }
}

impl std::fmt::Debug for AnalysisContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext").field("options", &self.options).finish_non_exhaustive()
    }
}
