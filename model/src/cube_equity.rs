use serde::{Deserialize, Serialize};

use super::cube::CubeInfo;
use super::equity::EquityVector;
use super::evaluator::EvalType;
use super::match_equity::{mwc_after_game, mwc_to_equity, MatchEquity};

/// Cubeful equities of the doubler's candidate cube actions, normalised to the current cube.
///
/// Match winning chances are converted to equities before they land here, so a pass is always worth
/// `1.0` when built from evaluations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeEquitySet {
    pub no_double: f64,
    pub double_take: f64,
    pub double_pass: f64,
    /// Equity after the opponent beavers, when given explicitly.
    pub double_beaver: Option<f64>,
    /// Gammon chances of the doubler in the no-double line.
    pub win_gammon: f64,
    pub eval_type: EvalType,
}

impl CubeEquitySet {
    pub fn new(no_double: f64, double_take: f64, double_pass: f64) -> Self {
        Self {
            no_double,
            double_take,
            double_pass,
            double_beaver: None,
            win_gammon: 0.0,
            eval_type: EvalType::Evaluated,
        }
    }

    pub fn with_gammons(self, win_gammon: f64) -> Self {
        Self { win_gammon, ..self }
    }

    pub fn with_beaver(self, double_beaver: f64) -> Self {
        Self {
            double_beaver: Some(double_beaver),
            ..self
        }
    }

    pub fn with_eval_type(self, eval_type: EvalType) -> Self {
        Self { eval_type, ..self }
    }

    /// Builds the set from the evaluator's no-double and double/take vectors for the player on
    /// roll.
    pub fn from_evaluations<M: MatchEquity + ?Sized>(
        no_double: &EquityVector,
        double_take: &EquityVector,
        cube_info: &CubeInfo,
        met: &M,
        eval_type: EvalType,
    ) -> Self {
        let (nd, dt, dp) = if cube_info.is_money() {
            (no_double.cubeful(), double_take.cubeful(), 1.0)
        } else {
            let pass_mwc = mwc_after_game(met, cube_info, cube_info.on_roll, cube_info.cube);
            (
                mwc_to_equity(met, cube_info, no_double.cubeful()),
                mwc_to_equity(met, cube_info, double_take.cubeful()),
                mwc_to_equity(met, cube_info, pass_mwc),
            )
        };

        Self {
            win_gammon: no_double.win_gammon(),
            eval_type,
            ..Self::new(nd, dt, dp)
        }
    }

    /// The opponent answers a double with whatever is worse for the doubler.
    pub fn response(&self) -> f64 {
        self.double_take.min(self.double_pass)
    }

    pub fn is_evaluated(&self) -> bool {
        self.eval_type != EvalType::None
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use engine::Player;

    use super::*;
    use crate::match_equity::{equity_to_mwc, TableMatchEquity};

    #[test]
    fn test_from_match_evaluations() {
        let met = TableMatchEquity::generated(7, 0.2).unwrap();
        let ci = CubeInfo::match_play(7, [3, 1], Player::Zero);

        let nd = EquityVector::from_probabilities(0.7, 0.2, 0.0, 0.05, 0.0)
            .with_cubeful(equity_to_mwc(&met, &ci, 0.45));
        let dt = nd.with_cubeful(equity_to_mwc(&met, &ci, 0.6));

        let set = CubeEquitySet::from_evaluations(&nd, &dt, &ci, &met, EvalType::Evaluated);

        assert_approx_eq!(set.no_double, 0.45, 1e-12);
        assert_approx_eq!(set.double_take, 0.6, 1e-12);
        assert_approx_eq!(set.double_pass, 1.0, 1e-12);
        assert_approx_eq!(set.win_gammon, 0.2, 1e-12);
        assert_approx_eq!(set.response(), 0.6, 1e-12);
    }

    #[test]
    fn test_from_money_evaluations() {
        let met = TableMatchEquity::generated(1, 0.0).unwrap();
        let ci = CubeInfo::money(Player::One);
        let nd = EquityVector::default().with_cubeful(0.8);
        let dt = EquityVector::default().with_cubeful(1.3);

        let set = CubeEquitySet::from_evaluations(&nd, &dt, &ci, &met, EvalType::Rollout);

        assert_eq!(set.double_pass, 1.0);
        assert_eq!(set.response(), 1.0);
        assert_eq!(set.eval_type, EvalType::Rollout);
    }
}
