use std::ops::{Index, IndexMut};

use engine::{GameOutcome, Side, WinKind};
use serde::{Deserialize, Serialize};

use super::cube::CubeInfo;

pub const NUM_OUTPUTS: usize = 7;

/// The named components of an [`EquityVector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Output {
    Win,
    WinGammon,
    WinBackgammon,
    LoseGammon,
    LoseBackgammon,
    CubelessEquity,
    CubefulEquity,
}

impl Output {
    pub const ALL: [Output; NUM_OUTPUTS] = [
        Output::Win,
        Output::WinGammon,
        Output::WinBackgammon,
        Output::LoseGammon,
        Output::LoseBackgammon,
        Output::CubelessEquity,
        Output::CubefulEquity,
    ];

    pub fn index(&self) -> usize {
        match self {
            Output::Win => 0,
            Output::WinGammon => 1,
            Output::WinBackgammon => 2,
            Output::LoseGammon => 3,
            Output::LoseBackgammon => 4,
            Output::CubelessEquity => 5,
            Output::CubefulEquity => 6,
        }
    }

    pub fn is_probability(&self) -> bool {
        !matches!(self, Output::CubelessEquity | Output::CubefulEquity)
    }
}

/// Outcome probabilities and equities for one position, from the side of the player on roll.
///
/// Gammon and backgammon probabilities are cumulative: `win_backgammon <= win_gammon <= win`.
/// The cubeful equity is normalised to the cube (money) or a match winning chance (match play).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityVector([f64; NUM_OUTPUTS]);

impl EquityVector {
    /// Builds a vector from outcome probabilities with the cubeless equity filled in.
    /// The cubeful equity starts equal to the cubeless one.
    pub fn from_probabilities(
        win: f64,
        win_gammon: f64,
        win_backgammon: f64,
        lose_gammon: f64,
        lose_backgammon: f64,
    ) -> Self {
        let cubeless =
            cubeless_equity(win, win_gammon, win_backgammon, lose_gammon, lose_backgammon);

        Self([win, win_gammon, win_backgammon, lose_gammon, lose_backgammon, cubeless, cubeless])
    }

    pub fn from_array(values: [f64; NUM_OUTPUTS]) -> Self {
        Self(values)
    }

    pub fn with_cubeful(mut self, cubeful: f64) -> Self {
        self[Output::CubefulEquity] = cubeful;
        self
    }

    /// The exact vector of a finished game as seen by the player on roll in the final board.
    pub fn from_outcome(outcome: &GameOutcome, cubeful: f64) -> Self {
        let gammon = if outcome.kind >= WinKind::Gammon {
            1.0
        } else {
            0.0
        };
        let backgammon = if outcome.kind == WinKind::Backgammon {
            1.0
        } else {
            0.0
        };

        match outcome.winner {
            Side::OnRoll => Self::from_probabilities(1.0, gammon, backgammon, 0.0, 0.0),
            Side::Opponent => Self::from_probabilities(0.0, 0.0, 0.0, gammon, backgammon),
        }
        .with_cubeful(cubeful)
    }

    pub fn as_array(&self) -> &[f64; NUM_OUTPUTS] {
        &self.0
    }

    pub fn win(&self) -> f64 {
        self[Output::Win]
    }

    pub fn win_gammon(&self) -> f64 {
        self[Output::WinGammon]
    }

    pub fn cubeless(&self) -> f64 {
        self[Output::CubelessEquity]
    }

    pub fn cubeful(&self) -> f64 {
        self[Output::CubefulEquity]
    }

    pub fn is_consistent(&self) -> bool {
        let [win, wg, wbg, lg, lbg, ..] = self.0;
        let lose = 1.0 - win;

        (0.0..=1.0).contains(&win)
            && (0.0..=win).contains(&wg)
            && (0.0..=wg).contains(&wbg)
            && (0.0..=lose).contains(&lg)
            && (0.0..=lg).contains(&lbg)
    }

    /// The same vector from the opponent's side.
    pub fn invert(&self, cube_info: &CubeInfo) -> Self {
        let [win, wg, wbg, lg, lbg, cubeless, cubeful] = self.0;
        let cubeful = if cube_info.is_money() {
            -cubeful
        } else {
            1.0 - cubeful
        };

        Self([1.0 - win, lg, lbg, wg, wbg, -cubeless, cubeful])
    }

    /// Clamps the probability outputs into `[0, 1]`, leaving the equities untouched.
    pub fn clamp_probabilities(mut self) -> Self {
        for output in Output::ALL.into_iter().filter(Output::is_probability) {
            self[output] = self[output].clamp(0.0, 1.0);
        }
        self
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self(self.0.map(f))
    }

    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
        let mut out = [0.0; NUM_OUTPUTS];
        for (i, o) in out.iter_mut().enumerate() {
            *o = f(self.0[i], other.0[i]);
        }
        Self(out)
    }
}

impl Index<Output> for EquityVector {
    type Output = f64;

    fn index(&self, output: Output) -> &f64 {
        &self.0[output.index()]
    }
}

impl IndexMut<Output> for EquityVector {
    fn index_mut(&mut self, output: Output) -> &mut f64 {
        &mut self.0[output.index()]
    }
}

pub fn cubeless_equity(
    win: f64,
    win_gammon: f64,
    win_backgammon: f64,
    lose_gammon: f64,
    lose_backgammon: f64,
) -> f64 {
    2.0 * win - 1.0 + win_gammon - lose_gammon + win_backgammon - lose_backgammon
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use engine::Player;

    use super::*;

    #[test]
    fn test_cubeless_equity() {
        let v = EquityVector::from_probabilities(0.6, 0.2, 0.01, 0.1, 0.005);

        assert_approx_eq!(v.cubeless(), 0.2 + 0.2 - 0.1 + 0.01 - 0.005, 1e-12);
        assert_eq!(v.cubeless(), v.cubeful());
        assert!(v.is_consistent());
    }

    #[test]
    fn test_inconsistent() {
        assert!(!EquityVector::from_probabilities(0.5, 0.6, 0.0, 0.0, 0.0).is_consistent());
        assert!(!EquityVector::from_probabilities(1.1, 0.0, 0.0, 0.0, 0.0).is_consistent());
        assert!(!EquityVector::from_probabilities(0.9, 0.1, 0.0, 0.2, 0.0).is_consistent());
    }

    #[test]
    fn test_invert_money_and_match() {
        let v = EquityVector::from_probabilities(0.7, 0.3, 0.05, 0.1, 0.01).with_cubeful(0.4);

        let money = v.invert(&CubeInfo::money(Player::Zero));
        assert_approx_eq!(money.win(), 0.3, 1e-12);
        assert_approx_eq!(money[Output::WinGammon], 0.1, 1e-12);
        assert_approx_eq!(money[Output::LoseGammon], 0.3, 1e-12);
        assert_approx_eq!(money.cubeless(), -v.cubeless(), 1e-12);
        assert_approx_eq!(money.cubeful(), -0.4, 1e-12);

        let matched = v.invert(&CubeInfo::match_play(7, [0, 0], Player::Zero));
        assert_approx_eq!(matched.cubeful(), 0.6, 1e-12);
        assert_eq!(matched.invert(&CubeInfo::match_play(7, [0, 0], Player::Zero)), v);
    }

    #[test]
    fn test_from_outcome() {
        let gammon = GameOutcome {
            winner: Side::OnRoll,
            kind: WinKind::Gammon,
        };
        let won = EquityVector::from_outcome(&gammon, 2.0);
        assert_eq!(won.as_array(), &[1.0, 1.0, 0.0, 0.0, 0.0, 2.0, 2.0]);

        let backgammon = GameOutcome {
            winner: Side::Opponent,
            kind: WinKind::Backgammon,
        };
        let lost = EquityVector::from_outcome(&backgammon, -3.0);
        assert_eq!(lost.cubeless(), -3.0);
        assert!(lost.is_consistent());
    }
}
