use common::ConfigError;
use engine::{GameOutcome, Player, Side, WinKind};

use super::cube::CubeInfo;
use super::equity::EquityVector;

/// Source of match winning chances.
pub trait MatchEquity {
    /// Winning chance for a player `away` points from victory against an opponent `opp_away` away.
    /// `post_crawford` is set once the Crawford game has been played.
    fn mwc(&self, away: i64, opp_away: i64, post_crawford: bool) -> f64;
}

/// A match equity table for matches up to `len` points.
///
/// `pre[i][j]` is the chance of a player `i + 1` away against `j + 1` away before the Crawford game
/// has been played (a 1-away entry is the Crawford game itself). `post[j]` is the chance of the
/// 1-away leader against a trailer `j + 1` away after the Crawford game.
#[derive(Clone, Debug)]
pub struct TableMatchEquity {
    pre: Vec<Vec<f64>>,
    post: Vec<f64>,
}

impl TableMatchEquity {
    pub fn from_rows(pre: Vec<Vec<f64>>, post: Vec<f64>) -> Result<Self, ConfigError> {
        let len = pre.len();
        if len == 0 {
            return Err(ConfigError::invalid("match_equity", "table is empty"));
        }

        if pre.iter().any(|row| row.len() != len) || post.len() != len {
            return Err(ConfigError::invalid(
                "match_equity",
                format!("table must be {len} x {len} with {len} post-Crawford entries"),
            ));
        }

        for &v in pre.iter().flatten().chain(post.iter()) {
            ConfigError::check_range("match_equity", v, 0.0, 1.0)?;
        }

        Ok(Self { pre, post })
    }

    /// A cubeless table from even single games where a fraction `gammon_rate` of wins are gammons.
    /// The trailer doubles every post-Crawford game.
    pub fn generated(len: usize, gammon_rate: f64) -> Result<Self, ConfigError> {
        if len == 0 {
            return Err(ConfigError::invalid("match_length", "must be positive"));
        }
        ConfigError::check_range("gammon_rate", gammon_rate, 0.0, 1.0)?;

        let g = gammon_rate;

        let mut trailer = vec![0.0; len + 1];
        let trailer_at = |t: &[f64], b: i64| if b <= 0 { 1.0 } else { t[b as usize] };
        for b in 1..=len {
            let b = b as i64;
            let value =
                0.5 * ((1.0 - g) * trailer_at(&trailer, b - 2) + g * trailer_at(&trailer, b - 4));
            trailer[b as usize] = value;
        }
        let post: Vec<f64> = trailer[1..].iter().map(|t| 1.0 - t).collect();

        let post_at = |b: i64| if b <= 0 { 0.0 } else { post[b as usize - 1] };
        let mut pre = vec![vec![0.0; len]; len];

        for total in 2..=(2 * len) {
            for a in 1..=len.min(total - 1) {
                let b = total - a;
                if b == 0 || b > len {
                    continue;
                }

                let value = if a == 1 && b == 1 {
                    0.5
                } else if a == 1 {
                    0.5 + 0.5 * ((1.0 - g) * post_at(b as i64 - 1) + g * post_at(b as i64 - 2))
                } else if b == 1 {
                    let single = 1.0 - post_at(a as i64 - 1);
                    let gammon = 1.0 - post_at(a as i64 - 2);
                    0.5 * ((1.0 - g) * single + g * gammon)
                } else {
                    let at = |x: i64, y: i64| {
                        if x <= 0 {
                            1.0
                        } else if y <= 0 {
                            0.0
                        } else {
                            pre[x as usize - 1][y as usize - 1]
                        }
                    };
                    let (a, b) = (a as i64, b as i64);

                    0.5 * (1.0 - g) * (at(a - 1, b) + at(a, b - 1))
                        + 0.5 * g * (at(a - 2, b) + at(a, b - 2))
                };

                pre[a - 1][b - 1] = value;
            }
        }

        Ok(Self { pre, post })
    }

    pub fn len(&self) -> usize {
        self.pre.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty()
    }

    fn clamp(&self, away: i64) -> usize {
        (away as usize).min(self.len()) - 1
    }
}

impl MatchEquity for TableMatchEquity {
    fn mwc(&self, away: i64, opp_away: i64, post_crawford: bool) -> f64 {
        if away <= 0 {
            return 1.0;
        }
        if opp_away <= 0 {
            return 0.0;
        }

        if post_crawford && away == 1 {
            return self.post[self.clamp(opp_away)];
        }
        if post_crawford && opp_away == 1 {
            return 1.0 - self.post[self.clamp(away)];
        }

        self.pre[self.clamp(away)][self.clamp(opp_away)]
    }
}

/// Winning chance of the player on roll at the current score.
pub fn mwc_at_score<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo) -> f64 {
    let p = ci.on_roll;
    met.mwc(ci.away(p), ci.away(p.opponent()), ci.post_crawford)
}

/// Winning chance of the player on roll after `winner` takes `points` in this game.
pub fn mwc_after_game<M: MatchEquity + ?Sized>(
    met: &M,
    ci: &CubeInfo,
    winner: Player,
    points: u32,
) -> f64 {
    let p = ci.on_roll;
    let points = points as i64;
    let away = |player: Player| ci.away(player) - if player == winner { points } else { 0 };

    met.mwc(away(p), away(p.opponent()), ci.post_crawford || ci.crawford)
}

/// Winning chances of the player on roll after winning and after losing a single game at the
/// current cube.
pub fn win_lose_mwc<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo) -> (f64, f64) {
    (
        mwc_after_game(met, ci, ci.on_roll, ci.cube),
        mwc_after_game(met, ci, ci.on_roll.opponent(), ci.cube),
    )
}

pub fn mwc_to_equity<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo, mwc: f64) -> f64 {
    let (win, lose) = win_lose_mwc(met, ci);
    (2.0 * mwc - (win + lose)) / (win - lose)
}

pub fn equity_to_mwc<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo, equity: f64) -> f64 {
    let (win, lose) = win_lose_mwc(met, ci);
    0.5 * (equity * (win - lose) + (win + lose))
}

/// Converts an equity difference or standard error into match winning chance units.
pub fn se_equity_to_mwc<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo, equity: f64) -> f64 {
    let (win, lose) = win_lose_mwc(met, ci);
    0.5 * equity * (win - lose)
}

pub fn se_mwc_to_equity<M: MatchEquity + ?Sized>(met: &M, ci: &CubeInfo, mwc: f64) -> f64 {
    let (win, lose) = win_lose_mwc(met, ci);
    2.0 / (win - lose) * mwc
}

/// The cubeful value of a finished game for the player on roll: for money play the points won or
/// lost normalised to the cube (a single game is worth 1 whatever the cube), for match play the
/// resulting match winning chance.
pub fn outcome_cubeful<M: MatchEquity + ?Sized>(
    met: &M,
    ci: &CubeInfo,
    outcome: &GameOutcome,
) -> f64 {
    let kind = if ci.gammons_count() {
        outcome.kind
    } else {
        WinKind::Single
    };
    let winner = match outcome.winner {
        Side::OnRoll => ci.on_roll,
        Side::Opponent => ci.on_roll.opponent(),
    };

    if ci.is_money() {
        let points = kind.points() as f64;
        return if winner == ci.on_roll {
            points
        } else {
            -points
        };
    }

    mwc_after_game(met, ci, winner, kind.points() * ci.cube)
}

/// A single equity for the player on roll, normalised to the current cube.
pub fn normalized_equity<M: MatchEquity + ?Sized>(
    met: &M,
    ci: &CubeInfo,
    ev: &EquityVector,
    cubeful: bool,
) -> f64 {
    match (cubeful, ci.is_money()) {
        (false, _) => ev.cubeless(),
        (true, true) => ev.cubeful(),
        (true, false) => mwc_to_equity(met, ci, ev.cubeful()),
    }
}
