use analysis::{classify, AnalysisContext, AnalysisOptions, CubeClassification, CubeDecision};
use common::CancellationToken;
use engine::{Dice, DiceSource, GameEngine};
use itertools::Itertools;
use log::debug;
use model::{
    mwc_after_game, mwc_to_equity, normalized_equity, outcome_cubeful, CubeEquitySet, CubeInfo,
    CubeOwner, EquityVector, EvalContext, EvalType, Evaluator, MatchEquity,
};

use super::config::RolloutConfig;
use super::error::RolloutError;

/// Everything a trial reads. Shared by all workers.
pub(crate) struct TrialContext<'a, G, E, M> {
    pub engine: &'a G,
    pub evaluator: &'a E,
    pub met: &'a M,
    pub config: &'a RolloutConfig,
    pub cancel: &'a CancellationToken,
}

/// What the player on roll did with the cube.
enum CubeOutcome {
    NoDouble,
    /// Doubled and taken. The new cube state.
    Taken(CubeInfo),
    /// Doubled and passed. The final vector of the trial from the doubler's side.
    Passed(EquityVector),
}

impl<G, E, M> TrialContext<'_, G, E, M>
where
    G: GameEngine,
    E: Evaluator<Board = G::Board>,
    M: MatchEquity,
{
    /// Plays `board` out from the side of the player on roll. Returns `None` when cancelled part
    /// way.
    pub fn play<D: DiceSource>(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        dice: &mut D,
    ) -> Result<Option<EquityVector>, RolloutError> {
        let config = self.config;
        let initial_cube = cube_info.cube;
        let mut board = board.clone();
        let mut ci = *cube_info;
        let mut flipped = false;
        let mut ply = 0;
        let mut luck = EquityVector::default();

        let equity = loop {
            if let Some(outcome) = self.engine.game_over(&board) {
                let cubeful = outcome_cubeful(self.met, &ci, &outcome);
                let ev = EquityVector::from_outcome(&outcome, cubeful);
                break to_start(ev, &ci, flipped, initial_cube);
            }

            let truncate = config.truncate_at.map_or(false, |at| ply >= at)
                || (config.truncate_bearoff && self.engine.in_bearoff_database(&board));
            if truncate {
                let eval_context = EvalContext {
                    cubeful: config.cubeful,
                    ..config.truncation
                };
                let ev = self.evaluate(&board, &ci, &eval_context)?;
                break to_start(ev, &ci, flipped, initial_cube);
            }

            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            let may_double = ply > 0 || (config.cube_at_start && !config.initial_position);
            if config.cubeful && may_double && ci.cube_available() {
                match self.cube_action(&board, &ci, config.cube_context(ci.on_roll, ply))? {
                    CubeOutcome::NoDouble => {}
                    CubeOutcome::Taken(doubled) => ci = doubled,
                    CubeOutcome::Passed(ev) => break to_start(ev, &ci, flipped, initial_cube),
                }
            }

            let roll = dice.next_roll().map_err(RolloutError::Dice)?;

            if config.variance_reduction {
                let roll_luck = self.roll_luck(&board, &ci, flipped, ply, initial_cube, roll)?;
                luck = luck.zip_with(&roll_luck, |a, b| a + b);
            }

            board = self.play_roll(&board, &ci, roll, config.eval_context(ci.on_roll, ply))?;
            ci = ci.swap_turn();
            flipped = !flipped;
            ply += 1;
        };

        Ok(Some(equity.zip_with(&luck, |e, l| e - l)))
    }

    /// Offers the cube if the player on roll should double and answers it the way the opponent
    /// should.
    fn cube_action(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<CubeOutcome, RolloutError> {
        let eval_context = EvalContext {
            cubeful: true,
            ..*eval_context
        };
        let doubled = CubeInfo {
            cube: cube_info.cube.saturating_mul(2),
            owner: CubeOwner::Player(cube_info.on_roll.opponent()),
            ..*cube_info
        };

        let no_double = self.evaluate(board, cube_info, &eval_context)?;
        let mut double_take = self.evaluate(board, &doubled, &eval_context)?;
        if cube_info.is_money() {
            double_take = double_take.with_cubeful(2.0 * double_take.cubeful());
        }

        let equities = CubeEquitySet::from_evaluations(
            &no_double,
            &double_take,
            cube_info,
            self.met,
            EvalType::Evaluated,
        );
        let ctx = AnalysisContext::new(AnalysisOptions::default(), self.met);

        let decision = match classify(&equities, cube_info, &ctx) {
            CubeClassification::Classified(verdict) => verdict.decision,
            CubeClassification::NotClassifiable => return Ok(CubeOutcome::NoDouble),
        };

        Ok(match decision {
            CubeDecision::DoubleTake | CubeDecision::DoubleBeaver | CubeDecision::RedoubleTake => {
                debug!("Cube turned to {} in trial: {}", doubled.cube, decision);
                CubeOutcome::Taken(doubled)
            }
            CubeDecision::DoublePass | CubeDecision::RedoublePass => {
                let pass = if cube_info.is_money() {
                    1.0
                } else {
                    mwc_after_game(self.met, cube_info, cube_info.on_roll, cube_info.cube)
                };
                CubeOutcome::Passed(no_double.with_cubeful(pass))
            }
            _ => CubeOutcome::NoDouble,
        })
    }

    /// The board after the player on roll plays `roll` as well as `eval_context` sees it.
    fn play_roll(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        roll: Dice,
        eval_context: &EvalContext,
    ) -> Result<G::Board, RolloutError> {
        let moves = self.engine.legal_moves(board, roll);

        if moves.is_empty() {
            return Ok(self.engine.pass_turn(board));
        }

        let best = self.choose_move(board, cube_info, &moves, eval_context)?;
        Ok(self.engine.apply_move(board, &moves[best]))
    }

    /// How much better `roll` is than the average roll, from the side of the player the trial
    /// started with.
    ///
    /// Every roll is played at 0-ply and the result evaluated one ply shallower than the chequer
    /// play context.
    fn roll_luck(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        flipped: bool,
        ply: usize,
        initial_cube: u32,
        roll: Dice,
    ) -> Result<EquityVector, RolloutError> {
        let config = self.config;
        let chequer = config.eval_context(cube_info.on_roll, ply);
        let screen = EvalContext {
            plies: 0,
            deterministic: true,
            ..*chequer
        };
        let reduced = EvalContext {
            plies: chequer.plies.saturating_sub(1),
            deterministic: true,
            cubeful: config.cubeful,
            ..*chequer
        };
        let next_ci = cube_info.swap_turn();
        let no_doubles = config.initial_position && ply == 0;

        let mut total = EquityVector::default();
        let mut weights = 0;
        let mut rolled = None;

        let rolls = Dice::distinct_rolls().filter(|(dice, _)| !(no_doubles && dice.is_double()));
        for (dice, weight) in rolls {
            let next = self.play_roll(board, cube_info, dice, &screen)?;
            let ev = match self.engine.game_over(&next) {
                Some(outcome) => {
                    let cubeful = outcome_cubeful(self.met, &next_ci, &outcome);
                    EquityVector::from_outcome(&outcome, cubeful)
                }
                None => self.evaluate(&next, &next_ci, &reduced)?,
            };
            let ev = to_start(ev, &next_ci, !flipped, initial_cube);

            if dice == roll || dice == Dice(roll.1, roll.0) {
                rolled = Some(ev);
            }
            total = total.zip_with(&ev, |t, e| t + e * weight as f64);
            weights += weight;
        }

        let mean = total.map(|t| t / weights as f64);
        Ok(rolled.map_or_else(EquityVector::default, |ev| ev.zip_with(&mean, |e, m| e - m)))
    }

    /// Index of the best move. Moves are screened at 0-ply and the survivors of the move filter
    /// re-evaluated with `eval_context`.
    fn choose_move(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        moves: &[G::Move],
        eval_context: &EvalContext,
    ) -> Result<usize, RolloutError> {
        if moves.len() == 1 {
            return Ok(0);
        }

        let screen = EvalContext {
            plies: 0,
            ..*eval_context
        };
        let screened = moves
            .iter()
            .enumerate()
            .map(|(i, mv)| {
                self.equity_after(board, cube_info, mv, &screen)
                    .map(|equity| (i, equity))
            })
            .collect::<Result<Vec<_>, RolloutError>>()?
            .into_iter()
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
            .collect::<Vec<_>>();

        let filter = match self.config.move_filter(eval_context.plies) {
            Some(filter) if eval_context.plies > 0 => filter,
            _ => return Ok(screened[0].0),
        };

        let best_screened = screened[0].1;
        let survivors = screened
            .iter()
            .enumerate()
            .take_while(|(rank, (_, equity))| {
                let within = best_screened - equity <= filter.threshold;
                *rank < filter.accept.max(1) || (*rank < filter.accept + filter.extra && within)
            })
            .map(|(_, (i, _))| *i);

        let mut best = (screened[0].0, f64::NEG_INFINITY);
        for i in survivors {
            let equity = self.equity_after(board, cube_info, &moves[i], eval_context)?;
            if equity > best.1 {
                best = (i, equity);
            }
        }

        Ok(best.0)
    }

    /// Normalised equity for the mover after playing `mv`.
    fn equity_after(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        mv: &G::Move,
        eval_context: &EvalContext,
    ) -> Result<f64, RolloutError> {
        let next = self.engine.apply_move(board, mv);
        let opponent_ci = cube_info.swap_turn();

        if let Some(outcome) = self.engine.game_over(&next) {
            let value = outcome_cubeful(self.met, &opponent_ci, &outcome);
            let equity = if opponent_ci.is_money() {
                value
            } else {
                mwc_to_equity(self.met, &opponent_ci, value)
            };
            return Ok(-equity);
        }

        let ev = self.evaluate(&next, &opponent_ci, eval_context)?;
        Ok(-normalized_equity(self.met, &opponent_ci, &ev, eval_context.cubeful))
    }

    fn evaluate(
        &self,
        board: &G::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<EquityVector, RolloutError> {
        let ev = self
            .evaluator
            .evaluate(board, cube_info, eval_context)
            .map_err(RolloutError::Evaluator)?;

        if ev.is_consistent() {
            Ok(ev)
        } else {
            debug!("Clamping inconsistent evaluator output: {:?}", ev);
            Ok(ev.clamp_probabilities())
        }
    }
}

/// Turns a vector seen by the player on roll under `cube_info` into one seen by the player the
/// trial started with. Money equities are rescaled from the current cube to the starting cube.
fn to_start(
    ev: EquityVector,
    cube_info: &CubeInfo,
    flipped: bool,
    initial_cube: u32,
) -> EquityVector {
    let ev = if cube_info.is_money() {
        ev.with_cubeful(ev.cubeful() * cube_info.cube as f64 / initial_cube as f64)
    } else {
        ev
    };

    if flipped {
        ev.invert(cube_info)
    } else {
        ev
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use engine::Player;

    use super::*;

    #[test]
    fn test_to_start_rescales_money_cube() {
        let ci = CubeInfo {
            cube: 4,
            owner: CubeOwner::Player(Player::One),
            ..CubeInfo::money(Player::One)
        };
        let ev = EquityVector::from_probabilities(0.7, 0.1, 0.0, 0.0, 0.0).with_cubeful(0.5);

        let unflipped = to_start(ev, &ci, false, 2);
        assert_approx_eq!(unflipped.cubeful(), 1.0, 1e-12);
        assert_approx_eq!(unflipped.win(), 0.7, 1e-12);

        let flipped = to_start(ev, &ci, true, 1);
        assert_approx_eq!(flipped.cubeful(), -2.0, 1e-12);
        assert_approx_eq!(flipped.win(), 0.3, 1e-12);
        assert_approx_eq!(flipped.cubeless(), -ev.cubeless(), 1e-12);
    }

    #[test]
    fn test_to_start_keeps_match_winning_chance() {
        let ci = CubeInfo {
            cube: 2,
            ..CubeInfo::match_play(7, [2, 3], Player::Zero)
        };
        let ev = EquityVector::from_probabilities(0.6, 0.0, 0.0, 0.0, 0.0).with_cubeful(0.55);

        assert_approx_eq!(to_start(ev, &ci, false, 1).cubeful(), 0.55, 1e-12);
        assert_approx_eq!(to_start(ev, &ci, true, 1).cubeful(), 0.45, 1e-12);
    }
}
