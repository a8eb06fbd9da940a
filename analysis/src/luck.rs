use anyhow::Result;
use engine::{Dice, GameEngine};
use model::{mwc_to_equity, outcome_cubeful, CubeInfo, EvalContext, Evaluator};

use super::context::AnalysisContext;

/// Normalised equity for the player on roll after playing `dice` as well as possible.
pub fn best_equity_after_roll<G, E>(
    engine: &G,
    evaluator: &E,
    ctx: &AnalysisContext,
    board: &G::Board,
    cube_info: &CubeInfo,
    eval_context: &EvalContext,
    dice: Dice,
) -> Result<f64>
where
    G: GameEngine,
    E: Evaluator<Board = G::Board>,
{
    let opponent_ci = cube_info.swap_turn();
    let cubeful = eval_context.cubeful;

    let opponent_view = |next: &G::Board| -> Result<f64> {
        if let Some(outcome) = engine.game_over(next) {
            let value = outcome_cubeful(ctx.met, &opponent_ci, &outcome);
            let equity = if opponent_ci.is_money() {
                value
            } else {
                mwc_to_equity(ctx.met, &opponent_ci, value)
            };
            return Ok(-equity);
        }

        let ev = evaluator.evaluate(next, &opponent_ci, eval_context)?;
        Ok(-ctx.normalized_equity(&ev, &opponent_ci, cubeful))
    };

    let moves = engine.legal_moves(board, dice);
    if moves.is_empty() {
        return opponent_view(&engine.pass_turn(board));
    }

    let mut best = f64::NEG_INFINITY;
    for mv in &moves {
        best = best.max(opponent_view(&engine.apply_move(board, mv))?);
    }

    Ok(best)
}

/// Luck of rolling `dice`: the equity after its best play minus the average over all rolls. The
/// first roll of a game cannot be a double, so it is measured against the non-doubles only.
#[allow(clippy::too_many_arguments)]
pub fn roll_luck<G, E>(
    engine: &G,
    evaluator: &E,
    ctx: &AnalysisContext,
    board: &G::Board,
    cube_info: &CubeInfo,
    eval_context: &EvalContext,
    dice: Dice,
    first_roll: bool,
) -> Result<f64>
where
    G: GameEngine,
    E: Evaluator<Board = G::Board>,
{
    let normalize = |d: Dice| if d.0 < d.1 { Dice(d.1, d.0) } else { d };
    let rolled = normalize(dice);

    let mut rolled_equity = None;
    let mut sum = 0.0;
    let mut weight = 0.0;

    for (roll, w) in Dice::distinct_rolls() {
        if first_roll && roll.is_double() {
            continue;
        }

        let equity =
            best_equity_after_roll(engine, evaluator, ctx, board, cube_info, eval_context, roll)?;
        if normalize(roll) == rolled {
            rolled_equity = Some(equity);
        }

        sum += equity * w as f64;
        weight += w as f64;
    }

    let rolled_equity = match rolled_equity {
        Some(equity) => equity,
        None => anyhow::bail!("{:?} is not a legal roll here", dice),
    };

    Ok(rolled_equity - sum / weight)
}
