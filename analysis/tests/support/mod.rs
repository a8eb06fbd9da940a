#![allow(dead_code)]

use anyhow::Result;
use engine::{Dice, GameEngine, GameOutcome, Side, WinKind};
use model::{CubeInfo, EquityVector, EvalContext, Evaluator};

/// Pip counts, the player on roll first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaceGameState {
    pub pips: [u32; 2],
}

impl RaceGameState {
    pub fn new(on_roll: u32, opponent: u32) -> Self {
        Self {
            pips: [on_roll, opponent],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceAction {
    Full,
    Half,
}

pub struct RaceGameEngine {}

impl RaceGameEngine {
    pub fn new() -> Self {
        Self {}
    }
}

fn roll_pips(dice: Dice) -> u32 {
    let total = (dice.0 + dice.1) as u32;
    if dice.is_double() {
        total * 2
    } else {
        total
    }
}

impl GameEngine for RaceGameEngine {
    type Board = RaceGameState;
    type Move = (RaceAction, u32);

    fn legal_moves(&self, board: &Self::Board, dice: Dice) -> Vec<Self::Move> {
        if board.pips[0] == 0 {
            return vec![];
        }

        vec![(RaceAction::Full, roll_pips(dice)), (RaceAction::Half, roll_pips(dice) / 2)]
    }

    fn apply_move(&self, board: &Self::Board, mv: &Self::Move) -> Self::Board {
        RaceGameState::new(board.pips[1], board.pips[0].saturating_sub(mv.1))
    }

    fn pass_turn(&self, board: &Self::Board) -> Self::Board {
        RaceGameState::new(board.pips[1], board.pips[0])
    }

    fn game_over(&self, board: &Self::Board) -> Option<GameOutcome> {
        if board.pips[1] == 0 {
            let kind = if board.pips[0] >= 100 {
                WinKind::Gammon
            } else {
                WinKind::Single
            };
            Some(GameOutcome {
                winner: Side::Opponent,
                kind,
            })
        } else {
            None
        }
    }
}

/// Winning chances from a logistic curve over the pip difference, with a fixed on-roll bonus.
pub struct RaceEvaluator {}

impl RaceEvaluator {
    pub fn new() -> Self {
        Self {}
    }

    pub fn win(board: &RaceGameState) -> f64 {
        let [own, opp] = board.pips.map(|p| p as f64);
        let x = 0.6 * (opp - own + 4.0) / (own + opp).sqrt().max(1.0);
        1.0 / (1.0 + (-x).exp())
    }
}

impl Evaluator for RaceEvaluator {
    type Board = RaceGameState;

    fn evaluate(
        &self,
        board: &Self::Board,
        _cube_info: &CubeInfo,
        _eval_context: &EvalContext,
    ) -> Result<EquityVector> {
        Ok(EquityVector::from_probabilities(Self::win(board), 0.0, 0.0, 0.0, 0.0))
    }
}
