use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use engine::{Dice, GameEngine, GameOutcome, Side, WinKind};
use model::{CubeInfo, EquityVector, EvalContext, Evaluator};

/// A pure race: each side only has a pip count, the player on roll first.
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

pub fn roll_pips(dice: Dice) -> u32 {
    let total = (dice.0 + dice.1) as u32;
    if dice.is_double() {
        total * 2
    } else {
        total
    }
}

pub struct RaceGameEngine {
    /// Positions with both sides at or below this many pips count as covered by a bearoff database.
    pub bearoff_pips: u32,
}

impl RaceGameEngine {
    pub fn new() -> Self {
        Self { bearoff_pips: 0 }
    }
}

impl GameEngine for RaceGameEngine {
    type Board = RaceGameState;
    type Move = (RaceAction, u32);

    fn legal_moves(&self, board: &Self::Board, dice: Dice) -> Vec<Self::Move> {
        if board.pips[0] == 0 {
            return vec![];
        }

        let pips = roll_pips(dice);
        vec![(RaceAction::Half, pips / 2), (RaceAction::Full, pips)]
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

    fn in_bearoff_database(&self, board: &Self::Board) -> bool {
        board.pips.iter().all(|&p| p <= self.bearoff_pips)
    }
}

/// Winning chances from a logistic curve over the pip difference.
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

/// Remembers the search depths it was asked for.
pub struct RecordingEvaluator {
    pub plies: Mutex<HashSet<u8>>,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self {
            plies: Mutex::new(HashSet::new()),
        }
    }

    pub fn plies_seen(&self) -> HashSet<u8> {
        self.plies.lock().unwrap().clone()
    }
}

impl Evaluator for RecordingEvaluator {
    type Board = RaceGameState;

    fn evaluate(
        &self,
        board: &Self::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<EquityVector> {
        self.plies.lock().unwrap().insert(eval_context.plies);
        RaceEvaluator::new().evaluate(board, cube_info, eval_context)
    }
}

/// Fails once either side gets below the given pip count.
pub struct FailingEvaluator {
    pub below: u32,
}

impl Evaluator for FailingEvaluator {
    type Board = RaceGameState;

    fn evaluate(
        &self,
        board: &Self::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<EquityVector> {
        if board.pips.iter().any(|&p| p < self.below) {
            return Err(anyhow!("bearoff database missing"));
        }

        RaceEvaluator::new().evaluate(board, cube_info, eval_context)
    }
}

/// Panics the first time either side gets below the given pip count.
pub struct PanickingEvaluator {
    pub below: u32,
    pub fired: AtomicBool,
}

impl PanickingEvaluator {
    pub fn new(below: u32) -> Self {
        Self {
            below,
            fired: AtomicBool::new(false),
        }
    }
}

impl Evaluator for PanickingEvaluator {
    type Board = RaceGameState;

    fn evaluate(
        &self,
        board: &Self::Board,
        cube_info: &CubeInfo,
        eval_context: &EvalContext,
    ) -> Result<EquityVector> {
        if board.pips.iter().any(|&p| p < self.below) && !self.fired.swap(true, Ordering::SeqCst) {
            panic!("evaluator blew up on {:?}", board);
        }

        RaceEvaluator::new().evaluate(board, cube_info, eval_context)
    }
}
