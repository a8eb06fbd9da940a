use std::fmt::Debug;

use super::dice::Dice;

/// Move generation and board bookkeeping supplied by the host engine.
///
/// Boards are always seen from the side of the player on roll. `apply_move` and `pass_turn`
/// return the board with the opponent on roll.
pub trait GameEngine {
    type Board: Clone + Debug + Send;
    type Move: Clone + Debug;

    fn legal_moves(&self, board: &Self::Board, dice: Dice) -> Vec<Self::Move>;
    fn apply_move(&self, board: &Self::Board, mv: &Self::Move) -> Self::Board;
    fn pass_turn(&self, board: &Self::Board) -> Self::Board;
    fn game_over(&self, board: &Self::Board) -> Option<GameOutcome>;

    /// Whether the position is covered by an external bearoff database.
    fn in_bearoff_database(&self, _board: &Self::Board) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    OnRoll,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WinKind {
    Single,
    Gammon,
    Backgammon,
}

impl WinKind {
    pub fn points(&self) -> u32 {
        match self {
            WinKind::Single => 1,
            WinKind::Gammon => 2,
            WinKind::Backgammon => 3,
        }
    }
}

/// A finished game, relative to the player on roll in the final board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Side,
    pub kind: WinKind,
}
