//! Game status after a move

use std::fmt;

use shakmaty::Color;

use crate::oracle::{OracleError, RulesOracle};
use crate::position::Position;
use crate::session::side_label;

/// Occurrences of one position that end the game.
pub const REPETITION_LIMIT: usize = 3;
/// Half-moves without a capture or pawn move that end the game.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// `side` is in check.
    Check { side: Color },
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    Repetition,
    FiftyMoveRule,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing | GameStatus::Check { .. })
    }
}

/// Wire text sent to the controller.
impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => write!(f, "GAME_CONTINUES"),
            GameStatus::Check { side } => write!(f, "{} is CHECK", side_label(*side)),
            GameStatus::Checkmate { winner } => write!(f, "CHECKMATE: {} Wins", side_label(*winner)),
            GameStatus::Stalemate => write!(f, "STALEMATE"),
            GameStatus::InsufficientMaterial => write!(f, "DRAW INSUFFICIENT MATERIAL"),
            GameStatus::Repetition => write!(f, "DRAW REPETITION"),
            GameStatus::FiftyMoveRule => write!(f, "DRAW 50 MOVE RULE"),
        }
    }
}

/// Classifies `position`, terminal outcomes first.
pub fn evaluate<O: RulesOracle + ?Sized>(
    oracle: &O,
    position: &Position,
) -> Result<GameStatus, OracleError> {
    let to_move = position.turn();

    let status = if oracle.is_checkmate(position)? {
        GameStatus::Checkmate { winner: !to_move }
    } else if oracle.is_stalemate(position)? {
        GameStatus::Stalemate
    } else if oracle.is_insufficient_material(position)? {
        GameStatus::InsufficientMaterial
    } else if oracle.is_repetition(position, REPETITION_LIMIT)? {
        GameStatus::Repetition
    } else if position.halfmoves() >= FIFTY_MOVE_HALFMOVES {
        GameStatus::FiftyMoveRule
    } else if oracle.is_check(position)? {
        GameStatus::Check { side: to_move }
    } else {
        GameStatus::Ongoing
    };

    Ok(status)
}
