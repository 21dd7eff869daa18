//! Rules oracle: everything the rig needs to know about chess law
//!
//! The control core never computes legality itself. It asks a [`RulesOracle`],
//! which can be an in-process library ([`ShakmatyOracle`]) or anything else
//! that answers the same questions.

mod standard;

pub use standard::ShakmatyOracle;

use shakmaty::Board;
use thiserror::Error;

use crate::position::{Move, Position};

#[derive(Error, Debug, Clone)]
pub enum OracleError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Move {0} is not legal here")]
    IllegalMove(Move),

    #[error("Rules oracle unavailable: {0}")]
    Unavailable(String),
}

/// What kind of move a legal move is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub capture: bool,
    pub castle: bool,
    pub en_passant: bool,
}

impl MoveFlags {
    /// Castling and en passant, which the automated side never plays.
    pub fn is_special(&self) -> bool {
        self.castle || self.en_passant
    }
}

pub trait RulesOracle {
    fn initial_position(&self) -> Position;

    fn from_fen(&self, fen: &str) -> Result<Position, OracleError>;

    /// Places `board` into `template`'s turn, rights and clocks.
    fn from_placement(&self, template: &Position, board: Board) -> Position {
        template.with_placement(board)
    }

    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, OracleError>;

    fn is_legal(&self, position: &Position, mv: &Move) -> Result<bool, OracleError> {
        Ok(self.legal_moves(position)?.contains(mv))
    }

    /// Plays a legal move, extending the game history.
    fn apply(&self, position: &Position, mv: &Move) -> Result<Position, OracleError>;

    fn move_flags(&self, position: &Position, mv: &Move) -> Result<MoveFlags, OracleError>;

    fn is_check(&self, position: &Position) -> Result<bool, OracleError>;

    fn is_checkmate(&self, position: &Position) -> Result<bool, OracleError>;

    fn is_stalemate(&self, position: &Position) -> Result<bool, OracleError>;

    fn is_insufficient_material(&self, position: &Position) -> Result<bool, OracleError>;

    fn is_repetition(&self, position: &Position, count: usize) -> Result<bool, OracleError> {
        Ok(position.occurrences() >= count)
    }
}
