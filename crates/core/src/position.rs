//! Authoritative position record and the move value type

use std::fmt;
use std::str::FromStr;

use shakmaty::{fen::Fen, Bitboard, Board, Color, Piece, Rank, Role, Setup, Square};
use thiserror::Error;

/// A piece lifted from one square and set down on another.
///
/// Castling is written as the king's two-square step (`e1g1`), which is also
/// how the rig's controller and UCI engines spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, role: Role) -> Self {
        self.promotion = Some(role);
        self
    }

    /// Four-character square pair, promotion suffix stripped.
    pub fn square_pair(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid move notation: {0:?}")]
pub struct ParseMoveError(String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParseMoveError(s.to_string());

        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(invalid());
        }

        let from: Square = s[0..2].parse().map_err(|_| invalid())?;
        let to: Square = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match Role::from_char(c.to_ascii_lowercase()) {
                Some(role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight)) => Some(role),
                _ => return Err(invalid()),
            },
        };

        Ok(Move { from, to, promotion })
    }
}

/// Rank a side's king and rooks start on.
pub fn back_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::First,
        Color::Black => Rank::Eighth,
    }
}

/// Rank on which a pawn of `color` promotes.
pub fn promotion_rank(color: Color) -> Rank {
    back_rank(!color)
}

/// Full game state plus the repetition history of the current game.
///
/// Instances come from a [`RulesOracle`](crate::oracle::RulesOracle): the
/// initial position, FEN import, or applying a validated move. Positions
/// built from a snapshot keep the template's history and state and are only
/// used for comparison.
#[derive(Debug, Clone)]
pub struct Position {
    setup: Setup,
    /// Repetition keys of every position reached this game, current last.
    history: Vec<String>,
}

impl Position {
    /// Assembles a position from oracle-produced parts. The current key is
    /// appended to `history` if it is not already its last entry.
    pub fn from_parts(setup: Setup, mut history: Vec<String>) -> Self {
        let key = repetition_key(&setup);
        if history.last() != Some(&key) {
            history.push(key);
        }
        Self { setup, history }
    }

    /// The position reached after a move, extending this game's history.
    pub fn followed_by(&self, setup: Setup) -> Self {
        Self::from_parts(setup, self.history.clone())
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    pub fn board(&self) -> &Board {
        &self.setup.board
    }

    pub fn turn(&self) -> Color {
        self.setup.turn
    }

    pub fn halfmoves(&self) -> u32 {
        self.setup.halfmoves
    }

    pub fn fullmoves(&self) -> u32 {
        self.setup.fullmoves.get()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.setup.board.piece_at(square)
    }

    pub fn fen(&self) -> String {
        fen_of(&self.setup)
    }

    pub fn repetition_key(&self) -> String {
        repetition_key(&self.setup)
    }

    /// How many times the current position has occurred this game.
    pub fn occurrences(&self) -> usize {
        let key = self.repetition_key();
        self.history.iter().filter(|k| **k == key).count()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn same_placement(&self, other: &Position) -> bool {
        self.setup.board == other.setup.board
    }

    /// Same state and history, different piece placement.
    pub fn with_placement(&self, board: Board) -> Self {
        let mut setup = self.setup.clone();
        setup.board = board;
        Self {
            setup,
            history: self.history.clone(),
        }
    }

    /// Copy of this position with `color`'s castling rights removed.
    pub fn without_castling_rights(&self, color: Color) -> Self {
        let mut setup = self.setup.clone();
        setup.castling_rights &= !Bitboard::from_rank(back_rank(color));
        Self {
            setup,
            history: self.history.clone(),
        }
    }
}

fn fen_of(setup: &Setup) -> String {
    Fen::try_from_setup(setup.clone())
        .unwrap_or_else(|e| e.ignore())
        .to_string()
}

/// Placement, side to move, castling and en-passant fields of the FEN.
fn repetition_key(setup: &Setup) -> String {
    fen_of(setup)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}
