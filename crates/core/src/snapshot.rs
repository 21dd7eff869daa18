//! Board snapshots reported by the vision process

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shakmaty::{Board, Color, Piece, Role, Square};
use tracing::debug;

use crate::error::{Error, Result};
use crate::oracle::RulesOracle;
use crate::position::Position;

/// One detection pass: which piece the camera saw on which square.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    board: Board,
}

impl BoardSnapshot {
    pub fn empty() -> Self {
        Self {
            board: Board::empty(),
        }
    }

    /// The snapshot a perfect camera would report for `position`.
    pub fn from_position(position: &Position) -> Self {
        Self {
            board: position.board().clone(),
        }
    }

    /// Builds a snapshot from `(square label, piece code)` pairs.
    ///
    /// Piece codes are FEN letters (`P`, `n`) or detector class labels
    /// (`white-pawn`, `black-knight`). A later entry for the same square
    /// replaces an earlier one.
    pub fn from_labels<I, K, V>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut snapshot = Self::empty();
        for (square, code) in labels {
            let (square, code) = (square.as_ref().trim(), code.as_ref());
            let sq: Square = square
                .parse()
                .map_err(|_| Error::Snapshot(format!("unknown square {:?}", square)))?;
            let piece = parse_piece(code)
                .ok_or_else(|| Error::Snapshot(format!("unknown piece code {:?} on {}", code, sq)))?;
            snapshot.place(sq, piece);
        }
        Ok(snapshot)
    }

    /// Parses a JSON object mapping square labels to piece codes.
    pub fn from_json(json: &str) -> Result<Self> {
        let labels: BTreeMap<String, String> = serde_json::from_str(json)?;
        Self::from_labels(labels)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    pub fn place(&mut self, square: Square, piece: Piece) {
        self.board.set_piece_at(square, piece);
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.board.remove_piece_at(square)
    }

    pub fn piece_count(&self) -> usize {
        self.board.occupied().count()
    }

    /// Reads this placement into `template`'s turn, castling rights and clocks.
    pub fn to_position<O: RulesOracle + ?Sized>(&self, template: &Position, oracle: &O) -> Position {
        oracle.from_placement(template, self.board.clone())
    }
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

fn parse_piece(code: &str) -> Option<Piece> {
    let code = code.trim();
    let mut chars = code.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Piece::from_char(c);
    }

    let (color, role) = code.split_once('-')?;
    let color = match color.to_ascii_lowercase().as_str() {
        "white" => Color::White,
        "black" => Color::Black,
        _ => return None,
    };
    let role = match role.to_ascii_lowercase().as_str() {
        "pawn" => Role::Pawn,
        "knight" => Role::Knight,
        "bishop" => Role::Bishop,
        "rook" => Role::Rook,
        "queen" => Role::Queen,
        "king" => Role::King,
        _ => return None,
    };
    Some(Piece { color, role })
}

/// Anything that can produce the current board as the camera sees it.
pub trait SnapshotSource {
    fn capture(&mut self) -> Result<BoardSnapshot>;
}

/// Reads the latest detection the vision process wrote to disk.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshots {
    path: PathBuf,
}

impl JsonFileSnapshots {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for JsonFileSnapshots {
    fn capture(&mut self) -> Result<BoardSnapshot> {
        let contents = fs::read_to_string(&self.path)?;
        let snapshot = BoardSnapshot::from_json(&contents)?;
        debug!(path = %self.path.display(), pieces = snapshot.piece_count(), "captured snapshot");
        Ok(snapshot)
    }
}
