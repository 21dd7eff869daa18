//! Error types for chess-rig-core

use shakmaty::{Color, Square};
use thiserror::Error;

use crate::engine::EngineError;
use crate::oracle::OracleError;
use crate::position::Move;

/// Why a board diff could not be read as exactly one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    /// A piece of the side not on move showed up where it was not before.
    OpponentAppeared(Square),
    TooManyVacated,
    TooManyArrivals,
    TooManyCaptures,
    TooManyRemoved,
    /// A mover piece left a square but no destination was seen.
    MissingDestination(Square),
    /// An opposing piece vanished without any mover square changing.
    OpponentRemovedOnly(Square),
    /// An opposing piece vanished but the move is not an en-passant capture.
    UnexplainedRemoval(Square),
    NotCastling,
    /// The king made a castling step but its rook did not move.
    IncompleteCastle,
    /// A pawn took en passant but the captured pawn is still on `0`.
    CapturedPawnStillPresent(Square),
    Unrecognized {
        vacated: usize,
        arrivals: usize,
        captures: usize,
    },
}

impl std::fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ambiguity::OpponentAppeared(sq) => write!(f, "opposing piece appeared on {}", sq),
            Ambiguity::TooManyVacated => write!(f, "more than two mover squares vacated"),
            Ambiguity::TooManyArrivals => write!(f, "more than two mover arrivals"),
            Ambiguity::TooManyCaptures => write!(f, "more than one capture"),
            Ambiguity::TooManyRemoved => write!(f, "more than one opposing piece removed"),
            Ambiguity::MissingDestination(sq) => write!(f, "piece left {} with no destination", sq),
            Ambiguity::OpponentRemovedOnly(sq) => {
                write!(f, "opposing piece removed from {} but no mover piece moved", sq)
            }
            Ambiguity::UnexplainedRemoval(sq) => {
                write!(f, "opposing piece removed from {} by a non en-passant move", sq)
            }
            Ambiguity::NotCastling => write!(f, "two pieces moved but not as a castle"),
            Ambiguity::IncompleteCastle => write!(f, "king castled but the rook was not moved"),
            Ambiguity::CapturedPawnStillPresent(sq) => {
                write!(f, "en-passant capture but the pawn on {} was not removed", sq)
            }
            Ambiguity::Unrecognized { vacated, arrivals, captures } => write!(
                f,
                "unrecognized pattern ({} vacated, {} arrivals, {} captures)",
                vacated, arrivals, captures
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Ambiguous transition: {0}")]
    AmbiguousTransition(Ambiguity),

    #[error("Illegal move: {0}")]
    IllegalMove(Move),

    #[error("Move played out of turn: {0:?} to move")]
    OutOfTurn(Color),

    #[error("Board unchanged since last confirmed position")]
    NoChange,

    #[error("Unexpected token {token:?} in phase {phase}")]
    ProtocolDesync { token: String, phase: &'static str },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Controller stalled: no {expected} within {secs}s")]
    Stalled { expected: &'static str, secs: u64 },

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OracleError> for Error {
    fn from(error: OracleError) -> Self {
        match error {
            OracleError::IllegalMove(mv) => Error::IllegalMove(mv),
            other => Error::UpstreamUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
