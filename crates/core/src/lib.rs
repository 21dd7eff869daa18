//! Chess Rig Core Library
//!
//! Control core for a physical chess board: reads the human's move off a
//! camera snapshot, answers with an engine move the mechanism can execute,
//! and keeps a line-token protocol with the board controller in step.

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod inference;
pub mod opponent;
pub mod oracle;
pub mod position;
pub mod protocol;
pub mod session;
pub mod snapshot;
pub mod status;

pub use config::{DifficultyProfile, RigConfig};
pub use controller::{ControllerSettings, SyncController};
pub use engine::StockfishSource;
pub use error::{Error, Result};
pub use inference::infer;
pub use opponent::OpponentMoveSource;
pub use oracle::{RulesOracle, ShakmatyOracle};
pub use position::{Move, Position};
pub use protocol::{Inbound, Outbound};
pub use session::{Difficulty, Phase};
pub use snapshot::{BoardSnapshot, JsonFileSnapshots, SnapshotSource};
pub use status::{evaluate, GameStatus};

/// Creates the standard starting position
pub fn starting_position() -> Position {
    ShakmatyOracle::new().initial_position()
}
