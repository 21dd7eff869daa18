//! Chess engine integration
//!
//! Drives a UCI engine such as Stockfish as the automated opponent.

mod source;
pub mod stockfish;

pub use source::StockfishSource;
pub use stockfish::{EngineError, StockfishEngine};
