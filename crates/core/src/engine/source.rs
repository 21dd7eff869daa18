use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

use super::stockfish::{EngineError, StockfishEngine};
use crate::config::{DifficultyProfile, RigConfig};
use crate::error::Result;
use crate::opponent::OpponentMoveSource;
use crate::oracle::{RulesOracle, ShakmatyOracle};
use crate::position::{Move, ParseMoveError, Position};
use crate::session::Difficulty;

/// Opponent backed by a Stockfish process, weakened per difficulty.
pub struct StockfishSource {
    engine: StockfishEngine,
    easy: DifficultyProfile,
    hard: DifficultyProfile,
    oracle: ShakmatyOracle,
}

impl StockfishSource {
    pub fn spawn(config: &RigConfig) -> Result<Self> {
        let engine = StockfishEngine::new(&config.engine_path)?;
        info!(path = %config.engine_path, "stockfish started");
        Ok(Self {
            engine,
            easy: config.easy,
            hard: config.hard,
            oracle: ShakmatyOracle::new(),
        })
    }

    fn profile(&self, difficulty: Difficulty) -> DifficultyProfile {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Hard => self.hard,
        }
    }
}

impl OpponentMoveSource for StockfishSource {
    fn select(&mut self, position: &Position, difficulty: Difficulty) -> Result<Move> {
        let profile = self.profile(difficulty);

        self.engine.limit_strength(profile.elo)?;
        self.engine.set_position(Some(&position.fen()))?;
        let best = self.engine.best_move(profile.movetime_ms)?;
        let best: Move = best
            .parse()
            .map_err(|e: ParseMoveError| EngineError::ProtocolError(e.to_string()))?;

        let mut rng = rand::rng();
        if let Some(blunder) = pick_blunder(&self.oracle, position, profile.blunder_chance, &mut rng)? {
            debug!(%best, %blunder, "swapping engine move for a random one");
            return Ok(blunder);
        }
        Ok(best)
    }
}

/// With probability `chance`, picks a random legal move instead of the
/// engine's. Never blunders out of check or when only one move exists.
pub fn pick_blunder<O, R>(
    oracle: &O,
    position: &Position,
    chance: f64,
    rng: &mut R,
) -> Result<Option<Move>>
where
    O: RulesOracle + ?Sized,
    R: Rng + ?Sized,
{
    if chance <= 0.0 || !rng.random_bool(chance.min(1.0)) {
        return Ok(None);
    }
    if oracle.is_check(position)? {
        return Ok(None);
    }
    let moves = oracle.legal_moves(position)?;
    if moves.len() < 2 {
        return Ok(None);
    }
    Ok(moves.choose(rng).copied())
}
