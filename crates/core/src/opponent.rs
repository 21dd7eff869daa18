//! Choosing the automated side's move
//!
//! The rig's mechanism can lift one piece and, for a capture, clear one
//! target square. It cannot castle or take en passant, so every proposal from
//! an [`OpponentMoveSource`] goes through [`select_guarded`] before it is
//! played.

use shakmaty::Role;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::oracle::{OracleError, RulesOracle};
use crate::position::{promotion_rank, Move, Position};
use crate::session::Difficulty;

/// Anything that can propose a move for the side to move.
pub trait OpponentMoveSource {
    fn select(&mut self, position: &Position, difficulty: Difficulty) -> Result<Move>;
}

impl<S: OpponentMoveSource + ?Sized> OpponentMoveSource for Box<S> {
    fn select(&mut self, position: &Position, difficulty: Difficulty) -> Result<Move> {
        (**self).select(position, difficulty)
    }
}

/// Asks `source` for a move the mechanism can execute.
///
/// The source sees `position` with the mover's castling rights removed.
/// Pawn moves to the last rank are always played as queen promotions. A
/// castle, an en-passant capture or an illegal proposal is thrown away and a
/// replacement requested, up to `max_attempts` times. After that the first
/// plain legal move is played. A failing source aborts the whole selection.
pub fn select_guarded<O, S>(
    oracle: &O,
    source: &mut S,
    position: &Position,
    difficulty: Difficulty,
    max_attempts: u32,
) -> Result<Move>
where
    O: RulesOracle + ?Sized,
    S: OpponentMoveSource + ?Sized,
{
    let view = position.without_castling_rights(position.turn());

    for attempt in 1..=max_attempts {
        let proposed = source.select(&view, difficulty)?;
        let mv = force_queen(position, proposed);

        match oracle.move_flags(position, &mv) {
            Ok(flags) if flags.is_special() => {
                warn!(attempt, %mv, "opponent proposed castling or en passant, asking again");
            }
            Ok(_) => {
                info!(attempt, %mv, difficulty = difficulty.as_str(), "opponent move selected");
                return Ok(mv);
            }
            Err(OracleError::IllegalMove(_)) => {
                warn!(attempt, %mv, "opponent proposed an illegal move, asking again");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let fallback = first_plain_move(oracle, position)?;
    warn!(%fallback, max_attempts, "no usable proposal, playing first plain legal move");
    Ok(fallback)
}

/// Rewrites any pawn move onto the last rank as a queen promotion.
fn force_queen(position: &Position, mv: Move) -> Move {
    let is_pawn = position
        .piece_at(mv.from)
        .is_some_and(|piece| piece.role == Role::Pawn && piece.color == position.turn());

    if is_pawn && mv.to.rank() == promotion_rank(position.turn()) {
        mv.with_promotion(Role::Queen)
    } else {
        mv
    }
}

fn first_plain_move<O: RulesOracle + ?Sized>(oracle: &O, position: &Position) -> Result<Move> {
    for mv in oracle.legal_moves(position)? {
        if matches!(mv.promotion, Some(role) if role != Role::Queen) {
            continue;
        }
        if !oracle.move_flags(position, &mv)?.is_special() {
            return Ok(mv);
        }
    }
    Err(Error::UpstreamUnavailable(format!(
        "no playable move in {}",
        position.fen()
    )))
}
