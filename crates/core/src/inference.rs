//! Move inference: reading exactly one move out of two board observations
//!
//! Every square is compared between the last confirmed position and the new
//! snapshot. The changed squares must form one of two shapes, a single piece
//! relocation (optionally onto an opposing piece) or a castle. Anything else
//! is reported as ambiguous; the inferencer never guesses. A move that has the
//! right shape is then checked against the rules oracle.

use shakmaty::{Color, File, Role, Square};
use tracing::{debug, info};

use crate::error::{Ambiguity, Error, Result};
use crate::oracle::RulesOracle;
use crate::position::{back_rank, promotion_rank, Move, Position};
use crate::snapshot::BoardSnapshot;

const MAX_VACATED: usize = 2;
const MAX_ARRIVALS: usize = 2;
const MAX_CAPTURES: usize = 1;

/// Squares that changed between a position and a snapshot, seen from the
/// side to move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SquareChanges {
    /// Held a mover piece, now empty.
    pub vacated: Vec<Square>,
    /// Was empty, now holds a mover piece.
    pub quiet: Vec<Square>,
    /// Held an opposing piece, now holds a mover piece.
    pub captures: Vec<Square>,
    /// Held an opposing piece, now empty (en passant only).
    pub removed: Option<Square>,
}

impl SquareChanges {
    /// Classifies every square, failing as soon as a bound is exceeded.
    pub fn classify(previous: &Position, snapshot: &BoardSnapshot) -> Result<Self> {
        let mover = previous.turn();
        let mut changes = SquareChanges::default();

        for sq in Square::ALL {
            let before = previous.piece_at(sq);
            let after = snapshot.piece_at(sq);

            match (before, after) {
                (None, None) => {}
                (Some(b), None) if b.color == mover => {
                    changes.vacated.push(sq);
                    if changes.vacated.len() > MAX_VACATED {
                        return Err(ambiguous(Ambiguity::TooManyVacated));
                    }
                }
                (Some(_), None) => {
                    if changes.removed.is_some() {
                        return Err(ambiguous(Ambiguity::TooManyRemoved));
                    }
                    changes.removed = Some(sq);
                }
                (None, Some(a)) if a.color == mover => {
                    changes.quiet.push(sq);
                    changes.check_arrivals()?;
                }
                (Some(b), Some(a)) if a.color == mover && b.color != mover => {
                    changes.captures.push(sq);
                    if changes.captures.len() > MAX_CAPTURES {
                        return Err(ambiguous(Ambiguity::TooManyCaptures));
                    }
                    changes.check_arrivals()?;
                }
                (_, Some(a)) if a.color != mover && before.map_or(true, |b| b.color == mover) => {
                    return Err(ambiguous(Ambiguity::OpponentAppeared(sq)));
                }
                // Same side still on the square.
                _ => {}
            }
        }

        Ok(changes)
    }

    pub fn arrivals(&self) -> usize {
        self.quiet.len() + self.captures.len()
    }

    fn check_arrivals(&self) -> Result<()> {
        if self.arrivals() > MAX_ARRIVALS {
            return Err(ambiguous(Ambiguity::TooManyArrivals));
        }
        Ok(())
    }

    /// Turns the classified squares into a single move, without consulting
    /// the rules oracle.
    pub fn resolve(&self, previous: &Position) -> Result<Move> {
        match (self.vacated.len(), self.quiet.len(), self.captures.len()) {
            (1, 1, 0) | (1, 0, 1) => self.relocation(previous),
            (2, 2, 0) => self.castle(previous),
            (0, 0, 0) => match self.removed {
                Some(sq) => Err(ambiguous(Ambiguity::OpponentRemovedOnly(sq))),
                None => Err(Error::NoChange),
            },
            (_, 0, 0) => Err(ambiguous(Ambiguity::MissingDestination(self.vacated[0]))),
            (2, _, _) if self.arrivals() == 2 => Err(ambiguous(Ambiguity::NotCastling)),
            _ => Err(self.unrecognized()),
        }
    }

    fn relocation(&self, previous: &Position) -> Result<Move> {
        let mover = previous.turn();
        let from = self.vacated[0];
        let to = match (self.quiet.first(), self.captures.first()) {
            (Some(sq), _) | (None, Some(sq)) => *sq,
            (None, None) => return Err(self.unrecognized()),
        };
        let is_pawn = previous.piece_at(from).map(|p| p.role) == Some(Role::Pawn);

        if let Some(removed) = self.removed {
            let en_passant = is_pawn
                && self.captures.is_empty()
                && from.file() != to.file()
                && removed == Square::from_coords(to.file(), from.rank());
            if !en_passant {
                return Err(ambiguous(Ambiguity::UnexplainedRemoval(removed)));
            }
        }

        let mv = Move::new(from, to);
        if is_pawn && to.rank() == promotion_rank(mover) {
            // Under-promotion is never inferred.
            return Ok(mv.with_promotion(Role::Queen));
        }
        Ok(mv)
    }

    fn castle(&self, previous: &Position) -> Result<Move> {
        if let Some(removed) = self.removed {
            return Err(ambiguous(Ambiguity::UnexplainedRemoval(removed)));
        }

        let mover = previous.turn();
        for (king_from, king_to, rook_from, rook_to) in castling_squares(mover) {
            let is_king = previous.piece_at(king_from).map(|p| p.role) == Some(Role::King);
            if is_king
                && same_squares(&self.vacated, [king_from, rook_from])
                && same_squares(&self.quiet, [king_to, rook_to])
            {
                return Ok(Move::new(king_from, king_to));
            }
        }
        Err(ambiguous(Ambiguity::NotCastling))
    }

    fn unrecognized(&self) -> Error {
        ambiguous(Ambiguity::Unrecognized {
            vacated: self.vacated.len(),
            arrivals: self.arrivals(),
            captures: self.captures.len(),
        })
    }
}

/// (king from, king to, rook from, rook to) for the king side and queen side.
fn castling_squares(color: Color) -> [(Square, Square, Square, Square); 2] {
    let rank = back_rank(color);
    let at = |file| Square::from_coords(file, rank);
    [
        (at(File::E), at(File::G), at(File::H), at(File::F)),
        (at(File::E), at(File::C), at(File::A), at(File::D)),
    ]
}

fn same_squares(found: &[Square], mut expected: [Square; 2]) -> bool {
    expected.sort();
    let mut found = found.to_vec();
    found.sort();
    found == expected
}

fn ambiguous(reason: Ambiguity) -> Error {
    Error::AmbiguousTransition(reason)
}

/// Deduces the one move that turns `previous` into what `snapshot` shows.
pub fn infer<O: RulesOracle + ?Sized>(
    oracle: &O,
    previous: &Position,
    snapshot: &BoardSnapshot,
) -> Result<Move> {
    let changes = SquareChanges::classify(previous, snapshot)?;
    debug!(?changes, "classified board changes");

    let mv = changes.resolve(previous)?;
    if !oracle.is_legal(previous, &mv)? {
        return Err(Error::IllegalMove(mv));
    }

    // The board must show every square the oracle will change.
    let flags = oracle.move_flags(previous, &mv)?;
    if flags.castle && changes.vacated.len() != 2 {
        return Err(ambiguous(Ambiguity::IncompleteCastle));
    }
    if flags.en_passant && changes.removed.is_none() {
        let captured = Square::from_coords(mv.to.file(), mv.from.rank());
        return Err(ambiguous(Ambiguity::CapturedPawnStillPresent(captured)));
    }

    info!(%mv, "inferred move");
    Ok(mv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;
    use shakmaty::Piece;

    fn position(fen: &str) -> Position {
        ShakmatyOracle::new().from_fen(fen).unwrap()
    }

    fn mv(uci: &str) -> Move {
        uci.parse().unwrap()
    }

    /// Snapshot of `pos` with a piece physically carried from `from` to `to`.
    fn carried(pos: &Position, moves: &[(Square, Square)]) -> BoardSnapshot {
        let mut snapshot = BoardSnapshot::from_position(pos);
        for &(from, to) in moves {
            let piece = snapshot.remove(from).unwrap();
            snapshot.place(to, piece);
        }
        snapshot
    }

    fn reason(result: Result<Move>) -> Ambiguity {
        match result {
            Err(Error::AmbiguousTransition(reason)) => reason,
            other => panic!("expected ambiguous transition, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_pawn_move() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let snapshot = carried(&start, &[(Square::E2, Square::E4)]);
        assert_eq!(infer(&oracle, &start, &snapshot).unwrap(), mv("e2e4"));
    }

    #[test]
    fn test_unchanged_board() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let snapshot = BoardSnapshot::from_position(&start);
        assert!(matches!(infer(&oracle, &start, &snapshot), Err(Error::NoChange)));
    }

    #[test]
    fn test_king_step_without_rook_is_not_a_castle() {
        let oracle = ShakmatyOracle::new();
        let pos = position("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let snapshot = carried(&pos, &[(Square::E1, Square::G1)]);
        assert_eq!(reason(infer(&oracle, &pos, &snapshot)), Ambiguity::IncompleteCastle);
    }

    #[test]
    fn test_en_passant_needs_captured_pawn_removed() {
        let oracle = ShakmatyOracle::new();
        let pos = position("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let snapshot = carried(&pos, &[(Square::E5, Square::F6)]);
        assert_eq!(
            reason(infer(&oracle, &pos, &snapshot)),
            Ambiguity::CapturedPawnStillPresent(Square::F5)
        );
    }

    #[test]
    fn test_capture() {
        let oracle = ShakmatyOracle::new();
        let pos = position("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let snapshot = carried(&pos, &[(Square::E4, Square::D5)]);
        assert_eq!(infer(&oracle, &pos, &snapshot).unwrap(), mv("e4d5"));
    }

    #[test]
    fn test_kingside_castle() {
        let oracle = ShakmatyOracle::new();
        let pos = position("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let snapshot = carried(&pos, &[(Square::E1, Square::G1), (Square::H1, Square::F1)]);
        let inferred = infer(&oracle, &pos, &snapshot).unwrap();
        assert_eq!(inferred, mv("e1g1"));

        let after = oracle.apply(&pos, &inferred).unwrap();
        assert!(after.fen().contains(" b kq "));
    }

    #[test]
    fn test_black_queenside_castle() {
        let oracle = ShakmatyOracle::new();
        let pos = position("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1");
        let snapshot = carried(&pos, &[(Square::E8, Square::C8), (Square::A8, Square::D8)]);
        assert_eq!(infer(&oracle, &pos, &snapshot).unwrap(), mv("e8c8"));
    }

    #[test]
    fn test_castle_without_rights_is_illegal() {
        let oracle = ShakmatyOracle::new();
        let pos = position("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w kq - 0 1");
        let snapshot = carried(&pos, &[(Square::E1, Square::G1), (Square::H1, Square::F1)]);
        assert!(matches!(
            infer(&oracle, &pos, &snapshot),
            Err(Error::IllegalMove(m)) if m == mv("e1g1")
        ));
    }

    #[test]
    fn test_promotion_is_auto_queen() {
        let oracle = ShakmatyOracle::new();
        let pos = position("8/4P3/8/8/8/k7/8/K7 w - - 0 1");
        // the pawn itself is set down on e8
        let snapshot = carried(&pos, &[(Square::E7, Square::E8)]);
        assert_eq!(infer(&oracle, &pos, &snapshot).unwrap(), mv("e7e8q"));
    }

    #[test]
    fn test_en_passant() {
        let oracle = ShakmatyOracle::new();
        let pos = position("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
        let mut snapshot = carried(&pos, &[(Square::E5, Square::F6)]);
        snapshot.remove(Square::F5);
        assert_eq!(infer(&oracle, &pos, &snapshot).unwrap(), mv("e5f6"));
    }

    #[test]
    fn test_two_pieces_vanish_one_reappears() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = carried(&start, &[(Square::E2, Square::E4)]);
        snapshot.remove(Square::D2);
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::Unrecognized { vacated: 2, arrivals: 1, captures: 0 }
        );
    }

    #[test]
    fn test_opponent_piece_appears() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = carried(&start, &[(Square::E2, Square::E4)]);
        snapshot.place(Square::E5, Piece { color: Color::Black, role: Role::Pawn });
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::OpponentAppeared(Square::E5)
        );
    }

    #[test]
    fn test_missing_destination() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = BoardSnapshot::from_position(&start);
        snapshot.remove(Square::G1);
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::MissingDestination(Square::G1)
        );
    }

    #[test]
    fn test_only_opponent_removed() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = BoardSnapshot::from_position(&start);
        snapshot.remove(Square::D7);
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::OpponentRemovedOnly(Square::D7)
        );
    }

    #[test]
    fn test_removal_without_en_passant() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = carried(&start, &[(Square::E2, Square::E4)]);
        snapshot.remove(Square::A7);
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::UnexplainedRemoval(Square::A7)
        );
    }

    #[test]
    fn test_two_captures_fail_fast() {
        let oracle = ShakmatyOracle::new();
        let pos = position("4k3/8/8/3p1p2/2P3P1/8/8/4K3 w - - 0 1");
        let snapshot = carried(&pos, &[(Square::C4, Square::D5), (Square::G4, Square::F5)]);
        assert_eq!(
            reason(infer(&oracle, &pos, &snapshot)),
            Ambiguity::TooManyCaptures
        );
    }

    #[test]
    fn test_three_pieces_lifted() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let mut snapshot = BoardSnapshot::from_position(&start);
        for sq in [Square::A2, Square::B2, Square::C2] {
            snapshot.remove(sq);
        }
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::TooManyVacated
        );
    }

    #[test]
    fn test_two_pawn_pushes_are_not_a_castle() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let snapshot = carried(&start, &[(Square::E2, Square::E4), (Square::D2, Square::D4)]);
        assert_eq!(
            reason(infer(&oracle, &start, &snapshot)),
            Ambiguity::NotCastling
        );
    }

    #[test]
    fn test_impossible_knight_jump_is_illegal() {
        let oracle = ShakmatyOracle::new();
        let start = oracle.initial_position();
        let snapshot = carried(&start, &[(Square::G1, Square::G3)]);
        assert!(matches!(
            infer(&oracle, &start, &snapshot),
            Err(Error::IllegalMove(m)) if m == mv("g1g3")
        ));
    }

    #[test]
    fn test_every_legal_move_round_trips() {
        let oracle = ShakmatyOracle::new();
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1",
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "3r3k/4P3/8/8/8/8/1p6/2R4K w - - 0 1",
            "3r3k/4P3/8/8/8/8/1p6/2R4K b - - 0 1",
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        ];

        for fen in fens {
            let pos = position(fen);
            let moves = oracle.legal_moves(&pos).unwrap();
            assert!(!moves.is_empty(), "{}", fen);

            for m in moves {
                if matches!(m.promotion, Some(role) if role != Role::Queen) {
                    continue;
                }
                let after = oracle.apply(&pos, &m).unwrap();
                let snapshot = BoardSnapshot::from_position(&after);
                let inferred = infer(&oracle, &pos, &snapshot)
                    .unwrap_or_else(|e| panic!("{} in {}: {}", m, fen, e));
                assert_eq!(inferred, m, "{}", fen);
            }
        }
    }
}
