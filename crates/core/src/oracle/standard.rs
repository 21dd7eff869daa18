//! In-process rules oracle backed by shakmaty

use shakmaty::{
    fen::Fen, CastlingMode, Chess, EnPassantMode, File, FromSetup, Position as _, Square,
};

use super::{MoveFlags, OracleError, RulesOracle};
use crate::position::{Move, Position};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    pub fn new() -> Self {
        Self
    }

    fn chess(&self, position: &Position) -> Result<Chess, OracleError> {
        Chess::from_setup(position.setup().clone(), CastlingMode::Standard)
            .map_err(|e| OracleError::InvalidPosition(e.to_string()))
    }

    fn find(&self, chess: &Chess, mv: &Move) -> Option<shakmaty::Move> {
        chess
            .legal_moves()
            .into_iter()
            .find(|m| to_rig_move(m).as_ref() == Some(mv))
    }
}

/// Convert a shakmaty move to the rig's from/to form.
fn to_rig_move(mv: &shakmaty::Move) -> Option<Move> {
    match mv {
        shakmaty::Move::Normal {
            from, to, promotion, ..
        } => Some(Move {
            from: *from,
            to: *to,
            promotion: *promotion,
        }),
        shakmaty::Move::EnPassant { from, to } => Some(Move::new(*from, *to)),
        shakmaty::Move::Castle { king, rook } => {
            let king_to = if rook.file() > king.file() {
                Square::from_coords(File::G, king.rank())
            } else {
                Square::from_coords(File::C, king.rank())
            };
            Some(Move::new(*king, king_to))
        }
        shakmaty::Move::Put { .. } => None,
    }
}

impl RulesOracle for ShakmatyOracle {
    fn initial_position(&self) -> Position {
        Position::from_parts(Chess::default().to_setup(EnPassantMode::Legal), Vec::new())
    }

    fn from_fen(&self, fen: &str) -> Result<Position, OracleError> {
        let fen: Fen = fen
            .trim()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| OracleError::InvalidPosition(e.to_string()))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| OracleError::InvalidPosition(e.to_string()))?;
        Ok(Position::from_parts(chess.to_setup(EnPassantMode::Legal), Vec::new()))
    }

    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, OracleError> {
        let chess = self.chess(position)?;
        Ok(chess.legal_moves().iter().filter_map(to_rig_move).collect())
    }

    fn apply(&self, position: &Position, mv: &Move) -> Result<Position, OracleError> {
        let chess = self.chess(position)?;
        let legal = self.find(&chess, mv).ok_or(OracleError::IllegalMove(*mv))?;
        let next = chess
            .play(legal)
            .map_err(|e| OracleError::InvalidPosition(e.to_string()))?;
        Ok(position.followed_by(next.to_setup(EnPassantMode::Legal)))
    }

    fn move_flags(&self, position: &Position, mv: &Move) -> Result<MoveFlags, OracleError> {
        let chess = self.chess(position)?;
        let legal = self.find(&chess, mv).ok_or(OracleError::IllegalMove(*mv))?;
        Ok(MoveFlags {
            capture: legal.is_capture(),
            castle: legal.is_castle(),
            en_passant: legal.is_en_passant(),
        })
    }

    fn is_check(&self, position: &Position) -> Result<bool, OracleError> {
        Ok(self.chess(position)?.is_check())
    }

    fn is_checkmate(&self, position: &Position) -> Result<bool, OracleError> {
        Ok(self.chess(position)?.is_checkmate())
    }

    fn is_stalemate(&self, position: &Position) -> Result<bool, OracleError> {
        Ok(self.chess(position)?.is_stalemate())
    }

    fn is_insufficient_material(&self, position: &Position) -> Result<bool, OracleError> {
        Ok(self.chess(position)?.is_insufficient_material())
    }
}
