//! End-to-end exchanges between the board controller and the core
//!
//! The camera is a shared snapshot the test moves pieces on, the engine is a
//! script of canned replies.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use chess_rig_core::{
    infer, BoardSnapshot, ControllerSettings, Difficulty, Error, Inbound, Move, OpponentMoveSource,
    Outbound, Phase, Position, Result, RulesOracle, ShakmatyOracle, SnapshotSource,
    SyncController,
};
use shakmaty::{Color, Piece, Role, Square};

struct Camera(Rc<RefCell<BoardSnapshot>>);

impl SnapshotSource for Camera {
    fn capture(&mut self) -> Result<BoardSnapshot> {
        Ok(self.0.borrow().clone())
    }
}

struct Script {
    replies: VecDeque<Move>,
    asked: Rc<Cell<usize>>,
}

impl OpponentMoveSource for Script {
    fn select(&mut self, _: &Position, _: Difficulty) -> Result<Move> {
        self.asked.set(self.asked.get() + 1);
        self.replies
            .pop_front()
            .ok_or_else(|| Error::UpstreamUnavailable("script exhausted".into()))
    }
}

struct Rig {
    controller: SyncController<ShakmatyOracle, Script, Camera>,
    board: Rc<RefCell<BoardSnapshot>>,
    asked: Rc<Cell<usize>>,
}

impl Rig {
    fn new(replies: &[&str]) -> Self {
        let oracle = ShakmatyOracle::new();
        let board = Rc::new(RefCell::new(BoardSnapshot::from_position(
            &oracle.initial_position(),
        )));
        let asked = Rc::new(Cell::new(0));
        let script = Script {
            replies: replies.iter().map(|uci| uci.parse().unwrap()).collect(),
            asked: Rc::clone(&asked),
        };
        let controller = SyncController::new(
            oracle,
            script,
            Camera(Rc::clone(&board)),
            ControllerSettings::default(),
        );
        Rig {
            controller,
            board,
            asked,
        }
    }

    /// A rig past `START` with hard difficulty chosen.
    fn started(replies: &[&str]) -> Self {
        let mut rig = Rig::new(replies);
        assert_eq!(rig.send(Inbound::Start), vec!["START_OK"]);
        assert!(rig.send(Inbound::Hard).is_empty());
        rig
    }

    fn send(&mut self, token: Inbound) -> Vec<String> {
        self.controller
            .handle(token)
            .iter()
            .map(|out| out.to_string())
            .collect()
    }

    fn previous(&self) -> Position {
        self.controller.session().previous().clone()
    }

    fn show(&self, position: &Position) {
        *self.board.borrow_mut() = BoardSnapshot::from_position(position);
    }

    /// Makes `uci` on the physical board and presses confirm.
    fn human(&mut self, uci: &str) -> Vec<String> {
        let next = self
            .controller
            .oracle()
            .apply(&self.previous(), &uci.parse().unwrap())
            .unwrap();
        self.show(&next);
        self.send(Inbound::MoveConfirm)
    }

    /// One full human/opponent cycle; returns the opponent's move line.
    fn full_turn(&mut self, uci: &str) -> String {
        assert_eq!(self.human(uci), vec!["MOVE_OK"]);
        assert_eq!(self.send(Inbound::AskHumanStatus), vec!["GAME_CONTINUES"]);
        let reply = self.send(Inbound::AskAiMove);
        assert_eq!(reply.len(), 1);
        // the trolley carries the piece
        self.show(&self.previous());
        assert_eq!(self.send(Inbound::AskAiStatus).len(), 1);
        reply[0].clone()
    }
}

// =============================================================================
// Session start
// =============================================================================

#[test]
fn test_start_on_set_up_board() {
    let mut rig = Rig::new(&[]);
    assert_eq!(rig.send(Inbound::Start), vec!["START_OK"]);
    assert_eq!(rig.controller.session().phase(), Phase::AwaitingHumanMove);
}

#[test]
fn test_start_with_misplaced_piece() {
    let mut rig = Rig::new(&[]);
    rig.board.borrow_mut().remove(Square::D1);
    assert_eq!(rig.send(Inbound::Start), vec!["START_ERROR"]);
    assert_eq!(rig.controller.session().phase(), Phase::Idle);
}

// =============================================================================
// Human moves
// =============================================================================

#[test]
fn test_quiet_pawn_push() {
    let mut rig = Rig::started(&[]);
    assert_eq!(rig.human("e2e4"), vec!["MOVE_OK"]);
    assert_eq!(rig.previous().turn(), Color::Black);
    assert_eq!(
        rig.controller.session().phase(),
        Phase::AwaitingHumanStatus(chess_rig_core::GameStatus::Ongoing)
    );
}

#[test]
fn test_unchanged_board_reports_no_change() {
    let mut rig = Rig::started(&[]);
    let before = rig.previous().fen();
    assert_eq!(rig.send(Inbound::MoveConfirm), vec!["MOVE_NO_CHANGE"]);
    assert_eq!(rig.previous().fen(), before);
    assert_eq!(rig.controller.session().phase(), Phase::AwaitingHumanMove);
}

#[test]
fn test_illegal_move_leaves_position_untouched() {
    let mut rig = Rig::started(&[]);
    let before = rig.previous().fen();
    {
        let mut board = rig.board.borrow_mut();
        let pawn = board.remove(Square::E2).unwrap();
        board.place(Square::E5, pawn);
    }
    assert_eq!(rig.send(Inbound::MoveConfirm), vec!["MOVE_ERROR"]);
    assert_eq!(rig.previous().fen(), before);
    assert_eq!(rig.controller.session().phase(), Phase::AwaitingHumanMove);
}

#[test]
fn test_kingside_castle_on_board() {
    let mut rig = Rig::started(&["e7e5", "b8c6", "f8c5"]);
    rig.full_turn("e2e4");
    rig.full_turn("g1f3");
    rig.full_turn("f1c4");

    {
        let mut board = rig.board.borrow_mut();
        let king = board.remove(Square::E1).unwrap();
        let rook = board.remove(Square::H1).unwrap();
        board.place(Square::G1, king);
        board.place(Square::F1, rook);
    }
    assert_eq!(rig.send(Inbound::MoveConfirm), vec!["MOVE_OK"]);

    let fen = rig.previous().fen();
    assert_eq!(fen.split_whitespace().nth(2), Some("kq"));
    assert_eq!(rig.previous().piece_at(Square::G1).map(|p| p.role), Some(Role::King));
}

#[test]
fn test_pawn_reaching_last_rank_becomes_queen() {
    let oracle = ShakmatyOracle::new();
    let previous = oracle.from_fen("1k6/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let mut snapshot = BoardSnapshot::from_position(&previous);
    let pawn = snapshot.remove(Square::E7).unwrap();
    snapshot.place(Square::E8, pawn);

    let mv = infer(&oracle, &previous, &snapshot).unwrap();
    assert_eq!(mv.to_string(), "e7e8q");
}

#[test]
fn test_two_pieces_lifted_one_returned() {
    let mut rig = Rig::started(&[]);
    {
        let mut board = rig.board.borrow_mut();
        board.remove(Square::D2);
        let pawn = board.remove(Square::E2).unwrap();
        board.place(Square::E4, pawn);
    }
    assert_eq!(rig.send(Inbound::MoveConfirm), vec!["MOVE_ERROR"]);
    assert_eq!(rig.controller.session().phase(), Phase::AwaitingHumanMove);
}

#[test]
fn test_rejection_in_check_lists_legal_moves() {
    let mut rig = Rig::started(&["e7e6", "f8b4"]);
    rig.full_turn("d2d3");

    assert_eq!(rig.human("h2h3"), vec!["MOVE_OK"]);
    assert_eq!(rig.send(Inbound::AskHumanStatus), vec!["GAME_CONTINUES"]);
    assert_eq!(rig.send(Inbound::AskAiMove), vec!["f8b4:1"]);
    rig.show(&rig.previous());
    assert_eq!(rig.send(Inbound::AskAiStatus), vec!["Human is CHECK"]);

    let previous = rig.previous();
    let expected =
        Outbound::MoveErrorCheck(rig.controller.oracle().legal_moves(&previous).unwrap()).to_string();
    assert!(expected.starts_with("MOVE_ERROR_CHECK:"));

    // two pawns lifted, one set down
    {
        let mut board = rig.board.borrow_mut();
        board.remove(Square::A2);
        let pawn = board.remove(Square::B2).unwrap();
        board.place(Square::B3, pawn);
    }
    assert_eq!(rig.send(Inbound::MoveConfirm), vec![expected.clone()]);

    // a legal-looking move that ignores the check
    rig.show(&previous);
    {
        let mut board = rig.board.borrow_mut();
        let pawn = board.remove(Square::A2).unwrap();
        board.place(Square::A3, pawn);
    }
    assert_eq!(rig.send(Inbound::MoveConfirm), vec![expected]);
    assert_eq!(rig.previous().fen(), previous.fen());
}

// =============================================================================
// Opponent moves
// =============================================================================

#[test]
fn test_opponent_capture_flag() {
    let mut rig = Rig::started(&["d7d5", "d5e4"]);
    assert_eq!(rig.full_turn("e2e4"), "d7d5:1");
    assert_eq!(rig.full_turn("d2d3"), "d5e4:0");
    assert_eq!(
        rig.previous().piece_at(Square::E4),
        Some(Piece {
            color: Color::Black,
            role: Role::Pawn
        })
    );
}

#[test]
fn test_opponent_castle_is_replaced() {
    let mut rig = Rig::started(&["e7e5", "g8f6", "f8e7", "e8g8", "b8c6"]);
    rig.full_turn("e2e4");
    rig.full_turn("g1f3");
    rig.full_turn("f1c4");
    assert_eq!(rig.asked.get(), 3);

    assert_eq!(rig.full_turn("d2d3"), "b8c6:1");
    assert_eq!(rig.asked.get(), 5);
    assert_eq!(rig.previous().piece_at(Square::E8).map(|p| p.role), Some(Role::King));
}

// =============================================================================
// Game end
// =============================================================================

#[test]
fn test_checkmate_ends_session() {
    let mut rig = Rig::started(&["e7e5", "b8c6", "g8f6"]);
    rig.full_turn("e2e4");
    rig.full_turn("f1c4");
    rig.full_turn("d1h5");

    assert_eq!(rig.human("h5f7"), vec!["MOVE_OK"]);
    assert_eq!(rig.send(Inbound::AskHumanStatus), vec!["CHECKMATE: Human Wins"]);
    assert_eq!(rig.controller.session().phase(), Phase::Idle);
    assert!(rig.send(Inbound::AskAiMove).is_empty());
    assert_eq!(rig.asked.get(), 3);
}

#[test]
fn test_end_resets_mid_game() {
    let mut rig = Rig::started(&["e7e5"]);
    rig.full_turn("e2e4");

    assert!(rig.send(Inbound::End).is_empty());
    let session = rig.controller.session();
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.difficulty(), None);
    assert_eq!(
        session.previous().fen(),
        ShakmatyOracle::new().initial_position().fen()
    );

    // pieces are still where the last game left them
    assert_eq!(rig.send(Inbound::Start), vec!["START_ERROR"]);
}

#[test]
fn test_tokens_out_of_phase_are_ignored() {
    let mut rig = Rig::started(&["e7e5"]);
    assert!(rig.send(Inbound::AskAiMove).is_empty());
    assert_eq!(rig.human("e2e4"), vec!["MOVE_OK"]);

    assert!(rig.send(Inbound::MoveConfirm).is_empty());
    assert!(rig.send(Inbound::AskAiStatus).is_empty());
    assert!(rig.send(Inbound::Easy).is_empty());
    assert_eq!(rig.asked.get(), 0);
    assert_eq!(rig.send(Inbound::AskHumanStatus), vec!["GAME_CONTINUES"]);
}
