//! Line tokens exchanged with the board controller

use std::fmt;

use crate::position::Move;
use crate::status::GameStatus;

/// Tokens the controller sends us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Easy,
    Hard,
    End,
    MoveConfirm,
    AskHumanStatus,
    AskAiMove,
    AskAiStatus,
}

impl Inbound {
    /// Parses one line; tokens are case-sensitive, surrounding whitespace is
    /// ignored.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "START" => Some(Inbound::Start),
            "EASY" => Some(Inbound::Easy),
            "HARD" => Some(Inbound::Hard),
            "END" => Some(Inbound::End),
            "MOVE_CONFIRM" => Some(Inbound::MoveConfirm),
            "ASK_HUMAN_STATUS" => Some(Inbound::AskHumanStatus),
            "ASK_AI_MOVE" => Some(Inbound::AskAiMove),
            "ASK_AI_STATUS" => Some(Inbound::AskAiStatus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Inbound::Start => "START",
            Inbound::Easy => "EASY",
            Inbound::Hard => "HARD",
            Inbound::End => "END",
            Inbound::MoveConfirm => "MOVE_CONFIRM",
            Inbound::AskHumanStatus => "ASK_HUMAN_STATUS",
            Inbound::AskAiMove => "ASK_AI_MOVE",
            Inbound::AskAiStatus => "ASK_AI_STATUS",
        }
    }
}

/// Tokens we send to the controller. `Display` gives the exact line, without
/// the newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    StartOk,
    StartError,
    MoveOk,
    MoveError,
    /// Rejected while in check, with every legal move attached.
    MoveErrorCheck(Vec<Move>),
    MoveNoChange,
    OpponentMove { mv: Move, capture: bool },
    Status(GameStatus),
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outbound::StartOk => write!(f, "START_OK"),
            Outbound::StartError => write!(f, "START_ERROR"),
            Outbound::MoveOk => write!(f, "MOVE_OK"),
            Outbound::MoveError => write!(f, "MOVE_ERROR"),
            Outbound::MoveErrorCheck(moves) => {
                let moves: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
                write!(f, "MOVE_ERROR_CHECK:{}", moves.join(" "))
            }
            Outbound::MoveNoChange => write!(f, "MOVE_NO_CHANGE"),
            // the trolley expects 0 for a capture, 1 otherwise
            Outbound::OpponentMove { mv, capture } => {
                write!(f, "{}:{}", mv.square_pair(), if *capture { 0 } else { 1 })
            }
            Outbound::Status(status) => write!(f, "{}", status),
        }
    }
}
