//! Session state for one physical game

use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::position::Position;
use crate::status::GameStatus;

/// The human always plays white; the automated side answers as black.
pub const HUMAN: Color = Color::White;

pub fn side_label(color: Color) -> &'static str {
    if color == HUMAN {
        "Human"
    } else {
        "AI"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }
}

/// Where the session is in the request/acknowledge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game; waiting for `START`.
    Idle,
    /// Waiting for the human to move and press confirm.
    AwaitingHumanMove,
    /// Human move accepted, status held until `ASK_HUMAN_STATUS`.
    AwaitingHumanStatus(GameStatus),
    AwaitingOpponentMove,
    /// Opponent move sent, status held until `ASK_AI_STATUS`.
    AwaitingOpponentStatus(GameStatus),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingHumanMove => "in_progress",
            Phase::AwaitingHumanStatus(_) => "awaiting_human_status",
            Phase::AwaitingOpponentMove => "awaiting_ai_move",
            Phase::AwaitingOpponentStatus(_) => "awaiting_ai_status",
        }
    }

    pub fn is_in_progress(&self) -> bool {
        *self != Phase::Idle
    }

    /// The pacing token the controller owes us, if any.
    pub fn expected_pacing_token(&self) -> Option<&'static str> {
        match self {
            Phase::AwaitingHumanStatus(_) => Some("ASK_HUMAN_STATUS"),
            Phase::AwaitingOpponentMove => Some("ASK_AI_MOVE"),
            Phase::AwaitingOpponentStatus(_) => Some("ASK_AI_STATUS"),
            Phase::Idle | Phase::AwaitingHumanMove => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    phase: Phase,
    difficulty: Option<Difficulty>,
    /// Last confirmed position; every snapshot is diffed against it.
    previous: Position,
}

impl SessionState {
    pub fn new(initial: Position) -> Self {
        Self {
            phase: Phase::Idle,
            difficulty: None,
            previous: initial,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn previous(&self) -> &Position {
        &self.previous
    }

    pub(crate) fn begin(&mut self, initial: Position) {
        self.phase = Phase::AwaitingHumanMove;
        self.previous = initial;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = Some(difficulty);
    }

    pub(crate) fn set_previous(&mut self, position: Position) {
        self.previous = position;
    }

    pub(crate) fn reset(&mut self, initial: Position) {
        *self = Self::new(initial);
    }
}
