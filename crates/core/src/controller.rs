//! Sync protocol controller
//!
//! Turns each inbound token into zero or more outbound tokens, advancing the
//! session through the human-move / opponent-move cycle. Tokens that do not
//! fit the current phase are logged and dropped without a reply.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::RigConfig;
use crate::error::{Error, Result};
use crate::inference::infer;
use crate::opponent::{select_guarded, OpponentMoveSource};
use crate::oracle::RulesOracle;
use crate::position::{Move, Position};
use crate::protocol::{Inbound, Outbound};
use crate::session::{Difficulty, Phase, SessionState, HUMAN};
use crate::snapshot::SnapshotSource;
use crate::status::{evaluate, GameStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub max_replacement_attempts: u32,
    pub pacing_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&RigConfig::default())
    }
}

impl From<&RigConfig> for ControllerSettings {
    fn from(config: &RigConfig) -> Self {
        Self {
            max_replacement_attempts: config.max_replacement_attempts,
            pacing_timeout: config.pacing_timeout(),
        }
    }
}

pub struct SyncController<O, S, V> {
    oracle: O,
    opponent: S,
    vision: V,
    settings: ControllerSettings,
    session: SessionState,
}

impl<O, S, V> SyncController<O, S, V>
where
    O: RulesOracle,
    S: OpponentMoveSource,
    V: SnapshotSource,
{
    pub fn new(oracle: O, opponent: S, vision: V, settings: ControllerSettings) -> Self {
        let session = SessionState::new(oracle.initial_position());
        Self {
            oracle,
            opponent,
            vision,
            settings,
            session,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Drops the current game and returns to idle.
    pub fn reset(&mut self) {
        self.session.reset(self.oracle.initial_position());
    }

    /// How long the link may wait for the next token before giving up, if a
    /// pacing token is owed.
    pub fn pacing_deadline(&self) -> Option<Duration> {
        self.session
            .phase()
            .expected_pacing_token()
            .map(|_| self.settings.pacing_timeout)
    }

    /// Tears the session down after the controller went quiet mid-cycle.
    pub fn stall(&mut self) -> Error {
        let expected = self
            .session
            .phase()
            .expected_pacing_token()
            .unwrap_or("any token");
        let err = Error::Stalled {
            expected,
            secs: self.settings.pacing_timeout.as_secs(),
        };
        error!(error = %err, phase = self.session.phase().name(), "resetting session");
        self.reset();
        err
    }

    /// Handles one raw line from the link.
    pub fn handle_line(&mut self, line: &str) -> Vec<Outbound> {
        match Inbound::parse(line) {
            Some(token) => self.handle(token),
            None => {
                if !line.trim().is_empty() {
                    warn!(line = line.trim(), phase = self.session.phase().name(), "unknown token ignored");
                }
                Vec::new()
            }
        }
    }

    pub fn handle(&mut self, token: Inbound) -> Vec<Outbound> {
        debug!(token = token.as_str(), phase = self.session.phase().name(), "received");

        match (self.session.phase(), token) {
            (_, Inbound::End) => self.end(),
            (Phase::Idle, Inbound::Start) => self.start(),
            (Phase::AwaitingHumanMove, Inbound::Easy) => self.choose(Difficulty::Easy),
            (Phase::AwaitingHumanMove, Inbound::Hard) => self.choose(Difficulty::Hard),
            (Phase::AwaitingHumanMove, Inbound::MoveConfirm) => self.confirm_human_move(),
            (Phase::AwaitingHumanStatus(status), Inbound::AskHumanStatus) => {
                self.report_status(status, Phase::AwaitingOpponentMove)
            }
            (Phase::AwaitingOpponentMove, Inbound::AskAiMove) => self.opponent_move(),
            (Phase::AwaitingOpponentStatus(status), Inbound::AskAiStatus) => {
                self.report_status(status, Phase::AwaitingHumanMove)
            }
            (phase, token) => {
                let err = Error::ProtocolDesync {
                    token: token.as_str().to_string(),
                    phase: phase.name(),
                };
                warn!(error = %err, "ignored");
                Vec::new()
            }
        }
    }

    fn start(&mut self) -> Vec<Outbound> {
        let initial = self.oracle.initial_position();
        let snapshot = match self.vision.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "could not capture board for setup check");
                return vec![Outbound::StartError];
            }
        };

        let observed = snapshot.to_position(&initial, &self.oracle);
        if observed.same_placement(&initial) {
            info!("board set up, game started");
            self.session.begin(initial);
            vec![Outbound::StartOk]
        } else {
            warn!(seen = %observed.fen(), "board is not in the starting position");
            vec![Outbound::StartError]
        }
    }

    fn choose(&mut self, difficulty: Difficulty) -> Vec<Outbound> {
        info!(difficulty = difficulty.as_str(), "difficulty selected");
        self.session.set_difficulty(difficulty);
        Vec::new()
    }

    fn end(&mut self) -> Vec<Outbound> {
        if self.session.phase().is_in_progress() {
            info!(phase = self.session.phase().name(), "game ended by controller");
        }
        self.reset();
        Vec::new()
    }

    fn confirm_human_move(&mut self) -> Vec<Outbound> {
        if self.session.difficulty().is_none() {
            warn!("MOVE_CONFIRM before a difficulty was chosen, ignored");
            return Vec::new();
        }

        let previous = self.session.previous().clone();
        let snapshot = match self.vision.capture() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "could not capture board");
                return vec![Outbound::MoveError];
            }
        };

        if snapshot.to_position(&previous, &self.oracle).same_placement(&previous) {
            info!("board unchanged since last confirmed position");
            return vec![Outbound::MoveNoChange];
        }

        let mv = match infer(&self.oracle, &previous, &snapshot) {
            Ok(mv) => mv,
            Err(Error::NoChange) => return vec![Outbound::MoveNoChange],
            Err(err) => return vec![self.reject(&previous, err)],
        };

        match self.play_human(&previous, mv) {
            Ok((next, status)) => {
                info!(%mv, %status, "human move accepted");
                self.session.set_previous(next);
                self.session.set_phase(Phase::AwaitingHumanStatus(status));
                vec![Outbound::MoveOk]
            }
            Err(err) => vec![self.reject(&previous, err)],
        }
    }

    fn play_human(&self, previous: &Position, mv: Move) -> Result<(Position, GameStatus)> {
        if previous.turn() != HUMAN {
            return Err(Error::OutOfTurn(previous.turn()));
        }
        let next = self.oracle.apply(previous, &mv)?;
        let status = evaluate(&self.oracle, &next)?;
        Ok((next, status))
    }

    /// Picks the rejection token; while in check the legal moves are attached.
    fn reject(&self, previous: &Position, err: Error) -> Outbound {
        warn!(error = %err, "human move rejected");

        let in_check = match self.oracle.is_check(previous) {
            Ok(in_check) => in_check,
            Err(e) => {
                warn!(error = %e, "could not check for check");
                return Outbound::MoveError;
            }
        };
        if !in_check {
            return Outbound::MoveError;
        }

        match self.oracle.legal_moves(previous) {
            Ok(moves) => Outbound::MoveErrorCheck(moves),
            Err(e) => {
                warn!(error = %e, "could not list legal moves");
                Outbound::MoveError
            }
        }
    }

    fn report_status(&mut self, status: GameStatus, next: Phase) -> Vec<Outbound> {
        if status.is_terminal() {
            info!(%status, "game over");
            self.reset();
        } else {
            debug!(%status, "status reported");
            self.session.set_phase(next);
        }
        vec![Outbound::Status(status)]
    }

    fn opponent_move(&mut self) -> Vec<Outbound> {
        match self.play_opponent() {
            Ok((mv, capture, next, status)) => {
                info!(%mv, capture, %status, "opponent move sent");
                self.session.set_previous(next);
                self.session.set_phase(Phase::AwaitingOpponentStatus(status));
                vec![Outbound::OpponentMove { mv, capture }]
            }
            Err(err) => {
                error!(error = %err, "could not produce opponent move");
                vec![Outbound::MoveError]
            }
        }
    }

    fn play_opponent(&mut self) -> Result<(Move, bool, Position, GameStatus)> {
        let difficulty = self
            .session
            .difficulty()
            .ok_or_else(|| Error::UpstreamUnavailable("no difficulty selected".into()))?;
        let position = self.session.previous().clone();

        let mv = select_guarded(
            &self.oracle,
            &mut self.opponent,
            &position,
            difficulty,
            self.settings.max_replacement_attempts,
        )?;
        let capture = self.oracle.move_flags(&position, &mv)?.capture;
        let next = self.oracle.apply(&position, &mv)?;
        let status = evaluate(&self.oracle, &next)?;

        Ok((mv, capture, next, status))
    }
}
