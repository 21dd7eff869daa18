//! Stockfish chess engine interface
//!
//! Spawns Stockfish as a subprocess and communicates via UCI protocol.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use tracing::{debug, trace};

/// Error type for engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Failed to start the engine process
    SpawnError(String),
    /// Failed to communicate with engine
    IoError(std::io::Error),
    /// Engine returned unexpected response
    ProtocolError(String),
    /// Engine closed its output
    Closed,
    /// Engine not initialized
    NotInitialized,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::SpawnError(s) => write!(f, "Failed to start engine: {}", s),
            EngineError::IoError(e) => write!(f, "I/O error: {}", e),
            EngineError::ProtocolError(s) => write!(f, "Protocol error: {}", s),
            EngineError::Closed => write!(f, "Engine closed its output"),
            EngineError::NotInitialized => write!(f, "Engine not initialized"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError(error)
    }
}

/// Wrapper around Stockfish chess engine
pub struct StockfishEngine {
    /// The child process
    process: Child,
    /// Stdin for sending commands
    stdin: ChildStdin,
    /// Stdout reader for receiving responses
    stdout: BufReader<ChildStdout>,
    /// Whether UCI handshake completed
    initialized: bool,
}

impl StockfishEngine {
    /// Creates a new Stockfish engine instance
    ///
    /// # Arguments
    /// * `path` - Path to stockfish binary (or "stockfish" if in PATH)
    ///
    /// # Example
    /// ```ignore
    /// let mut engine = StockfishEngine::new("stockfish")?;
    /// ```
    pub fn new(path: &str) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::SpawnError(e.to_string()))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdin".into()))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::SpawnError("Failed to open stdout".into()))?;

        let mut engine = StockfishEngine {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            initialized: false,
        };

        engine.init_uci()?;
        debug!(path, "engine ready");

        Ok(engine)
    }

    /// Sends a command to the engine
    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(cmd, "engine <");
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Reads a line from the engine
    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Closed);
        }
        Ok(line.trim().to_string())
    }

    /// Reads lines until we get the expected response
    fn read_until(&mut self, expected: &str) -> Result<Vec<String>, EngineError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            let done = line.starts_with(expected);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    fn init_uci(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.read_until("uciok")?;

        self.sync()?;

        self.initialized = true;
        Ok(())
    }

    /// Blocks until the engine has processed every command sent so far.
    fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        self.read_until("readyok")?;
        Ok(())
    }

    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        self.send(&format!("setoption name {} value {}", name, value))?;
        self.sync()
    }

    /// Caps playing strength at `elo`.
    pub fn limit_strength(&mut self, elo: u32) -> Result<(), EngineError> {
        self.set_option("UCI_LimitStrength", "true")?;
        self.set_option("UCI_Elo", &elo.to_string())
    }

    /// Sets a position from a FEN string
    ///
    /// # Arguments
    /// * `fen` - FEN string, or None for starting position
    pub fn set_position(&mut self, fen: Option<&str>) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        let cmd = match fen {
            Some(f) => format!("position fen {}", f),
            None => "position startpos".to_string(),
        };

        self.send(&cmd)?;
        Ok(())
    }

    /// Searches the current position for `movetime_ms` and returns the
    /// engine's choice in UCI notation.
    pub fn best_move(&mut self, movetime_ms: u64) -> Result<String, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        self.send(&format!("go movetime {}", movetime_ms))?;

        loop {
            let line = self.read_line()?;
            if line.starts_with("bestmove") {
                return parse_bestmove(&line);
            }
        }
    }

    /// Quit the engine cleanly
    pub fn quit(&mut self) -> Result<(), EngineError> {
        self.send("quit")?;
        // Give it a moment to exit
        std::thread::sleep(Duration::from_millis(100));
        let _ = self.process.kill();
        let _ = self.process.wait();
        Ok(())
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

/// Parses `bestmove e2e4 ponder e7e5`.
fn parse_bestmove(line: &str) -> Result<String, EngineError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("bestmove"), Some("(none)")) => {
            Err(EngineError::ProtocolError("no legal move to play".into()))
        }
        (Some("bestmove"), Some(mv)) => Ok(mv.to_string()),
        _ => Err(EngineError::ProtocolError(format!("unexpected reply: {:?}", line))),
    }
}
