//! Error taxonomy for the rules engine, the protocol layer and the
//! game-record reader.
//!
//! The board never partially applies a failing move: every error here
//! implies the pre-call state is preserved exactly.

use std::io;

/// Why a move was rejected by the board.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// Point is not empty.
    #[error("illegal move: point not empty")]
    Occupied,

    /// Move would leave the played string with no liberties and captures
    /// nothing.
    #[error("illegal move: suicide")]
    Suicide,

    /// Move retakes the ko point.
    #[error("illegal move: retakes ko")]
    KoViolation,
}

/// Protocol-level failures: unknown commands and malformed arguments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid {what}: {value}")]
    BadArgument { what: &'static str, value: String },

    #[error("invalid vertex: {0}")]
    BadVertex(String),

    #[error("unacceptable size {0}")]
    UnacceptableSize(usize),

    /// `boardsize` was issued but `clear_board` has not followed yet.
    #[error("board is not initialized, issue clear_board")]
    BoardUninitialized,

    #[error("board is not empty")]
    BoardNotEmpty,

    #[error("invalid number of handicap stones: {0}")]
    BadHandicap(usize),
}

/// Any failure a protocol command can report. The session converts each
/// into one `?` response line and keeps running.
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("move generator failed: {0}")]
    Generator(anyhow::Error),
}

/// Failures while reading a persisted game record.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("cannot read game record: {0}")]
    Read(#[from] io::Error),

    #[error("cannot parse game record: {0}")]
    Syntax(String),

    #[error("game record has unsupported board size {0}")]
    UnsupportedSize(usize),

    /// A recorded move could not be replayed on the board.
    #[error("game record contains illegal move {vertex} at move {index}: {source}")]
    IllegalMove {
        index: usize,
        vertex: String,
        source: MoveError,
    },
}
