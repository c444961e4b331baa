use thiserror::Error;

use crate::types::{MatchId, ParticipantId};

/// Rejections surfaced to the caller. A rejected request never leaves a
/// partially applied mutation behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BracketError {
    #[error("Add at least {required} participants to create a bracket (have {actual}).")]
    RosterTooSmall { required: usize, actual: usize },

    #[error("Participant name must not be empty.")]
    EmptyName,

    #[error("Malformed score: {0}")]
    MalformedScore(String),

    #[error("Participant {0} not found.")]
    ParticipantNotFound(ParticipantId),

    #[error("Match {0} not found.")]
    MatchNotFound(MatchId),

    #[error("Match {0} is not yet ready to be scored.")]
    MatchNotReady(MatchId),

    #[error("Match {0} is a bye and cannot be scored.")]
    ByeNotScorable(MatchId),

    #[error("No bracket has been generated.")]
    NoBracket,

    #[error("Unknown bracket format: {0}")]
    UnknownFormat(String),

    #[error("Invalid bracket data: {0}")]
    InvalidImport(String),

    #[error("No identifiers left to issue.")]
    IdsExhausted,
}

pub type BracketResult<T> = Result<T, BracketError>;

/// Failures of the command-line application around the engine.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Bracket(#[from] BracketError),

    #[error("Command {index} rejected: {source}")]
    Script {
        index: usize,
        #[source]
        source: BracketError,
    },

    #[error("{0}")]
    Config(String),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io { context: context.into(), source }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Json { context: context.into(), source }
    }
}

pub type AppResult<T> = Result<T, AppError>;
