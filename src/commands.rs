use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult, BracketError, BracketResult};
use crate::session::BracketSession;
use crate::types::{Format, MatchId, ParticipantId};

// ── Score input ─────────────────────────────────────────────────────────

/// A score as typed by the user: a JSON number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreInput {
    Number(f64),
    Text(String),
}

impl ScoreInput {
    pub fn resolve(&self) -> BracketResult<Option<f64>> {
        match self {
            ScoreInput::Number(value) if value.is_finite() => Ok(Some(*value)),
            ScoreInput::Number(value) => Err(BracketError::MalformedScore(value.to_string())),
            ScoreInput::Text(raw) => parse_score(raw),
        }
    }
}

/// Empty text clears the score; anything else must be a finite number.
pub fn parse_score(raw: &str) -> BracketResult<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(BracketError::MalformedScore(trimmed.to_string())),
    }
}

fn resolve_optional(input: &Option<ScoreInput>) -> BracketResult<Option<f64>> {
    match input {
        Some(input) => input.resolve(),
        None => Ok(None),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

/// One user action against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SessionCommand {
    AddParticipant {
        name: String,
        #[serde(default)]
        score: Option<ScoreInput>,
    },
    RemoveParticipant {
        id: ParticipantId,
    },
    ClearParticipants,
    SetScore {
        id: ParticipantId,
        #[serde(default)]
        score: Option<ScoreInput>,
    },
    SetCategory {
        id: ParticipantId,
        category: String,
    },
    SeedByScore,
    Generate {
        format: Format,
    },
    #[serde(rename_all = "camelCase")]
    RecordScore {
        match_id: MatchId,
        #[serde(default)]
        score1: Option<ScoreInput>,
        #[serde(default)]
        score2: Option<ScoreInput>,
    },
    Reset,
}

pub fn apply_command(session: &mut BracketSession, command: &SessionCommand) -> BracketResult<()> {
    match command {
        SessionCommand::AddParticipant { name, score } => {
            let score = resolve_optional(score)?;
            session.add_participant(name, score)?;
        }
        SessionCommand::RemoveParticipant { id } => {
            session.remove_participant(*id)?;
        }
        SessionCommand::ClearParticipants => session.clear_participants(),
        SessionCommand::SetScore { id, score } => {
            let score = resolve_optional(score)?;
            session.set_participant_score(*id, score)?;
        }
        SessionCommand::SetCategory { id, category } => {
            session.set_participant_category(*id, category)?;
        }
        SessionCommand::SeedByScore => session.seed_by_score(),
        SessionCommand::Generate { format } => {
            session.generate(*format)?;
        }
        SessionCommand::RecordScore { match_id, score1, score2 } => {
            let score1 = resolve_optional(score1)?;
            let score2 = resolve_optional(score2)?;
            session.record_score(*match_id, score1, score2)?;
        }
        SessionCommand::Reset => session.reset(),
    }
    Ok(())
}

/// Applies commands in order and stops at the first rejection. Commands before
/// the rejected one stay applied.
pub fn run_script(session: &mut BracketSession, commands: &[SessionCommand]) -> AppResult<usize> {
    for (index, command) in commands.iter().enumerate() {
        debug!(index, ?command, "applying command");
        if let Err(source) = apply_command(session, command) {
            warn!(index, error = %source, "command rejected");
            return Err(AppError::Script { index, source });
        }
    }
    Ok(commands.len())
}

pub fn load_script(path: &Path) -> AppResult<Vec<SessionCommand>> {
    let data =
        fs::read_to_string(path).map_err(|e| AppError::io(format!("read script {}", path.display()), e))?;
    serde_json::from_str(&data).map_err(|e| AppError::json(format!("parse script {}", path.display()), e))
}
