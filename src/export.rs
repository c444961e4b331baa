use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::errors::{AppError, AppResult, BracketError, BracketResult};
use crate::progression::{decide, validate_score};
use crate::roster::Roster;
use crate::session::{BracketSession, SessionOptions};
use crate::types::*;

// ── Serialized records ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub p1: Option<ParticipantId>,
    pub p2: Option<ParticipantId>,
    pub score1: Option<f64>,
    pub score2: Option<f64>,
    pub winner: Option<ParticipantId>,
    pub loser: Option<ParticipantId>,
}

impl From<&Match> for MatchRecord {
    fn from(m: &Match) -> Self {
        MatchRecord {
            id: m.id,
            p1: m.p1(),
            p2: m.p2(),
            score1: m.scores[0],
            score2: m.scores[1],
            winner: m.winner(),
            loser: m.loser(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum BracketRecord {
    #[serde(rename = "single", rename_all = "camelCase")]
    Single {
        entrants: Vec<Participant>,
        rounds: Vec<Vec<MatchRecord>>,
        #[serde(default)]
        third_place: Option<MatchRecord>,
    },
    #[serde(rename = "double", rename_all = "camelCase")]
    Double {
        entrants: Vec<Participant>,
        rounds_winners: Vec<Vec<MatchRecord>>,
        rounds_losers: Vec<Vec<MatchRecord>>,
    },
    #[serde(rename = "roundrobin", rename_all = "camelCase")]
    RoundRobin {
        entrants: Vec<Participant>,
        rounds: Vec<Vec<MatchRecord>>,
    },
}

/// Everything needed to restore a session: the roster in seed order and the
/// bracket with its match ids, scores and winners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentExport {
    #[serde(default = "default_competition_name")]
    pub competition_name: String,
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub bracket: Option<BracketRecord>,
    #[serde(default = "default_true")]
    pub third_place_match: bool,
}

fn default_competition_name() -> String {
    DEFAULT_COMPETITION_NAME.to_string()
}

fn default_true() -> bool {
    true
}

// ── Bracket -> records ─────────────────────────────────────────────────

fn rounds_to_records(rounds: &[Round]) -> Vec<Vec<MatchRecord>> {
    rounds
        .iter()
        .map(|round| round.iter().map(MatchRecord::from).collect())
        .collect()
}

pub fn bracket_to_record(bracket: &Bracket) -> BracketRecord {
    let entrants = bracket.entrants.clone();
    match &bracket.kind {
        BracketKind::Single { rounds, third_place } => BracketRecord::Single {
            entrants,
            rounds: rounds_to_records(rounds),
            third_place: third_place.as_ref().map(MatchRecord::from),
        },
        BracketKind::Double { winners, losers } => BracketRecord::Double {
            entrants,
            rounds_winners: rounds_to_records(winners),
            rounds_losers: rounds_to_records(losers),
        },
        BracketKind::RoundRobin { rounds } => BracketRecord::RoundRobin {
            entrants,
            rounds: rounds_to_records(rounds),
        },
    }
}

pub fn export_session(session: &BracketSession, competition_name: &str) -> TournamentExport {
    TournamentExport {
        competition_name: competition_name.to_string(),
        participants: session.participants().to_vec(),
        bracket: session.bracket().map(bracket_to_record),
        third_place_match: session.options().third_place_match,
    }
}

// ── Records -> bracket ─────────────────────────────────────────────────

fn invalid(message: String) -> BracketError {
    BracketError::InvalidImport(message)
}

/// Checks participant references, match ids and result consistency while
/// rebuilding matches from records.
struct RecordResolver {
    entrant_ids: HashSet<ParticipantId>,
    seen_matches: HashSet<MatchId>,
}

impl RecordResolver {
    fn new(entrants: &[Participant]) -> BracketResult<Self> {
        let mut entrant_ids = HashSet::new();
        for entrant in entrants {
            if !entrant_ids.insert(entrant.id) {
                return Err(invalid(format!("duplicate entrant id {}", entrant.id)));
            }
        }
        Ok(RecordResolver {
            entrant_ids,
            seen_matches: HashSet::new(),
        })
    }

    fn participant(&self, match_id: MatchId, id: Option<ParticipantId>) -> BracketResult<Option<ParticipantId>> {
        match id {
            Some(id) if !self.entrant_ids.contains(&id) => {
                Err(invalid(format!("match {match_id} references unknown participant {id}")))
            }
            other => Ok(other),
        }
    }

    fn resolve(&mut self, record: &MatchRecord) -> BracketResult<Match> {
        if !self.seen_matches.insert(record.id) {
            return Err(invalid(format!("duplicate match id {}", record.id)));
        }
        let p1 = self.participant(record.id, record.p1)?;
        let p2 = self.participant(record.id, record.p2)?;
        if p1.is_some() && p1 == p2 {
            return Err(invalid(format!("match {} pairs a participant with itself", record.id)));
        }
        let scores = [validate_score(record.score1)?, validate_score(record.score2)?];

        let mut m = Match::empty(record.id);
        m.slots = [p1, p2];
        m.scores = scores;
        m.outcome = match (p1, p2) {
            (Some(only), None) | (None, Some(only)) => match record.winner {
                Some(winner) if winner == only => MatchOutcome::Bye { winner },
                None => MatchOutcome::Unset,
                Some(other) => {
                    return Err(invalid(format!(
                        "match {} names winner {other} who is not in the match",
                        record.id
                    )))
                }
            },
            _ => {
                decide(&mut m);
                m.outcome
            }
        };
        if m.winner() != record.winner || m.loser() != record.loser {
            return Err(invalid(format!(
                "match {} result does not agree with its scores and occupants",
                record.id
            )));
        }
        Ok(m)
    }

    fn resolve_rounds(&mut self, records: &[Vec<MatchRecord>]) -> BracketResult<Vec<Round>> {
        records
            .iter()
            .map(|round| round.iter().map(|record| self.resolve(record)).collect())
            .collect()
    }
}

/// Elimination rounds halve down to a single final.
fn check_elimination_shape(rounds: &[Round]) -> BracketResult<()> {
    let Some(first) = rounds.first() else {
        return Err(invalid("elimination bracket has no rounds".to_string()));
    };
    let mut expected = first.len();
    if !expected.is_power_of_two() {
        return Err(invalid(format!("first round has {expected} matches")));
    }
    for (idx, round) in rounds.iter().enumerate() {
        if round.len() != expected {
            return Err(invalid(format!(
                "round {idx} has {} matches, expected {expected}",
                round.len()
            )));
        }
        expected = (expected / 2).max(1);
    }
    if rounds.last().map(Vec::len) != Some(1) {
        return Err(invalid("elimination bracket does not end in a single final".to_string()));
    }
    Ok(())
}

pub fn record_to_bracket(record: &BracketRecord) -> BracketResult<Bracket> {
    let (entrants, kind) = match record {
        BracketRecord::Single { entrants, rounds, third_place } => {
            let mut resolver = RecordResolver::new(entrants)?;
            let rounds = resolver.resolve_rounds(rounds)?;
            check_elimination_shape(&rounds)?;
            let third_place = third_place.as_ref().map(|m| resolver.resolve(m)).transpose()?;
            (entrants, BracketKind::Single { rounds, third_place })
        }
        BracketRecord::Double {
            entrants,
            rounds_winners,
            rounds_losers,
        } => {
            let mut resolver = RecordResolver::new(entrants)?;
            let winners = resolver.resolve_rounds(rounds_winners)?;
            check_elimination_shape(&winners)?;
            let losers = resolver.resolve_rounds(rounds_losers)?;
            (entrants, BracketKind::Double { winners, losers })
        }
        BracketRecord::RoundRobin { entrants, rounds } => {
            let mut resolver = RecordResolver::new(entrants)?;
            let rounds = resolver.resolve_rounds(rounds)?;
            (entrants, BracketKind::RoundRobin { rounds })
        }
    };
    if entrants.len() < MIN_ROSTER_SIZE {
        return Err(invalid(format!("bracket has {} entrants", entrants.len())));
    }
    Ok(Bracket {
        entrants: entrants.clone(),
        kind,
    })
}

/// Rebuilds a session from an export. Nothing is returned unless the whole
/// payload validates.
pub fn import_session(export: &TournamentExport) -> BracketResult<BracketSession> {
    let bracket = export.bracket.as_ref().map(record_to_bracket).transpose()?;
    let entrant_ids = bracket.iter().flat_map(|b| b.entrants.iter().map(|e| e.id));
    let roster = Roster::from_participants(export.participants.clone(), entrant_ids)?;
    let options = SessionOptions {
        third_place_match: export.third_place_match,
    };
    info!(
        participants = roster.len(),
        format = ?bracket.as_ref().map(Bracket::format),
        "imported session"
    );
    BracketSession::restore(roster, bracket, options)
}

// ── Files ──────────────────────────────────────────────────────────────

pub fn export_file_name(date: NaiveDate) -> String {
    format!("octomatch_data_{}.json", date.format("%Y-%m-%d"))
}

pub fn to_json(export: &TournamentExport) -> AppResult<String> {
    serde_json::to_string_pretty(export).map_err(|e| AppError::json("serialize export", e))
}

pub fn from_json(data: &str) -> AppResult<TournamentExport> {
    serde_json::from_str(data).map_err(|e| AppError::json("parse export", e))
}

pub fn write_export(dir: &Path, export: &TournamentExport, date: NaiveDate) -> AppResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| AppError::io(format!("create {}", dir.display()), e))?;
    let path = dir.join(export_file_name(date));
    let payload = to_json(export)?;
    fs::write(&path, payload).map_err(|e| AppError::io(format!("write export {}", path.display()), e))?;
    info!(path = %path.display(), "wrote export");
    Ok(path)
}

pub fn read_export(path: &Path) -> AppResult<TournamentExport> {
    let data =
        fs::read_to_string(path).map_err(|e| AppError::io(format!("read export {}", path.display()), e))?;
    from_json(&data)
}
