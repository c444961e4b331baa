use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::BracketError;

// ── Constants ──────────────────────────────────────────────────────────

pub const MIN_ROSTER_SIZE: usize = 2;
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const DEFAULT_COMPETITION_NAME: &str = "OctoMatch";

// ── Identifiers ────────────────────────────────────────────────────────

pub type ParticipantId = u32;
pub type MatchId = u64;

// ── Roster types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default = "default_category")]
    pub category: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, score: Option<f64>) -> Self {
        Participant {
            id,
            name: name.into(),
            score,
            category: default_category(),
        }
    }
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

/// A line of a roster file. Ids are issued when the entry is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

// ── Bracket types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "roundrobin")]
    RoundRobin,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Single => "single",
            Format::Double => "double",
            Format::RoundRobin => "roundrobin",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = BracketError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Format::Single),
            "double" => Ok(Format::Double),
            "roundrobin" | "round-robin" | "round_robin" => Ok(Format::RoundRobin),
            other => Err(BracketError::UnknownFormat(other.to_string())),
        }
    }
}

/// Result state of a match. A bye is decided from the moment it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Unset,
    Bye { winner: ParticipantId },
    Decided { winner: ParticipantId, loser: ParticipantId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub slots: [Option<ParticipantId>; 2],
    pub scores: [Option<f64>; 2],
    pub outcome: MatchOutcome,
}

impl Match {
    /// Builds a first-round pairing. Exactly one occupant makes it a bye.
    pub fn new(id: MatchId, p1: Option<ParticipantId>, p2: Option<ParticipantId>) -> Self {
        let outcome = match (p1, p2) {
            (Some(winner), None) | (None, Some(winner)) => MatchOutcome::Bye { winner },
            _ => MatchOutcome::Unset,
        };
        Match {
            id,
            slots: [p1, p2],
            scores: [None, None],
            outcome,
        }
    }

    pub fn empty(id: MatchId) -> Self {
        Match {
            id,
            slots: [None, None],
            scores: [None, None],
            outcome: MatchOutcome::Unset,
        }
    }

    pub fn p1(&self) -> Option<ParticipantId> {
        self.slots[0]
    }

    pub fn p2(&self) -> Option<ParticipantId> {
        self.slots[1]
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        match self.outcome {
            MatchOutcome::Unset => None,
            MatchOutcome::Bye { winner } | MatchOutcome::Decided { winner, .. } => Some(winner),
        }
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        match self.outcome {
            MatchOutcome::Decided { loser, .. } => Some(loser),
            _ => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Bye { .. })
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self.outcome, MatchOutcome::Unset)
    }

    /// Both slots occupied, so scores may be entered.
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }

    pub fn involves(&self, id: ParticipantId) -> bool {
        self.slots.iter().any(|slot| *slot == Some(id))
    }
}

pub type Round = Vec<Match>;

/// Issues match ids for one session. Ids only move forward, so a regenerated
/// bracket never reuses an id from an earlier one.
#[derive(Debug, Clone)]
pub struct MatchIdIssuer {
    next: MatchId,
}

impl Default for MatchIdIssuer {
    fn default() -> Self {
        MatchIdIssuer { next: 1 }
    }
}

impl MatchIdIssuer {
    /// Callers check `remaining` first; once the sequence is spent the last id
    /// would repeat.
    pub fn issue(&mut self) -> MatchId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    pub fn peek(&self) -> MatchId {
        self.next
    }

    /// Ids that can still be issued without repeating one.
    pub fn remaining(&self) -> u64 {
        MatchId::MAX - self.next
    }

    /// Moves past `id` if it has not been issued yet (used after an import).
    pub fn skip_past(&mut self, id: MatchId) -> Result<(), BracketError> {
        if id >= self.next {
            self.next = id.checked_add(1).ok_or_else(|| {
                BracketError::InvalidImport(format!("match id {id} leaves no id for new matches"))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BracketKind {
    Single {
        rounds: Vec<Round>,
        third_place: Option<Match>,
    },
    Double {
        winners: Vec<Round>,
        losers: Vec<Round>,
    },
    RoundRobin {
        rounds: Vec<Round>,
    },
}

/// A generated tournament structure plus the roster snapshot it was built from.
/// `entrants` is kept in seed order; matches refer to it by participant id.
#[derive(Debug, Clone, PartialEq)]
pub struct Bracket {
    pub entrants: Vec<Participant>,
    pub kind: BracketKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Main,
    Winners,
    Losers,
    ThirdPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLocation {
    pub section: Section,
    pub round: usize,
    pub position: usize,
}

impl MatchLocation {
    pub fn new(section: Section, round: usize, position: usize) -> Self {
        MatchLocation { section, round, position }
    }
}

impl Bracket {
    pub fn format(&self) -> Format {
        match self.kind {
            BracketKind::Single { .. } => Format::Single,
            BracketKind::Double { .. } => Format::Double,
            BracketKind::RoundRobin { .. } => Format::RoundRobin,
        }
    }

    pub fn entrant(&self, id: ParticipantId) -> Option<&Participant> {
        self.entrants.iter().find(|p| p.id == id)
    }

    /// Every round sequence paired with the section it belongs to.
    pub fn sections(&self) -> Vec<(Section, &[Round])> {
        match &self.kind {
            BracketKind::Single { rounds, .. } | BracketKind::RoundRobin { rounds } => {
                vec![(Section::Main, rounds.as_slice())]
            }
            BracketKind::Double { winners, losers } => vec![
                (Section::Winners, winners.as_slice()),
                (Section::Losers, losers.as_slice()),
            ],
        }
    }

    /// Enumerates all matches in render order, third-place match last.
    pub fn matches(&self) -> Vec<(MatchLocation, &Match)> {
        let mut out = Vec::new();
        for (section, rounds) in self.sections() {
            for (round_idx, round) in rounds.iter().enumerate() {
                for (position, m) in round.iter().enumerate() {
                    out.push((MatchLocation::new(section, round_idx, position), m));
                }
            }
        }
        if let BracketKind::Single { third_place: Some(m), .. } = &self.kind {
            out.push((MatchLocation::new(Section::ThirdPlace, 0, 0), m));
        }
        out
    }

    pub fn match_at(&self, location: MatchLocation) -> Option<&Match> {
        match (&self.kind, location.section) {
            (BracketKind::Single { third_place, .. }, Section::ThirdPlace) => third_place.as_ref(),
            (BracketKind::Single { rounds, .. }, Section::Main)
            | (BracketKind::RoundRobin { rounds }, Section::Main)
            | (BracketKind::Double { winners: rounds, .. }, Section::Winners)
            | (BracketKind::Double { losers: rounds, .. }, Section::Losers) => {
                rounds.get(location.round)?.get(location.position)
            }
            _ => None,
        }
    }

    pub fn match_at_mut(&mut self, location: MatchLocation) -> Option<&mut Match> {
        match (&mut self.kind, location.section) {
            (BracketKind::Single { third_place, .. }, Section::ThirdPlace) => third_place.as_mut(),
            (BracketKind::Single { rounds, .. }, Section::Main)
            | (BracketKind::RoundRobin { rounds }, Section::Main)
            | (BracketKind::Double { winners: rounds, .. }, Section::Winners)
            | (BracketKind::Double { losers: rounds, .. }, Section::Losers) => {
                rounds.get_mut(location.round)?.get_mut(location.position)
            }
            _ => None,
        }
    }

    pub fn find_match(&self, id: MatchId) -> Option<(MatchLocation, &Match)> {
        self.matches().into_iter().find(|(_, m)| m.id == id)
    }

    /// Winner of the deciding match of an elimination bracket.
    pub fn champion(&self) -> Option<ParticipantId> {
        match &self.kind {
            BracketKind::Single { rounds, .. } | BracketKind::Double { winners: rounds, .. } => {
                rounds.last()?.first()?.winner()
            }
            BracketKind::RoundRobin { .. } => None,
        }
    }
}

// ── Standings types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntrantStatus {
    Active,
    Champion,
    Eliminated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub name: String,
    pub seed: u32,
    pub wins: u32,
    pub losses: u32,
    pub status: EntrantStatus,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub competition_name: String,
    pub format: Format,
    pub roster_path: String,
    pub script_path: String,
    pub output_dir: String,
    pub logs_dir: String,
    pub seed_by_score: bool,
    pub third_place_match: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            competition_name: DEFAULT_COMPETITION_NAME.to_string(),
            format: Format::Single,
            roster_path: String::new(),
            script_path: String::new(),
            output_dir: "exports".to_string(),
            logs_dir: "logs".to_string(),
            seed_by_score: true,
            third_place_match: true,
        }
    }
}
