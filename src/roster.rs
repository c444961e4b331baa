use std::collections::HashSet;

use crate::errors::{BracketError, BracketResult};
use crate::progression::validate_score;
use crate::seeding::{balanced_pairs, sort_by_score_desc};
use crate::types::{Participant, ParticipantId, UNCATEGORIZED};

/// Roster keeps the participant list in seed order and hands out participant ids.
/// Ids are issued once and never reused, even after a removal or a clear.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    next_id: ParticipantId,
}

impl Default for Roster {
    fn default() -> Self {
        Roster {
            participants: Vec::new(),
            next_id: 1,
        }
    }
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Rebuild a roster from exported records, keeping their ids. New ids continue
    /// after both the roster and `taken`, the ids still held by bracket entrants
    /// that were removed from the roster.
    pub fn from_participants(
        participants: Vec<Participant>,
        taken: impl IntoIterator<Item = ParticipantId>,
    ) -> BracketResult<Self> {
        let mut seen = HashSet::new();
        for participant in &participants {
            if participant.name.trim().is_empty() {
                return Err(BracketError::EmptyName);
            }
            validate_score(participant.score)?;
            if !seen.insert(participant.id) {
                return Err(BracketError::InvalidImport(format!(
                    "duplicate participant id {}",
                    participant.id
                )));
            }
        }
        let highest = participants.iter().map(|p| p.id).chain(taken).max();
        let next_id = match highest {
            Some(max) => max.checked_add(1).ok_or_else(|| {
                BracketError::InvalidImport(format!("participant id {max} leaves no id for new participants"))
            })?,
            None => 1,
        };
        Ok(Roster { participants, next_id })
    }

    /// Add a participant at the end of the seed order
    pub fn add(&mut self, name: &str, score: Option<f64>) -> BracketResult<ParticipantId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BracketError::EmptyName);
        }
        let score = validate_score(score)?;
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(BracketError::IdsExhausted)?;
        self.participants.push(Participant::new(id, name, score));
        Ok(id)
    }

    /// Remove a participant. Brackets built earlier keep their own snapshot.
    pub fn remove(&mut self, id: ParticipantId) -> BracketResult<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or(BracketError::ParticipantNotFound(id))?;
        Ok(self.participants.remove(index))
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }

    pub fn set_score(&mut self, id: ParticipantId, score: Option<f64>) -> BracketResult<()> {
        let score = validate_score(score)?;
        let participant = self.get_mut(id)?;
        participant.score = score;
        Ok(())
    }

    /// Category labels come from outside the engine; an empty label resets to the default.
    pub fn set_category(&mut self, id: ParticipantId, category: &str) -> BracketResult<()> {
        let participant = self.get_mut(id)?;
        let trimmed = category.trim();
        participant.category = if trimmed.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            trimmed.to_string()
        };
        Ok(())
    }

    /// Reorder by score, highest first. Ties keep their current order.
    pub fn seed_by_score(&mut self) {
        sort_by_score_desc(&mut self.participants);
    }

    /// Strongest-with-weakest team pairing over the current roster
    pub fn balanced_teams(&self) -> Vec<(ParticipantId, Option<ParticipantId>)> {
        balanced_pairs(&self.participants)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: ParticipantId) -> BracketResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BracketError::ParticipantNotFound(id))
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
