use tracing::debug;

use crate::errors::{BracketError, BracketResult};
use crate::types::{Match, MatchOutcome, ParticipantId, Round};

/// Scores must be finite numbers; `None` means not entered.
pub fn validate_score(score: Option<f64>) -> BracketResult<Option<f64>> {
  match score {
    Some(value) if !value.is_finite() => Err(BracketError::MalformedScore(value.to_string())),
    other => Ok(other),
  }
}

/// Recomputes the outcome of a match from its occupants and scores.
/// Higher score wins; an equal score goes to slot 1. A missing score leaves the
/// match unset. Byes keep their outcome.
pub fn decide(m: &mut Match) {
  if m.is_bye() {
    return;
  }
  m.outcome = match (m.slots, m.scores) {
    ([Some(p1), Some(p2)], [Some(s1), Some(s2)]) => {
      if s1 >= s2 {
        MatchOutcome::Decided { winner: p1, loser: p2 }
      } else {
        MatchOutcome::Decided { winner: p2, loser: p1 }
      }
    }
    _ => MatchOutcome::Unset,
  };
}

/// Drops scores and decision, keeping the occupants.
pub fn clear_result(m: &mut Match) {
  if m.is_bye() {
    return;
  }
  m.scores = [None, None];
  m.outcome = MatchOutcome::Unset;
}

/// Destination of a match's winner in the following round: (position, slot index).
pub fn next_slot(position: usize) -> (usize, usize) {
  (position / 2, position % 2)
}

/// A downstream match whose decision was cleared because an upstream result changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidated {
  pub round: usize,
  pub position: usize,
  pub loser: Option<ParticipantId>,
}

/// Forwards the current winner (or the lack of one) of `rounds[round][position]`
/// through the elimination tree. A destination slot that already holds the incoming
/// winner is left alone; otherwise the slot is overwritten, the destination loses
/// its scores and decision, and the change keeps travelling toward the final.
/// Sibling branches are never touched.
pub fn propagate_winner(rounds: &mut [Round], round: usize, position: usize) -> Vec<Invalidated> {
  let mut invalidated = Vec::new();
  let (mut r, mut p) = (round, position);
  while r + 1 < rounds.len() {
    let Some(incoming) = rounds[r].get(p).map(Match::winner) else {
      break;
    };
    let (next_position, slot) = next_slot(p);
    let Some(target) = rounds[r + 1].get_mut(next_position) else {
      break;
    };
    if target.slots[slot] == incoming {
      break;
    }
    target.slots[slot] = incoming;
    if target.is_decided() {
      invalidated.push(Invalidated {
        round: r + 1,
        position: next_position,
        loser: target.loser(),
      });
      debug!(match_id = target.id, round = r + 1, position = next_position, "cleared downstream decision");
    }
    clear_result(target);
    debug!(match_id = target.id, slot, participant = ?incoming, "placed winner");
    r += 1;
    p = next_position;
  }
  invalidated
}

/// Pushes every first-round bye winner into the second round.
pub fn propagate_byes(rounds: &mut [Round]) {
  let bye_positions = rounds
    .first()
    .map(|first| {
      first
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_bye())
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>()
    })
    .unwrap_or_default();
  for position in bye_positions {
    propagate_winner(rounds, 0, position);
  }
}
