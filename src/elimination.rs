use tracing::{debug, info, warn};

use crate::progression::{clear_result, propagate_byes};
use crate::seeding::{next_power_of_two, seed_positions};
use crate::types::{Match, MatchIdIssuer, Participant, ParticipantId, Round};

/// Places seeded entrants into bracket slots: slot `k` holds seed `order[k]`,
/// and slots for seeds beyond the roster stay empty.
pub fn seeded_slots(entrants: &[Participant], bracket_size: usize) -> Vec<Option<ParticipantId>> {
  seed_positions(bracket_size)
    .into_iter()
    .map(|seed| entrants.get(seed as usize - 1).map(|e| e.id))
    .collect()
}

/// Builds single-elimination rounds from entrants already in seed order.
/// First-round byes are decided on construction and moved into round two.
/// The caller guarantees at least two entrants.
pub fn build_single_elim(entrants: &[Participant], ids: &mut MatchIdIssuer) -> Vec<Round> {
  let bracket_size = next_power_of_two(entrants.len().max(2));
  let slots = seeded_slots(entrants, bracket_size);

  let mut rounds: Vec<Round> = Vec::new();
  let first = slots
    .chunks(2)
    .map(|pair| Match::new(ids.issue(), pair[0], pair[1]))
    .collect::<Vec<_>>();
  rounds.push(first);

  let mut prev_len = bracket_size / 2;
  while prev_len > 1 {
    let next = (0..prev_len / 2).map(|_| Match::empty(ids.issue())).collect::<Vec<_>>();
    prev_len = next.len();
    rounds.push(next);
  }

  let byes = rounds[0].iter().filter(|m| m.is_bye()).count();
  propagate_byes(&mut rounds);
  info!(
    entrants = entrants.len(),
    bracket_size,
    rounds = rounds.len(),
    byes,
    "built single elimination bracket"
  );
  rounds
}

/// Losers of the two semifinals, once both are decided.
pub fn semifinal_losers(rounds: &[Round]) -> Option<(ParticipantId, ParticipantId)> {
  if rounds.len() < 2 {
    return None;
  }
  let semis = &rounds[rounds.len() - 2];
  if semis.len() != 2 {
    return None;
  }
  Some((semis[0].loser()?, semis[1].loser()?))
}

/// Keeps the third-place match in line with the semifinal results. The match is
/// created once both semifinal losers are known, rebuilt with cleared scores when
/// either loser changes, and withdrawn while a semifinal is undecided.
/// Returns whether anything changed.
pub fn refresh_third_place(rounds: &[Round], current: &mut Option<Match>, ids: &mut MatchIdIssuer) -> bool {
  let Some((a, b)) = semifinal_losers(rounds) else {
    let had_match = current.is_some();
    if had_match {
      debug!("withdrew third place match");
    }
    *current = None;
    return had_match;
  };

  match current {
    Some(m) if m.slots == [Some(a), Some(b)] => false,
    Some(m) => {
      m.slots = [Some(a), Some(b)];
      clear_result(m);
      debug!(match_id = m.id, "third place pairing changed");
      true
    }
    None if ids.remaining() == 0 => {
      warn!("no match id left for a third place match");
      false
    }
    None => {
      let m = Match::new(ids.issue(), Some(a), Some(b));
      debug!(match_id = m.id, "created third place match");
      *current = Some(m);
      true
    }
  }
}
