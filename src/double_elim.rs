use tracing::{debug, info, warn};

use crate::elimination::build_single_elim;
use crate::progression::propagate_winner;
use crate::types::{Match, MatchIdIssuer, MatchOutcome, Participant, ParticipantId, Round};

/// Winners rounds plus the losers-bracket skeleton derived from them.
pub fn build_double_elim(entrants: &[Participant], ids: &mut MatchIdIssuer) -> (Vec<Round>, Vec<Round>) {
  let winners = build_single_elim(entrants, ids);
  let losers = build_losers_skeleton(&winners, ids);
  info!(
    winners_rounds = winners.len(),
    losers_rounds = losers.len(),
    "built double elimination bracket"
  );
  (winners, losers)
}

/// One losers round per winners round except the final, holding half as many
/// matches (rounded up). Every winners round after the first is followed by a
/// consolidation round half the size of the round just added. All matches start empty.
pub fn build_losers_skeleton(winners: &[Round], ids: &mut MatchIdIssuer) -> Vec<Round> {
  let mut losers: Vec<Round> = Vec::new();
  for (idx, round) in winners.iter().enumerate().take(winners.len().saturating_sub(1)) {
    let count = round.len().div_ceil(2);
    if count == 0 {
      continue;
    }
    losers.push((0..count).map(|_| Match::empty(ids.issue())).collect());

    if idx > 0 {
      let consolidation = count.div_ceil(2);
      losers.push((0..consolidation).map(|_| Match::empty(ids.issue())).collect());
    }
  }
  losers
}

/// Index of the losers round that receives the losers of winners round `round`.
pub fn drop_round_index(round: usize) -> usize {
  if round == 0 {
    0
  } else {
    round * 2 - 1
  }
}

/// Losers-bracket match (round, position) fed by a winners match. The winners
/// final has none.
pub fn drop_target(winners_rounds: usize, round: usize, position: usize) -> Option<(usize, usize)> {
  if round + 1 >= winners_rounds {
    return None;
  }
  Some((drop_round_index(round), position / 2))
}

/// Winners matches that can still send a loser into `target`. First-round byes never do.
pub fn drop_feeders(winners: &[Round], target: (usize, usize)) -> usize {
  let rounds = winners.len();
  winners
    .iter()
    .enumerate()
    .flat_map(|(r, round)| round.iter().enumerate().map(move |(p, m)| (r, p, m)))
    .filter(|(r, p, m)| !m.is_bye() && drop_target(rounds, *r, *p) == Some(target))
    .count()
}

/// Swaps `previous` for `current` in a losers-bracket drop match. The newcomer takes
/// the first open slot. Any change clears the drop match's result, and a lone
/// occupant of a match with a single feeder gets a bye.
pub fn place_loser(
  losers: &mut [Round],
  target: (usize, usize),
  feeders: usize,
  previous: Option<ParticipantId>,
  current: Option<ParticipantId>,
) {
  if previous == current {
    return;
  }
  let Some(m) = losers.get_mut(target.0).and_then(|round| round.get_mut(target.1)) else {
    warn!(round = target.0, position = target.1, "losers drop match missing");
    return;
  };
  if let Some(prev) = previous {
    if let Some(slot) = m.slots.iter().position(|s| *s == Some(prev)) {
      m.slots[slot] = None;
    }
  }
  if let Some(next) = current {
    match m.slots.iter().position(Option::is_none) {
      Some(slot) => m.slots[slot] = Some(next),
      None => warn!(match_id = m.id, participant = next, "losers drop match has no open slot"),
    }
  }
  m.scores = [None, None];
  m.outcome = match (m.slots, feeders) {
    ([Some(winner), None], 1) | ([None, Some(winner)], 1) => MatchOutcome::Bye { winner },
    _ => MatchOutcome::Unset,
  };
  debug!(match_id = m.id, slots = ?m.slots, outcome = ?m.outcome, "updated losers drop match");
}

/// Applies a freshly decided (or undecided) winners match: its loser moves into the
/// losers bracket in place of `previous_loser`, its winner travels forward, and every
/// winners match invalidated on the way withdraws the loser it had dropped.
pub fn settle_winners_match(
  winners: &mut [Round],
  losers: &mut [Round],
  round: usize,
  position: usize,
  previous_loser: Option<ParticipantId>,
) {
  let rounds = winners.len();
  let current_loser = winners[round][position].loser();
  if let Some(target) = drop_target(rounds, round, position) {
    place_loser(losers, target, drop_feeders(winners, target), previous_loser, current_loser);
  }
  for invalidated in propagate_winner(winners, round, position) {
    if let Some(target) = drop_target(rounds, invalidated.round, invalidated.position) {
      place_loser(losers, target, drop_feeders(winners, target), invalidated.loser, None);
    }
  }
}
