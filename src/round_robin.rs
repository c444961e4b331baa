use tracing::info;

use crate::types::{Match, MatchIdIssuer, Participant, ParticipantId, Round};

/// Circle-method schedule. An odd roster gets a sit-out placeholder, position 0
/// stays fixed, and after every round the last position rotates into position 1.
/// Pairings against the placeholder are skipped, so that entrant rests that round.
pub fn build_round_robin(entrants: &[Participant], ids: &mut MatchIdIssuer) -> Vec<Round> {
  let mut order: Vec<Option<ParticipantId>> = entrants.iter().map(|e| Some(e.id)).collect();
  if order.len() % 2 == 1 {
    order.push(None);
  }
  let size = order.len();
  let round_count = size.saturating_sub(1);

  let mut rounds = Vec::with_capacity(round_count);
  for _ in 0..round_count {
    let mut round = Vec::with_capacity(size / 2);
    for i in 0..size / 2 {
      if let (Some(a), Some(b)) = (order[i], order[size - 1 - i]) {
        round.push(Match::new(ids.issue(), Some(a), Some(b)));
      }
    }
    rounds.push(round);

    if let Some(last) = order.pop() {
      order.insert(1, last);
    }
  }

  info!(
    entrants = entrants.len(),
    rounds = rounds.len(),
    matches = rounds.iter().map(Vec::len).sum::<usize>(),
    "built round robin schedule"
  );
  rounds
}
