use std::collections::HashMap;

use tracing::{debug, info};

use crate::double_elim::{build_double_elim, settle_winners_match};
use crate::elimination::{build_single_elim, refresh_third_place};
use crate::errors::{BracketError, BracketResult};
use crate::progression::{decide, propagate_winner, validate_score};
use crate::roster::Roster;
use crate::round_robin::build_round_robin;
use crate::standings::compute_standings;
use crate::types::{
  Bracket, BracketKind, Format, Match, MatchId, MatchIdIssuer, MatchLocation, Participant, ParticipantId,
  Section, Standing, MIN_ROSTER_SIZE,
};

#[derive(Clone, Debug)]
pub struct SessionOptions {
  pub third_place_match: bool,
}

impl Default for SessionOptions {
  fn default() -> Self {
    SessionOptions { third_place_match: true }
  }
}

/// Builds a bracket from a roster snapshot in seed order. Rejects rosters that are
/// too small before any match id is issued.
pub fn build_bracket(entrants: &[Participant], format: Format, ids: &mut MatchIdIssuer) -> BracketResult<Bracket> {
  if entrants.len() < MIN_ROSTER_SIZE {
    return Err(BracketError::RosterTooSmall {
      required: MIN_ROSTER_SIZE,
      actual: entrants.len(),
    });
  }
  // Loose upper bound on the ids a bracket can consume, third place included.
  let n = entrants.len() as u64;
  let needed = n.saturating_mul(n).saturating_add(n.saturating_mul(4));
  if ids.remaining() < needed {
    return Err(BracketError::IdsExhausted);
  }
  let kind = match format {
    Format::Single => BracketKind::Single {
      rounds: build_single_elim(entrants, ids),
      third_place: None,
    },
    Format::Double => {
      let (winners, losers) = build_double_elim(entrants, ids);
      BracketKind::Double { winners, losers }
    }
    Format::RoundRobin => BracketKind::RoundRobin {
      rounds: build_round_robin(entrants, ids),
    },
  };
  Ok(Bracket {
    entrants: entrants.to_vec(),
    kind,
  })
}

pub fn index_matches(bracket: &Bracket) -> HashMap<MatchId, MatchLocation> {
  bracket
    .matches()
    .into_iter()
    .map(|(location, m)| (m.id, location))
    .collect()
}

/// One tournament session: the roster, the current bracket and the match id
/// sequence. Every user action goes through one method here.
pub struct BracketSession {
  roster: Roster,
  bracket: Option<Bracket>,
  match_index: HashMap<MatchId, MatchLocation>,
  ids: MatchIdIssuer,
  options: SessionOptions,
}

impl Default for BracketSession {
  fn default() -> Self {
    BracketSession::with_options(SessionOptions::default())
  }
}

impl BracketSession {
  pub fn new() -> Self {
    BracketSession::default()
  }

  pub fn with_options(options: SessionOptions) -> Self {
    BracketSession {
      roster: Roster::new(),
      bracket: None,
      match_index: HashMap::new(),
      ids: MatchIdIssuer::default(),
      options,
    }
  }

  /// Reassembles a session from imported parts. Match ids continue after the
  /// highest id found in the bracket.
  pub fn restore(roster: Roster, bracket: Option<Bracket>, options: SessionOptions) -> BracketResult<Self> {
    let mut ids = MatchIdIssuer::default();
    let match_index = bracket.as_ref().map(index_matches).unwrap_or_default();
    if let Some(max) = match_index.keys().max() {
      ids.skip_past(*max)?;
    }
    Ok(BracketSession {
      roster,
      bracket,
      match_index,
      ids,
      options,
    })
  }

  // ── Roster ────────────────────────────────────────────────────────────

  pub fn roster(&self) -> &Roster {
    &self.roster
  }

  pub fn participants(&self) -> &[Participant] {
    self.roster.participants()
  }

  pub fn add_participant(&mut self, name: &str, score: Option<f64>) -> BracketResult<ParticipantId> {
    let id = self.roster.add(name, score)?;
    debug!(participant = id, "added participant");
    Ok(id)
  }

  pub fn remove_participant(&mut self, id: ParticipantId) -> BracketResult<Participant> {
    let removed = self.roster.remove(id)?;
    debug!(participant = id, "removed participant");
    Ok(removed)
  }

  /// Empties the roster and drops the bracket built from it.
  pub fn clear_participants(&mut self) {
    self.roster.clear();
    self.reset();
  }

  pub fn set_participant_score(&mut self, id: ParticipantId, score: Option<f64>) -> BracketResult<()> {
    self.roster.set_score(id, score)
  }

  pub fn set_participant_category(&mut self, id: ParticipantId, category: &str) -> BracketResult<()> {
    self.roster.set_category(id, category)
  }

  pub fn seed_by_score(&mut self) {
    self.roster.seed_by_score();
  }

  pub fn balanced_teams(&self) -> Vec<(ParticipantId, Option<ParticipantId>)> {
    self.roster.balanced_teams()
  }

  // ── Bracket ───────────────────────────────────────────────────────────

  pub fn options(&self) -> &SessionOptions {
    &self.options
  }

  pub fn bracket(&self) -> Option<&Bracket> {
    self.bracket.as_ref()
  }

  pub fn find_match(&self, id: MatchId) -> Option<(MatchLocation, &Match)> {
    let location = *self.match_index.get(&id)?;
    let m = self.bracket.as_ref()?.match_at(location)?;
    Some((location, m))
  }

  pub fn third_place_match(&self) -> Option<&Match> {
    match &self.bracket.as_ref()?.kind {
      BracketKind::Single { third_place, .. } => third_place.as_ref(),
      _ => None,
    }
  }

  pub fn standings(&self) -> BracketResult<Vec<Standing>> {
    let bracket = self.bracket.as_ref().ok_or(BracketError::NoBracket)?;
    Ok(compute_standings(bracket))
  }

  /// Replaces any current bracket with a fresh one built from the roster as it is now.
  pub fn generate(&mut self, format: Format) -> BracketResult<&Bracket> {
    let bracket = build_bracket(self.roster.participants(), format, &mut self.ids)?;
    self.match_index = index_matches(&bracket);
    info!(%format, entrants = bracket.entrants.len(), matches = self.match_index.len(), "generated bracket");
    let bracket: &Bracket = self.bracket.insert(bracket);
    Ok(bracket)
  }

  /// Enters both scores for a match, decides it and carries the result forward.
  /// Validation happens before anything changes, so a rejected call leaves the
  /// bracket exactly as it was.
  pub fn record_score(
    &mut self,
    match_id: MatchId,
    score1: Option<f64>,
    score2: Option<f64>,
  ) -> BracketResult<&Bracket> {
    let scores = [validate_score(score1)?, validate_score(score2)?];
    let bracket = self.bracket.as_mut().ok_or(BracketError::NoBracket)?;
    let location = *self
      .match_index
      .get(&match_id)
      .ok_or(BracketError::MatchNotFound(match_id))?;
    let target = bracket
      .match_at_mut(location)
      .ok_or(BracketError::MatchNotFound(match_id))?;
    if target.is_bye() {
      return Err(BracketError::ByeNotScorable(match_id));
    }
    if !target.is_ready() {
      return Err(BracketError::MatchNotReady(match_id));
    }
    let previous_loser = target.loser();
    target.scores = scores;
    decide(target);
    debug!(match_id, ?scores, winner = ?target.winner(), "recorded score");

    let MatchLocation { section, round, position } = location;
    let mut reindex = false;
    match (&mut bracket.kind, section) {
      (BracketKind::Single { rounds, third_place }, Section::Main) => {
        propagate_winner(rounds, round, position);
        if self.options.third_place_match {
          reindex = refresh_third_place(rounds, third_place, &mut self.ids);
        }
      }
      (BracketKind::Double { winners, losers }, Section::Winners) => {
        settle_winners_match(winners, losers, round, position, previous_loser);
      }
      // Third place, losers bracket and round robin results are terminal.
      _ => {}
    }
    if reindex {
      self.match_index = index_matches(bracket);
    }
    Ok(&*bracket)
  }

  /// Drops the current bracket. The roster and the match id sequence are kept.
  pub fn reset(&mut self) {
    if self.bracket.take().is_some() {
      info!("reset bracket");
    }
    self.match_index.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{EntrantStatus, MatchOutcome};

  fn session_with(players: &[(&str, f64)]) -> BracketSession {
    let mut session = BracketSession::new();
    for (name, score) in players {
      session.add_participant(name, Some(*score)).unwrap();
    }
    session
  }

  fn abcd() -> BracketSession {
    session_with(&[("A", 10.0), ("B", 8.0), ("C", 6.0), ("D", 4.0)])
  }

  fn main_rounds(session: &BracketSession) -> &Vec<Vec<Match>> {
    match &session.bracket().unwrap().kind {
      BracketKind::Single { rounds, .. } | BracketKind::RoundRobin { rounds } => rounds,
      BracketKind::Double { winners, .. } => winners,
    }
  }

  #[test]
  fn generate_rejects_small_roster() {
    let mut session = session_with(&[("Solo", 1.0)]);
    let err = session.generate(Format::Single).unwrap_err();
    assert_eq!(err, BracketError::RosterTooSmall { required: 2, actual: 1 });
    assert!(session.bracket().is_none());
  }

  #[test]
  fn four_player_scenario() {
    let mut session = abcd();
    session.generate(Format::Single).unwrap();
    let rounds = main_rounds(&session).clone();
    let name = |id: Option<u32>| session.roster().get(id.unwrap()).unwrap().name.clone();
    assert_eq!((name(rounds[0][0].p1()), name(rounds[0][0].p2())), ("A".into(), "D".into()));
    assert_eq!((name(rounds[0][1].p1()), name(rounds[0][1].p2())), ("B".into(), "C".into()));

    session.record_score(rounds[0][0].id, Some(3.0), Some(1.0)).unwrap();
    session.record_score(rounds[0][1].id, Some(2.0), Some(2.0)).unwrap();

    let final_match = &main_rounds(&session)[1][0];
    assert_eq!(final_match.slots, [Some(1), Some(2)]);
    assert_eq!(main_rounds(&session)[0][1].winner(), Some(2));
  }

  #[test]
  fn byes_and_empty_matches_cannot_be_scored() {
    let mut session = session_with(&[("A", 5.0), ("B", 4.0), ("C", 3.0)]);
    session.generate(Format::Single).unwrap();
    let rounds = main_rounds(&session).clone();
    let bye = rounds[0][0].id;
    let final_id = rounds[1][0].id;

    assert_eq!(session.record_score(bye, Some(1.0), Some(0.0)).unwrap_err(), BracketError::ByeNotScorable(bye));
    assert_eq!(
      session.record_score(final_id, Some(1.0), Some(0.0)).unwrap_err(),
      BracketError::MatchNotReady(final_id)
    );
    assert_eq!(main_rounds(&session), &rounds);
  }

  #[test]
  fn rejected_scores_leave_state_untouched() {
    let mut session = abcd();
    session.generate(Format::Single).unwrap();
    let before = session.bracket().cloned();
    let first = main_rounds(&session)[0][0].id;

    assert!(matches!(
      session.record_score(first, Some(f64::INFINITY), Some(1.0)),
      Err(BracketError::MalformedScore(_))
    ));
    assert_eq!(session.record_score(999, Some(1.0), Some(0.0)).unwrap_err(), BracketError::MatchNotFound(999));
    assert_eq!(session.bracket().cloned(), before);
  }

  #[test]
  fn scoring_without_bracket_fails() {
    let mut session = abcd();
    assert_eq!(session.record_score(1, Some(1.0), Some(0.0)).unwrap_err(), BracketError::NoBracket);
    assert_eq!(session.standings().unwrap_err(), BracketError::NoBracket);
  }

  #[test]
  fn regenerating_issues_fresh_ids() {
    let mut session = abcd();
    let first_ids = session
      .generate(Format::Single)
      .unwrap()
      .matches()
      .iter()
      .map(|(_, m)| m.id)
      .collect::<Vec<_>>();
    let second_ids = session
      .generate(Format::Single)
      .unwrap()
      .matches()
      .iter()
      .map(|(_, m)| m.id)
      .collect::<Vec<_>>();
    assert_eq!(first_ids, vec![1, 2, 3]);
    assert_eq!(second_ids, vec![4, 5, 6]);
    assert!(session.find_match(1).is_none());
    assert!(session.find_match(4).is_some());
  }

  #[test]
  fn roster_changes_do_not_patch_the_bracket() {
    let mut session = abcd();
    session.generate(Format::Single).unwrap();
    session.remove_participant(4).unwrap();
    let bracket = session.bracket().unwrap();
    assert!(bracket.entrant(4).is_some());
    assert_eq!(main_rounds(&session)[0][0].p2(), Some(4));
  }

  #[test]
  fn third_place_match_is_scoreable_and_terminal() {
    let mut session = abcd();
    session.generate(Format::Single).unwrap();
    let rounds = main_rounds(&session).clone();
    assert!(session.third_place_match().is_none());

    session.record_score(rounds[0][0].id, Some(3.0), Some(1.0)).unwrap();
    session.record_score(rounds[0][1].id, Some(3.0), Some(1.0)).unwrap();
    let bronze = session.third_place_match().cloned().unwrap();
    assert_eq!(bronze.slots, [Some(4), Some(3)]);
    assert_eq!(session.find_match(bronze.id).map(|(loc, _)| loc.section), Some(Section::ThirdPlace));

    session.record_score(bronze.id, Some(0.0), Some(2.0)).unwrap();
    assert_eq!(session.third_place_match().unwrap().winner(), Some(3));
    assert_eq!(main_rounds(&session)[1][0].outcome, MatchOutcome::Unset);
  }

  #[test]
  fn third_place_can_be_disabled() {
    let mut session = BracketSession::with_options(SessionOptions { third_place_match: false });
    for name in ["A", "B", "C", "D"] {
      session.add_participant(name, None).unwrap();
    }
    session.generate(Format::Single).unwrap();
    let rounds = main_rounds(&session).clone();
    session.record_score(rounds[0][0].id, Some(3.0), Some(1.0)).unwrap();
    session.record_score(rounds[0][1].id, Some(3.0), Some(1.0)).unwrap();
    assert!(session.third_place_match().is_none());
  }

  #[test]
  fn double_elim_drops_losers() {
    let mut session = abcd();
    session.generate(Format::Double).unwrap();
    let (first, second, loser_match) = match &session.bracket().unwrap().kind {
      BracketKind::Double { winners, losers } => (winners[0][0].id, winners[0][1].id, losers[0][0].id),
      _ => unreachable!(),
    };
    session.record_score(first, Some(3.0), Some(1.0)).unwrap();
    session.record_score(second, Some(0.0), Some(1.0)).unwrap();

    let (_, losers_match) = session.find_match(loser_match).unwrap();
    assert_eq!(losers_match.slots, [Some(4), Some(2)]);
    session.record_score(loser_match, Some(1.0), Some(5.0)).unwrap();
    assert_eq!(session.find_match(loser_match).unwrap().1.winner(), Some(2));
  }

  #[test]
  fn round_robin_scores_do_not_propagate() {
    let mut session = abcd();
    session.generate(Format::RoundRobin).unwrap();
    let before = session.bracket().cloned().unwrap();
    let first = main_rounds(&session)[0][0].id;
    session.record_score(first, Some(1.0), Some(0.0)).unwrap();
    let after = session.bracket().unwrap();
    let changed = before
      .matches()
      .iter()
      .zip(after.matches().iter())
      .filter(|((_, a), (_, b))| a != b)
      .count();
    assert_eq!(changed, 1);
  }

  #[test]
  fn five_player_double_elim_settles_every_loser() {
    let mut session = session_with(&[("A", 10.0), ("B", 8.0), ("C", 6.0), ("D", 4.0), ("E", 2.0)]);
    session.generate(Format::Double).unwrap();
    let ids_of = |session: &BracketSession, round: usize| -> Vec<MatchId> {
      match &session.bracket().unwrap().kind {
        BracketKind::Double { winners, .. } => winners[round].iter().map(|m| m.id).collect(),
        _ => unreachable!(),
      }
    };
    let losers_match = match &session.bracket().unwrap().kind {
      BracketKind::Double { losers, .. } => losers[0][0].id,
      _ => unreachable!(),
    };

    session.record_score(ids_of(&session, 0)[1], Some(2.0), Some(1.0)).unwrap();
    let (_, bye) = session.find_match(losers_match).unwrap();
    assert_eq!(bye.slots, [Some(5), None]);
    assert_eq!(bye.outcome, MatchOutcome::Bye { winner: 5 });
    assert_eq!(
      session.record_score(losers_match, Some(1.0), Some(0.0)).unwrap_err(),
      BracketError::ByeNotScorable(losers_match)
    );

    for id in ids_of(&session, 1).into_iter().chain(ids_of(&session, 2)) {
      session.record_score(id, Some(2.0), Some(1.0)).unwrap();
    }
    assert_eq!(session.bracket().unwrap().champion(), Some(1));

    let standings = session.standings().unwrap();
    let status_of = |id: ParticipantId| standings.iter().find(|s| s.participant_id == id).unwrap().status;
    assert_eq!(status_of(1), EntrantStatus::Champion);
    assert_eq!(status_of(5), EntrantStatus::Eliminated);
    assert_eq!(status_of(2), EntrantStatus::Eliminated);
    assert_eq!(status_of(4), EntrantStatus::Active);
    assert_eq!(status_of(3), EntrantStatus::Active);
  }

  #[test]
  fn clear_participants_drops_bracket() {
    let mut session = abcd();
    session.generate(Format::Single).unwrap();
    session.clear_participants();
    assert!(session.bracket().is_none());
    assert!(session.participants().is_empty());
  }
}
