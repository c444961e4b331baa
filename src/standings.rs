use std::collections::{HashMap, HashSet};

use crate::types::{Bracket, BracketKind, EntrantStatus, ParticipantId, Standing};

/// Win/loss records and bracket status per entrant.
///
/// A participant who has lost and has no undecided match left is eliminated.
/// Elimination brackets crown the winner of their last match. A round robin
/// crowns the entrant with most wins (earlier seed on ties) only once every
/// match is decided, and until then everyone stays active.
pub fn compute_standings(bracket: &Bracket) -> Vec<Standing> {
    let mut records: HashMap<ParticipantId, (u32, u32)> = HashMap::new();
    let mut pending: HashSet<ParticipantId> = HashSet::new();

    for (_, m) in bracket.matches() {
        if m.is_bye() {
            continue;
        }
        match (m.winner(), m.loser()) {
            (Some(winner), Some(loser)) => {
                records.entry(winner).or_default().0 += 1;
                records.entry(loser).or_default().1 += 1;
            }
            _ => pending.extend(m.slots.iter().flatten().copied()),
        }
    }

    let round_robin = matches!(bracket.kind, BracketKind::RoundRobin { .. });
    let champion = if round_robin {
        if pending.is_empty() {
            bracket
                .entrants
                .iter()
                .map(|e| (e.id, records.get(&e.id).map_or(0, |r| r.0)))
                .fold(None, |best: Option<(ParticipantId, u32)>, (id, wins)| match best {
                    Some((_, best_wins)) if best_wins >= wins => best,
                    _ => Some((id, wins)),
                })
                .map(|(id, _)| id)
        } else {
            None
        }
    } else {
        bracket.champion()
    };

    let mut standings = bracket
        .entrants
        .iter()
        .enumerate()
        .map(|(idx, entrant)| {
            let (wins, losses) = records.get(&entrant.id).copied().unwrap_or_default();
            let status = if champion == Some(entrant.id) {
                EntrantStatus::Champion
            } else if round_robin {
                if champion.is_some() {
                    EntrantStatus::Eliminated
                } else {
                    EntrantStatus::Active
                }
            } else if losses > 0 && !pending.contains(&entrant.id) {
                EntrantStatus::Eliminated
            } else {
                EntrantStatus::Active
            };
            Standing {
                participant_id: entrant.id,
                name: entrant.name.clone(),
                seed: idx as u32 + 1,
                wins,
                losses,
                status,
            }
        })
        .collect::<Vec<_>>();

    standings.sort_by(|a, b| {
        let state_order = |status: &EntrantStatus| -> u8 {
            match status {
                EntrantStatus::Active => 0,
                EntrantStatus::Champion => 1,
                EntrantStatus::Eliminated => 2,
            }
        };
        state_order(&a.status)
            .cmp(&state_order(&b.status))
            .then(b.wins.cmp(&a.wins))
            .then(a.seed.cmp(&b.seed))
    });
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elimination::build_single_elim;
    use crate::progression::{decide, propagate_winner};
    use crate::round_robin::build_round_robin;
    use crate::types::{MatchIdIssuer, Participant, Round};

    fn roster(n: usize) -> Vec<Participant> {
        (0..n)
            .map(|idx| Participant::new(idx as u32 + 1, format!("P{}", idx + 1), None))
            .collect()
    }

    fn score(rounds: &mut [Round], round: usize, position: usize, s1: f64, s2: f64) {
        rounds[round][position].scores = [Some(s1), Some(s2)];
        decide(&mut rounds[round][position]);
        propagate_winner(rounds, round, position);
    }

    fn status_of(standings: &[Standing], id: ParticipantId) -> EntrantStatus {
        standings.iter().find(|s| s.participant_id == id).unwrap().status
    }

    #[test]
    fn single_elim_marks_losers_and_champion() {
        let entrants = roster(4);
        let mut ids = MatchIdIssuer::default();
        let mut rounds = build_single_elim(&entrants, &mut ids);
        score(&mut rounds, 0, 0, 3.0, 1.0);

        let bracket = Bracket {
            entrants: entrants.clone(),
            kind: BracketKind::Single { rounds: rounds.clone(), third_place: None },
        };
        let standings = compute_standings(&bracket);
        assert_eq!(status_of(&standings, 4), EntrantStatus::Eliminated);
        assert_eq!(status_of(&standings, 1), EntrantStatus::Active);

        score(&mut rounds, 0, 1, 3.0, 1.0);
        score(&mut rounds, 1, 0, 1.0, 2.0);
        let bracket = Bracket {
            entrants,
            kind: BracketKind::Single { rounds, third_place: None },
        };
        let standings = compute_standings(&bracket);
        assert_eq!(status_of(&standings, 2), EntrantStatus::Champion);
        assert_eq!(status_of(&standings, 1), EntrantStatus::Eliminated);
        let champion = standings.iter().find(|s| s.participant_id == 2).unwrap();
        assert_eq!((champion.wins, champion.losses), (2, 0));
    }

    #[test]
    fn byes_do_not_count_as_wins() {
        let entrants = roster(3);
        let mut ids = MatchIdIssuer::default();
        let rounds = build_single_elim(&entrants, &mut ids);
        let bracket = Bracket {
            entrants,
            kind: BracketKind::Single { rounds, third_place: None },
        };
        let standings = compute_standings(&bracket);
        assert!(standings.iter().all(|s| s.wins == 0 && s.status == EntrantStatus::Active));
    }

    #[test]
    fn round_robin_crowns_only_when_complete() {
        let entrants = roster(3);
        let mut ids = MatchIdIssuer::default();
        let mut rounds = build_round_robin(&entrants, &mut ids);
        for round in rounds.iter_mut() {
            for m in round.iter_mut() {
                m.scores = [Some(1.0), Some(0.0)];
                decide(m);
            }
        }
        let last = rounds.len() - 1;
        rounds[last][0].scores = [None, None];
        decide(&mut rounds[last][0]);

        let mut bracket = Bracket {
            entrants,
            kind: BracketKind::RoundRobin { rounds },
        };
        let standings = compute_standings(&bracket);
        assert!(standings.iter().all(|s| s.status == EntrantStatus::Active));

        if let BracketKind::RoundRobin { rounds } = &mut bracket.kind {
            rounds[last][0].scores = [Some(1.0), Some(0.0)];
            decide(&mut rounds[last][0]);
        }
        let standings = compute_standings(&bracket);
        assert_eq!(standings.iter().filter(|s| s.status == EntrantStatus::Champion).count(), 1);
        assert_eq!(standings[0].status, EntrantStatus::Champion);
        assert!(standings[1..].iter().all(|s| s.status == EntrantStatus::Eliminated));
    }
}
