use std::cmp::Ordering;

use crate::types::{Participant, ParticipantId};

/// Smallest power of two that is `>= n` (1 for `n == 0`).
pub fn next_power_of_two(n: usize) -> usize {
  n.max(1).next_power_of_two()
}

/// Standard bracket placement: slot `i` (0-indexed) holds seed `order[i]`.
/// Every seed `s` of the half-size order is followed by its complement `size + 1 - s`,
/// so seeds 1 and 2 land in opposite halves and cannot meet before the final.
pub fn seed_positions(size: usize) -> Vec<u32> {
  debug_assert!(size.is_power_of_two(), "seed order needs a power-of-two size, got {size}");
  let mut seeds = vec![1u32];
  while seeds.len() < size {
    let n = seeds.len() as u32;
    let mut next = Vec::with_capacity(seeds.len() * 2);
    for seed in seeds.iter().copied() {
      next.push(seed);
      next.push(n * 2 + 1 - seed);
    }
    seeds = next;
  }
  seeds
}

/// Descending by score; unscored participants count as 0. Stable, so equal
/// scores keep their roster order.
pub fn compare_by_score_desc(a: &Participant, b: &Participant) -> Ordering {
  let a_score = a.score.unwrap_or(0.0);
  let b_score = b.score.unwrap_or(0.0);
  b_score.total_cmp(&a_score)
}

pub fn sort_by_score_desc(participants: &mut [Participant]) {
  participants.sort_by(compare_by_score_desc);
}

/// Balanced two-person teams: the strongest remaining participant is paired with
/// the weakest remaining one. An odd participant out gets a team of one.
pub fn balanced_pairs(participants: &[Participant]) -> Vec<(ParticipantId, Option<ParticipantId>)> {
  let mut ranked = participants.to_vec();
  sort_by_score_desc(&mut ranked);
  let ids = ranked.iter().map(|p| p.id).collect::<Vec<_>>();

  let mut pairs = Vec::with_capacity(ids.len().div_ceil(2));
  let (mut lo, mut hi) = (0usize, ids.len());
  while lo < hi {
    hi -= 1;
    if lo == hi {
      pairs.push((ids[lo], None));
    } else {
      pairs.push((ids[lo], Some(ids[hi])));
    }
    lo += 1;
  }
  pairs
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  fn roster(scores: &[Option<f64>]) -> Vec<Participant> {
    scores
      .iter()
      .enumerate()
      .map(|(idx, score)| Participant::new(idx as u32 + 1, format!("P{}", idx + 1), *score))
      .collect()
  }

  #[test]
  fn next_power_of_two_rounds_up() {
    assert_eq!(next_power_of_two(0), 1);
    assert_eq!(next_power_of_two(1), 1);
    assert_eq!(next_power_of_two(2), 2);
    assert_eq!(next_power_of_two(3), 4);
    assert_eq!(next_power_of_two(5), 8);
    assert_eq!(next_power_of_two(16), 16);
    assert_eq!(next_power_of_two(17), 32);
  }

  #[test]
  fn seed_positions_matches_standard_order() {
    assert_eq!(seed_positions(1), vec![1]);
    assert_eq!(seed_positions(2), vec![1, 2]);
    assert_eq!(seed_positions(4), vec![1, 4, 2, 3]);
    assert_eq!(seed_positions(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
  }

  #[test]
  fn seed_positions_is_a_permutation() {
    for size in [1usize, 2, 4, 8, 16, 32, 64] {
      let order = seed_positions(size);
      let unique = order.iter().copied().collect::<HashSet<_>>();
      assert_eq!(order.len(), size);
      assert_eq!(unique.len(), size);
      assert!(order.iter().all(|seed| *seed >= 1 && *seed as usize <= size));
    }
  }

  #[test]
  fn top_two_seeds_split_halves() {
    for size in [4usize, 8, 16, 32] {
      let order = seed_positions(size);
      let pos1 = order.iter().position(|s| *s == 1).unwrap();
      let pos2 = order.iter().position(|s| *s == 2).unwrap();
      assert!(pos1 < size / 2);
      assert!(pos2 >= size / 2);
    }
  }

  #[test]
  fn sort_treats_missing_score_as_zero() {
    let mut players = roster(&[Some(3.0), None, Some(10.0), Some(-1.0), Some(3.0)]);
    sort_by_score_desc(&mut players);
    let ids = players.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![3, 1, 5, 2, 4]);
  }

  #[test]
  fn balanced_pairs_even_and_odd() {
    let players = roster(&[Some(1.0), Some(4.0), Some(3.0), Some(2.0)]);
    assert_eq!(balanced_pairs(&players), vec![(2, Some(1)), (3, Some(4))]);

    let players = roster(&[Some(5.0), Some(4.0), Some(3.0)]);
    assert_eq!(balanced_pairs(&players), vec![(1, Some(3)), (2, None)]);
  }
}
