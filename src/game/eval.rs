//! Hand evaluator: ranks any 5-7 card set into a hand category plus an
//! ordered kicker vector, totally ordered so equality means a genuine split.

use super::deck::Card;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Hand categories from weakest to strongest. Derived `Ord` follows
/// declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum HandCategory {
    HighCard,
    Pair,
    TwoPair,
    Trips,
    Straight,
    Flush,
    FullHouse,
    Quads,
    StraightFlush,
    RoyalFlush,
}

/// A classified hand: category plus the ordered tiebreaker ranks within it.
///
/// The kicker vector carries the defining ranks first (pair rank, trips
/// rank, ...) followed by the side kickers, so lexicographic comparison
/// breaks ties correctly within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandRank {
    pub category: HandCategory,
    pub kickers: Vec<u8>,
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.kickers.cmp(&other.kickers))
    }
}

fn rank_name(rank: u8) -> &'static str {
    match rank {
        2 => "Two",
        3 => "Three",
        4 => "Four",
        5 => "Five",
        6 => "Six",
        7 => "Seven",
        8 => "Eight",
        9 => "Nine",
        10 => "Ten",
        11 => "Jack",
        12 => "Queen",
        13 => "King",
        _ => "Ace",
    }
}

fn rank_plural(rank: u8) -> String {
    if rank == 6 {
        "Sixes".to_string()
    } else {
        format!("{}s", rank_name(rank))
    }
}

impl HandRank {
    /// Human-readable description, e.g. "Pair of Kings" or "Ace High".
    pub fn describe(&self) -> String {
        let k = &self.kickers;
        match self.category {
            HandCategory::RoyalFlush => "Royal Flush".to_string(),
            HandCategory::StraightFlush => {
                format!("Straight Flush, {} High", rank_name(k[0]))
            }
            HandCategory::Quads => format!("Four of a Kind, {}", rank_plural(k[0])),
            HandCategory::FullHouse => format!(
                "Full House, {} over {}",
                rank_plural(k[0]),
                rank_plural(k[1])
            ),
            HandCategory::Flush => format!("Flush, {} High", rank_name(k[0])),
            HandCategory::Straight => format!("Straight, {} High", rank_name(k[0])),
            HandCategory::Trips => format!("Three of a Kind, {}", rank_plural(k[0])),
            HandCategory::TwoPair => format!(
                "Two Pair, {} and {}",
                rank_plural(k[0]),
                rank_plural(k[1])
            ),
            HandCategory::Pair => format!("Pair of {}", rank_plural(k[0])),
            HandCategory::HighCard => format!("{} High", rank_name(k[0])),
        }
    }
}

/// If the five distinct-or-not ranks form a straight, return its high card.
/// The Ace may play low in A-2-3-4-5 (high card 5); no wrap-around.
fn straight_high(ranks_desc: &[u8; 5]) -> Option<u8> {
    let distinct = ranks_desc.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if ranks_desc[0] - ranks_desc[4] == 4 {
        return Some(ranks_desc[0]);
    }
    // Wheel: A-5-4-3-2
    if ranks_desc == &[14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// Classify exactly five cards.
fn classify_five(cards: &[Card]) -> HandRank {
    debug_assert_eq!(cards.len(), 5);

    let mut ranks: [u8; 5] = [0; 5];
    for (i, c) in cards.iter().enumerate() {
        ranks[i] = c.rank;
    }
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight = straight_high(&ranks);

    if let (true, Some(high)) = (is_flush, straight) {
        return if high == 14 {
            HandRank {
                category: HandCategory::RoyalFlush,
                kickers: vec![],
            }
        } else {
            HandRank {
                category: HandCategory::StraightFlush,
                kickers: vec![high],
            }
        };
    }

    // Group ranks: (count, rank) sorted by count desc, then rank desc.
    let mut groups: Vec<(u8, u8)> = Vec::with_capacity(5);
    for &r in &ranks {
        match groups.iter_mut().find(|(_, gr)| *gr == r) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, r)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));

    match groups.as_slice() {
        [(4, quad), (1, kicker)] => HandRank {
            category: HandCategory::Quads,
            kickers: vec![*quad, *kicker],
        },
        [(3, trips), (2, pair)] => HandRank {
            category: HandCategory::FullHouse,
            kickers: vec![*trips, *pair],
        },
        _ if is_flush => HandRank {
            category: HandCategory::Flush,
            kickers: ranks.to_vec(),
        },
        _ if straight.is_some() => HandRank {
            category: HandCategory::Straight,
            kickers: vec![straight.unwrap()],
        },
        [(3, trips), (1, k1), (1, k2)] => HandRank {
            category: HandCategory::Trips,
            kickers: vec![*trips, *k1, *k2],
        },
        [(2, hi), (2, lo), (1, k)] => HandRank {
            category: HandCategory::TwoPair,
            kickers: vec![*hi, *lo, *k],
        },
        [(2, pair), (1, k1), (1, k2), (1, k3)] => HandRank {
            category: HandCategory::Pair,
            kickers: vec![*pair, *k1, *k2, *k3],
        },
        _ => HandRank {
            category: HandCategory::HighCard,
            kickers: ranks.to_vec(),
        },
    }
}

/// Generate all k-combinations of indices 0..n.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut combo: Vec<usize> = (0..k).collect();
    loop {
        result.push(combo.clone());
        // Advance the rightmost index that can still move.
        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if combo[i] != i + n - k {
                break;
            }
        }
        combo[i] += 1;
        for j in i + 1..k {
            combo[j] = combo[j - 1] + 1;
        }
    }
}

/// Evaluate the best 5-card hand among 5-7 cards by enumerating every
/// 5-card subset (at most C(7,5) = 21) and taking the maximum.
pub fn evaluate_best(cards: &[Card]) -> HandRank {
    debug_assert!((5..=7).contains(&cards.len()));
    combinations(cards.len(), 5)
        .into_iter()
        .map(|idxs| {
            let five: Vec<Card> = idxs.iter().map(|&i| cards[i]).collect();
            classify_five(&five)
        })
        .max()
        .expect("at least one 5-card combination")
}

/// Evaluate hole cards plus community cards.
pub fn evaluate_hand(hole_cards: &[Card], community_cards: &[Card]) -> HandRank {
    let mut all = Vec::with_capacity(hole_cards.len() + community_cards.len());
    all.extend_from_slice(hole_cards);
    all.extend_from_slice(community_cards);
    evaluate_best(&all)
}

/// Determine winner indices from (player_idx, HandRank) pairs. Ties return
/// every tied index.
pub fn determine_winners(hands: &[(usize, HandRank)]) -> Vec<usize> {
    let best = match hands.iter().map(|(_, r)| r).max() {
        Some(best) => best.clone(),
        None => return vec![],
    };
    hands
        .iter()
        .filter(|(_, r)| *r == best)
        .map(|(idx, _)| *idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(list: &str) -> Vec<Card> {
        list.split_whitespace()
            .map(|s| Card::parse(s).expect("valid card"))
            .collect()
    }

    fn rank_of(list: &str) -> HandRank {
        evaluate_best(&cards(list))
    }

    #[test]
    fn royal_flush_is_its_own_category() {
        let r = rank_of("As Ks Qs Js Ts 2h 3d");
        assert_eq!(r.category, HandCategory::RoyalFlush);
        assert_eq!(r.describe(), "Royal Flush");
    }

    #[test]
    fn straight_flush_below_royal() {
        let r = rank_of("9s Ks Qs Js Ts");
        assert_eq!(r.category, HandCategory::StraightFlush);
        assert_eq!(r.kickers, vec![13]);
        assert!(r < rank_of("As Ks Qs Js Ts"));
    }

    #[test]
    fn wheel_straight_has_high_card_five() {
        let r = rank_of("Ah 2c 3d 4s 5h 9c Jd");
        assert_eq!(r.category, HandCategory::Straight);
        assert_eq!(r.kickers, vec![5]);
        // The wheel loses to a six-high straight.
        assert!(r < rank_of("2c 3d 4s 5h 6h 9c Jd"));
    }

    #[test]
    fn no_wraparound_straight() {
        let r = rank_of("Qh Kd Ac 2s 3h");
        assert_eq!(r.category, HandCategory::HighCard);
    }

    #[test]
    fn pair_kickers_exclude_the_paired_rank() {
        let r = rank_of("Ah Ad 9c 5s 2h");
        assert_eq!(r.category, HandCategory::Pair);
        assert_eq!(r.kickers, vec![14, 9, 5, 2]);
        assert_eq!(r.describe(), "Pair of Aces");
    }

    #[test]
    fn two_pair_ordering_and_description() {
        let r = rank_of("Kh Kd 6c 6s Ah");
        assert_eq!(r.category, HandCategory::TwoPair);
        assert_eq!(r.kickers, vec![13, 6, 14]);
        assert_eq!(r.describe(), "Two Pair, Kings and Sixes");
    }

    #[test]
    fn full_house_beats_flush() {
        let boat = rank_of("Kh Kd Kc 2s 2h");
        let flush = rank_of("Ah Jh 9h 5h 2h");
        assert!(boat > flush);
        assert_eq!(boat.describe(), "Full House, Kings over Twos");
    }

    #[test]
    fn seven_card_hand_picks_the_best_subset() {
        // Board pairs the deuce, but the best five is the ace-high flush.
        let r = rank_of("Ah Qh 2h Jh Kh 2c 9d");
        assert_eq!(r.category, HandCategory::Flush);
        assert_eq!(r.kickers, vec![14, 13, 12, 11, 2]);
    }

    #[test]
    fn equal_hands_are_a_genuine_split() {
        let a = evaluate_hand(&cards("Ah Qh"), &cards("2h 5d 9c Js Kd"));
        let b = evaluate_hand(&cards("Ad Qd"), &cards("2h 5d 9c Js Kd"));
        assert_eq!(a, b);
        assert_eq!(a.describe(), "Ace High");
    }

    #[test]
    fn kicker_breaks_ties_within_a_category() {
        let better = rank_of("Ah Ad Kc 5s 2h");
        let worse = rank_of("As Ac Qc 5d 2d");
        assert!(better > worse);
    }

    #[test]
    fn winners_include_every_tied_player() {
        let split = HandRank {
            category: HandCategory::Straight,
            kickers: vec![9],
        };
        let hands = vec![
            (0, split.clone()),
            (1, split),
            (
                2,
                HandRank {
                    category: HandCategory::Pair,
                    kickers: vec![14, 9, 5, 2],
                },
            ),
        ];
        let winners = determine_winners(&hands);
        assert_eq!(winners, vec![0, 1]);
    }

    #[test]
    fn combination_count_for_seven_cards() {
        assert_eq!(combinations(7, 5).len(), 21);
        assert_eq!(combinations(5, 5).len(), 1);
    }
}
