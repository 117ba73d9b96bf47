//! Deck shuffling driven by externally supplied randomness.

use crate::card::Card;
use crate::deck::reference_deck;
use crate::error::{Result, TarotError};

/// Permutes `items` in place with a Fisher–Yates pass seeded by `randoms`.
///
/// Index `i` runs from the last element down to 1 and is swapped with
/// `j = randoms[i % randoms.len()] % (i + 1)`. The result is always a
/// permutation of the input.
pub fn shuffle_with<T>(items: &mut [T], randoms: &[u32]) -> Result<()> {
    if randoms.is_empty() {
        return Err(TarotError::randomness("no random values supplied for shuffle"));
    }

    for i in (1..items.len()).rev() {
        let j = randoms[i % randoms.len()] as usize % (i + 1);
        items.swap(i, j);
    }

    Ok(())
}

/// Returns a freshly shuffled copy of the reference deck.
pub fn shuffled_deck(randoms: &[u32]) -> Result<Vec<Card>> {
    let mut deck = reference_deck().to_vec();
    shuffle_with(&mut deck, randoms)?;
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DECK_SIZE;

    fn sorted_ids(deck: &[Card]) -> Vec<u8> {
        let mut ids: Vec<u8> = deck.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_shuffle_is_permutation_for_varied_inputs() {
        let expected: Vec<u8> = (0..DECK_SIZE as u8).collect();
        let inputs: Vec<Vec<u32>> = vec![
            vec![0; DECK_SIZE],
            vec![u16::MAX as u32; DECK_SIZE],
            (0..DECK_SIZE as u32).collect(),
            (0..DECK_SIZE as u32).map(|n| n.wrapping_mul(2_654_435_761) >> 16).collect(),
            vec![7],
            vec![3, 1, 4, 1, 5, 9, 2, 6],
        ];

        for randoms in inputs {
            let deck = shuffled_deck(&randoms).unwrap();
            assert_eq!(deck.len(), DECK_SIZE);
            assert_eq!(sorted_ids(&deck), expected);
        }
    }

    #[test]
    fn test_shuffle_follows_index_rule() {
        let mut items = vec!['a', 'b', 'c'];
        // i = 2: j = 5 % 3 = 2 (no-op); i = 1: j = 1 % 2 = 1 (no-op)
        shuffle_with(&mut items, &[0, 1, 5]).unwrap();
        assert_eq!(items, vec!['a', 'b', 'c']);

        // i = 2: j = 0 % 3 = 0 -> c b a; i = 1: j = 0 % 2 = 0 -> b c a
        shuffle_with(&mut items, &[0, 0, 0]).unwrap();
        assert_eq!(items, vec!['b', 'c', 'a']);
    }

    #[test]
    fn test_all_zero_randoms_still_move_cards() {
        let deck = shuffled_deck(&[0; DECK_SIZE]).unwrap();
        assert_eq!(deck[0].id, 1);
        assert_eq!(sorted_ids(&deck).len(), DECK_SIZE);
    }

    #[test]
    fn test_empty_randoms_rejected() {
        let mut items = vec![1, 2, 3];
        assert!(shuffle_with(&mut items, &[]).is_err());
        assert_eq!(items, vec![1, 2, 3]);
    }
}
