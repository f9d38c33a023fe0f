use rand::Rng;
use rand::seq::SliceRandom;

/// Symbols handed out as indicators.
pub const SYMBOLS: [&str; 4] = ["🍋", "🍒", "🍇", "🍉"];

/// Shuffles the roster and deals [`SYMBOLS`] round-robin, so no symbol
/// is held by more than one player above any other.
pub fn deal<T, R>(players: &[T], rng: &mut R) -> Vec<(T, &'static str)>
where
    T: Copy,
    R: Rng + ?Sized,
{
    let mut deck = players.to_vec();
    deck.shuffle(rng);
    deck.into_iter()
        .zip(SYMBOLS.iter().copied().cycle())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;

    #[test]
    fn everyone_gets_one_symbol() {
        let ref mut rng = SmallRng::seed_from_u64(11);
        let players = (0..10u32).collect::<Vec<_>>();
        let dealt = deal(&players, rng);
        assert_eq!(dealt.len(), players.len());
        let mut seen = dealt.iter().map(|(p, _)| *p).collect::<Vec<_>>();
        seen.sort();
        assert_eq!(seen, players);
    }
    #[test]
    fn symbols_are_balanced() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        let players = (0..10u32).collect::<Vec<_>>();
        let mut counts = HashMap::<&str, usize>::new();
        for (_, symbol) in deal(&players, rng) {
            *counts.entry(symbol).or_default() += 1;
        }
        assert_eq!(counts.len(), SYMBOLS.len());
        let most = counts.values().max().copied().unwrap();
        let least = counts.values().min().copied().unwrap();
        assert!(most - least <= 1);
    }
    #[test]
    fn empty_roster_deals_nothing() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        assert!(deal::<u32, _>(&[], rng).is_empty());
    }
}
