use chicken_core::MIN_PLAYERS;
use rand::Rng;
use rand::seq::SliceRandom;

/// Errors that can occur while pairing players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// Odd roster, or fewer than [`MIN_PLAYERS`].
    InvalidPlayerCount(usize),
    /// The player or the source round has no pairing.
    PairingNotFound,
}

impl std::fmt::Display for PairingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPlayerCount(n) => write!(
                f,
                "invalid player count: need an even number of at least {}, got {}",
                MIN_PLAYERS, n
            ),
            Self::PairingNotFound => write!(f, "pairing not found"),
        }
    }
}

impl std::error::Error for PairingError {}

/// Checks the roster size precondition shared by activation and pairing.
pub fn validate(count: usize) -> Result<(), PairingError> {
    (count >= MIN_PLAYERS && count % 2 == 0)
        .then_some(())
        .ok_or(PairingError::InvalidPlayerCount(count))
}

/// Uniformly shuffles the roster and partitions it into consecutive
/// disjoint pairs `(p0, p1), (p2, p3), ...`.
pub fn shuffle<T, R>(players: &[T], rng: &mut R) -> Result<Vec<(T, T)>, PairingError>
where
    T: Copy,
    R: Rng + ?Sized,
{
    validate(players.len())?;
    let mut deck = players.to_vec();
    deck.shuffle(rng);
    Ok(deck.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}

/// Finds the other member of the pair containing `player`.
pub fn opponent<T>(pairs: &[(T, T)], player: T) -> Result<T, PairingError>
where
    T: Copy + PartialEq,
{
    pairs
        .iter()
        .find_map(|&(a, b)| {
            if a == player {
                Some(b)
            } else if b == player {
                Some(a)
            } else {
                None
            }
        })
        .ok_or(PairingError::PairingNotFound)
}
