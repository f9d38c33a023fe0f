use super::*;
use chicken_core::*;
use chicken_game::PairingError;
use rand::Rng;

/// Two players matched against each other for one round.
///
/// Pairs are drawn once for round 1 and copied verbatim into every later
/// round of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    round: ID<Round>,
    a: ID<Participant>,
    b: ID<Participant>,
}

impl Pairing {
    pub fn new(round: ID<Round>, a: ID<Participant>, b: ID<Participant>) -> Self {
        Self { round, a, b }
    }
    pub fn round(&self) -> ID<Round> {
        self.round
    }
    pub fn a(&self) -> ID<Participant> {
        self.a
    }
    pub fn b(&self) -> ID<Participant> {
        self.b
    }
    pub fn members(&self) -> [ID<Participant>; 2] {
        [self.a, self.b]
    }

    /// Shuffles the roster into disjoint pairs for `round`.
    pub fn draw<R>(
        round: ID<Round>,
        players: &[ID<Participant>],
        rng: &mut R,
    ) -> Result<Vec<Self>, PairingError>
    where
        R: Rng + ?Sized,
    {
        chicken_game::shuffle(players, rng).map(|pairs| {
            pairs
                .into_iter()
                .map(|(a, b)| Self::new(round, a, b))
                .collect()
        })
    }
    /// Copies the pairs of an earlier round onto `round`.
    pub fn rebind(source: &[Self], round: ID<Round>) -> Result<Vec<Self>, PairingError> {
        match source.is_empty() {
            true => Err(PairingError::PairingNotFound),
            false => Ok(source.iter().map(|p| Self::new(round, p.a, p.b)).collect()),
        }
    }
    /// The other member of `player`'s pair.
    pub fn opponent(
        pairings: &[Self],
        player: ID<Participant>,
    ) -> Result<ID<Participant>, PairingError> {
        let pairs = pairings.iter().map(|p| (p.a, p.b)).collect::<Vec<_>>();
        chicken_game::opponent(&pairs, player)
    }
    /// Every paired player, pair by pair.
    pub fn players(pairings: &[Self]) -> impl Iterator<Item = ID<Participant>> + '_ {
        pairings.iter().flat_map(Self::members)
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use chicken_pg::*;

    impl Schema for Pairing {
        fn name() -> &'static str {
            PAIRINGS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                PAIRINGS,
                " (
                    round_id        UUID NOT NULL REFERENCES ",
                ROUNDS,
                "(id) ON DELETE CASCADE,
                    player_a        UUID NOT NULL REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    player_b        UUID NOT NULL REFERENCES ",
                PARTICIPANTS,
                "(id) ON DELETE CASCADE,
                    PRIMARY KEY (round_id, player_a),
                    UNIQUE (round_id, player_b)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_pairings_round ON ",
                PAIRINGS,
                " (round_id);"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    #[test]
    fn later_rounds_keep_first_round_pairs() {
        let ref mut rng = SmallRng::seed_from_u64(3);
        let players = (0..6).map(|_| ID::default()).collect::<Vec<_>>();
        let first = Pairing::draw(ID::default(), &players, rng).unwrap();
        let later = ID::default();
        let again = Pairing::rebind(&first, later).unwrap();
        assert_eq!(again.len(), 3);
        for (x, y) in first.iter().zip(again.iter()) {
            assert_eq!(x.members(), y.members());
            assert_eq!(y.round(), later);
        }
        for player in players.iter().copied() {
            assert_eq!(
                Pairing::opponent(&first, player),
                Pairing::opponent(&again, player)
            );
        }
    }
    #[test]
    fn rebinding_nothing_is_not_found() {
        assert_eq!(
            Pairing::rebind(&[], ID::default()),
            Err(PairingError::PairingNotFound)
        );
    }
}
