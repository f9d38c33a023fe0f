//! Join codes players type to find a session.
//!
//! Uniqueness is not checked here. 26^6 codes make collisions rare, and the
//! caller retries against storage when one happens.
use chicken_core::CODE_LENGTH;
use rand::Rng;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draws a fresh code of [`CODE_LENGTH`] uppercase letters.
pub fn generate<R>(rng: &mut R) -> String
where
    R: Rng + ?Sized,
{
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of user input: trimmed and uppercased.
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    #[test]
    fn codes_are_uppercase_letters() {
        let ref mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..64 {
            let code = generate(rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| b.is_ascii_uppercase()));
        }
    }
    #[test]
    fn normalize_accepts_sloppy_input() {
        assert_eq!(normalize(" abcxyz\n"), "ABCXYZ");
    }
}
