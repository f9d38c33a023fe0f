use super::*;
use chicken_core::Score;

/// Payoff lookup over the 2x2 choice space.
///
/// Implementations must be total and symmetric: the first score for
/// `(x, y)` equals the second score for `(y, x)`.
pub trait Matrix: Send + Sync {
    fn payoffs(&self, a: Choice, b: Choice) -> (Score, Score);
}

/// Classroom chicken: mutual turning is comfortable, accelerating into a
/// swerver wins big, and two accelerators crash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chicken;

impl Matrix for Chicken {
    fn payoffs(&self, a: Choice, b: Choice) -> (Score, Score) {
        match (a, b) {
            (Choice::Turn, Choice::Turn) => (3, 3),
            (Choice::Turn, Choice::Accelerate) => (1, 5),
            (Choice::Accelerate, Choice::Turn) => (5, 1),
            (Choice::Accelerate, Choice::Accelerate) => (0, 0),
        }
    }
}
