use clap::ValueEnum;
use derive_more::Display;

/// Collision-resolution policy of a [`NameIndex`](super::NameIndex).
///
/// The three policies disagree on duplicate keys and on what
/// counts as a collision, so they stay separate insert paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Display)]
pub enum ProbingStrategy {
    /// Step one slot at a time. Equal keys are chained onto the slot they hit.
    #[display("linear probing")]
    Linear,
    /// Step by the square of the attempt count. Equal keys are refused.
    #[display("quadratic probing")]
    Quadratic,
    /// Every slot holds a chain. Equal keys are refused.
    #[default]
    #[display("chaining")]
    Chaining,
}
