//! Secondary name index over the node store.
//!
//! A naive hash table (byte-sum hash, tiny default capacity)
//! whose collision-resolution policy can be switched between linear probing,
//! quadratic probing and chaining so that collision behaviour can be compared.
//! It stores non-owning targets only and never controls entry lifetime.

mod name_index;
mod strategy;

pub use name_index::{IndexError, NameIndex};
pub use strategy::ProbingStrategy;
