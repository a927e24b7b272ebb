//! A minimal owned two-slot value.
//!
//! The miner loader's `meta` symbol is, in the original plugin contract, a
//! null-terminated array of C strings interpreted in pairs of
//! `(factory_name, label)`. Reaching for a `HashMap` to carry exactly two
//! related values around is overkill; `Pair` names the relationship instead.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Pair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Pair { first, second }
    }
}

impl<A, B> From<(A, B)> for Pair<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Pair { first, second }
    }
}
