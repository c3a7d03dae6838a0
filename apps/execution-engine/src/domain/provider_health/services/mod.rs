//! Provider health domain services.

mod ranking;

pub use ranking::rank_candidates;
