//! Execution Tactics Value Objects

mod algorithm;
mod child_slice;

pub use algorithm::{AlgorithmKind, ExecutionAlgorithm, IcebergParams, TwapParams, VwapParams};
pub use child_slice::{ChildSlice, SliceStatus};
