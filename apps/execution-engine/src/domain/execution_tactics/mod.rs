//! Execution Tactics Bounded Context
//!
//! Chooses how a parent order is worked (Immediate, TWAP, VWAP, Iceberg) and
//! plans its child slices. Algorithms are a closed set; each variant carries
//! only the parameters it needs.

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::TacticError;
pub use services::{SelectionContext, SelectionPolicy, TacticSelector, plan_slices};
pub use value_objects::{
    AlgorithmKind, ChildSlice, ExecutionAlgorithm, IcebergParams, SliceStatus, TwapParams,
    VwapParams,
};
