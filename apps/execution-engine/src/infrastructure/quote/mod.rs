//! Quote/Swap Aggregator Adapters

mod jupiter;

pub use jupiter::{JupiterConfig, JupiterQuoteClient};
