//! Blockchain RPC Adapters

mod solana;

pub use solana::{SolanaRpcClient, SolanaRpcConfig};
