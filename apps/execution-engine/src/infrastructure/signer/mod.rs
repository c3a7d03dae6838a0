//! Wallet Signer Adapters

mod remote;

pub use remote::{RemoteSigner, RemoteSignerConfig};
