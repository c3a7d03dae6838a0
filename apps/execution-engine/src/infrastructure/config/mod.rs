//! Engine wiring.

mod container;

pub use container::{ContainerError, EngineContainer, PaperProviders};
