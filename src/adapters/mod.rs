// Adapters layer: concrete implementations of the domain ports.

pub mod presenter;
pub mod snapshot;
