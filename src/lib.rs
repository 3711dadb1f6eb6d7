pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, OutputFormat, TomlConfig};

pub use adapters::presenter::{JsonPresenter, TextPresenter};
pub use adapters::snapshot::{Snapshot, SnapshotStore};
pub use core::architecture::{ArchitectureBuilder, UserRequest};
pub use utils::error::{ArchitectureError, Result};
