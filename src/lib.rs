pub mod archive;
pub mod cli;
pub mod core;
pub mod error;
pub mod fs;
pub mod settings;

pub use core::api::{RestorePolicy, RollbackApi, RollbackOps};
pub use core::config::RollbackConfig;
pub use error::types::{ArchiveError, FileSystemError, Result, RollbackError};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
