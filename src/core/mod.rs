pub mod api;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod manifest;
pub mod restore;
pub mod test_utils;
pub mod version;

pub use api::*;
pub use backup::*;
pub use catalog::*;
pub use config::*;
pub use constants::*;
pub use manifest::*;
pub use restore::*;
pub use version::*;
