mod temp;
mod traits;

pub use temp::{StagingDir, StagingKind, TempFileManager};
pub use traits::FileOperation;
