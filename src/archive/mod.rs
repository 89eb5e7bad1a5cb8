mod result;
mod seven_zip;
mod tar_gz;
mod tool;

pub use result::ToolOutput;
pub use seven_zip::SevenZipTool;
pub use tar_gz::TarGzTool;
pub use tool::{tool_for_path, ArchiveTool};
