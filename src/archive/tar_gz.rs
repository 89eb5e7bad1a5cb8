use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use walkdir::WalkDir;
use crate::error::types::{ArchiveError, Result};
use super::tool::{partial_archive_path, persist_archive, ArchiveTool};

/// In-process archiver writing a tar stream through a single gzip stream,
/// so the whole archive is compressed as one solid block.
#[derive(Debug, Clone)]
pub struct TarGzTool {
    level: u32,
}

impl Default for TarGzTool {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> ArchiveError + '_ {
    move |e| ArchiveError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl TarGzTool {
    pub fn new() -> Self {
        Self { level: 9 }
    }

    fn write_archive(&self, source_dir: &Path, file: File) -> Result<usize> {
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::new(self.level));
        let mut builder = tar::Builder::new(encoder);
        let mut count = 0;

        for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ArchiveError::Io {
                path: source_dir.to_path_buf(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(source_dir)
                .map_err(|e| ArchiveError::Io {
                    path: entry.path().to_path_buf(),
                    reason: e.to_string(),
                })?;
            builder.append_path_with_name(entry.path(), relative)
                .map_err(io_error(entry.path()))?;
            count += 1;
        }

        let encoder = builder.into_inner().map_err(io_error(source_dir))?;
        let mut writer = encoder.finish().map_err(io_error(source_dir))?;
        writer.flush().map_err(io_error(source_dir))?;
        Ok(count)
    }
}

impl ArchiveTool for TarGzTool {
    fn name(&self) -> &str {
        "tar.gz"
    }

    fn compress(&self, source_dir: &Path, dest_archive: &Path) -> Result<()> {
        debug!("Compressing {} into {}", source_dir.display(), dest_archive.display());
        let partial = partial_archive_path(dest_archive)?;
        let file = File::create(&partial).map_err(io_error(&partial))?;

        let count = self.write_archive(source_dir, file)?;
        persist_archive(partial, dest_archive)?;

        debug!("Wrote {} files to {}", count, dest_archive.display());
        Ok(())
    }

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        debug!("Extracting {} into {}", archive.display(), dest_dir.display());
        let file = File::open(archive).map_err(io_error(archive))?;
        let mut unpacker = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        unpacker.unpack(dest_dir).map_err(io_error(archive))?;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn ArchiveTool> {
        Box::new(self.clone())
    }
}
