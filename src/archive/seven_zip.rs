use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, warn};
use crate::core::constants::DEFAULT_TIMEOUT;
use crate::error::types::{ArchiveError, Result};
use super::result::ToolOutput;
use super::tool::{partial_archive_path, persist_archive, ArchiveTool};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drives an external 7-Zip executable.
///
/// Archives are written with solid compression (`-ms=on`). A run that exceeds the
/// timeout is killed and reported as [`ArchiveError::Timeout`].
#[derive(Debug, Clone)]
pub struct SevenZipTool {
    executable: PathBuf,
    timeout: Duration,
}

impl Default for SevenZipTool {
    fn default() -> Self {
        Self::new()
    }
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut reader) = reader {
            let mut bytes = Vec::new();
            if let Err(e) = reader.read_to_end(&mut bytes) {
                warn!("Failed to read archiver output: {}", e);
            }
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
        if tx.send(text).is_err() {
            warn!("Failed to send archiver output - receiver dropped");
        }
    });
    rx
}

impl SevenZipTool {
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("7z"),
            timeout: Duration::from_secs(u64::from(DEFAULT_TIMEOUT)),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_secs(1));
        self
    }

    fn command_name(&self) -> String {
        self.executable.display().to_string()
    }

    fn run(&self, args: Vec<OsString>) -> Result<ToolOutput> {
        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Full command: {:?}", command);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ArchiveError::CommandNotFound(self.command_name()),
            _ => ArchiveError::CommandFailed {
                cmd: self.command_name(),
                reason: e.to_string(),
            },
        })?;

        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    debug!("Archiver timed out after {} seconds", self.timeout.as_secs());
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill archiver process: {}", e);
                    }
                    let _ = child.wait();
                    return Err(ArchiveError::Timeout(self.timeout.as_secs() as u32).into());
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(ArchiveError::CommandFailed {
                        cmd: self.command_name(),
                        reason: e.to_string(),
                    }.into());
                }
            }
        };

        let output = ToolOutput {
            command: self.command_name(),
            return_code: status.code().unwrap_or(-1),
            stdout: stdout_rx.recv().unwrap_or_default(),
            stderr: stderr_rx.recv().unwrap_or_default(),
        };

        debug!("Command completed with status: {:?}", status);
        debug!("Stdout: {}", output.stdout);
        debug!("Stderr: {}", output.stderr);

        Ok(output)
    }

    fn compress_args(source_dir: &Path, archive: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["a", "-t7z", "-ms=on", "-mx=9", "-y", "-bd"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(archive.as_os_str().to_owned());
        args.push(source_dir.join("*").into_os_string());
        args
    }

    fn extract_args(archive: &Path, dest_dir: &Path) -> Vec<OsString> {
        let mut output_flag = OsString::from("-o");
        output_flag.push(dest_dir.as_os_str());
        vec![
            OsString::from("x"),
            archive.as_os_str().to_owned(),
            output_flag,
            OsString::from("-y"),
            OsString::from("-bd"),
        ]
    }
}

impl ArchiveTool for SevenZipTool {
    fn name(&self) -> &str {
        "7z"
    }

    fn compress(&self, source_dir: &Path, dest_archive: &Path) -> Result<()> {
        let partial = partial_archive_path(dest_archive)?;
        self.run(Self::compress_args(source_dir, &partial))?.into_result()?;
        persist_archive(partial, dest_archive)
    }

    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        if !archive.is_file() {
            return Err(ArchiveError::Io {
                path: archive.to_path_buf(),
                reason: "archive does not exist".to_string(),
            }.into());
        }
        self.run(Self::extract_args(archive, dest_dir))?.into_result()?;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn ArchiveTool> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::types::RollbackError;

    #[test]
    fn test_compress_args_use_solid_mode() {
        let args = SevenZipTool::compress_args(Path::new("staging"), Path::new("out.7z"));
        assert_eq!(args[0], "a");
        assert!(args.iter().any(|a| a == "-ms=on"));
        assert_eq!(args[args.len() - 2], "out.7z");
        assert_eq!(PathBuf::from(&args[args.len() - 1]), Path::new("staging").join("*"));
    }

    #[test]
    fn test_extract_args() {
        let args = SevenZipTool::extract_args(Path::new("in.7z"), Path::new("dest"));
        assert_eq!(args[0], "x");
        assert_eq!(args[1], "in.7z");
        assert_eq!(args[2], "-odest");
    }

    #[test]
    fn test_missing_executable() {
        let temp = tempfile::tempdir().unwrap();
        let tool = SevenZipTool::new().with_executable("definitely-not-a-real-7z-binary");
        let dest = temp.path().join("out.7z");

        match tool.compress(temp.path(), &dest) {
            Err(RollbackError::Archive(ArchiveError::CommandNotFound(cmd))) => {
                assert_eq!(cmd, "definitely-not-a-real-7z-binary");
            }
            other => panic!("Expected CommandNotFound, got {:?}", other),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_timeout_is_at_least_one_second() {
        let tool = SevenZipTool::new().with_timeout(Duration::from_millis(10));
        assert_eq!(tool.timeout, Duration::from_secs(1));
    }
}
