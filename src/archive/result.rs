use std::fmt;
use crate::error::types::ArchiveError;

/// Captured outcome of an external archiver run.
#[derive(Debug)]
pub struct ToolOutput {
    pub command: String,
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn is_success(&self) -> bool {
        self.return_code == 0 && !self.has_error_indicators()
    }

    fn has_error_indicators(&self) -> bool {
        let error_indicators = [
            "ERROR:",
            "Can not open the file as archive",
            "Cannot open",
            "Data Error",
        ];

        error_indicators.iter().any(|&indicator| {
            self.stderr.contains(indicator) || self.stdout.contains(indicator)
        })
    }

    pub fn get_error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        Some(if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            format!("Command failed with return code {}", self.return_code)
        })
    }

    /// Converts a failed run into an error, passing a successful one through.
    pub fn into_result(self) -> Result<Self, ArchiveError> {
        match self.get_error_message() {
            Some(reason) => Err(ArchiveError::CommandFailed {
                cmd: self.command,
                reason,
            }),
            None => Ok(self),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_error_message() {
            None => write!(f, "{}", self.stdout),
            Some(message) => write!(f, "Error ({}): {}", self.return_code, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(return_code: i32, stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            command: "7z".to_string(),
            return_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_error_detection() {
        assert!(output(0, "Everything is Ok", "").is_success());
        assert!(!output(2, "", "").is_success());
        assert!(!output(0, "", "ERROR: backup.7z\nCan not open the file as archive").is_success());
    }

    #[test]
    fn test_into_result() {
        assert!(output(0, "Everything is Ok", "").into_result().is_ok());

        match output(2, "", "ERROR: Data Error").into_result() {
            Err(ArchiveError::CommandFailed { cmd, reason }) => {
                assert_eq!(cmd, "7z");
                assert_eq!(reason, "ERROR: Data Error");
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(output(0, "Everything is Ok", "").to_string(), "Everything is Ok");
        assert_eq!(output(7, "", "").to_string(), "Error (7): Command failed with return code 7");
    }
}
