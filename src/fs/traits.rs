use std::path::{Path, PathBuf};
use std::fs::{create_dir_all, remove_dir_all, remove_file};
use log::debug;
use walkdir::WalkDir;
use crate::error::types::{Result, FileSystemError};

pub trait FileOperation {
    fn ensure_parent_exists(&self) -> Result<()>;
    fn ensure_directory(&self) -> Result<()>;
    fn remove_if_exists(&self) -> Result<()>;
    /// Copies a regular file to `dest`, creating missing parents and overwriting `dest`.
    fn copy_file_to(&self, dest: &Path) -> Result<()>;
    /// Names of the regular files directly inside this directory, sorted.
    /// A missing directory yields an empty list.
    fn list_files(&self) -> Result<Vec<String>>;
    /// Copies every regular file below this directory to the same relative path below `dest`.
    fn copy_tree_to(&self, dest: &Path) -> Result<usize>;
}

impl FileOperation for Path {
    fn ensure_parent_exists(&self) -> Result<()> {
        if let Some(parent) = self.parent() {
            if !parent.exists() {
                create_dir_all(parent)
                    .map_err(|e| FileSystemError::CreateDir {
                        path: parent.to_path_buf(),
                        reason: e.to_string(),
                    })?;
            }
        }
        Ok(())
    }

    fn ensure_directory(&self) -> Result<()> {
        if !self.exists() {
            create_dir_all(self)
                .map_err(|e| FileSystemError::CreateDir {
                    path: self.to_path_buf(),
                    reason: e.to_string(),
                })?;
        } else if !self.is_dir() {
            return Err(FileSystemError::CreateDir {
                path: self.to_path_buf(),
                reason: "Path exists but is not a directory".to_string(),
            }.into());
        }
        Ok(())
    }

    fn remove_if_exists(&self) -> Result<()> {
        if self.is_dir() {
            remove_dir_all(self).map_err(|e| FileSystemError::RemoveDir {
                path: self.to_path_buf(),
                reason: e.to_string(),
            })?;
        } else if self.exists() {
            remove_file(self).map_err(|e| FileSystemError::RemoveFile {
                path: self.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn copy_file_to(&self, dest: &Path) -> Result<()> {
        dest.ensure_parent_exists()?;
        std::fs::copy(self, dest)
            .map_err(|e| FileSystemError::Copy {
                from: self.to_path_buf(),
                to: dest.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        if !self.is_dir() {
            debug!("Nothing to list in {}", self.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(self)
            .map_err(|e| FileSystemError::ListDir {
                path: self.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FileSystemError::ListDir {
                path: self.to_path_buf(),
                reason: e.to_string(),
            })?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn copy_tree_to(&self, dest: &Path) -> Result<usize> {
        let mut copied = 0;
        for entry in WalkDir::new(self).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| FileSystemError::ListDir {
                path: self.to_path_buf(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(self)
                .map_err(|e| FileSystemError::Copy {
                    from: entry.path().to_path_buf(),
                    to: dest.to_path_buf(),
                    reason: e.to_string(),
                })?;
            let target: PathBuf = dest.join(relative);
            debug!("{} --> {}", entry.path().display(), target.display());
            entry.path().copy_file_to(&target)?;
            copied += 1;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_directory_operations() {
        let temp = tempdir().unwrap();
        let test_dir = temp.path().join("test_dir");

        test_dir.ensure_directory().unwrap();
        assert!(test_dir.is_dir());

        let test_file = temp.path().join("test_file");
        File::create(&test_file).unwrap();
        assert!(test_file.ensure_directory().is_err());
    }

    #[test]
    fn test_remove_if_exists() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("test.txt");
        let dir_path = temp.path().join("testdir");

        File::create(&file_path).unwrap();
        file_path.remove_if_exists().unwrap();
        assert!(!file_path.exists());

        create_dir_all(&dir_path).unwrap();
        File::create(dir_path.join("file.txt")).unwrap();
        dir_path.remove_if_exists().unwrap();
        assert!(!dir_path.exists());

        // removing something that is not there is fine
        dir_path.remove_if_exists().unwrap();
    }

    #[test]
    fn test_remove_file_error_message() {
        let err = FileSystemError::RemoveFile {
            path: PathBuf::from("bash.ini"),
            reason: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to remove file bash.ini: busy");
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("Table.dat");
        fs::write(&source, b"table").unwrap();

        let dest = temp.path().join("a/b/c/Table.dat");
        source.copy_file_to(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"table");

        fs::write(&source, b"newer").unwrap();
        source.copy_file_to(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"newer");
    }

    #[test]
    fn test_list_files_skips_directories() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();

        assert_eq!(temp.path().list_files().unwrap(), vec!["a.txt", "b.txt"]);
        assert!(temp.path().join("missing").list_files().unwrap().is_empty());
    }

    #[test]
    fn test_copy_tree_preserves_layout() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        fs::create_dir_all(source.join("Profile/Bash")).unwrap();
        fs::write(source.join("plugins.txt"), "p").unwrap();
        fs::write(source.join("Profile/Bash/Table.dat"), "t").unwrap();

        let dest = temp.path().join("dest");
        let copied = source.copy_tree_to(&dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("plugins.txt")).unwrap(), "p");
        assert_eq!(fs::read_to_string(dest.join("Profile/Bash/Table.dat")).unwrap(), "t");
    }
}
