// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Files staged into a job execution's workspace before the first step runs

use crate::step::Step;
use std::collections::{BTreeMap, BTreeSet};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileSetError {
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
    #[error("cannot delete directory {}: {source}", path.display())]
    Delete { path: PathBuf, source: std::io::Error },
    #[error("cannot build archive: {0}")]
    Archive(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetFile {
    pub content: Vec<u8>,
    /// Unix permission bits, e.g. `0o700`.
    pub mode: u32,
}

/// Relative path to file content and mode, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, FileSetFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the code of every code and script step under `steps/<position>`.
    pub fn from_steps(steps: &[Step], code_header: &str) -> Self {
        let mut set = Self::new();
        for step in steps {
            if let (Some(path), Some(content)) = (step.staged_path(), step.staged_content(code_header)) {
                set.add_file(path, content, 0o700);
            }
        }
        set
    }

    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>, mode: u32) {
        self.files.insert(path.into(), FileSetFile { content: content.into(), mode });
    }

    /// Move every file under `prefix`.
    pub fn with_prefix(self, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let files = self
            .files
            .into_iter()
            .map(|(path, file)| (join(prefix, &path), file))
            .collect();
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FileSetFile> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileSetFile)> {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    /// Distinct parent directories of all files once placed under `root`.
    pub fn directories(&self, root: &str) -> Vec<String> {
        let root = root.trim_end_matches('/');
        let dirs: BTreeSet<String> = self
            .files
            .keys()
            .map(|path| {
                let full = join(root, path);
                match full.rfind('/') {
                    Some(0) => "/".to_string(),
                    Some(idx) => full[..idx].to_string(),
                    None => root.to_string(),
                }
            })
            .collect();
        dirs.into_iter().collect()
    }

    /// Recreate `root` with mode 0700 and write every file into it.
    ///
    /// On a write failure the partially written root is removed.
    pub fn write_to(&self, root: &Path) -> Result<(), FileSetError> {
        match std::fs::remove_dir_all(root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(FileSetError::Delete { path: root.to_path_buf(), source }),
        }
        create_private_dir(root)?;

        for (path, file) in &self.files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                create_private_dir(parent)?;
            }
            let write = std::fs::write(&full, &file.content)
                .and_then(|_| std::fs::set_permissions(&full, std::fs::Permissions::from_mode(file.mode)));
            if let Err(source) = write {
                let _ = std::fs::remove_dir_all(root);
                return Err(FileSetError::Write { path: full, source });
            }
        }
        Ok(())
    }

    /// Ustar archive of every file with its mode, modification time `mtime`
    /// (seconds since the epoch). Paths must be relative.
    pub fn tar_archive(&self, mtime: u64) -> Result<Vec<u8>, FileSetError> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, file) in &self.files {
            let mut header = tar::Header::new_ustar();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(file.content.len() as u64);
            header.set_mode(file.mode);
            header.set_mtime(mtime);
            builder.append_data(&mut header, path, file.content.as_slice()).map_err(FileSetError::Archive)?;
        }
        builder.into_inner().map_err(FileSetError::Archive)
    }
}

fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}/{}", path.trim_start_matches('/'))
    }
}

fn create_private_dir(path: &Path) -> Result<(), FileSetError> {
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
        .map_err(|source| FileSetError::CreateDir { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "file_set_tests.rs"]
mod tests;
