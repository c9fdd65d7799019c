//! Upload storage for account and project images.
//!
//! # Responsibility
//! - Persist multipart file parts under the uploads directory.
//! - Build the public URLs stored on users and projects.
//! - Remove staged files when a request fails before commit.
//!
//! # Invariants
//! - Stored names never contain path separators; clients cannot steer
//!   writes outside the uploads root.
//! - A request either commits all of its staged files or none survive.

use crate::error::ApiError;
use log::{error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

static UNSAFE_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex"));

/// Filesystem-backed store for uploaded images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    base_url: String,
}

impl UploadStore {
    /// Prepares the uploads directory and binds it to the public origin.
    pub fn new(root: PathBuf, base_url: String) -> io::Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a rollback scope covering one request's uploads.
    pub fn begin(&self) -> UploadGuard<'_> {
        UploadGuard {
            store: self,
            staged: Vec::new(),
            committed: false,
        }
    }

    /// Public URL under which a stored file name is served.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/uploads/{file_name}", self.base_url)
    }
}

/// Tracks files written for one request until the request succeeds.
///
/// Dropping the guard without [`UploadGuard::commit`] deletes every staged
/// file, so failed requests leave no orphans on disk.
pub struct UploadGuard<'store> {
    store: &'store UploadStore,
    staged: Vec<PathBuf>,
    committed: bool,
}

impl UploadGuard<'_> {
    /// Writes one file part and returns its public URL.
    pub fn save(&mut self, original_name: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let file_name = build_file_name(original_name);
        let path = self.store.root.join(&file_name);
        fs::write(&path, bytes).map_err(|err| {
            ApiError::internal(format!("cannot store upload `{}`: {err}", path.display()))
        })?;
        self.staged.push(path);
        Ok(self.store.public_url(&file_name))
    }

    /// Keeps all staged files.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        if self.committed || self.staged.is_empty() {
            return;
        }

        for path in &self.staged {
            if let Err(err) = fs::remove_file(path) {
                error!(
                    "event=upload_rollback module=server status=error path={} detail={err}",
                    path.display()
                );
            }
        }
        warn!(
            "event=upload_rollback module=server status=ok count={}",
            self.staged.len()
        );
    }
}

/// Builds a collision-free stored name keeping the cleaned client suffix.
fn build_file_name(original_name: &str) -> String {
    format!(
        "{}-{}-{}",
        epoch_millis(),
        Uuid::new_v4().simple(),
        sanitize_file_name(original_name)
    )
}

/// Reduces a client file name to one safe path component.
fn sanitize_file_name(raw: &str) -> String {
    let base = match raw.rsplit(['/', '\\']).next() {
        Some(component) => component,
        None => raw,
    };
    let cleaned = UNSAFE_FILENAME_RE.replace_all(base, "_");
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        return "upload".to_string();
    }
    trimmed.to_string()
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{build_file_name, sanitize_file_name, UploadStore};

    #[test]
    fn sanitize_keeps_safe_names_and_replaces_the_rest() {
        assert_eq!(sanitize_file_name("photo-1.PNG"), "photo-1.PNG");
        assert_eq!(sanitize_file_name("weird name!.png"), "weird_name_.png");
        assert_eq!(sanitize_file_name("snímek obrazovky.png"), "sn_mek_obrazovky.png");
    }

    #[test]
    fn sanitize_strips_client_supplied_paths() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\x\\cover.png"), "cover.png");
    }

    #[test]
    fn sanitize_falls_back_for_unusable_names() {
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name("..."), "upload");
    }

    #[test]
    fn stored_names_are_unique_per_call() {
        let first = build_file_name("cover.png");
        let second = build_file_name("cover.png");
        assert_ne!(first, second);
        assert!(first.ends_with("-cover.png"));
    }

    #[test]
    fn guard_drop_removes_staged_files_unless_committed() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(
            dir.path().to_path_buf(),
            "http://localhost:4000".to_string(),
        )
        .unwrap();

        {
            let mut guard = store.begin();
            guard.save("rolled-back.png", b"abc").unwrap();
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let url = {
            let mut guard = store.begin();
            let url = guard.save("kept.png", b"abc").unwrap();
            guard.commit();
            url
        };
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(url.starts_with("http://localhost:4000/uploads/"));
        assert!(url.ends_with("-kept.png"));
    }
}
