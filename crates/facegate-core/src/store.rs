//! Corpus store: per-identity directories of canonical face samples.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/<identity>/<uuid>.bmp        enrolled face samples
//! <root>/<holding>/<uuid>.<ext>       raw probe snapshots, never trained on
//! ```
//!
//! Writes are append-only. Every file is written under a hidden `.partial`
//! name, synced, then linked into place under a fresh UUID, so concurrent
//! readers either see a complete sample or none at all.

use crate::types::IdentityCode;
use image::{GrayImage, ImageFormat};
use std::fs::{self, OpenOptions};
use std::io::{self, Cursor, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Extension shared by every enrolled face sample.
pub const SAMPLE_EXTENSION: &str = "bmp";

/// Default holding area for probe snapshots, relative to the corpus root.
pub const DEFAULT_HOLDING_DIR: &str = "UnknownEmployeeFolder";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to list {}: {source}", path.display())]
    List { path: PathBuf, source: io::Error },
    #[error("failed to encode face sample: {0}")]
    Encode(#[from] image::ImageError),
    #[error("invalid holding directory {name:?}: {reason}")]
    InvalidHoldingDir { name: String, reason: &'static str },
}

/// Maps identities to storage locations and back.
pub trait IdentityLayout: Send + Sync {
    /// Directory holding the samples of `identity`.
    fn location_of(&self, root: &Path, identity: IdentityCode) -> PathBuf;

    /// Identity owning the top-level directory called `dir_name`, if any.
    fn identity_at(&self, dir_name: &str) -> Option<IdentityCode>;
}

/// One directory per identity, named by its decimal code.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryPerIdentity;

impl IdentityLayout for DirectoryPerIdentity {
    fn location_of(&self, root: &Path, identity: IdentityCode) -> PathBuf {
        root.join(identity.to_string())
    }

    fn identity_at(&self, dir_name: &str) -> Option<IdentityCode> {
        dir_name.parse().ok()
    }
}

/// An identity directory found while walking the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDir {
    pub identity: IdentityCode,
    pub path: PathBuf,
}

pub struct CorpusStore {
    root: PathBuf,
    holding: String,
    layout: Box<dyn IdentityLayout>,
}

impl CorpusStore {
    /// Open a store rooted at `root`. Nothing is created until the first write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            holding: DEFAULT_HOLDING_DIR.to_string(),
            layout: Box::new(DirectoryPerIdentity),
        }
    }

    /// Use a different directory name for probe snapshots.
    ///
    /// The name must be a single path component that no identity maps to.
    pub fn with_holding_dir(mut self, name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        check_holding_name(&name, self.layout.as_ref())?;
        self.holding = name;
        Ok(self)
    }

    /// Switch identity layouts. Fails if the current holding area would
    /// collide with an identity under the new layout.
    pub fn with_layout(
        mut self,
        layout: impl IdentityLayout + 'static,
    ) -> Result<Self, StoreError> {
        check_holding_name(&self.holding, &layout)?;
        self.layout = Box::new(layout);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn holding_dir(&self) -> PathBuf {
        self.root.join(&self.holding)
    }

    pub fn identity_dir(&self, identity: IdentityCode) -> PathBuf {
        self.layout.location_of(&self.root, identity)
    }

    /// Persist a canonical face sample for `identity` under a fresh file name.
    pub fn write(&self, identity: IdentityCode, sample: &GrayImage) -> Result<PathBuf, StoreError> {
        let mut encoded = Vec::new();
        sample.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Bmp)?;

        let dir = self.identity_dir(identity);
        ensure_dir(&dir)?;

        let path = write_new_file(&dir, SAMPLE_EXTENSION, &encoded)?;
        tracing::debug!(%identity, path = %path.display(), "stored face sample");
        Ok(path)
    }

    /// Keep a verbatim copy of a probe upload in the holding area.
    pub fn hold_probe(&self, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let extension = image::guess_format(bytes)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin");

        let dir = self.holding_dir();
        ensure_dir(&dir)?;

        let path = write_new_file(&dir, extension, bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "held probe snapshot");
        Ok(path)
    }

    /// All identity directories under the root, ordered by identity.
    ///
    /// A missing root is an empty corpus. The holding area and entries that do
    /// not resolve to an identity are skipped.
    pub fn list_identity_directories(&self) -> Result<Vec<IdentityDir>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::List {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::List {
                path: self.root.clone(),
                source,
            })?;
            let is_dir = entry
                .file_type()
                .map(|t| t.is_dir())
                .map_err(|source| StoreError::List {
                    path: entry.path(),
                    source,
                })?;
            if !is_dir {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 directory");
                continue;
            };
            if name == self.holding {
                continue;
            }
            match self.layout.identity_at(name) {
                Some(identity) => dirs.push(IdentityDir {
                    identity,
                    path: entry.path(),
                }),
                None => {
                    tracing::warn!(dir = name, "skipping directory that names no identity");
                }
            }
        }

        dirs.sort_by(|a, b| a.identity.cmp(&b.identity).then_with(|| a.path.cmp(&b.path)));
        Ok(dirs)
    }

    /// Sample files inside one identity directory, ordered by file name.
    pub fn list_samples(&self, dir: &IdentityDir) -> Result<Vec<PathBuf>, StoreError> {
        let list_err = |source: io::Error| StoreError::List {
            path: dir.path.clone(),
            source,
        };

        let mut samples = Vec::new();
        for entry in fs::read_dir(&dir.path).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if !entry.file_type().map_err(list_err)?.is_file() {
                continue;
            }
            let path = entry.path();
            let is_sample = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SAMPLE_EXTENSION));
            if is_sample {
                samples.push(path);
            }
        }

        samples.sort();
        Ok(samples)
    }
}

fn check_holding_name(name: &str, layout: &dyn IdentityLayout) -> Result<(), StoreError> {
    let invalid = |reason| StoreError::InvalidHoldingDir {
        name: name.to_string(),
        reason,
    };
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return Err(invalid("must be a single directory name inside the corpus root")),
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("must not contain a path separator"));
    }
    if layout.identity_at(name).is_some() {
        return Err(invalid("collides with an identity directory"));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `bytes` to `<dir>/<uuid>.<extension>` without ever replacing an existing file.
fn write_new_file(dir: &Path, extension: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    let id = Uuid::new_v4();
    let path = dir.join(format!("{id}.{extension}"));
    let partial = dir.join(format!(".{id}.partial"));

    let staged = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
    if let Err(source) = staged {
        let _ = fs::remove_file(&partial);
        return Err(StoreError::Write { path, source });
    }

    publish(&partial, &path, |from, to| fs::hard_link(from, to))
        .map_err(|source| StoreError::Write { path: path.clone(), source })?;

    Ok(path)
}

/// Move a staged file to its final name.
///
/// `link` refuses to replace an existing target. Filesystems without hard
/// links (FAT, some network and FUSE mounts) fall back to a rename of the
/// UUID-named staging file.
fn publish(
    staged: &Path,
    target: &Path,
    link: fn(&Path, &Path) -> io::Result<()>,
) -> io::Result<()> {
    match link(staged, target) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(staged) {
                tracing::warn!(
                    path = %staged.display(),
                    error = %e,
                    "failed to remove staging file"
                );
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let _ = fs::remove_file(staged);
            Err(e)
        }
        Err(e) => {
            tracing::debug!(
                path = %target.display(),
                error = %e,
                "hard link unavailable, renaming"
            );
            fs::rename(staged, target).map_err(|rename_err| {
                let _ = fs::remove_file(staged);
                rename_err
            })
        }
    }
}
