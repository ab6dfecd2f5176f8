//! Local artifact store: the folder of produced files is the "recent files" list.
//!
//! There is no index file. Every [`RecentFile`] is derived from a directory
//! entry and its `stat`, so the list survives restarts for free and can never
//! drift from what is actually on disk. The in-memory snapshot held by
//! [`LocalArtifactStore`] is only a cache of the last listing plus the saves
//! and deletes made since; [`LocalArtifactStore::list`] rebuilds it.
//!
//! ## Saving
//!
//! Sources come in different shapes: a temp file we own, a file we may only
//! read, a file on another mount. [`LocalArtifactStore::save`] therefore walks
//! an ordered list of [`SaveStrategy`] values (copy, then move, then
//! read-and-write) and keeps the first that succeeds. The filesystem calls go
//! through [`ArtifactFs`] so each strategy can be failed on purpose.

use crate::error::{ConverterError, StrategyFailure};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// A file in the artifact folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    /// `name` plus modification time; changes when the file is overwritten.
    pub id: String,
    pub name: String,
    /// Location inside the artifact folder.
    pub uri: PathBuf,
    pub size: Option<u64>,
    /// Last modification time.
    pub created_at: Option<DateTime<Utc>>,
}

impl RecentFile {
    fn new(name: String, uri: PathBuf, size: Option<u64>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", name, created_at.timestamp_millis()),
            name,
            uri,
            size,
            created_at: Some(created_at),
        }
    }
}

/// One way of getting a source file into the artifact folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveStrategy {
    /// Copy the source, leaving it in place.
    Copy,
    /// Rename the source into the folder; suits single-use temp files.
    Move,
    /// Read the whole source into memory and write it out.
    ReadWrite,
}

/// The order in which [`LocalArtifactStore::save`] tries strategies.
pub const SAVE_STRATEGIES: [SaveStrategy; 3] =
    [SaveStrategy::Copy, SaveStrategy::Move, SaveStrategy::ReadWrite];

impl fmt::Display for SaveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaveStrategy::Copy => "copy",
            SaveStrategy::Move => "move",
            SaveStrategy::ReadWrite => "read-write",
        })
    }
}

/// Filesystem operations used by the store.
#[async_trait]
pub trait ArtifactFs: Send + Sync {
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    async fn remove(&self, path: &Path) -> io::Result<()>;
    /// Set the modification time of `path` to now.
    async fn touch(&self, path: &Path) -> io::Result<()>;
}

/// [`ArtifactFs`] backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFs;

#[async_trait]
impl ArtifactFs for TokioFs {
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::copy(from, to).await.map(|_| ())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, bytes).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn touch(&self, path: &Path) -> io::Result<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            std::fs::File::options()
                .write(true)
                .open(&path)?
                .set_modified(SystemTime::now())
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Directory-backed registry of produced files.
pub struct LocalArtifactStore {
    root: PathBuf,
    fs: Arc<dyn ArtifactFs>,
    recent: Mutex<Vec<RecentFile>>,
    last_stamp: AtomicI64,
}

impl fmt::Debug for LocalArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalArtifactStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, Arc::new(TokioFs))
    }

    pub fn with_fs(root: impl Into<PathBuf>, fs: Arc<dyn ArtifactFs>) -> Self {
        Self {
            root: root.into(),
            fs,
            recent: Mutex::new(Vec::new()),
            last_stamp: AtomicI64::new(0),
        }
    }

    /// The artifact folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the artifact folder (with parents) if it does not exist yet.
    pub async fn ensure_folder(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// The snapshot kept since the last [`list`](Self::list), without touching disk.
    pub fn recent(&self) -> Vec<RecentFile> {
        self.lock_recent().clone()
    }

    /// Enumerate the folder, newest first.
    ///
    /// Never fails. An entry whose `stat` fails is still listed, with the
    /// current time and no size. If the folder itself cannot be read, the
    /// previous snapshot is returned unchanged.
    pub async fn list(&self) -> Vec<RecentFile> {
        if let Err(e) = self.ensure_folder().await {
            warn!("Could not create artifact folder {}: {}", self.root.display(), e);
        }

        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Could not read artifact folder {}: {}", self.root.display(), e);
                return self.recent();
            }
        };

        let mut files = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped reading {} early: {}", self.root.display(), e);
                    break;
                }
            };
            if let Ok(kind) = entry.file_type().await {
                if kind.is_dir() {
                    continue;
                }
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(self.describe(name, entry.path()).await);
        }

        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!("Listed {} files in {}", files.len(), self.root.display());

        *self.lock_recent() = files.clone();
        files
    }

    /// Put `source` into the folder as `desired_name`, overwriting any file of that name.
    ///
    /// Tries [`SAVE_STRATEGIES`] in order. If every strategy fails the error
    /// lists each failure and the store is left unchanged.
    pub async fn save(&self, source: &Path, desired_name: &str) -> Result<RecentFile, ConverterError> {
        let name = sanitize_file_name(desired_name)
            .unwrap_or_else(|| format!("file_{}", Utc::now().timestamp_millis()));
        let dest = self.root.join(&name);

        if let Err(e) = self.ensure_folder().await {
            warn!("Could not create artifact folder {}: {}", self.root.display(), e);
        }

        if same_file(source, &dest).await {
            debug!("{} is already in the artifact folder", dest.display());
        } else {
            let mut failures = Vec::new();
            let mut saved = false;
            for strategy in SAVE_STRATEGIES {
                match self.attempt(strategy, source, &dest).await {
                    Ok(()) => {
                        debug!("Saved {} via {}", dest.display(), strategy);
                        saved = true;
                        break;
                    }
                    Err(e) => {
                        warn!("Save of {} via {} failed: {}", name, strategy, e);
                        failures.push(StrategyFailure {
                            strategy,
                            source: e,
                        });
                    }
                }
            }
            if !saved {
                return Err(ConverterError::LocalSave { name, failures });
            }
        }

        // Move and some copies keep the source mtime; listings sort on it.
        if let Err(e) = self.fs.touch(&dest).await {
            warn!("Could not refresh mtime of {}: {}", dest.display(), e);
        }

        let file = self.describe(name, dest).await;
        {
            let mut recent = self.lock_recent();
            recent.retain(|f| f.uri != file.uri);
            recent.insert(0, file.clone());
        }
        info!("Saved {} ({} bytes)", file.uri.display(), file.size.unwrap_or(0));
        Ok(file)
    }

    /// Remove a file. Removing a file that is already gone succeeds.
    pub async fn delete(&self, file: &RecentFile) -> Result<(), ConverterError> {
        if !self.contains(&file.uri) {
            return Err(ConverterError::OutsideArtifactFolder {
                path: file.uri.clone(),
            });
        }

        match self.fs.remove(&file.uri).await {
            Ok(()) => info!("Deleted {}", file.uri.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} was already gone", file.uri.display());
            }
            Err(e) => {
                return Err(ConverterError::LocalDelete {
                    path: file.uri.clone(),
                    source: e,
                })
            }
        }

        self.lock_recent().retain(|f| f.uri != file.uri);
        Ok(())
    }

    /// Whether `path` names an entry directly inside the artifact folder.
    pub fn contains(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && matches!(path.components().next_back(), Some(Component::Normal(_)))
    }

    /// A fresh `<prefix>_<millis>.<ext>` name.
    ///
    /// Timestamps never repeat within this store, and names already present
    /// on disk are skipped, so concurrent producers never collide.
    pub async fn unique_name(&self, prefix: &str, ext: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let mut stamp = self.next_stamp(now);
        loop {
            let name = format!("{prefix}_{stamp}.{ext}");
            match tokio::fs::try_exists(self.root.join(&name)).await {
                Ok(true) => stamp = self.next_stamp(stamp + 1),
                _ => return name,
            }
        }
    }

    fn next_stamp(&self, at_least: i64) -> i64 {
        let mut current = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = at_least.max(current + 1);
            match self.last_stamp.compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    async fn attempt(&self, strategy: SaveStrategy, source: &Path, dest: &Path) -> io::Result<()> {
        match strategy {
            SaveStrategy::Copy => self.fs.copy(source, dest).await,
            SaveStrategy::Move => self.fs.rename(source, dest).await,
            SaveStrategy::ReadWrite => {
                let bytes = self.fs.read(source).await?;
                if let Err(e) = self.fs.write(dest, &bytes).await {
                    // A half-written destination must not show up in listings.
                    let _ = self.fs.remove(dest).await;
                    return Err(e);
                }
                Ok(())
            }
        }
    }

    async fn describe(&self, name: String, path: PathBuf) -> RecentFile {
        match tokio::fs::metadata(&path).await {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                RecentFile::new(name, path, Some(meta.len()), modified)
            }
            Err(e) => {
                warn!("stat failed for {}: {}", path.display(), e);
                RecentFile::new(name, path, None, Utc::now())
            }
        }
    }

    fn lock_recent(&self) -> std::sync::MutexGuard<'_, Vec<RecentFile>> {
        self.recent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1f<>:"|?*]"#).expect("valid regex"));

/// Reduce a requested name to a plain file name that stays inside the folder.
///
/// Directory parts are dropped, characters that are invalid on common
/// filesystems become `_`, and leading dots are stripped. Returns `None`
/// when nothing usable remains.
pub fn sanitize_file_name(desired: &str) -> Option<String> {
    let base = desired.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let trimmed = cleaned.trim().trim_start_matches('.').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// Delegates to `TokioFs` except for the strategies told to fail.
    struct FailingFs {
        fail_copy: bool,
        fail_rename: bool,
        fail_read: bool,
        fail_remove: Option<io::ErrorKind>,
    }

    impl FailingFs {
        fn new() -> Self {
            Self {
                fail_copy: false,
                fail_rename: false,
                fail_read: false,
                fail_remove: None,
            }
        }
    }

    #[async_trait]
    impl ArtifactFs for FailingFs {
        async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.fail_copy {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "copy refused"));
            }
            TokioFs.copy(from, to).await
        }

        async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.fail_rename {
                return Err(io::Error::other("cross-device link"));
            }
            TokioFs.rename(from, to).await
        }

        async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            if self.fail_read {
                return Err(io::Error::new(io::ErrorKind::Unsupported, "unreadable scheme"));
            }
            TokioFs.read(path).await
        }

        async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
            TokioFs.write(path, bytes).await
        }

        async fn remove(&self, path: &Path) -> io::Result<()> {
            if let Some(kind) = self.fail_remove {
                return Err(io::Error::new(kind, "remove refused"));
            }
            TokioFs.remove(path).await
        }

        async fn touch(&self, path: &Path) -> io::Result<()> {
            TokioFs.touch(path).await
        }
    }

    fn age_by(path: &Path, secs: u64) {
        let old = SystemTime::now() - std::time::Duration::from_secs(secs);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(old)
            .unwrap();
    }

    fn source_file(dir: &TempDir, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn save_then_list_returns_saved_file_first() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path().join("pdfconverter"));

        store.ensure_folder().await.unwrap();
        std::fs::write(store.root().join("old.pdf"), b"old").unwrap();
        age_by(&store.root().join("old.pdf"), 3600);

        let saved = store
            .save(&source_file(&src, "in.pdf", b"%PDF-1.4 new"), "new.pdf")
            .await
            .unwrap();
        assert_eq!(saved.name, "new.pdf");
        assert_eq!(saved.size, Some(12));
        assert!(store.contains(&saved.uri));

        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].uri, saved.uri);
        assert_eq!(listed[1].name, "old.pdf");
    }

    #[tokio::test]
    async fn copy_leaves_source_in_place() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path());
        let path = source_file(&src, "a.pdf", b"data");

        store.save(&path, "a.pdf").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn move_is_used_when_copy_fails() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let fs = FailingFs {
            fail_copy: true,
            ..FailingFs::new()
        };
        let store = LocalArtifactStore::with_fs(home.path(), Arc::new(fs));
        let path = source_file(&src, "tmp.pdf", b"moved");

        let saved = store.save(&path, "out.pdf").await.unwrap();
        assert!(!path.exists(), "move should consume the source");
        assert_eq!(std::fs::read(&saved.uri).unwrap(), b"moved");
    }

    #[tokio::test]
    async fn moved_stale_source_still_lists_first() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let fs = FailingFs {
            fail_copy: true,
            ..FailingFs::new()
        };
        let store = LocalArtifactStore::with_fs(home.path().join("store"), Arc::new(fs));
        store.ensure_folder().await.unwrap();
        std::fs::write(store.root().join("existing.pdf"), b"existing").unwrap();
        age_by(&store.root().join("existing.pdf"), 60);

        let stale = source_file(&src, "stale.pdf", b"stale");
        age_by(&stale, 3600);
        let saved = store.save(&stale, "fresh.pdf").await.unwrap();
        assert!(!stale.exists(), "source should have been moved");

        let names: Vec<_> = store.list().await.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["fresh.pdf".to_string(), "existing.pdf".to_string()]);
        assert_eq!(store.recent()[0], saved);
    }

    #[tokio::test]
    async fn read_write_is_used_when_copy_and_move_fail() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let fs = FailingFs {
            fail_copy: true,
            fail_rename: true,
            ..FailingFs::new()
        };
        let store = LocalArtifactStore::with_fs(home.path(), Arc::new(fs));
        let path = source_file(&src, "remote.bin", b"bytes");

        let saved = store.save(&path, "out.docx").await.unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read(&saved.uri).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn all_strategies_failing_adds_nothing() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let fs = FailingFs {
            fail_copy: true,
            fail_rename: true,
            fail_read: true,
            ..FailingFs::new()
        };
        let store = LocalArtifactStore::with_fs(home.path().join("store"), Arc::new(fs));
        let path = source_file(&src, "x.pdf", b"x");

        let err = store.save(&path, "x.pdf").await.unwrap_err();
        match err {
            ConverterError::LocalSave { name, failures } => {
                assert_eq!(name, "x.pdf");
                let order: Vec<_> = failures.iter().map(|f| f.strategy).collect();
                assert_eq!(order, SAVE_STRATEGIES.to_vec());
            }
            other => panic!("expected LocalSave, got {other:?}"),
        }
        assert!(store.recent().is_empty());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn saving_same_name_replaces_entry() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path());

        store.save(&source_file(&src, "1", b"one"), "doc.pdf").await.unwrap();
        let second = store
            .save(&source_file(&src, "2", b"second"), "doc.pdf")
            .await
            .unwrap();

        let recent = store.recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], second);
        assert_eq!(std::fs::read(&second.uri).unwrap(), b"second");
    }

    #[tokio::test]
    async fn desired_name_cannot_escape_folder() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path().join("store"));

        let saved = store
            .save(&source_file(&src, "s", b"s"), "../../etc/passwd")
            .await
            .unwrap();
        assert_eq!(saved.name, "passwd");
        assert_eq!(saved.uri.parent(), Some(store.root()));
    }

    #[tokio::test]
    async fn delete_of_missing_file_succeeds_and_keeps_list() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path());
        store.save(&source_file(&src, "k", b"keep"), "keep.pdf").await.unwrap();
        let before = store.list().await;

        let ghost = RecentFile::new(
            "ghost.pdf".into(),
            store.root().join("ghost.pdf"),
            None,
            Utc::now(),
        );
        store.delete(&ghost).await.unwrap();

        assert_eq!(store.recent(), before);
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn delete_removes_file_and_entry() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path());
        let saved = store.save(&source_file(&src, "d", b"d"), "d.pdf").await.unwrap();

        store.delete(&saved).await.unwrap();
        assert!(!saved.uri.exists());
        assert!(store.recent().is_empty());
        // Second delete is a no-op.
        store.delete(&saved).await.unwrap();
    }

    #[tokio::test]
    async fn unexpected_delete_error_keeps_entry() {
        let home = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let fs = FailingFs {
            fail_remove: Some(io::ErrorKind::PermissionDenied),
            ..FailingFs::new()
        };
        let store = LocalArtifactStore::with_fs(home.path(), Arc::new(fs));
        let saved = store.save(&source_file(&src, "p", b"p"), "p.pdf").await.unwrap();

        let err = store.delete(&saved).await.unwrap_err();
        assert!(matches!(err, ConverterError::LocalDelete { .. }));
        assert_eq!(store.recent().len(), 1);
    }

    #[tokio::test]
    async fn delete_outside_folder_is_rejected() {
        let home = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path().join("store"));
        let outsider = RecentFile::new(
            "passwd".into(),
            PathBuf::from("/etc/passwd"),
            None,
            Utc::now(),
        );
        let err = store.delete(&outsider).await.unwrap_err();
        assert!(matches!(err, ConverterError::OutsideArtifactFolder { .. }));
    }

    #[tokio::test]
    async fn list_creates_missing_folder_and_skips_directories() {
        let home = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path().join("a").join("b"));
        assert!(store.list().await.is_empty());
        assert!(store.root().is_dir());

        std::fs::create_dir(store.root().join("nested")).unwrap();
        std::fs::write(store.root().join("f.pdf"), b"f").unwrap();
        let listed = store.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "f.pdf");
        assert!(listed[0].id.starts_with("f.pdf-"));
    }

    #[tokio::test]
    async fn unique_names_never_repeat() {
        let home = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(home.path());
        store.ensure_folder().await.unwrap();

        let mut seen = HashSet::new();
        for _ in 0..50 {
            let name = store.unique_name("converted", "pdf").await;
            std::fs::write(store.root().join(&name), b"").unwrap();
            assert!(seen.insert(name));
        }
    }

    #[test]
    fn sanitize_file_name_rules() {
        assert_eq!(sanitize_file_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(sanitize_file_name("a/b/c.docx").as_deref(), Some("c.docx"));
        assert_eq!(sanitize_file_name("C:\\x\\y.pdf").as_deref(), Some("y.pdf"));
        assert_eq!(sanitize_file_name("what?.pdf").as_deref(), Some("what_.pdf"));
        assert_eq!(sanitize_file_name("..hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }
}
