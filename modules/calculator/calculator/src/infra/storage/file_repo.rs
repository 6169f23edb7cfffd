//! One JSON file per session under a `histories` directory.
//!
//! Writes go to a temporary sibling file which is synced and then renamed
//! over the target, so readers observe either the old or the new history.
//! Mutations of one session are serialized by a per-session lock; different
//! sessions never wait on each other.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use calculator_sdk::{ComputationEntry, SessionKey};
use dashmap::DashMap;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error};
use uuid::Uuid;

use super::entity::StoredEntry;
use crate::domain::repo::{HistoryRepository, StorageError};

pub const HISTORIES_DIR: &str = "histories";

pub struct FileHistoryRepository {
    dir: PathBuf,
    locks: DashMap<SessionKey, Arc<Mutex<()>>>,
}

impl FileHistoryRepository {
    /// Use `dir` as the histories directory. It must already exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: DashMap::new(),
        }
    }

    /// Open the store under `data_dir`, creating `data_dir/histories` if needed.
    ///
    /// # Errors
    /// Returns `StorageError::Write` if the directory cannot be created.
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let dir = data_dir.join(HISTORIES_DIR);
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(Self::new(dir))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the history of `session`.
    #[must_use]
    pub fn path_for(&self, session: &SessionKey) -> PathBuf {
        self.dir.join(format!("{session}.json"))
    }

    fn lock_for(&self, session: &SessionKey) -> Arc<Mutex<()>> {
        self.locks.entry(*session).or_default().clone()
    }

    async fn read_entries(&self, session: &SessionKey) -> Result<Vec<ComputationEntry>, StorageError> {
        let path = self.path_for(session);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let stored: Vec<StoredEntry> = serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Decode {
                path: path.clone(),
                source,
            })?;

        stored
            .into_iter()
            .map(|e| {
                ComputationEntry::try_from(e).map_err(|e| StorageError::InvalidEntry {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn write_entries(
        &self,
        session: &SessionKey,
        entries: &[ComputationEntry],
    ) -> Result<(), StorageError> {
        let stored: Vec<StoredEntry> = entries.iter().map(StoredEntry::from).collect();
        let bytes = serde_json::to_vec(&stored).map_err(StorageError::Encode)?;

        let path = self.path_for(session);
        let tmp = self.dir.join(format!(".{session}.{}.tmp", Uuid::new_v4()));

        if let Err(source) = write_synced(&tmp, &bytes).await {
            discard(&tmp).await;
            return Err(StorageError::Write { path: tmp, source });
        }
        if let Err(source) = fs::rename(&tmp, &path).await {
            discard(&tmp).await;
            return Err(StorageError::Write { path, source });
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await
        && e.kind() != ErrorKind::NotFound
    {
        debug!(path = %tmp.display(), error = %e, "Failed to remove temporary history file");
    }
}

#[async_trait]
impl HistoryRepository for FileHistoryRepository {
    async fn load(&self, session: &SessionKey) -> Vec<ComputationEntry> {
        self.read_entries(session).await.unwrap_or_else(|e| {
            error!(sid = %session, error = %e, "Failed to read history file");
            Vec::new()
        })
    }

    async fn append(
        &self,
        session: &SessionKey,
        entry: ComputationEntry,
    ) -> Result<(), StorageError> {
        let lock = self.lock_for(session);
        let _guard = lock.lock().await;

        let mut entries = self.load(session).await;
        entries.push(entry);
        self.write_entries(session, &entries).await?;

        debug!(sid = %session, count = entries.len(), "History written");
        Ok(())
    }

    async fn clear(&self, session: &SessionKey) -> Result<(), StorageError> {
        let lock = self.lock_for(session);
        let _guard = lock.lock().await;

        let path = self.path_for(session);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete { path, source }),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use calculator_sdk::Operator;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn store() -> (TempDir, FileHistoryRepository) {
        let tmp = tempfile::tempdir().unwrap();
        let repo = FileHistoryRepository::open(tmp.path()).unwrap();
        (tmp, repo)
    }

    fn entry(a: f64, b: f64, op: Operator, result: f64) -> ComputationEntry {
        ComputationEntry {
            id: Uuid::new_v4(),
            a,
            b,
            op,
            result,
        }
    }

    #[tokio::test]
    async fn open_creates_histories_dir() {
        let (tmp, repo) = store();
        assert_eq!(repo.dir(), tmp.path().join(HISTORIES_DIR));
        assert!(repo.dir().is_dir());
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let (_tmp, repo) = store();
        assert!(repo.load(&SessionKey::generate()).await.is_empty());
    }

    #[tokio::test]
    async fn append_persists_in_order() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        let first = entry(1.0, 2.0, Operator::Add, 3.0);
        let second = entry(5.0, 2.0, Operator::Subtract, 3.0);

        repo.append(&session, first.clone()).await.unwrap();
        repo.append(&session, second.clone()).await.unwrap();

        assert_eq!(repo.load(&session).await, vec![first, second]);
    }

    #[tokio::test]
    async fn overflowed_result_keeps_earlier_history() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        let first = entry(1.0, 2.0, Operator::Add, 3.0);
        let overflow = entry(1e308, 10.0, Operator::Multiply, f64::INFINITY);
        let after = entry(4.0, 2.0, Operator::Divide, 2.0);

        repo.append(&session, first.clone()).await.unwrap();
        repo.append(&session, overflow.clone()).await.unwrap();
        assert_eq!(repo.load(&session).await, vec![first.clone(), overflow.clone()]);

        repo.append(&session, after.clone()).await.unwrap();
        assert_eq!(repo.load(&session).await, vec![first, overflow.clone(), after]);

        let raw = std::fs::read(repo.path_for(&session)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value[1]["result"], "Infinity");
        assert_eq!(value[1]["id"], serde_json::json!(overflow.id));
    }

    #[tokio::test]
    async fn history_survives_a_new_store_instance() {
        let (tmp, repo) = store();
        let session = SessionKey::generate();
        let saved = entry(2.0, 3.0, Operator::Multiply, 6.0);
        repo.append(&session, saved.clone()).await.unwrap();
        drop(repo);

        let reopened = FileHistoryRepository::open(tmp.path()).unwrap();
        assert_eq!(reopened.load(&session).await, vec![saved]);
    }

    #[tokio::test]
    async fn file_is_a_json_array_named_after_the_session() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        let saved = entry(8.0, 2.0, Operator::Divide, 4.0);
        repo.append(&session, saved.clone()).await.unwrap();

        let raw = std::fs::read(repo.path_for(&session)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"a": 8.0, "b": 2.0, "op": "/", "result": 4.0, "id": saved.id}])
        );
    }

    #[tokio::test]
    async fn no_temporary_files_are_left_behind() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        for i in 0..5 {
            let a = f64::from(i);
            repo.append(&session, entry(a, 1.0, Operator::Add, a + 1.0))
                .await
                .unwrap();
        }

        let names: Vec<_> = std::fs::read_dir(repo.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![format!("{session}.json")]);
    }

    #[tokio::test]
    #[traced_test]
    async fn corrupt_file_loads_as_empty_and_is_logged() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        std::fs::write(repo.path_for(&session), b"{not json").unwrap();

        assert!(repo.load(&session).await.is_empty());
        assert!(logs_contain("Failed to read history file"));
    }

    #[tokio::test]
    async fn append_after_corruption_starts_fresh() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        std::fs::write(repo.path_for(&session), b"[{\"bogus\": true}]").unwrap();

        let saved = entry(1.0, 1.0, Operator::Add, 2.0);
        repo.append(&session, saved.clone()).await.unwrap();

        assert_eq!(repo.load(&session).await, vec![saved]);
    }

    #[tokio::test]
    async fn whitespace_file_loads_as_empty() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        std::fs::write(repo.path_for(&session), b"  \n").unwrap();

        assert!(repo.read_entries(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_operator_in_file_is_invalid() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        let raw = format!(
            r#"[{{"a": 1.0, "b": 1.0, "op": "%", "result": 0.0, "id": "{}"}}]"#,
            Uuid::new_v4()
        );
        std::fs::write(repo.path_for(&session), raw).unwrap();

        let err = repo.read_entries(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidEntry { .. }));
    }

    #[tokio::test]
    async fn clear_removes_file_and_tolerates_absence() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        repo.append(&session, entry(1.0, 2.0, Operator::Add, 3.0))
            .await
            .unwrap();

        repo.clear(&session).await.unwrap();
        assert!(!repo.path_for(&session).exists());
        assert!(repo.load(&session).await.is_empty());

        repo.clear(&session).await.unwrap();
    }

    #[tokio::test]
    async fn clear_only_touches_its_own_session() {
        let (_tmp, repo) = store();
        let keep = SessionKey::generate();
        let drop_me = SessionKey::generate();
        repo.append(&keep, entry(1.0, 2.0, Operator::Add, 3.0))
            .await
            .unwrap();
        repo.append(&drop_me, entry(1.0, 2.0, Operator::Add, 3.0))
            .await
            .unwrap();

        repo.clear(&drop_me).await.unwrap();

        assert_eq!(repo.load(&keep).await.len(), 1);
        assert!(repo.load(&drop_me).await.is_empty());
    }

    #[tokio::test]
    async fn unwritable_target_reports_write_error() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        // A directory in place of the history file cannot be replaced by rename.
        std::fs::create_dir(repo.path_for(&session)).unwrap();

        let err = repo
            .append(&session, entry(1.0, 2.0, Operator::Add, 3.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[tokio::test]
    async fn undeletable_target_reports_delete_error() {
        let (_tmp, repo) = store();
        let session = SessionKey::generate();
        std::fs::create_dir(repo.path_for(&session)).unwrap();

        let err = repo.clear(&session).await.unwrap_err();
        assert!(matches!(err, StorageError::Delete { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_lose_nothing() {
        let (_tmp, repo) = store();
        let repo = Arc::new(repo);
        let session = SessionKey::generate();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let repo = repo.clone();
            tasks.spawn(async move {
                let a = f64::from(i);
                repo.append(&session, entry(a, 1.0, Operator::Add, a + 1.0))
                    .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let mut seen: Vec<f64> = repo.load(&session).await.iter().map(|e| e.a).collect();
        seen.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..32).map(f64::from).collect();
        assert_eq!(seen, expected);
    }
}
