use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{Result, StoreError};
use super::keys::{NEXT_SEQ_KEY, encode_order_key, encode_task_key};
use super::model::{SwapReport, SwapTask, TaskId};

/// Fjall-backed document store for swap tasks.
///
/// The store is the sole authority on task state. It assigns ids and sequence
/// numbers at insert, and the `order` partition gives recovery a scan in
/// insertion order without touching the documents themselves.
///
/// Cloning yields a handle onto the same keyspace; each worker holds its own
/// clone as its private connection.
#[derive(Clone)]
pub struct TaskStore {
    keyspace: Keyspace,
    tasks: PartitionHandle,
    order: PartitionHandle,
    metadata: PartitionHandle,
    seq_counter: Arc<AtomicU64>,
}

impl TaskStore {
    /// Open or create a task store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening task store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let tasks = keyspace.open_partition("tasks", PartitionCreateOptions::default())?;
        let order = keyspace.open_partition("order", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        let current_seq = metadata
            .get(NEXT_SEQ_KEY)?
            .map(|bytes| u64::from_be_bytes(bytes.as_ref().try_into().unwrap_or([0u8; 8])))
            .unwrap_or(0);

        info!(current_seq, "Task store opened");

        Ok(Self {
            keyspace,
            tasks,
            order,
            metadata,
            seq_counter: Arc::new(AtomicU64::new(current_seq)),
        })
    }

    /// Insert a new pending task for the given image pair.
    ///
    /// The store assigns the id and the sequence number. The counter is
    /// persisted after the document so a crash between the two at worst
    /// re-issues an unused sequence number.
    pub fn insert(&self, source_path: &str, target_path: &str) -> Result<SwapTask> {
        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);

        let task = SwapTask {
            id: Uuid::now_v7().to_string(),
            seq,
            source_path: source_path.to_string(),
            target_path: target_path.to_string(),
            source_face: None,
            target_face: None,
            result_path: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_vec(&task)?;
        self.tasks.insert(encode_task_key(&task.id), value)?;
        self.order.insert(encode_order_key(seq), task.id.as_bytes())?;
        self.metadata
            .insert(NEXT_SEQ_KEY, (seq + 1).to_be_bytes())?;

        debug!(id = %task.id, seq, "Task inserted");

        Ok(task)
    }

    /// Fetch a task by id.
    pub fn get(&self, id: &str) -> Result<Option<SwapTask>> {
        match self.tasks.get(encode_task_key(id))? {
            Some(value) => {
                let task = serde_json::from_slice(&value)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// Record the outcome of one inference run.
    ///
    /// Face flags and result path land in a single document write, keyed by
    /// id; a concurrent write for the same id (double delivery) ends in
    /// last-write-wins on the whole document.
    pub fn complete(&self, id: &str, report: SwapReport) -> Result<()> {
        let mut task = self
            .get(id)?
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;

        task.source_face = Some(report.source_face);
        task.target_face = Some(report.target_face);
        task.result_path = Some(report.result_path);

        let value = serde_json::to_vec(&task)?;
        self.tasks.insert(encode_task_key(id), value)?;

        debug!(%id, "Task completed");
        Ok(())
    }

    /// All pending tasks in insertion order, capped at `limit`.
    ///
    /// Used by startup recovery: filter first, then cap, so old pending work
    /// is never shadowed by newer terminal entries.
    pub fn pending(&self, limit: usize) -> Result<Vec<SwapTask>> {
        let mut out = Vec::new();

        for item in self.order.iter() {
            let (_, id_bytes) = item?;
            let id = String::from_utf8_lossy(&id_bytes).to_string();
            // A missing document behind an order entry means the task was
            // deleted out of band; skip it.
            let Some(task) = self.get(&id)? else {
                continue;
            };
            if task.is_pending() {
                out.push(task);
                if out.len() == limit {
                    break;
                }
            }
        }

        Ok(out)
    }

    /// Ids of all pending tasks in insertion order, capped at `limit`.
    pub fn pending_ids(&self, limit: usize) -> Result<Vec<TaskId>> {
        Ok(self.pending(limit)?.into_iter().map(|t| t.id).collect())
    }

    /// Persist all pending writes to disk.
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::{FACES_NOT_FOUND_SENTINEL, SwapState};
    use tempfile::TempDir;

    fn create_test_store() -> (TaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = TaskStore::open(temp_dir.path().join("tasks")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_insert_and_get() {
        let (store, _temp) = create_test_store();

        let task = store.insert("uploads/a.jpg", "uploads/b.jpg").unwrap();
        assert_eq!(task.seq, 0);
        assert!(task.is_pending());

        let fetched = store.get(&task.id).unwrap().unwrap();
        assert_eq!(fetched.id, task.id);
        assert_eq!(fetched.source_path, "uploads/a.jpg");
        assert_eq!(fetched.target_path, "uploads/b.jpg");
        assert_eq!(fetched.source_face, None);
        assert_eq!(fetched.result_path, None);
    }

    #[test]
    fn test_get_nonexistent() {
        let (store, _temp) = create_test_store();
        assert!(store.get("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_sequence_numbers_increment() {
        let (store, _temp) = create_test_store();

        let a = store.insert("a", "b").unwrap();
        let b = store.insert("c", "d").unwrap();
        let c = store.insert("e", "f").unwrap();

        assert_eq!((a.seq, b.seq, c.seq), (0, 1, 2));
    }

    #[test]
    fn test_sequence_continues_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks");

        let first_id = {
            let store = TaskStore::open(&path).unwrap();
            store.insert("a", "b").unwrap().id
        };

        let store = TaskStore::open(&path).unwrap();
        let task = store.insert("c", "d").unwrap();
        assert_eq!(task.seq, 1);

        // Old document still readable.
        assert!(store.get(&first_id).unwrap().is_some());
    }

    #[test]
    fn test_complete_writes_all_fields_at_once() {
        let (store, _temp) = create_test_store();
        let task = store.insert("a", "b").unwrap();

        store
            .complete(&task.id, SwapReport::done(format!("{}.jpg", task.id)))
            .unwrap();

        let done = store.get(&task.id).unwrap().unwrap();
        assert!(!done.is_pending());
        assert_eq!(done.source_face, Some(true));
        assert_eq!(done.target_face, Some(true));
        assert_eq!(
            done.state(),
            SwapState::Done {
                result_path: format!("{}.jpg", task.id)
            }
        );
    }

    #[test]
    fn test_complete_with_sentinel() {
        let (store, _temp) = create_test_store();
        let task = store.insert("a", "b").unwrap();

        store
            .complete(&task.id, SwapReport::faces_not_found(false, true))
            .unwrap();

        let done = store.get(&task.id).unwrap().unwrap();
        assert_eq!(done.result_path.as_deref(), Some(FACES_NOT_FOUND_SENTINEL));
        assert_eq!(done.source_face, Some(false));
    }

    #[test]
    fn test_complete_missing_task() {
        let (store, _temp) = create_test_store();
        let err = store
            .complete("ghost", SwapReport::done("x.jpg".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(_)));
    }

    #[test]
    fn test_pending_filters_and_orders() {
        let (store, _temp) = create_test_store();

        let a = store.insert("a1", "a2").unwrap();
        let b = store.insert("b1", "b2").unwrap();
        let c = store.insert("c1", "c2").unwrap();

        store
            .complete(&b.id, SwapReport::done("b.jpg".into()))
            .unwrap();

        let ids = store.pending_ids(100).unwrap();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn test_pending_respects_limit() {
        let (store, _temp) = create_test_store();

        for _ in 0..5 {
            store.insert("a", "b").unwrap();
        }

        let pending = store.pending(3).unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(
            pending.iter().map(|t| t.seq).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
