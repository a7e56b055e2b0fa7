//! Registry of in-flight operations.
//!
//! An operation groups one or more engine processes under a single
//! [`OperationId`]: a plain transcode has one process, a preview pipeline has a
//! producer and a consumer. The registry is the only shared mutable state in
//! the lifecycle core; a single mutex covers create, lookup and removal and is
//! never held across a process wait.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use mf_core::{Error, OperationId, OperationIdGenerator, Result};
use parking_lot::Mutex;

use crate::command::ProcessHandle;

/// How an operation was resolved. Set exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Every process exited on its own.
    Completed,
    /// Termination was requested before natural completion.
    Terminated,
}

/// Lifecycle state of a registered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Running,
    Completed,
    Terminated,
}

/// A snapshot of a registered operation.
///
/// The process list is copied at lookup time; the resolution slot is shared
/// with the registry entry, so resolving through any snapshot is visible to
/// every other holder.
#[derive(Debug, Clone)]
pub struct Operation {
    id: OperationId,
    processes: Vec<Arc<ProcessHandle>>,
    resolution: Arc<OnceLock<Resolution>>,
}

impl Operation {
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Processes in spawn order.
    pub fn processes(&self) -> &[Arc<ProcessHandle>] {
        &self.processes
    }

    /// Record how the operation ended. Returns `true` only for the first call.
    pub fn resolve(&self, resolution: Resolution) -> bool {
        self.resolution.set(resolution).is_ok()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution.get().copied()
    }

    pub fn state(&self) -> OperationState {
        match self.resolution() {
            None => OperationState::Running,
            Some(Resolution::Completed) => OperationState::Completed,
            Some(Resolution::Terminated) => OperationState::Terminated,
        }
    }
}

#[derive(Debug)]
struct Entry {
    processes: Vec<Arc<ProcessHandle>>,
    resolution: Arc<OnceLock<Resolution>>,
}

impl Entry {
    fn new(processes: Vec<Arc<ProcessHandle>>) -> Self {
        Self {
            processes,
            resolution: Arc::new(OnceLock::new()),
        }
    }
}

/// Thread-safe map from operation id to its processes.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    ids: OperationIdGenerator,
    entries: Mutex<HashMap<OperationId, Entry>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under a fresh operation when `id` is `None`, or append
    /// it to the running operation `id`, preserving spawn order.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` names an operation that is not registered or
    /// has already resolved. The handle is dropped, which kills its process.
    pub fn create_or_append(
        &self,
        id: Option<OperationId>,
        handle: ProcessHandle,
    ) -> Result<OperationId> {
        let handle = Arc::new(handle);
        let mut entries = self.entries.lock();

        match id {
            None => {
                let id = self.ids.next_id();
                entries.insert(id, Entry::new(vec![handle]));
                tracing::debug!(%id, "operation created");
                Ok(id)
            }
            Some(id) => match entries.get_mut(&id) {
                Some(entry) if entry.resolution.get().is_none() => {
                    entry.processes.push(handle);
                    tracing::debug!(%id, count = entry.processes.len(), "process appended");
                    Ok(id)
                }
                _ => Err(Error::not_found("operation", id)),
            },
        }
    }

    /// Register several already-started processes as one new operation.
    pub fn register(&self, handles: Vec<ProcessHandle>) -> OperationId {
        let processes = handles.into_iter().map(Arc::new).collect();
        let id = self.ids.next_id();
        self.entries.lock().insert(id, Entry::new(processes));
        tracing::debug!(%id, "operation created");
        id
    }

    /// Snapshot of the operation, or [`Error::NotFound`].
    pub fn lookup(&self, id: OperationId) -> Result<Operation> {
        self.entries
            .lock()
            .get(&id)
            .map(|entry| Operation {
                id,
                processes: entry.processes.clone(),
                resolution: Arc::clone(&entry.resolution),
            })
            .ok_or_else(|| Error::not_found("operation", id))
    }

    /// Drop the entry. Returns `false` if it was already gone.
    pub fn remove(&self, id: OperationId) -> bool {
        let removed = self.entries.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "operation removed");
        }
        removed
    }

    /// Ids of all registered operations, ascending.
    pub fn active_ids(&self) -> Vec<OperationId> {
        let mut ids: Vec<_> = self.entries.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
