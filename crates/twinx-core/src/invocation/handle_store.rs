use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use twinx_core_types::schema::{FIELD_EXECUTION_STATE, FIELD_OPERATION_PATH, FIELD_REQUEST_ID};
use twinx_core_types::RequestId;

use super::request::{ExecutionState, InvocationResponse};
use crate::errors::{Result, TwinError};

/// Identity of one asynchronous invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleKey {
    pub operation_path: String,
    pub request_id: RequestId,
}

impl HandleKey {
    pub fn new(operation_path: impl Into<String>, request_id: RequestId) -> Self {
        Self {
            operation_path: operation_path.into(),
            request_id,
        }
    }

    fn not_found(&self) -> TwinError {
        TwinError::HandleNotFound {
            operation_path: self.operation_path.clone(),
            request_id: self.request_id.to_string(),
        }
    }

    fn frozen(&self, state: ExecutionState) -> TwinError {
        TwinError::HandleFrozen {
            operation_path: self.operation_path.clone(),
            request_id: self.request_id.to_string(),
            state: state.to_string(),
        }
    }
}

/// Stored state of one asynchronous invocation
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRecord {
    pub response: InvocationResponse,
    pub created_at: DateTime<Utc>,
    /// Set when the record reaches a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

/// How long terminal records stay in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleRetention {
    /// Records are only removed by explicit [`HandleStore::evict`]
    #[default]
    KeepForever,
    /// [`HandleStore::evict_expired`] drops records this long after completion
    Ttl(Duration),
}

/// Concurrency-safe map of asynchronous invocation records
///
/// Each record is written by one background task: `begin`, then optionally
/// `mark_running`, then exactly one `complete`. Writes after completion are
/// rejected. Pollers read concurrently.
#[derive(Debug, Default)]
pub struct HandleStore {
    records: RwLock<HashMap<HandleKey, HandleRecord>>,
    retention: HandleRetention,
}

impl HandleStore {
    pub fn new(retention: HandleRetention) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn retention(&self) -> HandleRetention {
        self.retention
    }

    /// Record a new invocation
    ///
    /// # Errors
    /// * `DuplicateHandle` - a record already exists for the key
    pub fn begin(&self, key: HandleKey, response: InvocationResponse) -> Result<()> {
        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(TwinError::DuplicateHandle {
                operation_path: key.operation_path,
                request_id: key.request_id.to_string(),
            });
        }
        tracing::debug!(
            { FIELD_OPERATION_PATH } = %key.operation_path,
            { FIELD_REQUEST_ID } = %key.request_id,
            { FIELD_EXECUTION_STATE } = %response.execution_state,
            "invocation handle recorded"
        );
        records.insert(
            key,
            HandleRecord {
                response,
                created_at: Utc::now(),
                completed_at: None,
            },
        );
        Ok(())
    }

    /// Move a record to `Running`
    ///
    /// # Errors
    /// * `HandleNotFound` - no record for the key
    /// * `HandleFrozen` - the record is already terminal
    pub fn mark_running(&self, key: &HandleKey) -> Result<()> {
        let mut records = self.records.write();
        let record = records.get_mut(key).ok_or_else(|| key.not_found())?;
        let state = record.response.execution_state;
        if state.is_terminal() {
            return Err(key.frozen(state));
        }
        record.response.execution_state = ExecutionState::Running;
        Ok(())
    }

    /// Write the terminal response; the record is frozen afterwards
    ///
    /// # Errors
    /// * `HandleNotFound` - no record for the key
    /// * `HandleFrozen` - the record is already terminal
    /// * `Internal` - `response` is not in a terminal state
    pub fn complete(&self, key: &HandleKey, response: InvocationResponse) -> Result<()> {
        if !response.execution_state.is_terminal() {
            return Err(TwinError::Internal {
                message: format!(
                    "cannot complete handle with non-terminal state {}",
                    response.execution_state
                ),
            });
        }

        let mut records = self.records.write();
        let record = records.get_mut(key).ok_or_else(|| key.not_found())?;
        let state = record.response.execution_state;
        if state.is_terminal() {
            return Err(key.frozen(state));
        }
        tracing::debug!(
            { FIELD_OPERATION_PATH } = %key.operation_path,
            { FIELD_REQUEST_ID } = %key.request_id,
            { FIELD_EXECUTION_STATE } = %response.execution_state,
            "invocation handle completed"
        );
        record.response = response;
        record.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Current response for a key
    ///
    /// # Errors
    /// * `HandleNotFound` - no record for the key
    pub fn get(&self, key: &HandleKey) -> Result<InvocationResponse> {
        self.records
            .read()
            .get(key)
            .map(|r| r.response.clone())
            .ok_or_else(|| key.not_found())
    }

    pub fn get_record(&self, key: &HandleKey) -> Option<HandleRecord> {
        self.records.read().get(key).cloned()
    }

    /// Remove a terminal record
    ///
    /// Returns `None` when the key is unknown or the invocation is still in
    /// flight; in-flight records are never removed.
    pub fn evict(&self, key: &HandleKey) -> Option<HandleRecord> {
        let mut records = self.records.write();
        match records.get(key) {
            Some(record) if record.response.execution_state.is_terminal() => records.remove(key),
            _ => None,
        }
    }

    /// Drop terminal records older than the retention TTL at `now`
    ///
    /// Returns how many records were removed; always zero under `KeepForever`.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let ttl = match self.retention {
            HandleRetention::KeepForever => return 0,
            HandleRetention::Ttl(ttl) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => ttl,
                Err(_) => return 0,
            },
        };

        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| match record.completed_at {
            Some(done) => done
                .checked_add_signed(ttl)
                .map_or(true, |expiry| expiry > now),
            None => true,
        });
        let evicted = before - records.len();
        if evicted > 0 {
            tracing::debug!(evicted, "expired invocation handles evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
