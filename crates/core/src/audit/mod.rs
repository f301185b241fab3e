//! Audit trail.
//!
//! Audit records are written after the financial unit of work commits. A sink
//! failure is retried a bounded number of times and then logged; it never
//! undoes the committed change.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use girder_shared::types::{CompanyId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Company the change belongs to.
    pub company_id: CompanyId,
    /// Entity kind, e.g. `voucher` or `stock_movement`.
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: Uuid,
    /// What happened, e.g. `post`.
    pub action: String,
    /// State before the change.
    pub before_state: Option<serde_json::Value>,
    /// State after the change.
    pub after_state: Option<serde_json::Value>,
    /// Who made the change.
    pub actor_user_id: UserId,
    /// When.
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    /// A record of `action` on `entity_type` `entity_id` by `actor_user_id`, timestamped now.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        actor_user_id: UserId,
    ) -> Self {
        Self {
            company_id,
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            before_state: None,
            after_state: None,
            actor_user_id,
            timestamp: Utc::now(),
        }
    }

    /// Attaches before and after snapshots. Values that fail to serialize are left out.
    #[must_use]
    pub fn with_states<B: Serialize, A: Serialize>(
        mut self,
        before: Option<&B>,
        after: Option<&A>,
    ) -> Self {
        self.before_state = before.and_then(|b| serde_json::to_value(b).ok());
        self.after_state = after.and_then(|a| serde_json::to_value(a).ok());
        self
    }
}

/// Error reported by an audit sink.
#[derive(Debug, thiserror::Error)]
#[error("audit sink error: {0}")]
pub struct AuditSinkError(pub String);

/// Append-only destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one record.
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError>;
}

/// Writes records as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        tracing::info!(
            target: "girder::audit",
            company_id = %record.company_id,
            entity_type = %record.entity_type,
            entity_id = %record.entity_id,
            action = %record.action,
            actor = %record.actor_user_id,
            "audit"
        );
        Ok(())
    }
}

/// Keeps records in memory; used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records appended so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        self.records
            .lock()
            .map_err(|e| AuditSinkError(e.to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Best-effort writer in front of a sink.
#[derive(Clone)]
pub struct AuditTrail {
    sink: Arc<dyn AuditSink>,
    max_attempts: u32,
}

impl std::fmt::Debug for AuditTrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl AuditTrail {
    /// A trail writing to `sink`, trying each record up to `max_attempts` times.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>, max_attempts: u32) -> Self {
        Self {
            sink,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Write `record`. Returns true if the sink accepted it.
    pub async fn record(&self, record: AuditRecord) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.sink.append(&record).await {
                Ok(()) => return true,
                Err(err) => {
                    tracing::warn!(
                        entity_type = %record.entity_type,
                        entity_id = %record.entity_id,
                        action = %record.action,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "audit write failed"
                    );
                }
            }
        }
        tracing::error!(
            entity_type = %record.entity_type,
            entity_id = %record.entity_id,
            action = %record.action,
            "audit record dropped after {} attempts",
            self.max_attempts
        );
        false
    }

    /// Write every record in order.
    pub async fn record_all(&self, records: Vec<AuditRecord>) {
        for record in records {
            self.record(record).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySink {
        failures_left: AtomicU32,
        calls: AtomicU32,
        inner: MemoryAuditSink,
    }

    #[async_trait]
    impl AuditSink for FlakySink {
        async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(AuditSinkError("connection reset".to_string()));
            }
            self.inner.append(record).await
        }
    }

    fn record() -> AuditRecord {
        AuditRecord::new(CompanyId::new(), "voucher", Uuid::nil(), "post", UserId::new())
    }

    #[tokio::test]
    async fn test_record_retries_until_success() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
            inner: MemoryAuditSink::new(),
        });
        let trail = AuditTrail::new(sink.clone(), 3);

        assert!(trail.record(record()).await);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.inner.records().len(), 1);
    }

    #[tokio::test]
    async fn test_record_gives_up_after_max_attempts() {
        let sink = Arc::new(FlakySink {
            failures_left: AtomicU32::new(10),
            calls: AtomicU32::new(0),
            inner: MemoryAuditSink::new(),
        });
        let trail = AuditTrail::new(sink.clone(), 3);

        assert!(!trail.record(record()).await);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
        assert!(sink.inner.records().is_empty());
    }

    #[test]
    fn test_with_states_serializes_snapshots() {
        let record = record().with_states(Some(&"draft"), Some(&"submitted"));
        assert_eq!(record.before_state, Some(serde_json::json!("draft")));
        assert_eq!(record.after_state, Some(serde_json::json!("submitted")));
    }
}
