//! Audit sink backed by the append-only `audit_log` table.

use async_trait::async_trait;
use girder_core::audit::{AuditRecord, AuditSink, AuditSinkError};
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::entities::audit_log;
use crate::rls::set_company_context;

/// Writes each record in its own short transaction under the record's company.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    db: DatabaseConnection,
}

impl PgAuditSink {
    /// Creates a sink on `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn audit_model(record: &AuditRecord) -> audit_log::ActiveModel {
    audit_log::ActiveModel {
        id: Set(Uuid::now_v7()),
        company_id: Set(record.company_id.into_inner()),
        entity_type: Set(record.entity_type.clone()),
        entity_id: Set(record.entity_id),
        action: Set(record.action.clone()),
        before_state: Set(record.before_state.clone()),
        after_state: Set(record.after_state.clone()),
        actor_user_id: Set(record.actor_user_id.into_inner()),
        created_at: Set(record.timestamp),
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditSinkError> {
        let sink_error = |e: sea_orm::DbErr| AuditSinkError(e.to_string());

        let txn = self.db.begin().await.map_err(sink_error)?;
        set_company_context(&txn, record.company_id)
            .await
            .map_err(sink_error)?;
        audit_log::Entity::insert(audit_model(record))
            .exec(&txn)
            .await
            .map_err(sink_error)?;
        txn.commit().await.map_err(sink_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_shared::types::{CompanyId, UserId};
    use sea_orm::ActiveValue;

    #[test]
    fn test_audit_model_carries_record_fields() {
        let record = AuditRecord::new(
            CompanyId::new(),
            "voucher",
            Uuid::now_v7(),
            "post",
            UserId::new(),
        )
        .with_states(Some(&"approved"), Some(&"posted"));

        let model = audit_model(&record);

        assert_eq!(model.entity_type, ActiveValue::Set("voucher".to_string()));
        assert_eq!(model.action, ActiveValue::Set("post".to_string()));
        assert_eq!(
            model.after_state,
            ActiveValue::Set(Some(serde_json::json!("posted")))
        );
        assert_eq!(model.created_at, ActiveValue::Set(record.timestamp));
    }
}
