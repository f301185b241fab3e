//! Row-Level Security (RLS) context management.
//!
//! Every table carries a `tenant_isolation` policy comparing `company_id`
//! with the transaction-local setting `app.current_company_id`. The store
//! sets it right after `BEGIN`, together with the row lock timeout, using
//! `SET LOCAL` so neither leaks past the transaction.

use girder_shared::types::CompanyId;
use sea_orm::{ConnectionTrait, DatabaseTransaction, DbErr};

fn company_context_sql(company_id: CompanyId) -> String {
    format!("SET LOCAL app.current_company_id = '{company_id}'")
}

fn lock_timeout_sql(lock_timeout_ms: u64) -> String {
    format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'")
}

/// Scopes the transaction to `company_id`.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn set_company_context(
    txn: &DatabaseTransaction,
    company_id: CompanyId,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&company_context_sql(company_id))
        .await?;
    Ok(())
}

/// Limits how long the transaction waits for a row lock.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn set_lock_timeout(
    txn: &DatabaseTransaction,
    lock_timeout_ms: u64,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&lock_timeout_sql(lock_timeout_ms))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_company_context_sql_format() {
        let company_id =
            CompanyId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap());
        assert_eq!(
            company_context_sql(company_id),
            "SET LOCAL app.current_company_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
    }

    #[test]
    fn test_lock_timeout_sql_format() {
        assert_eq!(lock_timeout_sql(5000), "SET LOCAL lock_timeout = '5000ms'");
    }
}
