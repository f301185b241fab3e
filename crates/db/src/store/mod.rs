//! `PostgreSQL` implementation of the engine's persistence ports.
//!
//! Every unit of work is one database transaction with the company context
//! and lock timeout set through `SET LOCAL`, so row-level security scopes all
//! reads and writes and row locks wait at most `lock_timeout_ms`.

mod convert;
mod ledger;
mod payables;
mod stock;

use async_trait::async_trait;
use girder_core::store::{Store, StoreError, StoreResult, UnitOfWork};
use girder_shared::config::DatabaseConfig;
use girder_shared::types::CompanyId;
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, RuntimeErr,
    TransactionTrait,
};
use tracing::debug;

use crate::rls::{set_company_context, set_lock_timeout};

/// Opens company-scoped transactions on a connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
    lock_timeout_ms: u64,
}

impl PgStore {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lock_timeout_ms: u64) -> Self {
        Self {
            db,
            lock_timeout_ms,
        }
    }

    /// Connects a pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(false);
        let db = Database::connect(options).await?;
        Ok(Self::new(db, config.lock_timeout_ms))
    }

    /// The underlying pool.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self, company_id: CompanyId) -> StoreResult<PgTx> {
        let txn = self.db.begin().await.map_err(store_error)?;
        set_company_context(&txn, company_id)
            .await
            .map_err(store_error)?;
        set_lock_timeout(&txn, self.lock_timeout_ms)
            .await
            .map_err(store_error)?;
        debug!(company_id = %company_id, "Unit of work started");
        Ok(PgTx { txn, company_id })
    }
}

/// One company-scoped database transaction.
pub struct PgTx {
    txn: DatabaseTransaction,
    company_id: CompanyId,
}

impl PgTx {
    fn company(&self) -> uuid::Uuid {
        self.company_id.into_inner()
    }
}

#[async_trait]
impl UnitOfWork for PgTx {
    fn company_id(&self) -> CompanyId {
        self.company_id
    }

    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.txn.rollback().await.map_err(store_error)
    }
}

/// Maps a database error onto the store taxonomy by SQLSTATE.
///
/// | SQLSTATE | Meaning | Store error |
/// |----------|---------|-------------|
/// | `23505` | unique violation | `UniqueViolation` with the constraint name |
/// | `55P03` | lock not available | `LockTimeout` |
/// | `40001` | serialization failure | `SerializationFailure` |
/// | `40P01` | deadlock detected | `SerializationFailure` |
pub(crate) fn store_error(err: DbErr) -> StoreError {
    let database_error = match &err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => Some(e),
        _ => None,
    };

    if let Some(e) = database_error {
        match e.code().as_deref() {
            Some("23505") => {
                return StoreError::UniqueViolation {
                    constraint: e.constraint().unwrap_or_default().to_string(),
                };
            }
            Some("55P03") => return StoreError::LockTimeout,
            Some("40001" | "40P01") => return StoreError::SerializationFailure,
            _ => {}
        }
    }

    StoreError::Backend(err.to_string())
}
