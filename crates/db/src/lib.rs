//! `PostgreSQL` persistence for the Girder engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations with row-level security
//! - [`PgStore`], the engine's `Store` over company-scoped transactions
//! - [`PgAuditSink`], the append-only audit log writer

pub mod audit;
pub mod entities;
pub mod migration;
pub mod rls;
pub mod store;

pub use audit::PgAuditSink;
pub use store::{PgStore, PgTx};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
