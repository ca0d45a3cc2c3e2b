//! Pool construction and the serializable-transaction wrapper.

use anyhow::Context;
use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::errors::{Error, Result};

pub mod handlers;
pub mod models;

/// Attempts per operation before surfacing `Error::Retry`.
const MAX_ATTEMPTS: u32 = 3;

/// Connect to PostgreSQL and bring the schema up to date.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(pool)
}

/// PostgreSQL aborted the transaction because of a concurrency conflict:
/// serialization failure (40001) or deadlock detected (40P01).
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

/// Run `op` inside a transaction at SERIALIZABLE isolation, retrying a
/// bounded number of times when the database aborts it.
///
/// Every operation that reads an aggregate (seat count, conflicting-instance
/// set) and writes conditionally on it must go through here: under weaker
/// isolation two concurrent bookings can both observe `count < capacity` and
/// both commit.
///
/// The closure receives the transaction's connection; commit and rollback are
/// handled by this wrapper. Business-rule errors roll back and are returned
/// as-is, never retried.
pub async fn serializable<T, F>(pool: &PgPool, mut op: F) -> Result<T>
where
    F: for<'c> FnMut(&'c mut PgConnection) -> BoxFuture<'c, Result<T>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        match op(&mut *tx).await {
            Ok(value) => match tx.commit().await {
                Ok(()) => return Ok(value),
                Err(err) if is_serialization_failure(&err) => {
                    tracing::warn!(attempt, "transaction aborted at commit, retrying");
                }
                Err(err) => return Err(err.into()),
            },
            Err(Error::Database(err)) if is_serialization_failure(&err) => {
                tracing::warn!(attempt, "serialization failure, retrying");
            }
            Err(err) => {
                tx.rollback().await.ok();
                return Err(err);
            }
        }
    }

    Err(Error::Retry)
}
