use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::TransactionBehavior;

use crate::database::Database;
use crate::error::EasySqlError;
use crate::executor::SqlExecutor;
use crate::sqlite::connection::{lock_connection, rollback_with_busy_retries};
use crate::sqlite::{SharedSqliteConnection, run_blocking};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Active,
    Committed,
    RolledBack,
}

/// A transaction on a [`Database`], rolled back on drop unless committed.
///
/// The transaction borrows the database exclusively; every statement issued through it runs
/// inside the transaction.
///
/// ```rust,no_run
/// use easy_sql::prelude::*;
///
/// # async fn demo(db: &mut Database) -> Result<(), EasySqlError> {
/// {
///     let tx = db.transaction().await?;
///     tx.exec_non_query("DELETE FROM t").await?;
///     // dropped without commit: the delete is rolled back
/// }
/// let mut tx = db.transaction().await?;
/// tx.exec_non_query("DELETE FROM t WHERE a = 1").await?;
/// tx.commit().await?;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Transaction<'db> {
    db: &'db mut Database,
    state: TxState,
}

impl<'db> Transaction<'db> {
    pub(crate) async fn begin(
        db: &'db mut Database,
        behavior: TransactionBehavior,
    ) -> Result<Self, EasySqlError> {
        let sql = match behavior {
            TransactionBehavior::Immediate => "BEGIN IMMEDIATE",
            TransactionBehavior::Exclusive => "BEGIN EXCLUSIVE",
            _ => "BEGIN DEFERRED",
        };
        run_blocking(Arc::clone(&db.conn), move |c| {
            // No guard can be alive while `db` is borrowed here, so an open transaction was
            // abandoned (e.g. a cancelled `begin`) and is discarded.
            if !c.is_autocommit() {
                tracing::warn!("rolling back a transaction left open on the connection");
                rollback_with_busy_retries(c)?;
            }
            c.execute_batch(sql).map_err(|e| EasySqlError::query(sql, e))
        })
        .await?;
        tracing::debug!(sql, "sqlite transaction started");
        Ok(Self {
            db,
            state: TxState::Active,
        })
    }

    /// Commit. Committing again is a no-op that returns `Ok(true)`.
    ///
    /// A failed commit leaves the transaction active, so dropping it still rolls back.
    ///
    /// # Errors
    /// Returns `EasySqlError::TransactionError` after a rollback and
    /// `EasySqlError::QueryError` if COMMIT fails.
    pub async fn commit(&mut self) -> Result<bool, EasySqlError> {
        match self.state {
            TxState::Committed => return Ok(true),
            TxState::RolledBack => {
                return Err(EasySqlError::TransactionError(
                    "cannot commit a rolled back transaction".into(),
                ));
            }
            TxState::Active => {}
        }
        run_blocking(Arc::clone(&self.db.conn), |c| {
            c.execute_batch("COMMIT")
                .map_err(|e| EasySqlError::query("COMMIT", e))
        })
        .await?;
        self.state = TxState::Committed;
        tracing::debug!("sqlite transaction committed");
        Ok(true)
    }

    /// Roll back. Returns `Ok(false)` when the transaction already finished.
    ///
    /// # Errors
    /// Returns `EasySqlError::QueryError` if ROLLBACK fails.
    pub async fn rollback(&mut self) -> Result<bool, EasySqlError> {
        if self.state != TxState::Active {
            return Ok(false);
        }
        run_blocking(Arc::clone(&self.db.conn), |c| {
            if c.is_autocommit() {
                return Ok(());
            }
            rollback_with_busy_retries(c)
        })
        .await?;
        self.state = TxState::RolledBack;
        tracing::debug!("sqlite transaction rolled back");
        Ok(true)
    }

    /// True once BEGIN succeeded, which is the case for every `Transaction` value.
    #[must_use]
    pub fn started(&self) -> bool {
        true
    }

    #[must_use]
    pub fn committed(&self) -> bool {
        self.state == TxState::Committed
    }

    /// True until the transaction is committed or rolled back.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TxState::Active
    }
}

#[async_trait]
impl<'db> SqlExecutor for Transaction<'db> {
    fn connection_handle(&self) -> Result<SharedSqliteConnection, EasySqlError> {
        match self.state {
            TxState::Active => Ok(Arc::clone(&self.db.conn)),
            TxState::Committed => Err(EasySqlError::TransactionError(
                "transaction already committed".into(),
            )),
            TxState::RolledBack => Err(EasySqlError::TransactionError(
                "transaction already rolled back".into(),
            )),
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state != TxState::Active {
            return;
        }
        // Roll back synchronously so the connection is clean before anyone reuses it.
        let guard = lock_connection(&self.db.conn);
        if guard.is_autocommit() {
            return;
        }
        match rollback_with_busy_retries(&guard) {
            Ok(()) => tracing::debug!("uncommitted sqlite transaction rolled back on drop"),
            Err(err) => tracing::warn!(error = %err, "sqlite rollback on drop failed"),
        }
    }
}
