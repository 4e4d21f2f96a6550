//! # Shift Repository
//!
//! Database operations for cash-drawer shifts.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Shift Lifecycle                               │
//! │                                                                     │
//! │  1. OPEN                                                            │
//! │     └── insert_open() → Shift { status: open }                      │
//! │         A partial unique index on (store_id, user_id) WHERE         │
//! │         status = 'open' makes the second of two racing opens fail   │
//! │         with UniqueViolation; the engine recovers by re-fetching.   │
//! │                                                                     │
//! │  2. (optional) UPDATE while open                                    │
//! │     └── update_open() → opening_balance / notes only                │
//! │                                                                     │
//! │  3. CLOSE (terminal, exactly once)                                  │
//! │     └── close() → conditional on status = 'open'; records both      │
//! │         actual and expected balances so variance is derivable       │
//! │         from the stored row                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use presto_core::{Shift, ShiftStatus};

const SHIFT_COLUMNS: &str = "id, store_id, user_id, start_time, end_time, opening_balance, \
     closing_balance_actual, closing_balance_expected, status, notes";

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts a new open shift.
    ///
    /// Fails with [`DbError::UniqueViolation`](crate::DbError::UniqueViolation)
    /// when an open shift already exists for this (store, user) - the caller
    /// recovers by re-fetching the existing one.
    pub async fn insert_open(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, store_id = %shift.store_id, user_id = %shift.user_id, "Opening shift");

        sqlx::query(
            "INSERT INTO shifts ( \
                 id, store_id, user_id, start_time, end_time, opening_balance, \
                 closing_balance_actual, closing_balance_expected, status, notes \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&shift.id)
        .bind(&shift.store_id)
        .bind(&shift.user_id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.opening_balance)
        .bind(shift.closing_balance_actual)
        .bind(shift.closing_balance_expected)
        .bind(shift.status)
        .bind(&shift.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Finds the open shift for a (store, user), if any.
    ///
    /// The partial unique index guarantees at most one row can match.
    pub async fn find_open(&self, store_id: &str, user_id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts \
             WHERE store_id = ?1 AND user_id = ?2 AND status = ?3 \
             ORDER BY start_time DESC LIMIT 1"
        ))
        .bind(store_id)
        .bind(user_id)
        .bind(ShiftStatus::Open)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Closes a shift, recording counted and expected balances.
    ///
    /// Conditional on `status = 'open'`: closing is terminal and happens
    /// exactly once.
    ///
    /// ## Returns
    /// * `Ok(true)` - closed now
    /// * `Ok(false)` - shift missing or already closed
    pub async fn close(
        &self,
        id: &str,
        end_time: DateTime<Utc>,
        closing_balance_actual: i64,
        closing_balance_expected: i64,
        notes: Option<&str>,
    ) -> DbResult<bool> {
        debug!(id = %id, actual = closing_balance_actual, expected = closing_balance_expected, "Closing shift");

        let result = sqlx::query(
            "UPDATE shifts SET \
                 end_time = ?2, closing_balance_actual = ?3, \
                 closing_balance_expected = ?4, status = ?5, notes = ?6 \
             WHERE id = ?1 AND status = ?7",
        )
        .bind(id)
        .bind(end_time)
        .bind(closing_balance_actual)
        .bind(closing_balance_expected)
        .bind(ShiftStatus::Closed)
        .bind(notes)
        .bind(ShiftStatus::Open)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Updates the mutable fields of a still-open shift.
    ///
    /// Only `opening_balance` and `notes` may change; `None` leaves a field
    /// as it was.
    ///
    /// ## Returns
    /// * `Ok(true)` - updated
    /// * `Ok(false)` - shift missing or already closed
    pub async fn update_open(
        &self,
        id: &str,
        opening_balance: Option<i64>,
        notes: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE shifts SET \
                 opening_balance = COALESCE(?2, opening_balance), \
                 notes = COALESCE(?3, notes) \
             WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(opening_balance)
        .bind(notes)
        .bind(ShiftStatus::Open)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists shifts for a store whose start time falls in the window,
    /// newest first.
    pub async fn list_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts \
             WHERE store_id = ?1 AND start_time >= ?2 AND start_time <= ?3 \
             ORDER BY start_time DESC"
        ))
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Generates a new shift ID.
pub fn generate_shift_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn shift(id: &str, store: &str, user: &str, opening: i64) -> Shift {
        Shift {
            id: id.to_string(),
            store_id: store.to_string(),
            user_id: user.to_string(),
            start_time: Utc::now(),
            end_time: None,
            opening_balance: opening,
            closing_balance_actual: None,
            closing_balance_expected: None,
            status: ShiftStatus::Open,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_open_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        repo.insert_open(&shift("sh1", "store-1", "user-1", 100_000))
            .await
            .unwrap();

        let found = repo.find_open("store-1", "user-1").await.unwrap().unwrap();
        assert_eq!(found.id, "sh1");
        assert_eq!(found.opening_balance, 100_000);
        assert!(found.is_open());

        // other user has no open shift
        assert!(repo.find_open("store-1", "user-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_violates_unique_index() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        repo.insert_open(&shift("sh1", "store-1", "user-1", 100_000))
            .await
            .unwrap();

        let err = repo
            .insert_open(&shift("sh2", "store-1", "user-1", 50_000))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // a different user may still open
        repo.insert_open(&shift("sh3", "store-1", "user-2", 75_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_close_is_terminal_and_conditional() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        repo.insert_open(&shift("sh1", "store-1", "user-1", 100_000))
            .await
            .unwrap();

        let closed = repo
            .close("sh1", Utc::now(), 315_000, 320_000, Some("short 5k"))
            .await
            .unwrap();
        assert!(closed);

        let loaded = repo.get_by_id("sh1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ShiftStatus::Closed);
        assert_eq!(loaded.closing_balance_actual, Some(315_000));
        assert_eq!(loaded.closing_balance_expected, Some(320_000));
        assert_eq!(loaded.variance(), Some(-5_000));
        assert!(loaded.end_time.is_some());

        // second close finds no open row
        assert!(!repo.close("sh1", Utc::now(), 0, 0, None).await.unwrap());

        // after closing, a fresh shift may open for the same (store, user)
        repo.insert_open(&shift("sh2", "store-1", "user-1", 315_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_open_only_touches_mutable_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.shifts();

        repo.insert_open(&shift("sh1", "store-1", "user-1", 100_000))
            .await
            .unwrap();

        assert!(repo
            .update_open("sh1", Some(120_000), None)
            .await
            .unwrap());
        let loaded = repo.get_by_id("sh1").await.unwrap().unwrap();
        assert_eq!(loaded.opening_balance, 120_000);
        assert_eq!(loaded.notes, None);

        assert!(repo
            .update_open("sh1", None, Some("drawer recounted"))
            .await
            .unwrap());
        let loaded = repo.get_by_id("sh1").await.unwrap().unwrap();
        assert_eq!(loaded.opening_balance, 120_000);
        assert_eq!(loaded.notes.as_deref(), Some("drawer recounted"));

        // closed shifts refuse updates
        repo.close("sh1", Utc::now(), 1, 1, None).await.unwrap();
        assert!(!repo.update_open("sh1", Some(1), None).await.unwrap());
    }
}
