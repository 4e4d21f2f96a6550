//! # Transaction Number Allocation
//!
//! Allocates the next `TRX-<YYYYMMDD>-<seq>` display number from the
//! per-store per-day transaction count.
//!
//! A failing count query must not abort checkout: the allocator degrades to
//! the time-derived fallback format from `presto_core::numbering` and the
//! sale proceeds. Numbers are advisory; the transaction's UUID is the key.

use chrono::{DateTime, Utc};
use tracing::warn;

use presto_core::numbering::{day_bounds, fallback_transaction_number, transaction_number};
use presto_db::TransactionRepository;

/// Allocates a transaction number for a sale happening at `now`.
///
/// Infallible by design: a backend fault downgrades the scheme instead of
/// failing the caller.
pub async fn allocate_transaction_number(
    transactions: &TransactionRepository,
    store_id: &str,
    now: DateTime<Utc>,
) -> String {
    let (start, end) = day_bounds(now);

    match transactions.count_between(store_id, start, end).await {
        Ok(count) => transaction_number(now.date_naive(), count as u32 + 1),
        Err(err) => {
            warn!(
                store_id,
                error = %err,
                "Daily transaction count unavailable, using time-derived number"
            );
            fallback_transaction_number(now)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{insert_cash_sale, test_db};

    #[tokio::test]
    async fn test_sequence_counts_existing_sales() {
        let db = test_db().await;
        let repo = db.transactions();
        let now = Utc::now();
        let date = now.format("%Y%m%d");

        let first = allocate_transaction_number(&repo, "store-1", now).await;
        assert_eq!(first, format!("TRX-{}-001", date));

        insert_cash_sale(&db, "t1", "store-1", 10_000).await;
        let second = allocate_transaction_number(&repo, "store-1", now).await;
        assert_eq!(second, format!("TRX-{}-002", date));

        // another store has its own sequence
        let other = allocate_transaction_number(&repo, "store-2", now).await;
        assert_eq!(other, format!("TRX-{}-001", date));
    }

    #[tokio::test]
    async fn test_falls_back_when_count_unavailable() {
        let db = test_db().await;
        let repo = db.transactions();
        let now = Utc::now();

        // closing the pool makes the count query fail
        db.close().await;

        let number = allocate_transaction_number(&repo, "store-1", now).await;
        let prefix = format!("TRX-{}-", now.format("%Y%m%d"));
        assert!(number.starts_with(&prefix));
        // time-derived suffix is 9 digits (HHMMSSmmm), not the 3-digit sequence
        assert_eq!(number.len(), prefix.len() + 9);
    }
}
