//! Retry of whole transactions on transient Postgres conflicts.

use std::future::Future;
use std::time::Duration;

use crate::DbError;

/// SQLSTATEs worth a fresh attempt: serialization failure, deadlock, and
/// unique violation from a racing insert.
const RETRIABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "23505"];

pub(crate) fn is_retriable(err: &DbError) -> bool {
    match err {
        DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err
            .code()
            .is_some_and(|code| RETRIABLE_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Run `operation` up to `max_attempts` times while it fails with a retriable
/// conflict, sleeping `base_delay_ms × 2^n` (±25 % jitter) between attempts.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    base_delay_ms: u64,
    mut operation: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let computed = base_delay_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (computed as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transaction conflict; retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use sqlx::PgPool;

    use super::*;

    /// Insert a fixed country row; a second call raises a unique violation.
    async fn insert_fixed_country(pool: &PgPool) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO countries (code, name, has_trends, centroid_lat, centroid_lng) \
             VALUES ('US', 'United States', true, 39.83, -98.58)",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn non_retriable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), DbError> = retry_on_conflict(3, 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DbError::InvalidData("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(DbError::InvalidData(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_is_returned_without_retry() {
        let calls = AtomicU32::new(0);
        let result = retry_on_conflict(3, 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, DbError>(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn unique_violation_is_retried_until_success(pool: PgPool) {
        insert_fixed_country(&pool).await.expect("first insert");

        let calls = AtomicU32::new(0);
        let result = retry_on_conflict(3, 1, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            let pool = &pool;
            async move {
                if attempt == 0 {
                    insert_fixed_country(pool).await?;
                }
                Ok::<_, DbError>(attempt)
            }
        })
        .await;

        assert_eq!(result.expect("second attempt succeeds"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn persistent_conflict_gives_up_after_max_attempts(pool: PgPool) {
        insert_fixed_country(&pool).await.expect("first insert");

        let calls = AtomicU32::new(0);
        let result = retry_on_conflict(3, 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            insert_fixed_country(&pool)
        })
        .await;

        let err = result.expect_err("duplicate insert keeps failing");
        assert!(is_retriable(&err));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pool_errors_are_not_retriable() {
        assert!(!is_retriable(&DbError::Sqlx(sqlx::Error::PoolTimedOut)));
        assert!(!is_retriable(&DbError::InvalidData("x".to_string())));
    }
}
