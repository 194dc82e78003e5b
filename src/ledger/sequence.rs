use std::future::Future;
use std::time::Duration;

use sqlx::{MySql, Transaction};
use tokio::time::timeout;

use crate::error::AdmissionError;

/// Bounded-wait wrapper around an allocation attempt. The allocator may
/// block on the counter row lock under contention; callers get a clean
/// `AllocationTimeout` instead of waiting forever, and retry the whole
/// submission as a fresh attempt.
pub async fn allocate_bounded<F, Fut>(lock_timeout: Duration, alloc: F) -> Result<u64, AdmissionError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<u64, AdmissionError>>,
{
    timeout(lock_timeout, alloc())
        .await
        .map_err(|_| AdmissionError::AllocationTimeout)?
}

/// Allocate the next NSR inside the caller's transaction.
///
/// The counter lives in a dedicated single-row table so the exclusive
/// lock taken here covers exactly one row; punches for unrelated
/// employees only ever meet at this row, never at a table lock. The
/// increment commits or rolls back together with the punch insert, so an
/// aborted submission can leave a gap in committed NSRs but can never
/// produce a duplicate.
pub async fn next_nsr(
    tx: &mut Transaction<'_, MySql>,
    lock_timeout: Duration,
) -> Result<u64, AdmissionError> {
    allocate_bounded(lock_timeout, || async move {
        let current: u64 =
            sqlx::query_scalar("SELECT value FROM nsr_counter WHERE id = 1 FOR UPDATE")
                .fetch_one(&mut **tx)
                .await?;

        let next = current + 1;
        sqlx::query("UPDATE nsr_counter SET value = ? WHERE id = 1")
            .bind(next)
            .execute(&mut **tx)
            .await?;

        Ok(next)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Contract check for the counter: arbitrarily many concurrent
    /// allocations through the bounded-wait path must never hand out the
    /// same value twice. The shared Mutex plays the role of the counter
    /// row's exclusive lock.
    #[tokio::test]
    async fn concurrent_allocations_never_duplicate() {
        const N: usize = 1000;
        let counter = Arc::new(Mutex::new(0u64));

        let mut handles = Vec::with_capacity(N);
        for _ in 0..N {
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                allocate_bounded(Duration::from_secs(5), || async move {
                    let mut value = counter.lock().await;
                    *value += 1;
                    Ok(*value)
                })
                .await
            }));
        }

        let mut seen = HashSet::with_capacity(N);
        for handle in handles {
            let nsr = handle.await.unwrap().unwrap();
            assert!(seen.insert(nsr), "nsr {nsr} handed out twice");
        }
        assert_eq!(seen.len(), N);
        assert_eq!(*seen.iter().max().unwrap(), N as u64);
    }

    #[tokio::test]
    async fn blocked_allocation_times_out_cleanly() {
        let result = allocate_bounded(Duration::from_millis(20), || async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        })
        .await;
        assert!(matches!(result, Err(AdmissionError::AllocationTimeout)));
    }

    /// A failed attempt must not leak its value to the next caller as a
    /// duplicate; after a rollback the sequence simply continues (gaps
    /// are legal, repeats are not).
    #[tokio::test]
    async fn aborted_attempt_leaves_no_duplicate() {
        let counter = Arc::new(Mutex::new(0u64));

        let c = Arc::clone(&counter);
        let first = allocate_bounded(Duration::from_secs(1), || async move {
            let mut value = c.lock().await;
            *value += 1;
            Ok(*value)
        })
        .await
        .unwrap();

        // Simulated abort: the submission owning `first` rolled back.
        let c = Arc::clone(&counter);
        let second = allocate_bounded(Duration::from_secs(1), || async move {
            let mut value = c.lock().await;
            *value += 1;
            Ok(*value)
        })
        .await
        .unwrap();

        assert!(second > first);
    }
}
