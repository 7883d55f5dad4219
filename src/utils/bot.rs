//! Bot-related helpers

use std::future::Future;
use std::time::Duration;

/// Run futures in batches of `max_per_time`, pausing `time_period` between
/// batches so a platform rate limit is not hit. Results keep input order.
pub async fn prevent_ratelimit<F, T>(tasks: Vec<F>, max_per_time: usize, time_period: Duration) -> Vec<T>
where
    F: Future<Output = T>,
{
    let max_per_time = max_per_time.max(1);
    let mut results = Vec::with_capacity(tasks.len());
    let mut pending = tasks.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<F> = pending.by_ref().take(max_per_time).collect();
        results.extend(futures::future::join_all(batch).await);

        if pending.peek().is_some() {
            tokio::time::sleep(time_period).await;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_batches_keep_order() {
        let futures: Vec<_> = (0..5).map(|i| async move { i * 2 }).collect();
        let started = tokio::time::Instant::now();

        let results = prevent_ratelimit(futures, 2, Duration::from_secs(1)).await;

        assert_eq!(results, vec![0, 2, 4, 6, 8]);
        // three batches, two pauses
        assert_eq!(started.elapsed().as_secs(), 2);
    }
}
