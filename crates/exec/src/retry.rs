//! Bounded polling for conditions that settle shortly after a launch.

use std::time::Duration;
use tokio::time::Instant;

/// Call `attempt` until it yields a value or `limit` elapses.
///
/// Always attempts at least once. Returns `None` on timeout.
pub async fn retry_with_timeout<T, F>(mut attempt: F, limit: Duration, interval: Duration) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let deadline = Instant::now() + limit;

    loop {
        if let Some(value) = attempt() {
            return Some(value);
        }
        if Instant::now() + interval > deadline {
            return None;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_first_success() {
        let mut calls = 0;
        let result = retry_with_timeout(
            || {
                calls += 1;
                (calls == 3).then_some(calls)
            },
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(result, Some(3));
    }

    #[tokio::test]
    async fn test_gives_up_after_limit() {
        let start = std::time::Instant::now();
        let result: Option<()> = retry_with_timeout(
            || None,
            Duration::from_millis(100),
            Duration::from_millis(20),
        )
        .await;

        assert!(result.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_limit_still_attempts_once() {
        let result = retry_with_timeout(|| Some(7), Duration::ZERO, Duration::from_millis(10)).await;
        assert_eq!(result, Some(7));
    }
}
