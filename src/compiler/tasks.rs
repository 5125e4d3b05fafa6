//! Concurrent task helpers.

use tokio::task::JoinSet;

use super::CompileError;

/// Wait for every task, or for the first failure.
///
/// On failure the remaining tasks are detached: they keep running and their
/// results are discarded.
pub async fn first_failure<T: 'static>(
    mut set: JoinSet<Result<T, CompileError>>,
) -> Result<Vec<T>, CompileError> {
    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined.map_err(CompileError::from).and_then(|r| r) {
            Ok(value) => results.push(value),
            Err(e) => {
                set.detach_all();
                return Err(e);
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_success() {
        let mut set = JoinSet::new();
        for i in 0..4 {
            set.spawn(async move { Ok::<_, CompileError>(i) });
        }
        let mut results = first_failure(set).await.unwrap();
        results.sort();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_first_failure_detaches_the_rest() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();

        let flag = Arc::clone(&finished);
        set.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        set.spawn(async { Err(CompileError::Task("boom".into())) });

        let err = first_failure(set).await.unwrap_err();
        assert!(matches!(err, CompileError::Task(ref m) if m == "boom"));
        assert!(!finished.load(Ordering::SeqCst));

        // The slow task was detached, not aborted
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(finished.load(Ordering::SeqCst));
    }
}
