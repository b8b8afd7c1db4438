//! Per-commit outcomes of an orchestration

use crate::error::GitError;
use tokio::sync::mpsc;

/// The terminal outcome of one commit
#[derive(Debug)]
pub struct CommitResult {
    pub commit_id: i64,
    pub error: Option<GitError>,
}

impl CommitResult {
    pub fn merged(commit_id: i64) -> Self {
        Self {
            commit_id,
            error: None,
        }
    }

    pub fn failed(commit_id: i64, error: GitError) -> Self {
        Self {
            commit_id,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Receiving end of the results stream
///
/// Results land in any order; correlate them by commit id. The stream ends
/// once the owner is closed and every buffered result has been read.
#[derive(Debug)]
pub struct Summary {
    rx: mpsc::Receiver<CommitResult>,
}

impl Summary {
    pub async fn recv(&mut self) -> Option<CommitResult> {
        self.rx.recv().await
    }

    /// Drains every result; only ends once the sending side is closed
    pub async fn collect(mut self) -> Vec<CommitResult> {
        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }
}

/// A stream able to hold `capacity` results without blocking any sender
pub(crate) fn channel(capacity: usize) -> (mpsc::Sender<CommitResult>, Summary) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, Summary { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_ends_when_senders_drop() {
        let (tx, summary) = channel(2);
        tx.send(CommitResult::merged(1)).await.unwrap();
        tx.send(CommitResult::failed(2, GitError::NilReviewer)).await.unwrap();
        drop(tx);

        let results = summary.collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(!results[1].is_ok());
    }

    #[test]
    fn test_zero_capacity_is_allowed() {
        let (tx, _summary) = channel(0);
        assert_eq!(tx.max_capacity(), 1);
    }
}
