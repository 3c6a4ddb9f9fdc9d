//! Cancellation and bounded shutdown of background tasks.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// How long shutdown waits for a task to acknowledge cancellation.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum TaskState {
    Running(JoinHandle<()>),
    Stopped { in_time: bool },
}

/// Owner's side of a running background task.
///
/// Shutdown cancels the task's token and waits for the task to finish, but
/// never longer than the given timeout.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    token: CancellationToken,
    state: Mutex<TaskState>,
}

impl TaskHandle {
    /// Wrap a spawned task together with the token it observes.
    pub fn new(name: impl Into<String>, token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            token,
            state: Mutex::new(TaskState::Running(join)),
        }
    }

    /// Name used in log output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task has exited, on its own or after shutdown.
    ///
    /// Reports `false` while a shutdown is still waiting on the task.
    pub fn is_finished(&self) -> bool {
        match self.state.try_lock() {
            Ok(state) => match &*state {
                TaskState::Running(join) => join.is_finished(),
                TaskState::Stopped { .. } => true,
            },
            Err(_) => false,
        }
    }

    /// Cancel the task and wait up to `timeout` for it to stop.
    ///
    /// Returns `true` once the task has stopped. If it does not stop in time,
    /// the failure is logged, the task is aborted and `false` is returned.
    ///
    /// The outcome of the first shutdown is kept: later calls return it
    /// without waiting again. A call made while another shutdown is still
    /// waiting waits for that one (within its own `timeout`) and returns the
    /// same outcome, or `false` if its own `timeout` runs out first.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.token.cancel();
        let deadline = Instant::now() + timeout;

        let Ok(mut state) = tokio::time::timeout_at(deadline, self.state.lock()).await else {
            error!(task = %self.name, timeout = ?timeout, "gave up waiting for concurrent shutdown");
            return false;
        };

        let join = match &mut *state {
            TaskState::Stopped { in_time } => return *in_time,
            TaskState::Running(join) => join,
        };

        let in_time = match tokio::time::timeout_at(deadline, &mut *join).await {
            Ok(Ok(())) => {
                debug!(task = %self.name, "task stopped");
                true
            }
            Ok(Err(err)) => {
                error!(task = %self.name, error = %err, "task ended abnormally");
                true
            }
            Err(_) => {
                error!(task = %self.name, timeout = ?timeout, "failed to stop task in time");
                join.abort();
                false
            }
        };

        *state = TaskState::Stopped { in_time };
        in_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_shutdown_cooperative_task() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move { child.cancelled().await });
        let handle = TaskHandle::new("cooperative", token, join);

        assert!(!handle.is_finished());
        assert!(handle.shutdown(Duration::from_secs(1)).await);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_shutdown_twice_returns_immediately() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move { child.cancelled().await });
        let handle = TaskHandle::new("twice", token, join);

        assert!(handle.shutdown(Duration::from_secs(1)).await);

        let started = Instant::now();
        assert!(handle.shutdown(Duration::from_secs(5)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_shutdown_is_bounded_for_unresponsive_task() {
        let token = CancellationToken::new();
        let join = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let handle = TaskHandle::new("stuck", token, join);

        let started = Instant::now();
        assert!(!handle.shutdown(Duration::from_millis(100)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_shutdown_after_timeout_keeps_failure() {
        let token = CancellationToken::new();
        let join = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let handle = TaskHandle::new("stuck", token, join);

        assert!(!handle.shutdown(Duration::from_millis(100)).await);

        let started = Instant::now();
        assert!(!handle.shutdown(Duration::from_secs(5)).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_shares_outcome() {
        let token = CancellationToken::new();
        let join = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let handle = Arc::new(TaskHandle::new("stuck", token, join));

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.shutdown(Duration::from_millis(200)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = handle.shutdown(Duration::from_secs(5)).await;

        assert!(!first.await.unwrap());
        assert!(!second);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_concurrent_shutdown_of_cooperative_task() {
        let token = CancellationToken::new();
        let child = token.clone();
        let join = tokio::spawn(async move {
            child.cancelled().await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        });
        let handle = Arc::new(TaskHandle::new("slow", token, join));

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.shutdown(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!handle.is_finished());
        assert!(handle.shutdown(Duration::from_secs(2)).await);
        assert!(first.await.unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_after_task_exited() {
        let token = CancellationToken::new();
        let join = tokio::spawn(async {});
        let handle = TaskHandle::new("done", token, join);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.shutdown(Duration::from_millis(100)).await);
    }
}
