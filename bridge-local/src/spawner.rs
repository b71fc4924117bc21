//! Tokio-backed task spawner

use bridge_traits::TaskSpawner;
use futures_util::future::BoxFuture;
use tracing::warn;

/// Spawns native SDK futures onto the ambient Tokio runtime.
///
/// Must be used from within a runtime; outside of one the task is dropped
/// and a warning is logged, which leaves the corresponding promise to settle
/// as abandoned.
#[derive(Debug, Clone, Default)]
pub struct TokioTaskSpawner;

impl TokioTaskSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl TaskSpawner for TokioTaskSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        if !core_async::runtime::in_runtime() {
            warn!("No async runtime available; dropping spawned task");
            return;
        }
        // Detached: completion is observed through the task's own deferred.
        let _ = core_async::task::spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::sync::oneshot;

    #[core_async::test]
    async fn test_spawned_task_runs() {
        let (tx, rx) = oneshot::channel();
        TokioTaskSpawner::new().spawn(Box::pin(async move {
            let _ = tx.send(5);
        }));
        assert_eq!(rx.await.unwrap(), 5);
    }

    #[test]
    fn test_spawn_outside_runtime_drops_task() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        TokioTaskSpawner::new().spawn(Box::pin(async move {
            let _ = tx.send(());
        }));
        // The task (and its sender) was dropped without running
        assert!(rx.recv().is_err());
    }
}
