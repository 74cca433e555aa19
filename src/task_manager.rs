//! Manages the lifecycle of the background tasks spawned by the application.
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Keeps the `JoinHandle` of every spawned background task together with the
/// shutdown signal those tasks listen to.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns `future` under `name` and tracks its handle.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        match self.handles.lock() {
            Ok(mut handles) => handles.push((name, handle)),
            Err(poisoned) => poisoned.into_inner().push((name, handle)),
        }
    }

    /// Number of tracked tasks.
    pub fn len(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a clone of the shutdown receiver.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Waits up to `grace` for every task to finish, then aborts the rest.
    ///
    /// Returns the names of the tasks that panicked or had to be aborted.
    pub async fn shutdown(self, grace: Duration) -> Vec<&'static str> {
        let handles = match self.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect::<Vec<_>>(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect::<Vec<_>>(),
        };
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let (task_names, joins): (Vec<&'static str>, Vec<JoinHandle<()>>) =
            handles.into_iter().unzip();
        let aborters: Vec<_> = joins.iter().map(|j| j.abort_handle()).collect();

        let results = match tokio::time::timeout(grace, join_all(joins)).await {
            Ok(results) => results,
            Err(_) => {
                warn!("Tasks did not stop within {:?}; aborting.", grace);
                for aborter in &aborters {
                    aborter.abort();
                }
                return task_names;
            }
        };

        let mut unclean = Vec::new();
        for (task_name, result) in task_names.into_iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name, "Task panicked during shutdown: {:?}", e);
                    unclean.push(task_name);
                }
            }
        }

        if unclean.is_empty() {
            info!("All tasks shut down gracefully.");
        }
        unclean
    }
}
