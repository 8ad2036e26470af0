// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asynchronous shutdown tasks and disposal.
use futures::future::LocalBoxFuture;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::address_space::AddressSpace;
use crate::model_change::ModelChangeTracker;

/// Failure reported by a shutdown task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShutdownError {
    /// A registered task failed; later tasks were not run.
    #[error("shutdown task failed: {0}")]
    Task(String),
    /// The address space was already disposed.
    #[error("address space already disposed")]
    AlreadyDisposed,
}

impl ShutdownError {
    /// Task failure with a message.
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}

/// A deferred asynchronous cleanup step.
pub type ShutdownTask = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<(), ShutdownError>>>;

impl AddressSpace {
    /// Registers a task to run during [`AddressSpace::shutdown`], after the
    /// tasks registered before it.
    pub fn register_shutdown_task<F>(&mut self, task: F)
    where
        F: FnOnce() -> LocalBoxFuture<'static, Result<(), ShutdownError>> + 'static,
    {
        self.shutdown_tasks.push(Box::new(task));
    }

    /// Number of tasks waiting for shutdown.
    #[must_use]
    pub fn pending_shutdown_tasks(&self) -> usize {
        self.shutdown_tasks.len()
    }

    /// Runs the shutdown tasks in registration order, then disposes the space.
    ///
    /// Stops at the first failing task and returns its error; the space is
    /// left undisposed and the remaining tasks are dropped.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) -> Result<(), ShutdownError> {
        if self.disposed {
            return Err(ShutdownError::AlreadyDisposed);
        }
        let tasks = std::mem::take(&mut self.shutdown_tasks);
        let total = tasks.len();
        for (position, task) in tasks.into_iter().enumerate() {
            if let Err(err) = task().await {
                warn!(position, total, error = %err, "shutdown task failed");
                return Err(err);
            }
        }
        self.dispose();
        Ok(())
    }

    /// Drops every node, sink, hook and pending task. Further mutations fail
    /// with [`Disposed`](crate::AddressSpaceError::Disposed).
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let nodes = self.node_count();
        self.arena.clear();
        for namespace in &mut self.namespaces {
            namespace.clear_nodes();
        }
        self.sinks.clear();
        self.hooks.clear();
        self.shutdown_tasks.clear();
        self.changes = ModelChangeTracker::default();
        self.disposed = true;
        info!(nodes, "address space disposed");
    }

    /// True after [`AddressSpace::dispose`].
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}
