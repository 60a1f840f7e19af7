//! Graceful shutdown (spec §9 ambient stack): every long-running
//! collaborator — the WebSocket pool, the queue rebalancer, the order
//! reconciler — implements one of these so the process can drain in a
//! known order instead of being killed mid-flight.

use async_trait::async_trait;

/// A collaborator that shuts down synchronously and cannot fail.
pub trait SyncShutdown {
    fn shutdown(&self);
}

/// A collaborator whose shutdown needs to await in-flight work (closing
/// sockets, flushing a queue) and may fail partway through.
#[async_trait]
pub trait AsyncShutdown: Send + Sync {
    async fn shutdown(&self) -> Result<(), crate::error::ExecutionError>;
}

/// Runs a list of [`AsyncShutdown`] collaborators in order, collecting
/// every failure rather than aborting at the first one — a stuck
/// WebSocket pool must not prevent the queue rebalancer from draining.
pub struct Shutdown {
    targets: Vec<Box<dyn AsyncShutdown>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self { targets: Vec::new() }
    }

    pub fn register(mut self, target: Box<dyn AsyncShutdown>) -> Self {
        self.targets.push(target);
        self
    }

    pub async fn run(&self) -> Vec<crate::error::ExecutionError> {
        let mut errors = Vec::new();
        for target in &self.targets {
            if let Err(err) = target.shutdown().await {
                errors.push(err);
            }
        }
        errors
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
