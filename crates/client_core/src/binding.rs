use futures::{future, Stream, StreamExt};
use shared::domain::WorkflowBinding;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Publishes the workflow a comment thread should follow. Consecutive equal
/// bindings are swallowed so hosts can publish on every render without
/// triggering reloads.
pub struct BindingPublisher {
    tx: watch::Sender<Option<WorkflowBinding>>,
}

impl BindingPublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Returns `true` when `binding` differs from the current one and
    /// subscribers were notified.
    pub fn publish(&self, binding: WorkflowBinding) -> bool {
        self.tx.send_if_modified(move |current| {
            if current.as_ref() == Some(&binding) {
                return false;
            }
            *current = Some(binding);
            true
        })
    }

    pub fn current(&self) -> Option<WorkflowBinding> {
        self.tx.borrow().clone()
    }

    /// Stream of binding changes, starting with the current binding if any.
    pub fn subscribe(&self) -> impl Stream<Item = WorkflowBinding> + Send + Unpin + 'static {
        WatchStream::new(self.tx.subscribe()).filter_map(future::ready)
    }
}

impl Default for BindingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/binding_tests.rs"]
mod tests;
