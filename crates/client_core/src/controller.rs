use std::sync::Arc;

use chrono::Utc;
use futures::{Stream, StreamExt};
use shared::{
    domain::{Comment, CommentState, WorkflowBinding, WorkflowId},
    protocol::{CreateCommentRequest, DeleteCommentRequest, UpdateCommentRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::CommentError,
    session::{resolve_avatar, SessionProvider},
    validator::CommentInputValidator,
    CommentService,
};

type Result<T> = std::result::Result<T, CommentError>;

#[derive(Debug, Clone)]
pub enum ThreadEvent {
    Reloaded {
        workflow_id: WorkflowId,
        count: usize,
    },
    CommentAdded(Comment),
    CommentEdited(Comment),
    CommentDeleted(Comment),
    ResponseDiscarded {
        operation: &'static str,
        workflow_id: WorkflowId,
    },
    Error(String),
}

/// Keeps the comment thread of one bound workflow in sync with the remote
/// comment service.
///
/// The state lock is never held across a remote call, so overlapping calls
/// are allowed and their results land in completion order. Every call is
/// tagged when issued: a thread load only commits if no newer load was
/// started, and a mutation only commits while the same workflow is bound.
pub struct CommentThreadController {
    service: Arc<dyn CommentService>,
    session: Arc<dyn SessionProvider>,
    avatar_placeholder: String,
    preserve_draft_on_failure: bool,
    inner: Mutex<ThreadState>,
    events: broadcast::Sender<ThreadEvent>,
}

#[derive(Default)]
struct ThreadState {
    workflow_id: Option<WorkflowId>,
    generation: u64,
    comments: Vec<Comment>,
    pending_delete: Option<Comment>,
    input: CommentInputValidator,
}

impl CommentThreadController {
    pub fn new(
        service: Arc<dyn CommentService>,
        session: Arc<dyn SessionProvider>,
    ) -> Arc<Self> {
        Self::new_with_settings(service, session, &ClientSettings::default())
    }

    pub fn new_with_settings(
        service: Arc<dyn CommentService>,
        session: Arc<dyn SessionProvider>,
        settings: &ClientSettings,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Arc::new(Self {
            service,
            session,
            avatar_placeholder: settings.avatar_placeholder.clone(),
            preserve_draft_on_failure: settings.preserve_draft_on_failure,
            inner: Mutex::new(ThreadState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ThreadEvent> {
        self.events.subscribe()
    }

    /// Binds the thread to `workflow_id` and reloads it. Runs on every
    /// binding notification, including ones that keep the same id.
    pub async fn on_resource_bound(&self, workflow_id: WorkflowId) -> Result<usize> {
        let generation = self.begin_binding(&workflow_id).await;
        self.load_thread(workflow_id, generation).await
    }

    /// Reloads the thread for every binding the stream yields. Loads run
    /// concurrently; only the most recent one commits.
    pub fn follow_bindings<S>(self: &Arc<Self>, bindings: S) -> JoinHandle<()>
    where
        S: Stream<Item = WorkflowBinding> + Send + Unpin + 'static,
    {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut bindings = bindings;
            while let Some(binding) = bindings.next().await {
                let workflow_id = binding.workflow_id;
                let generation = controller.begin_binding(&workflow_id).await;
                let loader = Arc::clone(&controller);
                tokio::spawn(async move {
                    // Failures are already logged and published as events.
                    let _ = loader.load_thread(workflow_id, generation).await;
                });
            }
            debug!("comments: binding stream closed");
        })
    }

    async fn begin_binding(&self, workflow_id: &WorkflowId) -> u64 {
        let mut guard = self.inner.lock().await;
        if guard.workflow_id.as_ref() != Some(workflow_id) {
            guard.pending_delete = None;
        }
        guard.workflow_id = Some(workflow_id.clone());
        guard.generation += 1;
        guard.generation
    }

    async fn load_thread(&self, workflow_id: WorkflowId, generation: u64) -> Result<usize> {
        info!(%workflow_id, generation, "comments: loading thread");
        let response = match self.service.fetch_comments(&workflow_id).await {
            Ok(response) => response,
            Err(source) => return Err(self.remote_failure("fetch_comments", workflow_id, source)),
        };

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            let current = guard.workflow_id.clone().unwrap_or_else(|| workflow_id.clone());
            drop(guard);
            return Err(self.discard("fetch_comments", workflow_id, current));
        }
        guard.comments = response.comments;
        let count = guard.comments.len();
        drop(guard);

        info!(%workflow_id, count, "comments: thread loaded");
        self.publish(ThreadEvent::Reloaded { workflow_id, count });
        Ok(count)
    }

    /// Posts `raw_text` as a new comment. Invalid text is a silent no-op
    /// returning `Ok(None)`.
    pub async fn submit_comment(&self, raw_text: &str) -> Result<Option<Comment>> {
        let (workflow_id, request) = {
            let mut guard = self.inner.lock().await;
            if !guard.input.is_valid(raw_text) {
                debug!("comments: submission rejected by input policy");
                return Ok(None);
            }
            let workflow_id = guard.workflow_id.clone().ok_or(CommentError::Unbound)?;
            let request = CreateCommentRequest {
                text: guard.input.normalize(raw_text),
                timestamp: Utc::now(),
            };
            if !self.preserve_draft_on_failure {
                guard.input.reset();
            }
            (workflow_id, request)
        };

        let response = match self.service.create_comment(&workflow_id, request).await {
            Ok(response) => response,
            Err(source) => return Err(self.remote_failure("create_comment", workflow_id, source)),
        };

        let mut guard = self.inner.lock().await;
        if self.preserve_draft_on_failure {
            guard.input.reset();
        }
        if let Some(current) = stale_binding(&guard, &workflow_id) {
            drop(guard);
            return Err(self.discard("create_comment", workflow_id, current));
        }
        let comment = response.comment;
        // A reload that raced the create may already carry the new comment.
        match guard
            .comments
            .iter()
            .position(|existing| existing.id == comment.id)
        {
            Some(index) => guard.comments[index] = comment.clone(),
            None => guard.comments.push(comment.clone()),
        }
        drop(guard);

        info!(%workflow_id, comment_id = %comment.id, "comments: comment added");
        self.publish(ThreadEvent::CommentAdded(comment.clone()));
        Ok(Some(comment))
    }

    pub async fn submit_draft(&self) -> Result<Option<Comment>> {
        let draft = self.draft().await;
        self.submit_comment(&draft).await
    }

    pub async fn request_delete(&self, comment: Comment) {
        debug!(comment_id = %comment.id, "comments: delete requested");
        self.inner.lock().await.pending_delete = Some(comment);
    }

    pub async fn cancel_delete(&self) {
        self.inner.lock().await.pending_delete = None;
    }

    /// Deletes the pending target remotely and flags it deleted in place.
    /// The pending target is cleared once the call resolves either way.
    pub async fn confirm_delete(&self) -> Result<Option<Comment>> {
        let (workflow_id, target) = {
            let mut guard = self.inner.lock().await;
            let target = guard
                .pending_delete
                .clone()
                .ok_or(CommentError::NoPendingDelete)?;
            let Some(workflow_id) = guard.workflow_id.clone() else {
                guard.pending_delete = None;
                return Err(CommentError::Unbound);
            };
            (workflow_id, target)
        };

        let request = DeleteCommentRequest {
            comment_id: target.id.clone(),
            timestamp: Utc::now(),
        };
        let result = self.service.delete_comment(&workflow_id, request).await;

        let mut guard = self.inner.lock().await;
        guard.pending_delete = None;
        if let Err(source) = result {
            drop(guard);
            return Err(self.remote_failure("delete_comment", workflow_id, source));
        }
        if let Some(current) = stale_binding(&guard, &workflow_id) {
            drop(guard);
            return Err(self.discard("delete_comment", workflow_id, current));
        }
        let deleted = guard
            .comments
            .iter_mut()
            .find(|comment| comment.id == target.id)
            .map(|comment| {
                comment.state = CommentState::Deleted;
                comment.clone()
            });
        drop(guard);

        info!(%workflow_id, comment_id = %target.id, "comments: comment deleted");
        if let Some(comment) = &deleted {
            self.publish(ThreadEvent::CommentDeleted(comment.clone()));
        }
        Ok(deleted)
    }

    /// Sends `update` and, on success, replaces the text and timestamp of the
    /// local comment with `target`'s id, keeping its position.
    pub async fn edit_comment(
        &self,
        target: &Comment,
        update: UpdateCommentRequest,
    ) -> Result<Option<Comment>> {
        let workflow_id = self
            .inner
            .lock()
            .await
            .workflow_id
            .clone()
            .ok_or(CommentError::Unbound)?;

        let text = update.text.clone();
        let timestamp = update.timestamp;
        if let Err(source) = self.service.update_comment(&workflow_id, update).await {
            return Err(self.remote_failure("update_comment", workflow_id, source));
        }

        let mut guard = self.inner.lock().await;
        if let Some(current) = stale_binding(&guard, &workflow_id) {
            drop(guard);
            return Err(self.discard("update_comment", workflow_id, current));
        }
        let edited = guard
            .comments
            .iter_mut()
            .find(|comment| comment.id == target.id)
            .map(|comment| {
                comment.text = text;
                comment.timestamp = timestamp;
                comment.clone()
            });
        drop(guard);

        info!(%workflow_id, comment_id = %target.id, "comments: comment edited");
        if let Some(comment) = &edited {
            self.publish(ThreadEvent::CommentEdited(comment.clone()));
        }
        Ok(edited)
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.inner.lock().await.comments.clone()
    }

    pub async fn visible_comments(&self) -> Vec<Comment> {
        self.inner
            .lock()
            .await
            .comments
            .iter()
            .filter(|comment| !comment.is_deleted())
            .cloned()
            .collect()
    }

    pub async fn pending_delete(&self) -> Option<Comment> {
        self.inner.lock().await.pending_delete.clone()
    }

    pub async fn bound_workflow(&self) -> Option<WorkflowId> {
        self.inner.lock().await.workflow_id.clone()
    }

    pub async fn draft(&self) -> String {
        self.inner.lock().await.input.draft().to_string()
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.inner.lock().await.input.set_draft(text);
    }

    pub async fn is_draft_valid(&self) -> bool {
        self.inner.lock().await.input.is_draft_valid()
    }

    pub fn user_avatar(&self) -> String {
        resolve_avatar(
            self.session.current_user().as_ref(),
            &self.avatar_placeholder,
        )
    }

    fn remote_failure(
        &self,
        operation: &'static str,
        workflow_id: WorkflowId,
        source: anyhow::Error,
    ) -> CommentError {
        warn!(%workflow_id, operation, "comments: remote call failed: {source:#}");
        let err = CommentError::Remote {
            operation,
            workflow_id,
            source,
        };
        self.publish(ThreadEvent::Error(err.to_string()));
        err
    }

    fn discard(
        &self,
        operation: &'static str,
        issued_for: WorkflowId,
        current: WorkflowId,
    ) -> CommentError {
        info!(
            %issued_for,
            %current,
            operation,
            "comments: discarding response from superseded binding"
        );
        self.publish(ThreadEvent::ResponseDiscarded {
            operation,
            workflow_id: issued_for.clone(),
        });
        CommentError::Superseded {
            operation,
            issued_for,
            current,
        }
    }

    fn publish(&self, event: ThreadEvent) {
        let _ = self.events.send(event);
    }
}

/// Current binding if it no longer names `issued_for`.
fn stale_binding(state: &ThreadState, issued_for: &WorkflowId) -> Option<WorkflowId> {
    match &state.workflow_id {
        Some(current) if current != issued_for => Some(current.clone()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
