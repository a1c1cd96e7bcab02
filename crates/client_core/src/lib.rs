use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::WorkflowId,
    protocol::{
        CommentsResponse, CreateCommentRequest, CreateCommentResponse, DeleteCommentRequest,
        UpdateCommentRequest,
    },
};

pub mod binding;
pub mod config;
mod controller;
pub mod error;
pub mod session;
pub mod transport;
pub mod validator;

pub use controller::{CommentThreadController, ThreadEvent};

/// Remote comment service scoped by workflow.
#[async_trait]
pub trait CommentService: Send + Sync {
    async fn fetch_comments(&self, workflow_id: &WorkflowId) -> Result<CommentsResponse>;
    async fn create_comment(
        &self,
        workflow_id: &WorkflowId,
        request: CreateCommentRequest,
    ) -> Result<CreateCommentResponse>;
    async fn update_comment(
        &self,
        workflow_id: &WorkflowId,
        request: UpdateCommentRequest,
    ) -> Result<()>;
    async fn delete_comment(
        &self,
        workflow_id: &WorkflowId,
        request: DeleteCommentRequest,
    ) -> Result<()>;
}
