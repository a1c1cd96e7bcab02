use shared::{domain::WorkflowId, error::ApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("no workflow is bound to the comment thread")]
    Unbound,
    #[error("no comment is pending deletion")]
    NoPendingDelete,
    #[error("{operation} response for workflow {issued_for} discarded; thread is now bound to {current}")]
    Superseded {
        operation: &'static str,
        issued_for: WorkflowId,
        current: WorkflowId,
    },
    #[error("{operation} failed for workflow {workflow_id}: {source:#}")]
    Remote {
        operation: &'static str,
        workflow_id: WorkflowId,
        source: anyhow::Error,
    },
}

impl CommentError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid comment service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build comment service http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("{operation} rejected with status {status}: {source}")]
    Api {
        operation: &'static str,
        status: u16,
        source: ApiError,
    },
    #[error("{operation} returned an unreadable body: {source}")]
    Decode {
        operation: &'static str,
        source: reqwest::Error,
    },
}

impl ServiceError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}
