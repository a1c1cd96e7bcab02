use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::WorkflowId,
    error::{ApiError, ErrorCode},
    protocol::{
        CommentsResponse, CreateCommentRequest, CreateCommentResponse, DeleteCommentRequest,
        UpdateCommentRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    config::ClientSettings, error::ServiceError, session::SessionProvider, CommentService,
};

/// [`CommentService`] over the comment service's JSON HTTP API.
pub struct HttpCommentService {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionProvider>,
}

impl HttpCommentService {
    pub fn new(
        settings: &ClientSettings,
        session: Arc<dyn SessionProvider>,
    ) -> std::result::Result<Self, ServiceError> {
        let base_url = Url::parse(&settings.base_url).map_err(|err| ServiceError::InvalidUrl {
            url: settings.base_url.clone(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidUrl {
                url: settings.base_url.clone(),
                reason: "expected an http(s) base url".into(),
            });
        }
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(ServiceError::Client)?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    fn endpoint(&self, workflow_id: &WorkflowId, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("workflow")
                .push(workflow_id.as_str())
                .extend(tail);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self
            .session
            .current_user()
            .and_then(|user| user.access_token)
        {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> std::result::Result<Response, ServiceError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let source = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            ApiError::new(ErrorCode::from_status(status.as_u16()), message)
        });
        Err(ServiceError::Api {
            operation,
            status: status.as_u16(),
            source,
        })
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> std::result::Result<T, ServiceError> {
        response
            .json()
            .await
            .map_err(|source| ServiceError::Decode { operation, source })
    }
}

#[async_trait]
impl CommentService for HttpCommentService {
    async fn fetch_comments(&self, workflow_id: &WorkflowId) -> Result<CommentsResponse> {
        let url = self.endpoint(workflow_id, &["comments"]);
        debug!(%workflow_id, %url, "comments: GET thread");
        let response = self.execute("fetch_comments", self.http.get(url)).await?;
        Ok(Self::decode("fetch_comments", response).await?)
    }

    async fn create_comment(
        &self,
        workflow_id: &WorkflowId,
        request: CreateCommentRequest,
    ) -> Result<CreateCommentResponse> {
        let url = self.endpoint(workflow_id, &["comment", "add"]);
        debug!(%workflow_id, %url, "comments: POST new comment");
        let response = self
            .execute("create_comment", self.http.post(url).json(&request))
            .await?;
        Ok(Self::decode("create_comment", response).await?)
    }

    async fn update_comment(
        &self,
        workflow_id: &WorkflowId,
        request: UpdateCommentRequest,
    ) -> Result<()> {
        let url = self.endpoint(workflow_id, &["comment"]);
        debug!(%workflow_id, comment_id = %request.comment_id, "comments: PUT edit");
        self.execute("update_comment", self.http.put(url).json(&request))
            .await?;
        Ok(())
    }

    async fn delete_comment(
        &self,
        workflow_id: &WorkflowId,
        request: DeleteCommentRequest,
    ) -> Result<()> {
        let url = self.endpoint(workflow_id, &["comment"]);
        debug!(%workflow_id, comment_id = %request.comment_id, "comments: DELETE comment");
        self.execute("delete_comment", self.http.delete(url).json(&request))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
