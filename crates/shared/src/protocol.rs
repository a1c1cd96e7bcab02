use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Comment, CommentId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentResponse {
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub comment_id: CommentId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl UpdateCommentRequest {
    /// Update for `comment` carrying new text, stamped with the current time.
    pub fn for_comment(comment: &Comment, text: impl Into<String>) -> Self {
        Self {
            comment_id: comment.id.clone(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    pub comment_id: CommentId,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_and_delete_bodies_use_camel_case_ids() {
        let timestamp = "2024-03-01T10:00:00Z".parse().expect("timestamp");
        let update = UpdateCommentRequest {
            comment_id: CommentId::from("c-3"),
            text: "edited text".into(),
            timestamp,
        };
        let delete = DeleteCommentRequest {
            comment_id: CommentId::from("c-3"),
            timestamp,
        };

        let update = serde_json::to_value(&update).expect("encode update");
        let delete = serde_json::to_value(&delete).expect("encode delete");
        assert_eq!(update["commentId"], "c-3");
        assert_eq!(delete["commentId"], "c-3");
        assert!(delete.get("text").is_none());
    }

    #[test]
    fn empty_comments_body_decodes_to_empty_list() {
        let response: CommentsResponse = serde_json::from_str("{}").expect("decode");
        assert!(response.comments.is_empty());
    }
}
