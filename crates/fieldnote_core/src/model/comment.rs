//! Comment domain model.
//!
//! # Responsibility
//! - Define the canonical comment record held by the store.
//! - Provide the annotation handle type recorded on each comment.
//!
//! # Invariants
//! - `local_id` is stable and never reused within one session.
//! - `content_path` is immutable after creation.
//! - `annotation` is written at most once, by the commenting core.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Session-stable comment identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CommentLocalId = u64;

/// Handle naming one on-screen annotation instance.
///
/// The store records this handle instead of owning the annotation itself, so
/// annotation lifetimes stay with the widgets that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    /// Creates a fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AnnotationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comment record anchored to one document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Stable id within the editing session.
    pub local_id: CommentLocalId,
    /// Dotted address of the field this comment is attached to.
    pub content_path: String,
    /// Annotation currently representing this comment on screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationId>,
}

impl Comment {
    /// Creates a comment with no annotation attached yet.
    pub fn new(local_id: CommentLocalId, content_path: impl Into<String>) -> Self {
        Self {
            local_id,
            content_path: content_path.into(),
            annotation: None,
        }
    }

    /// Creates a comment that is already represented by `annotation`.
    ///
    /// Used by the add-comment flow, where the marker exists before the
    /// comment does.
    pub fn with_annotation(
        local_id: CommentLocalId,
        content_path: impl Into<String>,
        annotation: AnnotationId,
    ) -> Self {
        Self {
            local_id,
            content_path: content_path.into(),
            annotation: Some(annotation),
        }
    }

    /// Returns whether an annotation has already been bound to this comment.
    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }

    /// Returns whether this comment belongs to the field at `content_path`.
    pub fn is_on_path(&self, content_path: &str) -> bool {
        self.content_path == content_path
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotationId, Comment};

    #[test]
    fn new_comment_has_no_annotation() {
        let comment = Comment::new(3, "body.0.heading");
        assert!(!comment.is_annotated());
        assert!(comment.is_on_path("body.0.heading"));
        assert!(!comment.is_on_path("body.0"));
    }

    #[test]
    fn annotation_ids_are_unique() {
        assert_ne!(AnnotationId::new(), AnnotationId::new());
    }

    #[test]
    fn comment_deserializes_without_annotation_field() {
        let comment: Comment =
            serde_json::from_str(r#"{"local_id": 7, "content_path": "title"}"#)
                .expect("comment json should parse");
        assert_eq!(comment, Comment::new(7, "title"));
    }
}
