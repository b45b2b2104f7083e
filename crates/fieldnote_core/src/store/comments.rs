//! Comment state, intents and reducer.
//!
//! # Invariants
//! - Sub-structures untouched by an action keep their `Rc` identity, so
//!   identity comparison downstream detects "nothing relevant changed".
//! - A comment's `annotation` slot is written only while empty.
//! - Deleting the focused or pinned comment clears that selection.

use super::Store;
use crate::model::comment::{AnnotationId, Comment, CommentLocalId};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Comments keyed by id; iteration order is creation order.
pub type CommentMap = BTreeMap<CommentLocalId, Rc<Comment>>;

/// Store type holding comment state.
pub type CommentStore = Store<CommentsState, CommentAction>;

/// Snapshot of the commenting state.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentsState {
    pub comments: Rc<CommentMap>,
    /// Comment currently highlighted in the comment list.
    pub focused: Option<CommentLocalId>,
    /// Comment the comment list keeps scrolled into view.
    pub pinned: Option<CommentLocalId>,
    /// Global "comments enabled" flag.
    pub enabled: bool,
    /// Tab the user is currently looking at.
    pub current_tab: Option<String>,
}

impl Default for CommentsState {
    fn default() -> Self {
        Self {
            comments: Rc::new(CommentMap::new()),
            focused: None,
            pinned: None,
            enabled: true,
            current_tab: None,
        }
    }
}

impl CommentsState {
    /// Builds a state seeded with `comments`.
    pub fn with_comments(comments: impl IntoIterator<Item = Comment>, enabled: bool) -> Self {
        let comments = comments
            .into_iter()
            .map(|comment| (comment.local_id, Rc::new(comment)))
            .collect();
        Self {
            comments: Rc::new(comments),
            enabled,
            ..Self::default()
        }
    }
}

/// Intents accepted by the comment store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    AddComment(Comment),
    UpdateAnnotation {
        local_id: CommentLocalId,
        annotation: AnnotationId,
    },
    DeleteComment(CommentLocalId),
    SetFocusedComment {
        local_id: Option<CommentLocalId>,
        update_pinned_comment: bool,
    },
    SetEnabled(bool),
    SetCurrentTab(Option<String>),
}

/// Creates a comment store with `initial` state.
pub fn comment_store(initial: CommentsState) -> CommentStore {
    Store::new(initial, reduce_comments)
}

/// Applies one intent to a snapshot.
pub fn reduce_comments(state: &CommentsState, action: CommentAction) -> CommentsState {
    let mut next = state.clone();
    match action {
        CommentAction::AddComment(comment) => {
            if state.comments.contains_key(&comment.local_id) {
                warn!(
                    "event=comment_add module=store status=rejected reason=duplicate_id local_id={}",
                    comment.local_id
                );
                return next;
            }
            Rc::make_mut(&mut next.comments).insert(comment.local_id, Rc::new(comment));
        }
        CommentAction::UpdateAnnotation {
            local_id,
            annotation,
        } => match state.comments.get(&local_id) {
            Some(existing) if existing.annotation.is_none() => {
                let mut updated = Comment::clone(existing);
                updated.annotation = Some(annotation);
                Rc::make_mut(&mut next.comments).insert(local_id, Rc::new(updated));
            }
            Some(_) => {
                debug!(
                    "event=annotation_update module=store status=skipped reason=already_bound local_id={local_id}"
                );
            }
            None => {
                debug!(
                    "event=annotation_update module=store status=skipped reason=missing local_id={local_id}"
                );
            }
        },
        CommentAction::DeleteComment(local_id) => {
            if !state.comments.contains_key(&local_id) {
                return next;
            }
            Rc::make_mut(&mut next.comments).remove(&local_id);
            if next.focused == Some(local_id) {
                next.focused = None;
            }
            if next.pinned == Some(local_id) {
                next.pinned = None;
            }
        }
        CommentAction::SetFocusedComment {
            local_id,
            update_pinned_comment,
        } => {
            if let Some(id) = local_id {
                if !state.comments.contains_key(&id) {
                    debug!(
                        "event=focus_change module=store status=skipped reason=missing local_id={id}"
                    );
                    return next;
                }
            }
            next.focused = local_id;
            if update_pinned_comment {
                next.pinned = local_id;
            }
        }
        CommentAction::SetEnabled(enabled) => next.enabled = enabled,
        CommentAction::SetCurrentTab(tab) => next.current_tab = tab,
    }
    next
}
