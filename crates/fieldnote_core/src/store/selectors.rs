//! Typed selectors over `CommentsState`.
//!
//! # Invariants
//! - `CommentsForPath::select` returns the same `Rc` as its previous call
//!   whenever the matching comments are pointer-identical to last time.

use super::comments::{CommentMap, CommentsState};
use crate::model::comment::{Comment, CommentLocalId};
use std::cell::RefCell;
use std::rc::Rc;

/// Ordered comments anchored to one content path.
pub type CommentList = Rc<[Rc<Comment>]>;

/// Selector record handed to widgets and annotations.
#[derive(Clone, Copy)]
pub struct Selectors {
    pub select_focused: fn(&CommentsState) -> Option<CommentLocalId>,
    pub select_enabled: fn(&CommentsState) -> bool,
    pub select_comment: fn(&CommentsState, CommentLocalId) -> Option<Rc<Comment>>,
    pub comments_for_path: fn(&str) -> CommentsForPath,
}

impl std::fmt::Debug for Selectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selectors").finish_non_exhaustive()
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            select_focused,
            select_enabled,
            select_comment,
            comments_for_path: CommentsForPath::new,
        }
    }
}

pub fn select_focused(state: &CommentsState) -> Option<CommentLocalId> {
    state.focused
}

pub fn select_enabled(state: &CommentsState) -> bool {
    state.enabled
}

pub fn select_comment(state: &CommentsState, local_id: CommentLocalId) -> Option<Rc<Comment>> {
    state.comments.get(&local_id).cloned()
}

#[derive(Debug)]
struct Memo {
    input: Rc<CommentMap>,
    output: CommentList,
}

/// Memoized "comments with this path" selector.
///
/// Each widget owns one instance, so memoization is per path.
#[derive(Debug)]
pub struct CommentsForPath {
    content_path: String,
    memo: RefCell<Option<Memo>>,
}

impl CommentsForPath {
    pub fn new(content_path: &str) -> Self {
        Self {
            content_path: content_path.to_string(),
            memo: RefCell::new(None),
        }
    }

    /// Returns comments on this path, reusing the previous list when unchanged.
    pub fn select(&self, state: &CommentsState) -> CommentList {
        let mut memo = self.memo.borrow_mut();
        if let Some(previous) = memo.as_ref() {
            if Rc::ptr_eq(&previous.input, &state.comments) {
                return previous.output.clone();
            }
        }

        let matching: Vec<Rc<Comment>> = state
            .comments
            .values()
            .filter(|comment| comment.is_on_path(&self.content_path))
            .cloned()
            .collect();

        let output = match memo.as_ref() {
            Some(previous) if same_elements(&previous.output, &matching) => {
                previous.output.clone()
            }
            _ => CommentList::from(matching),
        };

        *memo = Some(Memo {
            input: state.comments.clone(),
            output: output.clone(),
        });
        output
    }
}

fn same_elements(previous: &[Rc<Comment>], next: &[Rc<Comment>]) -> bool {
    previous.len() == next.len()
        && previous
            .iter()
            .zip(next)
            .all(|(left, right)| Rc::ptr_eq(left, right))
}
