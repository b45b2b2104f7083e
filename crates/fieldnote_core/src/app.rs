//! Comment application handle injected into widgets and annotations.
//!
//! # Responsibility
//! - Own the comment store, the selector record and the display strings.
//! - Translate widget-level requests into store intents.
//!
//! # Invariants
//! - Local ids handed out by `make_comment` never collide with committed ids.
//! - The app never writes store state directly; everything goes through
//!   `StateStore::dispatch`.

use crate::config::{CommentStrings, CommentingConfig};
use crate::model::comment::{AnnotationId, Comment, CommentLocalId};
use crate::store::comments::{comment_store, CommentAction, CommentStore, CommentsState};
use crate::store::selectors::Selectors;
use crate::store::StateStore;
use log::info;
use std::cell::Cell;
use std::rc::Rc;

/// Shared commenting application object.
pub struct CommentApp {
    store: CommentStore,
    selectors: Selectors,
    strings: CommentStrings,
    next_local_id: Cell<CommentLocalId>,
}

impl CommentApp {
    /// Creates an app over an existing store.
    pub fn new(store: CommentStore, selectors: Selectors, strings: CommentStrings) -> Self {
        let next_local_id = store
            .get_state()
            .comments
            .keys()
            .next_back()
            .map_or(1, |last| last + 1);
        Self {
            store,
            selectors,
            strings,
            next_local_id: Cell::new(next_local_id),
        }
    }

    /// Creates an app whose store is seeded from `config`.
    pub fn from_config(config: &CommentingConfig) -> Self {
        let mut state = CommentsState::with_comments(
            config.comments.iter().map(Comment::from),
            config.comments_enabled,
        );
        state.current_tab = config.current_tab.clone();
        info!(
            "event=comment_app_init module=app status=ok comments={} enabled={}",
            config.comments.len(),
            config.comments_enabled
        );
        Self::new(
            comment_store(state),
            Selectors::default(),
            config.strings.clone(),
        )
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub fn strings(&self) -> &CommentStrings {
        &self.strings
    }

    /// Returns the current store snapshot.
    pub fn state(&self) -> Rc<CommentsState> {
        self.store.get_state()
    }

    /// Creates a comment at `content_path` already bound to `annotation`.
    ///
    /// The new comment becomes the focused and pinned comment.
    pub fn make_comment(&self, annotation: AnnotationId, content_path: &str) -> CommentLocalId {
        let local_id = self.allocate_local_id();

        self.store.dispatch(CommentAction::AddComment(Comment::with_annotation(
            local_id,
            content_path,
            annotation,
        )));
        self.set_focused_comment(Some(local_id), true);
        info!(
            "event=comment_created module=app status=ok local_id={local_id} content_path={content_path}"
        );
        local_id
    }

    /// Next id above both the issued counter and every committed comment,
    /// including comments added by dispatching `AddComment` directly.
    fn allocate_local_id(&self) -> CommentLocalId {
        let after_committed = self
            .store
            .get_state()
            .comments
            .keys()
            .next_back()
            .map_or(1, |last| last + 1);
        let local_id = self.next_local_id.get().max(after_committed);
        self.next_local_id.set(local_id + 1);
        local_id
    }

    /// Records that `annotation` now represents comment `local_id`.
    pub fn update_annotation(&self, annotation: AnnotationId, local_id: CommentLocalId) {
        self.store.dispatch(CommentAction::UpdateAnnotation {
            local_id,
            annotation,
        });
    }

    pub fn set_focused_comment(&self, local_id: Option<CommentLocalId>, update_pinned_comment: bool) {
        self.store.dispatch(CommentAction::SetFocusedComment {
            local_id,
            update_pinned_comment,
        });
    }

    /// Turns commenting on or off globally.
    pub fn set_enabled(&self, enabled: bool) {
        self.store.dispatch(CommentAction::SetEnabled(enabled));
    }

    pub fn delete_comment(&self, local_id: CommentLocalId) {
        self.store.dispatch(CommentAction::DeleteComment(local_id));
    }

    /// Forwards the active tab into the store.
    pub fn set_current_tab(&self, tab: Option<String>) {
        self.store.dispatch(CommentAction::SetCurrentTab(tab));
    }
}

#[cfg(test)]
mod tests {
    use super::CommentApp;
    use crate::config::{CommentSeed, CommentingConfig};
    use crate::model::comment::{AnnotationId, Comment};
    use crate::store::comments::CommentAction;
    use crate::store::StateStore;

    fn config_with_seed(local_id: u64) -> CommentingConfig {
        CommentingConfig {
            comments: vec![CommentSeed {
                local_id,
                content_path: "title".to_string(),
            }],
            current_tab: Some("content".to_string()),
            ..CommentingConfig::default()
        }
    }

    #[test]
    fn make_comment_allocates_after_seeded_ids_and_focuses() {
        let app = CommentApp::from_config(&config_with_seed(41));
        let annotation = AnnotationId::new();

        let local_id = app.make_comment(annotation, "body.0.heading");
        assert_eq!(local_id, 42);

        let state = app.state();
        assert_eq!(state.comments[&42].annotation, Some(annotation));
        assert_eq!(state.focused, Some(42));
        assert_eq!(state.pinned, Some(42));
        assert_eq!(state.current_tab.as_deref(), Some("content"));
    }

    #[test]
    fn update_annotation_records_binding() {
        let app = CommentApp::from_config(&config_with_seed(1));
        let annotation = AnnotationId::new();
        app.update_annotation(annotation, 1);
        assert_eq!(app.state().comments[&1].annotation, Some(annotation));
    }

    #[test]
    fn make_comment_skips_ids_committed_by_direct_dispatch() {
        let app = CommentApp::from_config(&config_with_seed(1));
        app.store()
            .dispatch(CommentAction::AddComment(Comment::new(2, "title")));

        let local_id = app.make_comment(AnnotationId::new(), "body");
        assert_eq!(local_id, 3);
        assert_eq!(app.state().comments.len(), 3);
    }
}
