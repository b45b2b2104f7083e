//! Field-level comment widgets.
//!
//! # Responsibility
//! - Show the "add comment" affordance only while the field can take a new
//!   comment (comments enabled, none present).
//! - Create and own one annotation per comment on the field.
//! - Run the add-comment flow.
//!
//! # Invariants
//! - The content path is resolved once and never changes.
//! - Affordance visibility is edge-triggered: the element is only touched
//!   when the computed visibility differs from the applied one.
//! - A comment whose annotation slot is filled, or which this widget already
//!   annotates, never gets another annotation.

use crate::annotation::Annotation;
use crate::app::CommentApp;
use crate::content_path::resolve_content_path;
use crate::document::{Document, Element, ElementId, ElementRole};
use crate::model::comment::CommentLocalId;
use crate::store::selectors::{CommentList, CommentsForPath};
use crate::store::{StateStore, Subscription};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

/// Errors from widget construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// Field resolves to an empty content path.
    NotCommentable(ElementId),
}

impl Display for WidgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCommentable(id) => write!(f, "field {id} has no content path"),
        }
    }
}

impl Error for WidgetError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    Pending,
    Active,
    Unregistered,
}

struct WidgetInner {
    content_path: String,
    field: ElementId,
    add_button: ElementId,
    selector: CommentsForPath,
    registration: Registration,
    /// Last applied affordance visibility.
    shown: bool,
    last_comments: Option<CommentList>,
    last_enabled: bool,
    annotations: BTreeMap<CommentLocalId, Annotation>,
    subscription: Option<Subscription>,
    app: Rc<CommentApp>,
    document: Rc<RefCell<Document>>,
}

/// Controller for one commentable field. Clones share the same widget.
#[derive(Clone)]
pub struct FieldWidget {
    inner: Rc<RefCell<WidgetInner>>,
}

impl FieldWidget {
    /// Creates a widget for `field` at `content_path`.
    ///
    /// Mounts a hidden add-comment affordance inside the field. Fails when
    /// `content_path` is empty.
    pub fn new(
        app: Rc<CommentApp>,
        document: Rc<RefCell<Document>>,
        field: ElementId,
        content_path: impl Into<String>,
    ) -> Result<Self, WidgetError> {
        let content_path = content_path.into();
        if content_path.is_empty() {
            return Err(WidgetError::NotCommentable(field));
        }

        let add_button = document
            .borrow_mut()
            .append(field, Element::new(ElementRole::AddButton).hidden());
        let selector = (app.selectors().comments_for_path)(&content_path);
        Ok(Self {
            inner: Rc::new(RefCell::new(WidgetInner {
                content_path,
                field,
                add_button,
                selector,
                registration: Registration::Pending,
                shown: false,
                last_comments: None,
                last_enabled: false,
                annotations: BTreeMap::new(),
                subscription: None,
                app,
                document,
            })),
        })
    }

    /// Resolves `field`'s content path and creates a widget for it.
    pub fn for_field(
        app: Rc<CommentApp>,
        document: Rc<RefCell<Document>>,
        field: ElementId,
    ) -> Result<Self, WidgetError> {
        let content_path = resolve_content_path(&document.borrow().node(field));
        Self::new(app, document, field, content_path)
    }

    pub fn content_path(&self) -> String {
        self.inner.borrow().content_path.clone()
    }

    pub fn field(&self) -> ElementId {
        self.inner.borrow().field
    }

    pub fn add_button(&self) -> ElementId {
        self.inner.borrow().add_button
    }

    /// Whether the add-comment affordance is currently visible.
    pub fn is_shown(&self) -> bool {
        self.inner.borrow().shown
    }

    pub fn is_registered(&self) -> bool {
        self.inner.borrow().registration == Registration::Active
    }

    /// Annotation owned for comment `local_id`, if any.
    pub fn annotation_for(&self, local_id: CommentLocalId) -> Option<Annotation> {
        self.inner.borrow().annotations.get(&local_id).cloned()
    }

    /// Owned annotations in comment id order.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.inner.borrow().annotations.values().cloned().collect()
    }

    /// Applies initial state, annotates existing comments and starts
    /// listening for store changes. Only the first call has effect.
    pub fn register(&self) {
        let (app, comments) = {
            let mut inner = self.inner.borrow_mut();
            if inner.registration != Registration::Pending {
                warn!(
                    "event=widget_register module=widget status=skipped reason=already_registered content_path={}",
                    inner.content_path
                );
                return;
            }
            inner.registration = Registration::Active;

            let app = inner.app.clone();
            let state = app.state();
            let comments = inner.selector.select(&state);
            let enabled = (app.selectors().select_enabled)(&state);
            let shown = enabled && comments.is_empty();

            inner.document.borrow_mut().set_hidden(inner.add_button, !shown);
            inner.shown = shown;
            inner.last_comments = Some(comments.clone());
            inner.last_enabled = enabled;
            info!(
                "event=widget_registered module=widget status=ok content_path={} comments={} shown={shown}",
                inner.content_path,
                comments.len()
            );
            (app, comments)
        };

        self.annotate_new_comments(&comments);

        let weak = Rc::downgrade(&self.inner);
        let subscription = app.store().subscribe(Rc::new(move || {
            if let Some(inner) = Weak::upgrade(&weak) {
                FieldWidget { inner }.on_store_change();
            }
        }));
        self.inner.borrow_mut().subscription = Some(subscription);
    }

    /// Runs the add-comment flow and returns the new comment id.
    ///
    /// Returns `None` when the widget is not registered, or when called from
    /// inside a store notification round, where the new comment could not be
    /// bound before the queued add commits.
    pub fn on_add_clicked(&self) -> Option<CommentLocalId> {
        let (app, content_path) = {
            let inner = self.inner.borrow();
            if inner.registration != Registration::Active {
                warn!(
                    "event=comment_add module=widget status=skipped reason=not_registered content_path={}",
                    inner.content_path
                );
                return None;
            }
            if inner.app.store().is_dispatching() {
                warn!(
                    "event=comment_add module=widget status=skipped reason=dispatch_in_progress content_path={}",
                    inner.content_path
                );
                return None;
            }
            (inner.app.clone(), inner.content_path.clone())
        };

        let annotation = self.create_annotation();
        let local_id = app.make_comment(annotation.id(), &content_path);
        annotation.bind(local_id);
        self.inner
            .borrow_mut()
            .annotations
            .insert(local_id, annotation);
        Some(local_id)
    }

    /// Stops listening and destroys owned annotations. Idempotent.
    pub fn unregister(&self) {
        let (subscription, annotations) = {
            let mut inner = self.inner.borrow_mut();
            if inner.registration == Registration::Unregistered {
                return;
            }
            inner.registration = Registration::Unregistered;
            inner.document.borrow_mut().remove(inner.add_button);
            info!(
                "event=widget_unregistered module=widget status=ok content_path={}",
                inner.content_path
            );
            (
                inner.subscription.take(),
                std::mem::take(&mut inner.annotations),
            )
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        for annotation in annotations.values() {
            annotation.destroy();
        }
    }

    fn on_store_change(&self) {
        let comments = {
            let mut inner = self.inner.borrow_mut();
            if inner.registration != Registration::Active {
                return;
            }

            let app = inner.app.clone();
            let state = app.state();
            let comments = inner.selector.select(&state);
            let enabled = (app.selectors().select_enabled)(&state);

            let comments_changed = inner
                .last_comments
                .as_ref()
                .map_or(true, |last| !Rc::ptr_eq(last, &comments));
            if !comments_changed && enabled == inner.last_enabled {
                return;
            }
            inner.last_comments = Some(comments.clone());
            inner.last_enabled = enabled;

            let shown = enabled && comments.is_empty();
            if shown != inner.shown {
                inner.shown = shown;
                inner.document.borrow_mut().set_hidden(inner.add_button, !shown);
                debug!(
                    "event=affordance_toggled module=widget status=ok content_path={} shown={shown}",
                    inner.content_path
                );
            }

            if !comments_changed {
                return;
            }
            inner.annotations.retain(|_, annotation| !annotation.is_destroyed());
            comments
        };

        self.annotate_new_comments(&comments);
    }

    fn annotate_new_comments(&self, comments: &CommentList) {
        for comment in comments.iter() {
            if comment.is_annotated() {
                continue;
            }
            let (app, already_owned) = {
                let inner = self.inner.borrow();
                (
                    inner.app.clone(),
                    inner.annotations.contains_key(&comment.local_id),
                )
            };
            if already_owned {
                continue;
            }

            let annotation = self.create_annotation();
            annotation.bind(comment.local_id);
            let annotation_id = annotation.id();
            // Recorded before the store hears about it, so a notification
            // triggered by the update below cannot annotate the comment again.
            self.inner
                .borrow_mut()
                .annotations
                .insert(comment.local_id, annotation);
            app.update_annotation(annotation_id, comment.local_id);
        }
    }

    fn create_annotation(&self) -> Annotation {
        let inner = self.inner.borrow();
        Annotation::new(
            inner.app.clone(),
            inner.document.clone(),
            inner.field,
            inner.field,
        )
    }
}

impl std::fmt::Debug for FieldWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FieldWidget")
            .field("content_path", &inner.content_path)
            .field("field", &inner.field)
            .field("registration", &inner.registration)
            .field("shown", &inner.shown)
            .field("annotations", &inner.annotations.len())
            .finish()
    }
}
