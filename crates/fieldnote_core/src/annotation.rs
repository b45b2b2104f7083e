//! Per-comment annotation markers.
//!
//! # Responsibility
//! - Keep one marker element in sync with one comment's focus and the global
//!   enabled flag.
//! - Tear the marker down when its comment leaves the store.
//! - Report where the marker should be placed.
//!
//! # Invariants
//! - Lifecycle is `Unbound -> Bound -> Destroyed`; `Destroyed` is terminal.
//! - Visual state is applied at bind time, before any notification arrives.
//! - The store listener is removed exactly once, on destruction.

use crate::app::CommentApp;
use crate::document::{Document, Element, ElementId, ElementRole};
use crate::model::comment::{AnnotationId, CommentLocalId};
use crate::store::{StateStore, Subscription};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Class carried by markers whose comment is not focused.
pub const MARKER_UNFOCUSED_CLASS: &str = "comment-marker--unfocused";

/// Lifecycle phase of one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationPhase {
    Unbound,
    Bound {
        local_id: CommentLocalId,
        focused: bool,
        shown: bool,
    },
    Destroyed,
}

struct AnnotationInner {
    id: AnnotationId,
    field: ElementId,
    marker: ElementId,
    phase: AnnotationPhase,
    subscription: Option<Subscription>,
    app: Rc<CommentApp>,
    document: Rc<RefCell<Document>>,
}

/// Handle to one annotation marker. Clones share the same annotation.
#[derive(Clone)]
pub struct Annotation {
    inner: Rc<RefCell<AnnotationInner>>,
}

impl Annotation {
    /// Creates an unbound annotation for `field`, mounting a hidden marker
    /// under `container`.
    pub fn new(
        app: Rc<CommentApp>,
        document: Rc<RefCell<Document>>,
        field: ElementId,
        container: ElementId,
    ) -> Self {
        let marker = document
            .borrow_mut()
            .append(container, Element::new(ElementRole::Marker).hidden());
        Self {
            inner: Rc::new(RefCell::new(AnnotationInner {
                id: AnnotationId::new(),
                field,
                marker,
                phase: AnnotationPhase::Unbound,
                subscription: None,
                app,
                document,
            })),
        }
    }

    pub fn id(&self) -> AnnotationId {
        self.inner.borrow().id
    }

    pub fn phase(&self) -> AnnotationPhase {
        self.inner.borrow().phase
    }

    pub fn marker(&self) -> ElementId {
        self.inner.borrow().marker
    }

    /// Returns the bound comment id, if bound.
    pub fn local_id(&self) -> Option<CommentLocalId> {
        match self.phase() {
            AnnotationPhase::Bound { local_id, .. } => Some(local_id),
            AnnotationPhase::Unbound | AnnotationPhase::Destroyed => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase() == AnnotationPhase::Destroyed
    }

    /// Starts tracking comment `local_id`.
    ///
    /// Applies the current focus and visibility immediately, then listens for
    /// store changes. Binding twice or after destruction is ignored.
    pub fn bind(&self, local_id: CommentLocalId) {
        let app = {
            let inner = self.inner.borrow();
            if inner.phase != AnnotationPhase::Unbound {
                warn!(
                    "event=annotation_bind module=annotation status=skipped reason=not_unbound annotation={} local_id={local_id}",
                    inner.id
                );
                return;
            }
            inner.app.clone()
        };

        let state = app.state();
        let selectors = app.selectors();
        if (selectors.select_comment)(&state, local_id).is_none() {
            debug!(
                "event=annotation_bind module=annotation status=skipped reason=missing_comment local_id={local_id}"
            );
            self.destroy();
            return;
        }
        let focused = (selectors.select_focused)(&state) == Some(local_id);
        let shown = (selectors.select_enabled)(&state);

        {
            let mut inner = self.inner.borrow_mut();
            {
                let mut document = inner.document.borrow_mut();
                document.set_hidden(inner.marker, !shown);
                apply_focus(&mut document, inner.marker, focused, &app);
            }
            inner.phase = AnnotationPhase::Bound {
                local_id,
                focused,
                shown,
            };
        }

        let weak = Rc::downgrade(&self.inner);
        let subscription = app.store().subscribe(Rc::new(move || {
            if let Some(inner) = Weak::upgrade(&weak) {
                Annotation { inner }.on_store_change();
            }
        }));
        self.inner.borrow_mut().subscription = Some(subscription);
        debug!(
            "event=annotation_bound module=annotation status=ok local_id={local_id} focused={focused} shown={shown}"
        );
    }

    /// Requests focus for the bound comment, updating the pinned comment too.
    pub fn on_click(&self) {
        let (app, local_id) = {
            let inner = self.inner.borrow();
            match inner.phase {
                AnnotationPhase::Bound { local_id, .. } => (inner.app.clone(), local_id),
                AnnotationPhase::Unbound | AnnotationPhase::Destroyed => return,
            }
        };
        app.set_focused_comment(Some(local_id), true);
    }

    /// Field element the marker is attached to.
    pub fn anchor_node(&self) -> ElementId {
        self.inner.borrow().field
    }

    /// Top edge of the anchored field relative to the document.
    ///
    /// Recomputed on every call since layout can shift between calls.
    pub fn desired_position(&self) -> f64 {
        let inner = self.inner.borrow();
        let document = inner.document.borrow();
        document.offset_top_in_document(inner.field)
    }

    /// Removes the marker and stops listening. Idempotent.
    pub fn destroy(&self) {
        let subscription = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase == AnnotationPhase::Destroyed {
                return;
            }
            let local_id = match inner.phase {
                AnnotationPhase::Bound { local_id, .. } => Some(local_id),
                AnnotationPhase::Unbound | AnnotationPhase::Destroyed => None,
            };
            inner.phase = AnnotationPhase::Destroyed;
            inner.document.borrow_mut().remove(inner.marker);
            info!(
                "event=annotation_destroyed module=annotation status=ok annotation={} local_id={local_id:?}",
                inner.id
            );
            inner.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }

    fn on_store_change(&self) {
        let (app, local_id, was_focused, was_shown) = {
            let inner = self.inner.borrow();
            match inner.phase {
                AnnotationPhase::Bound {
                    local_id,
                    focused,
                    shown,
                } => (inner.app.clone(), local_id, focused, shown),
                AnnotationPhase::Unbound | AnnotationPhase::Destroyed => return,
            }
        };

        let state = app.state();
        let selectors = app.selectors();
        if (selectors.select_comment)(&state, local_id).is_none() {
            debug!("event=comment_removed module=annotation status=ok local_id={local_id}");
            self.destroy();
            return;
        }

        let focused = (selectors.select_focused)(&state) == Some(local_id);
        let shown = (selectors.select_enabled)(&state);
        if focused == was_focused && shown == was_shown {
            return;
        }

        let mut inner = self.inner.borrow_mut();
        {
            let mut document = inner.document.borrow_mut();
            if focused != was_focused {
                apply_focus(&mut document, inner.marker, focused, &app);
            }
            if shown != was_shown {
                document.set_hidden(inner.marker, !shown);
            }
        }
        inner.phase = AnnotationPhase::Bound {
            local_id,
            focused,
            shown,
        };
    }
}

impl std::fmt::Debug for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Annotation")
            .field("id", &inner.id)
            .field("marker", &inner.marker)
            .field("phase", &inner.phase)
            .finish()
    }
}

fn apply_focus(document: &mut Document, marker: ElementId, focused: bool, app: &CommentApp) {
    let strings = app.strings();
    document.set_class(marker, MARKER_UNFOCUSED_CLASS, !focused);
    // A focused marker offers to unfocus, and vice versa.
    let label = if focused {
        strings.unfocus_comment.as_str()
    } else {
        strings.focus_comment.as_str()
    };
    document.set_label(marker, label);
}

#[cfg(test)]
mod tests {
    use super::{Annotation, AnnotationPhase, MARKER_UNFOCUSED_CLASS};
    use crate::app::CommentApp;
    use crate::config::{CommentSeed, CommentingConfig};
    use crate::document::{Document, Element};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup(seed_ids: &[u64]) -> (Rc<CommentApp>, Rc<RefCell<Document>>, Annotation) {
        let config = CommentingConfig {
            comments: seed_ids
                .iter()
                .map(|local_id| CommentSeed {
                    local_id: *local_id,
                    content_path: "title".to_string(),
                })
                .collect(),
            ..CommentingConfig::default()
        };
        let app = Rc::new(CommentApp::from_config(&config));
        let document = Rc::new(RefCell::new(Document::new()));
        let field = {
            let mut doc = document.borrow_mut();
            let root = doc.root();
            doc.append(root, Element::field().segment("title").offset(30.0))
        };
        let annotation = Annotation::new(app.clone(), document.clone(), field, field);
        (app, document, annotation)
    }

    #[test]
    fn unbound_marker_starts_hidden() {
        let (_app, document, annotation) = setup(&[1]);
        assert_eq!(annotation.phase(), AnnotationPhase::Unbound);
        let doc = document.borrow();
        let marker = doc.get(annotation.marker()).expect("marker element");
        assert!(marker.hidden);
    }

    #[test]
    fn bind_to_focused_comment_applies_focus_immediately() {
        let (app, document, annotation) = setup(&[1]);
        app.set_focused_comment(Some(1), false);

        annotation.bind(1);
        assert_eq!(
            annotation.phase(),
            AnnotationPhase::Bound {
                local_id: 1,
                focused: true,
                shown: true
            }
        );
        let doc = document.borrow();
        let marker = doc.get(annotation.marker()).expect("marker element");
        assert!(!marker.hidden);
        assert!(!marker.has_class(MARKER_UNFOCUSED_CLASS));
        assert_eq!(marker.label.as_deref(), Some("Unfocus comment"));
    }

    #[test]
    fn focus_and_visibility_follow_store() {
        let (app, document, annotation) = setup(&[1, 2]);
        annotation.bind(1);

        app.set_focused_comment(Some(1), false);
        assert!(matches!(
            annotation.phase(),
            AnnotationPhase::Bound { focused: true, .. }
        ));

        app.set_focused_comment(Some(2), false);
        {
            let doc = document.borrow();
            let marker = doc.get(annotation.marker()).expect("marker element");
            assert!(marker.has_class(MARKER_UNFOCUSED_CLASS));
            assert_eq!(marker.label.as_deref(), Some("Focus comment"));
        }

        app.set_enabled(false);
        assert!(document
            .borrow()
            .get(annotation.marker())
            .expect("marker element")
            .hidden);
    }

    #[test]
    fn click_dispatches_focus_with_pin() {
        let (app, _document, annotation) = setup(&[1]);
        annotation.bind(1);
        annotation.on_click();
        let state = app.state();
        assert_eq!(state.focused, Some(1));
        assert_eq!(state.pinned, Some(1));
    }

    #[test]
    fn unchanged_notifications_do_not_touch_marker() {
        let (app, document, annotation) = setup(&[1]);
        annotation.bind(1);
        let before = document.borrow().mutation_count();
        app.set_current_tab(Some("settings".to_string()));
        assert_eq!(document.borrow().mutation_count(), before);
    }

    #[test]
    fn position_tracks_layout_changes() {
        let (_app, document, annotation) = setup(&[1]);
        assert_eq!(annotation.desired_position(), 30.0);
        let field = annotation.anchor_node();
        document.borrow_mut().set_offset_top(field, 75.0);
        assert_eq!(annotation.desired_position(), 75.0);
    }

    #[test]
    fn binding_to_missing_comment_destroys() {
        let (app, _document, annotation) = setup(&[]);
        annotation.bind(5);
        assert!(annotation.is_destroyed());
        assert_eq!(app.store().listener_count(), 0);
    }
}
