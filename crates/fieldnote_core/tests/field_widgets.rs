use fieldnote_core::{
    AnnotationPhase, CommentApp, CommentSeed, CommentingConfig, Document, Element, ElementId,
    FieldWidget, StateStore,
};
use std::cell::RefCell;
use std::rc::Rc;

struct Page {
    app: Rc<CommentApp>,
    document: Rc<RefCell<Document>>,
    heading: ElementId,
}

/// Builds `body > 0 > (wrapper) > heading` with optional seeded comments.
fn page(seeds: &[(u64, &str)], enabled: bool) -> Page {
    let config = CommentingConfig {
        comments_enabled: enabled,
        comments: seeds
            .iter()
            .map(|(local_id, content_path)| CommentSeed {
                local_id: *local_id,
                content_path: content_path.to_string(),
            })
            .collect(),
        ..CommentingConfig::default()
    };
    let app = Rc::new(CommentApp::from_config(&config));
    let mut document = Document::new();
    let root = document.root();
    let body = document.append(root, Element::plain().segment("body"));
    let block = document.append(body, Element::plain().segment("0").offset(120.0));
    let wrapper = document.append(block, Element::plain());
    let heading = document.append(wrapper, Element::field().segment("heading").offset(16.0));
    Page {
        app,
        document: Rc::new(RefCell::new(document)),
        heading,
    }
}

fn heading_widget(page: &Page) -> FieldWidget {
    let widget = FieldWidget::for_field(page.app.clone(), page.document.clone(), page.heading)
        .expect("heading should be commentable");
    widget.register();
    widget
}

fn add_button_hidden(page: &Page, widget: &FieldWidget) -> bool {
    page.document
        .borrow()
        .get(widget.add_button())
        .expect("add button element")
        .hidden
}

#[test]
fn add_flow_creates_one_comment_and_hides_affordance() {
    let page = page(&[], true);
    let widget = heading_widget(&page);
    assert_eq!(widget.content_path(), "body.0.heading");
    assert!(widget.is_shown());
    assert!(!add_button_hidden(&page, &widget));

    let local_id = widget.on_add_clicked().expect("registered widget adds");

    let state = page.app.state();
    assert_eq!(state.comments.len(), 1);
    let comment = &state.comments[&local_id];
    assert_eq!(comment.content_path, "body.0.heading");

    let annotations = widget.annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(comment.annotation, Some(annotations[0].id()));
    assert_eq!(
        annotations[0].phase(),
        AnnotationPhase::Bound {
            local_id,
            focused: true,
            shown: true
        }
    );
    assert!(!widget.is_shown());
    assert!(add_button_hidden(&page, &widget));
}

#[test]
fn existing_comments_are_annotated_at_registration() {
    let page = page(&[(3, "body.0.heading"), (4, "title"), (5, "body.0.heading")], true);
    let widget = heading_widget(&page);

    let ids: Vec<_> = widget
        .annotations()
        .iter()
        .filter_map(|annotation| annotation.local_id())
        .collect();
    assert_eq!(ids, vec![3, 5]);
    assert!(!widget.is_shown());

    let state = page.app.state();
    assert!(state.comments[&3].annotation.is_some());
    assert!(state.comments[&5].annotation.is_some());
    assert!(state.comments[&4].annotation.is_none());
}

#[test]
fn comments_added_elsewhere_get_exactly_one_annotation() {
    let page = page(&[], true);
    let widget = heading_widget(&page);

    // A comment created outside this widget (e.g. restored from history).
    page.app
        .store()
        .dispatch(fieldnote_core::CommentAction::AddComment(
            fieldnote_core::Comment::new(9, "body.0.heading"),
        ));
    page.app.set_enabled(true);
    page.app.set_current_tab(Some("content".to_string()));

    let annotations = widget.annotations();
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].local_id(), Some(9));
    assert_eq!(
        page.app.state().comments[&9].annotation,
        Some(annotations[0].id())
    );

    let markers = page.document.borrow().find_all(|element| {
        element.role == fieldnote_core::ElementRole::Marker
    });
    assert_eq!(markers.len(), 1);
}

#[test]
fn unchanged_visibility_does_not_mutate_affordance() {
    let page = page(&[(1, "title")], true);
    let widget = heading_widget(&page);
    assert!(widget.is_shown());

    let before = page.document.borrow().mutation_count();
    page.app.set_current_tab(Some("promote".to_string()));
    page.app.set_focused_comment(Some(1), true);
    page.app.delete_comment(1);
    assert_eq!(page.document.borrow().mutation_count(), before);

    page.app.set_enabled(false);
    assert_eq!(page.document.borrow().mutation_count(), before + 1);
    assert!(!widget.is_shown());
    assert!(add_button_hidden(&page, &widget));

    page.app.set_enabled(false);
    assert_eq!(page.document.borrow().mutation_count(), before + 1);
}

#[test]
fn disabled_comments_hide_affordance_until_enabled() {
    let page = page(&[], false);
    let widget = heading_widget(&page);
    assert!(!widget.is_shown());

    page.app.set_enabled(true);
    assert!(widget.is_shown());
    assert!(!add_button_hidden(&page, &widget));
}

#[test]
fn deleting_the_only_comment_shows_affordance_again() {
    let page = page(&[(2, "body.0.heading")], true);
    let widget = heading_widget(&page);
    assert!(!widget.is_shown());

    page.app.delete_comment(2);
    assert!(widget.is_shown());
    assert!(widget.annotations().is_empty());
}

#[test]
fn unregister_stops_tracking_and_destroys_markers() {
    let page = page(&[(2, "body.0.heading")], true);
    let widget = heading_widget(&page);
    let annotation = widget.annotation_for(2).expect("annotation for seeded comment");
    let listeners = page.app.store().listener_count();
    assert_eq!(listeners, 2);

    widget.unregister();
    widget.unregister();
    assert!(annotation.is_destroyed());
    assert!(!widget.is_registered());
    assert_eq!(page.app.store().listener_count(), 0);

    page.app.delete_comment(2);
    assert!(!widget.is_shown());
}

#[test]
fn add_flow_skips_ids_taken_by_directly_dispatched_comments() {
    let page = page(&[], true);
    let title = {
        let mut document = page.document.borrow_mut();
        let root = document.root();
        document.append(root, Element::field().segment("title"))
    };
    let title_widget = FieldWidget::for_field(page.app.clone(), page.document.clone(), title)
        .expect("title should be commentable");
    title_widget.register();
    let heading = heading_widget(&page);

    page.app
        .store()
        .dispatch(fieldnote_core::CommentAction::AddComment(
            fieldnote_core::Comment::new(1, "title"),
        ));
    assert_eq!(title_widget.annotations().len(), 1);

    let local_id = heading.on_add_clicked().expect("comment added");
    assert_eq!(local_id, 2);

    let state = page.app.state();
    assert_eq!(state.comments.len(), 2);
    assert_eq!(state.comments[&1].content_path, "title");
    assert_eq!(state.comments[&2].content_path, "body.0.heading");
    assert!(!heading.is_shown());

    let heading_ids: Vec<_> = heading
        .annotations()
        .iter()
        .map(|annotation| annotation.local_id())
        .collect();
    assert_eq!(heading_ids, vec![Some(2)]);
    let title_ids: Vec<_> = title_widget
        .annotations()
        .iter()
        .map(|annotation| annotation.local_id())
        .collect();
    assert_eq!(title_ids, vec![Some(1)]);
}

#[test]
fn add_requested_during_notification_round_is_refused() {
    let page = page(&[], true);
    let widget = heading_widget(&page);

    let outcome = Rc::new(RefCell::new(None));
    let listener_widget = widget.clone();
    let listener_outcome = outcome.clone();
    let _subscription = page.app.store().subscribe(Rc::new(move || {
        if listener_outcome.borrow().is_none() {
            let added = listener_widget.on_add_clicked();
            *listener_outcome.borrow_mut() = Some(added);
        }
    }));

    page.app.set_current_tab(Some("content".to_string()));
    assert_eq!(*outcome.borrow(), Some(None));
    assert!(page.app.state().comments.is_empty());
    assert!(widget.annotations().is_empty());
    assert!(widget.is_shown());

    assert_eq!(widget.on_add_clicked(), Some(1));
    assert_eq!(widget.annotations().len(), 1);
    assert!(!widget.annotations()[0].is_destroyed());
}
