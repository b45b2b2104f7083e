//! Page-ready wiring of field widgets and tab controls.
//!
//! # Responsibility
//! - Verify the page provides the elements commenting depends on.
//! - Register one widget per commentable field.
//! - Forward tab activation into the store.
//! - Unregister widgets whose fields were removed from the page.
//!
//! # Invariants
//! - Startup fails fast when the comments output element is missing.
//! - Fields resolving to an empty content path never get a widget.

use crate::app::CommentApp;
use crate::document::{Document, ElementId, ElementRole};
use crate::widget::FieldWidget;
use log::{debug, info};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Errors from commenting bootstrap and session control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentingError {
    /// Required page element is absent.
    MissingElement(&'static str),
    /// Element is not a tab control known to this session.
    UnknownTabControl(ElementId),
}

impl Display for CommentingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingElement(name) => write!(f, "required element is missing: {name}"),
            Self::UnknownTabControl(id) => write!(f, "element {id} is not a tab control"),
        }
    }
}

impl Error for CommentingError {}

/// Tab navigation control discovered at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabControl {
    pub element: ElementId,
    pub tab: String,
}

/// Live commenting state for one page.
pub struct CommentingSession {
    app: Rc<CommentApp>,
    document: Rc<RefCell<Document>>,
    comments_output: ElementId,
    widgets: Vec<FieldWidget>,
    tabs: Vec<TabControl>,
}

/// Attaches commenting to every eligible field and tab control.
///
/// # Errors
/// - `CommentingError::MissingElement` when the page has no comments output.
pub fn init_commenting(
    app: Rc<CommentApp>,
    document: Rc<RefCell<Document>>,
) -> Result<CommentingSession, CommentingError> {
    let (comments_output, fields, tabs) = {
        let doc = document.borrow();
        let comments_output = doc
            .find_role(&ElementRole::CommentsOutput)
            .ok_or(CommentingError::MissingElement("comments output"))?;
        let fields = doc.find_all(|element| element.role == ElementRole::Field);
        let tabs = doc
            .find_all(|element| matches!(element.role, ElementRole::TabControl { .. }))
            .into_iter()
            .filter_map(|element| match doc.get(element).map(|found| &found.role) {
                Some(ElementRole::TabControl { tab }) => Some(TabControl {
                    element,
                    tab: tab.clone(),
                }),
                _ => None,
            })
            .collect::<Vec<_>>();
        (comments_output, fields, tabs)
    };

    let mut widgets = Vec::with_capacity(fields.len());
    for field in fields {
        match FieldWidget::for_field(app.clone(), document.clone(), field) {
            Ok(widget) => {
                widget.register();
                widgets.push(widget);
            }
            Err(err) => {
                debug!("event=widget_skipped module=bootstrap status=skipped reason={err}");
            }
        }
    }

    info!(
        "event=commenting_init module=bootstrap status=ok widgets={} tabs={}",
        widgets.len(),
        tabs.len()
    );
    Ok(CommentingSession {
        app,
        document,
        comments_output,
        widgets,
        tabs,
    })
}

impl CommentingSession {
    pub fn app(&self) -> &Rc<CommentApp> {
        &self.app
    }

    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.document
    }

    /// Mount point for the comment list.
    pub fn comments_output(&self) -> ElementId {
        self.comments_output
    }

    pub fn widgets(&self) -> &[FieldWidget] {
        &self.widgets
    }

    pub fn tabs(&self) -> &[TabControl] {
        &self.tabs
    }

    /// Returns the registered widget for `content_path`.
    pub fn widget_for_path(&self, content_path: &str) -> Option<&FieldWidget> {
        self.widgets
            .iter()
            .find(|widget| widget.content_path() == content_path)
    }

    /// Forwards activation of tab control `element` into the store.
    pub fn activate_tab(&self, element: ElementId) -> Result<(), CommentingError> {
        let tab = self
            .tabs
            .iter()
            .find(|control| control.element == element)
            .ok_or(CommentingError::UnknownTabControl(element))?;
        self.app.set_current_tab(Some(tab.tab.clone()));
        Ok(())
    }

    /// Unregisters widgets whose field is no longer attached to the page.
    ///
    /// Returns the number of widgets removed.
    pub fn prune_detached(&mut self) -> usize {
        let document = self.document.clone();
        let before = self.widgets.len();
        self.widgets.retain(|widget| {
            let attached = document.borrow().is_attached(widget.field());
            if !attached {
                widget.unregister();
            }
            attached
        });
        let removed = before - self.widgets.len();
        if removed > 0 {
            info!("event=widgets_pruned module=bootstrap status=ok removed={removed}");
        }
        removed
    }
}
