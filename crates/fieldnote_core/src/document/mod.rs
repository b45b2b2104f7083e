//! In-memory document surface that field widgets and annotations render into.
//!
//! # Responsibility
//! - Hold the element tree of the editing page (fields, tab controls, markers).
//! - Apply the visual mutations requested by widgets and annotations.
//! - Expose the `AddressableNode` capability used for content path resolution.
//!
//! # Invariants
//! - `ElementId` values are arena indices and stay valid after removal;
//!   removed subtrees are only marked detached.
//! - Every visual mutation increments `mutation_count`, whether or not it
//!   changes the element.

mod outline;

pub use outline::{DocumentOutline, OutlineKind, OutlineNode};

use crate::content_path::AddressableNode;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Arena index of one document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Behavioral role of an element on the editing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElementRole {
    /// Structural element with no commenting behavior.
    #[default]
    Plain,
    /// Field that may receive a comment widget.
    Field,
    /// Tab navigation control; activating it selects `tab`.
    TabControl { tab: String },
    /// Mount point of the comment list; required at bootstrap.
    CommentsOutput,
    /// Annotation marker created by the commenting core.
    Marker,
    /// "Add comment" affordance created by the commenting core.
    AddButton,
}

/// One element in the document arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub role: ElementRole,
    /// Address segment contributed to descendant content paths.
    pub content_path: Option<String>,
    /// Marks this subtree as not commentable.
    pub comments_disabled: bool,
    pub hidden: bool,
    pub classes: BTreeSet<String>,
    /// Accessible label.
    pub label: Option<String>,
    /// Vertical offset relative to the parent element.
    pub offset_top: f64,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attached: bool,
}

impl Element {
    /// Creates a detached element with `role` and no address segment.
    pub fn new(role: ElementRole) -> Self {
        Self {
            role,
            content_path: None,
            comments_disabled: false,
            hidden: false,
            classes: BTreeSet::new(),
            label: None,
            offset_top: 0.0,
            parent: None,
            children: Vec::new(),
            attached: false,
        }
    }

    pub fn plain() -> Self {
        Self::new(ElementRole::Plain)
    }

    pub fn field() -> Self {
        Self::new(ElementRole::Field)
    }

    /// Sets the address segment this element contributes.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.content_path = Some(segment.into());
        self
    }

    /// Marks this element's subtree as not commentable.
    pub fn comments_disabled(mut self) -> Self {
        self.comments_disabled = true;
        self
    }

    pub fn offset(mut self, offset_top: f64) -> Self {
        self.offset_top = offset_top;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Element arena rooted at one attached root element.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
    mutations: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding only its root element.
    pub fn new() -> Self {
        let mut root = Element::plain();
        root.attached = true;
        Self {
            elements: vec![root],
            mutations: 0,
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Appends `element` as the last child of `parent`.
    ///
    /// The new element inherits the parent's attachment state.
    pub fn append(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = ElementId(self.elements.len());
        element.parent = Some(parent);
        element.children.clear();
        element.attached = self.get(parent).is_some_and(Element::is_attached);
        self.elements.push(element);
        if let Some(parent) = self.elements.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    /// Returns an addressable handle for `id`.
    pub fn node(&self, id: ElementId) -> NodeRef<'_> {
        NodeRef { document: self, id }
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(Element::is_attached)
    }

    /// Returns attached elements matching `predicate` in document order.
    pub fn find_all(&self, predicate: impl Fn(&Element) -> bool) -> Vec<ElementId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let Some(element) = self.get(id) else {
                continue;
            };
            if predicate(element) {
                found.push(id);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        found
    }

    /// Returns the first attached element with `role`.
    pub fn find_role(&self, role: &ElementRole) -> Option<ElementId> {
        self.find_all(|element| &element.role == role)
            .into_iter()
            .next()
    }

    pub fn set_hidden(&mut self, id: ElementId, hidden: bool) {
        self.mutations += 1;
        if let Some(element) = self.elements.get_mut(id.0) {
            element.hidden = hidden;
        }
    }

    pub fn set_class(&mut self, id: ElementId, class: &str, enabled: bool) {
        self.mutations += 1;
        if let Some(element) = self.elements.get_mut(id.0) {
            if enabled {
                element.classes.insert(class.to_string());
            } else {
                element.classes.remove(class);
            }
        }
    }

    pub fn set_label(&mut self, id: ElementId, label: impl Into<String>) {
        self.mutations += 1;
        if let Some(element) = self.elements.get_mut(id.0) {
            element.label = Some(label.into());
        }
    }

    /// Detaches `id` and its subtree from the document.
    ///
    /// Removing an already detached element is a no-op.
    pub fn remove(&mut self, id: ElementId) {
        if !self.is_attached(id) {
            return;
        }
        self.mutations += 1;
        if let Some(parent) = self.get(id).and_then(Element::parent) {
            if let Some(parent) = self.elements.get_mut(parent.0) {
                parent.children.retain(|child| *child != id);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(element) = self.elements.get_mut(current.0) {
                element.attached = false;
                stack.extend(element.children.iter().copied());
            }
        }
    }

    /// Returns the top edge of `id` relative to the document root.
    pub fn offset_top_in_document(&self, id: ElementId) -> f64 {
        let mut offset = 0.0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(element) = self.get(current) else {
                break;
            };
            offset += element.offset_top;
            cursor = element.parent;
        }
        offset
    }

    /// Updates the layout offset of `id`; not counted as a visual mutation.
    pub fn set_offset_top(&mut self, id: ElementId, offset_top: f64) {
        if let Some(element) = self.elements.get_mut(id.0) {
            element.offset_top = offset_top;
        }
    }

    /// Number of visual mutations applied since creation.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }
}

/// Borrowed handle to one element, used for content path resolution.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    id: ElementId,
}

impl AddressableNode for NodeRef<'_> {
    fn parent(&self) -> Option<Self> {
        self.document
            .get(self.id)
            .and_then(Element::parent)
            .map(|id| NodeRef {
                document: self.document,
                id,
            })
    }

    fn address_segment(&self) -> Option<&str> {
        self.document
            .get(self.id)
            .and_then(|element| element.content_path.as_deref())
    }

    fn disables_comments(&self) -> bool {
        self.document
            .get(self.id)
            .is_some_and(|element| element.comments_disabled)
    }
}
