//! Serializable document outlines used to build a `Document`.

use super::{Document, Element, ElementId, ElementRole};
use serde::{Deserialize, Serialize};

/// Element kinds an outline may declare.
///
/// Markers and add buttons are created by the commenting core and never
/// appear in outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineKind {
    #[default]
    Plain,
    Field,
    TabControl,
    CommentsOutput,
}

/// One node of a document outline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutlineNode {
    #[serde(default)]
    pub kind: OutlineKind,
    /// Tab selected by a `tab_control` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
    #[serde(default)]
    pub comments_disabled: bool,
    #[serde(default)]
    pub offset_top: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

/// Top-level outline: the children of the document root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub nodes: Vec<OutlineNode>,
}

impl DocumentOutline {
    /// Parses an outline from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds a fresh document from this outline.
    pub fn build(&self) -> Document {
        let mut document = Document::new();
        let root = document.root();
        for node in &self.nodes {
            append_node(&mut document, root, node);
        }
        document
    }
}

fn append_node(document: &mut Document, parent: ElementId, node: &OutlineNode) {
    let role = match node.kind {
        OutlineKind::Plain => ElementRole::Plain,
        OutlineKind::Field => ElementRole::Field,
        OutlineKind::TabControl => ElementRole::TabControl {
            tab: node.tab.clone().unwrap_or_default(),
        },
        OutlineKind::CommentsOutput => ElementRole::CommentsOutput,
    };
    let mut element = Element::new(role).offset(node.offset_top);
    element.content_path = node.content_path.clone();
    element.comments_disabled = node.comments_disabled;
    let id = document.append(parent, element);
    for child in &node.children {
        append_node(document, id, child);
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentOutline;
    use crate::content_path::resolve_content_path;
    use crate::document::ElementRole;

    #[test]
    fn outline_json_builds_addressable_document() {
        let outline = DocumentOutline::from_json(
            r#"{
                "nodes": [
                    {"kind": "comments_output"},
                    {"kind": "tab_control", "tab": "content"},
                    {"content_path": "body", "children": [
                        {"content_path": "0", "offset_top": 40.0, "children": [
                            {"kind": "field", "content_path": "heading", "offset_top": 8.0}
                        ]}
                    ]}
                ]
            }"#,
        )
        .expect("outline json should parse");

        let document = outline.build();
        let fields = document.find_all(|element| element.role == ElementRole::Field);
        assert_eq!(fields.len(), 1);
        assert_eq!(resolve_content_path(&document.node(fields[0])), "body.0.heading");
        assert_eq!(document.offset_top_in_document(fields[0]), 48.0);
        assert!(document
            .find_role(&ElementRole::TabControl {
                tab: "content".to_string()
            })
            .is_some());
    }
}
