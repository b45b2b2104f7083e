//! Field-level commenting core for structured document editors.
//! Binds an observable comment store to per-field widgets and per-comment
//! annotation markers.

pub mod annotation;
pub mod app;
pub mod bootstrap;
pub mod config;
pub mod content_path;
pub mod document;
pub mod logging;
pub mod model;
pub mod store;
pub mod widget;

pub use annotation::{Annotation, AnnotationPhase, MARKER_UNFOCUSED_CLASS};
pub use app::CommentApp;
pub use bootstrap::{init_commenting, CommentingError, CommentingSession, TabControl};
pub use config::{CommentSeed, CommentStrings, CommentingConfig, ConfigError};
pub use content_path::{resolve_content_path, AddressableNode};
pub use document::{Document, DocumentOutline, Element, ElementId, ElementRole};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::comment::{AnnotationId, Comment, CommentLocalId};
pub use store::comments::{comment_store, CommentAction, CommentStore, CommentsState};
pub use store::selectors::{CommentList, CommentsForPath, Selectors};
pub use store::{StateStore, Store, Subscription};
pub use widget::{FieldWidget, WidgetError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
