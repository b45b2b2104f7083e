//! Comment domain model shared by the store and the field widgets.
//!
//! # Responsibility
//! - Define the comment record owned by the store.
//! - Define identifiers linking comments to on-screen annotations.
//!
//! # Invariants
//! - Every comment is identified by a session-stable `CommentLocalId`.
//! - At most one live annotation exists per `CommentLocalId`.

pub mod comment;
