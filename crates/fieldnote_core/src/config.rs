//! Commenting bootstrap configuration.
//!
//! # Responsibility
//! - Parse the payload the editing page hands to the commenting core:
//!   global enable flag, active tab, pre-existing comments, display strings.
//! - Reject payloads that would break store invariants before any widget
//!   is registered.
//!
//! # Invariants
//! - Seeded comment ids are unique.
//! - Seeded comments always carry a non-empty content path.

use crate::model::comment::{Comment, CommentLocalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_FOCUS_COMMENT: &str = "Focus comment";
const DEFAULT_UNFOCUS_COMMENT: &str = "Unfocus comment";

/// Localized labels used on annotation markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStrings {
    /// Label of an unfocused marker.
    #[serde(default = "default_focus_comment")]
    pub focus_comment: String,
    /// Label of a focused marker.
    #[serde(default = "default_unfocus_comment")]
    pub unfocus_comment: String,
}

impl Default for CommentStrings {
    fn default() -> Self {
        Self {
            focus_comment: default_focus_comment(),
            unfocus_comment: default_unfocus_comment(),
        }
    }
}

fn default_focus_comment() -> String {
    DEFAULT_FOCUS_COMMENT.to_string()
}

fn default_unfocus_comment() -> String {
    DEFAULT_UNFOCUS_COMMENT.to_string()
}

/// Comment that already exists when the page loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSeed {
    pub local_id: CommentLocalId,
    pub content_path: String,
}

impl From<&CommentSeed> for Comment {
    fn from(seed: &CommentSeed) -> Self {
        Comment::new(seed.local_id, seed.content_path.clone())
    }
}

/// Top-level commenting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentingConfig {
    #[serde(default = "default_comments_enabled")]
    pub comments_enabled: bool,
    #[serde(default)]
    pub current_tab: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentSeed>,
    #[serde(default)]
    pub strings: CommentStrings,
}

fn default_comments_enabled() -> bool {
    true
}

impl Default for CommentingConfig {
    fn default() -> Self {
        Self {
            comments_enabled: default_comments_enabled(),
            current_tab: None,
            comments: Vec::new(),
            strings: CommentStrings::default(),
        }
    }
}

/// Errors from configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Payload is not valid configuration JSON.
    Parse(serde_json::Error),
    /// Two seeded comments share one id.
    DuplicateCommentId(CommentLocalId),
    /// Seeded comment has a blank content path.
    EmptyContentPath(CommentLocalId),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid commenting config: {err}"),
            Self::DuplicateCommentId(id) => write!(f, "duplicate comment id in config: {id}"),
            Self::EmptyContentPath(id) => {
                write!(f, "comment {id} has an empty content path")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::DuplicateCommentId(_) | Self::EmptyContentPath(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl CommentingConfig {
    /// Parses and validates configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates configuration from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks seeded comments against store invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for seed in &self.comments {
            if seed.content_path.trim().is_empty() {
                return Err(ConfigError::EmptyContentPath(seed.local_id));
            }
            if !seen.insert(seed.local_id) {
                return Err(ConfigError::DuplicateCommentId(seed.local_id));
            }
        }
        Ok(())
    }
}
