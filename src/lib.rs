#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    clippy::module_name_repetitions
)]

//! # Codepane
//!
//! An embeddable source-code editing surface.
//!
//! Codepane provides:
//! - Lexical highlighting that tiles the whole text with style spans
//! - A document controller tracking the bound file and unsaved changes
//! - Save / save-as / load against pluggable storage and host collaborators
//!
//! ## Modules
//!
//! - [`highlight`]: Pattern-based token classification
//! - [`editor`]: Text buffer and document lifecycle
//! - [`host`]: Collaborators provided by the hosting application
//! - [`config`]: Flag-file defaults

pub mod config;
pub mod editor;
pub mod highlight;
pub mod host;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{DocumentState, EditorPane, FsStorage, SaveOutcome, Storage};
    pub use crate::highlight::{StyleSpan, StyleSpans, TokenCategory, compute_spans};
    pub use crate::host::{EditorHost, TerminalHost};
}
