//! Editor pane: a rope-backed text buffer plus the document controller that
//! binds it to a file, tracks unsaved changes and keeps highlight spans
//! current on every keystroke.

mod buffer;
mod document;
mod storage;

pub use buffer::{Cursor, Direction, TextBuffer};
pub use document::{
    DocumentError, DocumentState, EditorPane, SaveOutcome, TAB_SPACES, UNBOUND_NAME,
    normalize_source,
};
pub use storage::{FsStorage, Storage};
