use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::buffer::{Cursor, Direction, TextBuffer};
use super::storage::Storage;
use crate::highlight::{Highlighter, StyleSpans};
use crate::host::EditorHost;

/// Spaces substituted for each tab when a file is loaded.
pub const TAB_SPACES: &str = "    ";

/// Name shown for a document that is not bound to a file.
pub const UNBOUND_NAME: &str = "New";

const SAVE_PROMPT: &str = "Save modified file?";
const SAVE_DETAIL: &str = "Save changes?";

/// Load and save failures. None of them leave the pane unusable.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} has no content", .path.display())]
    EmptySource { path: PathBuf },

    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persistence lifecycle of the pane's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// New document, never saved or loaded.
    Unbound,
    /// New document with edits.
    UnboundDirty,
    /// Bound to a file and matching it.
    BoundClean,
    /// Bound to a file with unsaved edits.
    BoundDirty,
}

/// What a save request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to this path, which is now the bound path.
    Saved(PathBuf),
    /// No destination was chosen for an unbound document.
    Declined,
    /// The user chose not to save pending changes.
    Discarded,
    /// Nothing to save.
    Unmodified,
}

/// Replace tabs with spaces and strip surrounding whitespace.
pub fn normalize_source(raw: &str) -> String {
    raw.replace('\t', TAB_SPACES).trim().to_string()
}

type SpanListener = Box<dyn FnMut(&StyleSpans)>;

/// An editable source document bound (or not yet bound) to a file.
///
/// Owns the text, the bound path and the modified flag. Every text change
/// marks the document modified and recomputes highlight spans over the
/// full text, which are handed to subscribed listeners.
pub struct EditorPane<S, H> {
    storage: S,
    host: H,
    highlighter: &'static Highlighter,
    buffer: TextBuffer,
    spans: StyleSpans,
    bound_path: Option<PathBuf>,
    modified: bool,
    sandbox_dir: PathBuf,
    listeners: Vec<SpanListener>,
}

impl<S: Storage, H: EditorHost> EditorPane<S, H> {
    /// Create an empty, unbound pane.
    pub fn new(storage: S, host: H) -> Self {
        let highlighter = Highlighter::shared();
        Self {
            storage,
            host,
            highlighter,
            buffer: TextBuffer::empty(),
            spans: highlighter.compute_spans(""),
            bound_path: None,
            modified: false,
            sandbox_dir: crate::config::default_sandbox_dir(),
            listeners: Vec::new(),
        }
    }

    /// Directory suggested when saving an unbound document.
    pub fn with_sandbox_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sandbox_dir = dir.into();
        self
    }

    /// Receive every freshly computed span set.
    pub fn subscribe(&mut self, listener: impl FnMut(&StyleSpans) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn bound_path(&self) -> Option<&Path> {
        self.bound_path.as_deref()
    }

    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    pub const fn state(&self) -> DocumentState {
        match (self.bound_path.is_some(), self.modified) {
            (false, false) => DocumentState::Unbound,
            (false, true) => DocumentState::UnboundDirty,
            (true, false) => DocumentState::BoundClean,
            (true, true) => DocumentState::BoundDirty,
        }
    }

    /// Spans for the current text.
    pub const fn spans(&self) -> &StyleSpans {
        &self.spans
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// The text as it would be saved.
    pub fn source(&self) -> String {
        self.buffer.text().trim().to_string()
    }

    pub const fn cursor(&self) -> Cursor {
        self.buffer.cursor()
    }

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// File name of the bound path, or [`UNBOUND_NAME`].
    pub fn display_name(&self) -> String {
        self.bound_path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(
                || UNBOUND_NAME.to_string(),
                |name| name.to_string_lossy().into_owned(),
            )
    }

    /// Bind to `path` and replace the content with its normalized text.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is empty; the pane is
    /// left exactly as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&StyleSpans, DocumentError> {
        let path = path.as_ref();
        let raw = self
            .storage
            .read_file(path)
            .map_err(|source| DocumentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if raw.is_empty() {
            return Err(DocumentError::EmptySource {
                path: path.to_path_buf(),
            });
        }

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            self.host.register_source_root(dir);
        }

        self.buffer.replace_all(&normalize_source(&raw));
        self.bound_path = Some(path.to_path_buf());
        self.set_modified(false);
        info!(path = %path.display(), "loaded source");
        self.refresh_spans();
        Ok(&self.spans)
    }

    /// The edit surface's full text changed.
    ///
    /// Always marks the document modified, even when `new_text` equals the
    /// current text.
    pub fn on_text_changed(&mut self, new_text: &str) -> &StyleSpans {
        self.buffer.replace_all(new_text);
        self.text_changed()
    }

    pub fn insert_char(&mut self, ch: char) -> &StyleSpans {
        self.buffer.insert_char(ch);
        self.text_changed()
    }

    pub fn insert_str(&mut self, s: &str) -> &StyleSpans {
        if self.buffer.insert_str(s) {
            self.text_changed();
        }
        &self.spans
    }

    pub fn split_line(&mut self) -> &StyleSpans {
        self.buffer.split_line();
        self.text_changed()
    }

    pub fn delete_back(&mut self) -> &StyleSpans {
        if self.buffer.delete_back() {
            self.text_changed();
        }
        &self.spans
    }

    pub fn delete_forward(&mut self) -> &StyleSpans {
        if self.buffer.delete_forward() {
            self.text_changed();
        }
        &self.spans
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.buffer.move_cursor(direction);
    }

    pub fn move_to(&mut self, line: usize, col: usize) {
        self.buffer.move_to(line, col);
    }

    pub fn move_home(&mut self) {
        self.buffer.move_home();
    }

    pub fn move_end(&mut self) {
        self.buffer.move_end();
    }

    /// Offer to save pending changes.
    ///
    /// # Errors
    /// Propagates a failed write from [`save`](Self::save).
    pub fn prompt_save(&mut self) -> Result<SaveOutcome, DocumentError> {
        if !self.modified {
            return Ok(SaveOutcome::Unmodified);
        }
        if self.host.ask_yes_no(SAVE_PROMPT, SAVE_DETAIL) {
            self.save()
        } else {
            Ok(SaveOutcome::Discarded)
        }
    }

    /// Write the trimmed text to the bound path, asking the host for a
    /// destination first if the document is unbound.
    ///
    /// # Errors
    /// Returns an error if the write fails. The document stays modified and
    /// a chosen save-as destination is not bound.
    pub fn save(&mut self) -> Result<SaveOutcome, DocumentError> {
        let target = match &self.bound_path {
            Some(path) => path.clone(),
            None => {
                if let Err(err) = self.storage.create_dir_all(&self.sandbox_dir) {
                    warn!(
                        dir = %self.sandbox_dir.display(),
                        error = %err,
                        "could not create sandbox dir"
                    );
                }
                match self.host.choose_save_destination(&self.sandbox_dir) {
                    Some(path) => path,
                    None => {
                        debug!("save-as declined");
                        return Ok(SaveOutcome::Declined);
                    }
                }
            }
        };

        if let Err(source) = self.storage.write_file(&target, &self.source()) {
            warn!(path = %target.display(), error = %source, "save failed");
            self.host
                .log(&format!("Could not save file {}: {source}", target.display()));
            return Err(DocumentError::Write {
                path: target,
                source,
            });
        }

        let canonical = self.storage.canonical_path(&target);
        info!(path = %canonical.display(), "saved source");
        self.host.log(&format!("Saved {}", canonical.display()));
        self.bound_path = Some(target.clone());
        self.set_modified(false);
        Ok(SaveOutcome::Saved(target))
    }

    fn text_changed(&mut self) -> &StyleSpans {
        self.set_modified(true);
        self.refresh_spans();
        &self.spans
    }

    fn refresh_spans(&mut self) {
        let text = self.buffer.text();
        self.spans = self.highlighter.compute_spans(&text);
        debug!(bytes = text.len(), spans = self.spans.len(), "recomputed spans");
        for listener in &mut self.listeners {
            listener(&self.spans);
        }
    }

    fn set_modified(&mut self, modified: bool) {
        if self.modified == modified {
            return;
        }
        self.modified = modified;
        let name = self.display_name();
        self.host.modified_changed(&name, modified);
    }
}

impl<S, H> std::fmt::Debug for EditorPane<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorPane")
            .field("bound_path", &self.bound_path)
            .field("modified", &self.modified)
            .field("buffer", &self.buffer)
            .field("spans", &self.spans.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::highlight::TokenCategory;

    #[derive(Debug, Default)]
    struct MemStorage {
        files: RefCell<HashMap<PathBuf, String>>,
        dirs: RefCell<Vec<PathBuf>>,
        read_only: bool,
    }

    impl MemStorage {
        fn with_file(path: &str, text: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .borrow_mut()
                .insert(PathBuf::from(path), text.to_string());
            storage
        }

        fn contents(&self, path: &str) -> Option<String> {
            self.files.borrow().get(Path::new(path)).cloned()
        }
    }

    impl Storage for MemStorage {
        fn read_file(&self, path: &Path) -> io::Result<String> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn write_file(&self, path: &Path, text: &str) -> io::Result<()> {
            if self.read_only {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), text.to_string());
            Ok(())
        }

        fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
            self.dirs.borrow_mut().push(dir.to_path_buf());
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedHost {
        answer_yes: bool,
        destination: Option<PathBuf>,
        questions: Vec<(String, String)>,
        offered_dirs: Vec<PathBuf>,
        roots: Vec<PathBuf>,
        logs: Vec<String>,
        modified_events: Vec<(String, bool)>,
    }

    impl EditorHost for ScriptedHost {
        fn ask_yes_no(&mut self, prompt: &str, detail: &str) -> bool {
            self.questions.push((prompt.to_string(), detail.to_string()));
            self.answer_yes
        }

        fn choose_save_destination(&mut self, default_dir: &Path) -> Option<PathBuf> {
            self.offered_dirs.push(default_dir.to_path_buf());
            self.destination.clone()
        }

        fn register_source_root(&mut self, dir: &Path) {
            self.roots.push(dir.to_path_buf());
        }

        fn log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }

        fn modified_changed(&mut self, name: &str, modified: bool) {
            self.modified_events.push((name.to_string(), modified));
        }
    }

    fn pane(storage: MemStorage, host: ScriptedHost) -> EditorPane<MemStorage, ScriptedHost> {
        EditorPane::new(storage, host).with_sandbox_dir("/sandbox")
    }

    #[test]
    fn test_new_pane_is_unbound_and_clean() {
        let p = pane(MemStorage::default(), ScriptedHost::default());
        assert_eq!(p.state(), DocumentState::Unbound);
        assert_eq!(p.display_name(), "New");
        assert_eq!(p.spans().as_slice().len(), 1);
        assert_eq!(p.spans().total_len(), 0);
    }

    #[test]
    fn test_load_normalizes_tabs_and_trims() {
        let storage = MemStorage::with_file("/src/A.java", "\n\tint x;\n\t\treturn;\n\n");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        assert_eq!(p.text(), "int x;\n        return;");
        assert_eq!(p.bound_path(), Some(Path::new("/src/A.java")));
        assert_eq!(p.state(), DocumentState::BoundClean);
        assert_eq!(p.display_name(), "A.java");
        assert_eq!(p.host().roots, vec![PathBuf::from("/src")]);
    }

    #[test]
    fn test_load_recomputes_spans_without_marking_modified() {
        let storage = MemStorage::with_file("/src/A.java", "int x;");
        let mut p = pane(storage, ScriptedHost::default());
        let keywords = p
            .load("/src/A.java")
            .unwrap()
            .categorized()
            .filter(|s| s.category == Some(TokenCategory::Keyword))
            .count();
        assert_eq!(keywords, 1);
        assert!(!p.is_modified());
    }

    #[test]
    fn test_load_missing_file_leaves_state_untouched() {
        let mut p = pane(MemStorage::default(), ScriptedHost::default());
        p.on_text_changed("draft");
        let err = p.load("/src/missing.java").unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
        assert_eq!(p.text(), "draft");
        assert_eq!(p.state(), DocumentState::UnboundDirty);
        assert!(p.host().roots.is_empty());
    }

    #[test]
    fn test_load_empty_file_fails() {
        let storage = MemStorage::with_file("/src/Empty.java", "");
        let mut p = pane(storage, ScriptedHost::default());
        let err = p.load("/src/Empty.java").unwrap_err();
        assert!(matches!(err, DocumentError::EmptySource { .. }));
        assert_eq!(p.bound_path(), None);
    }

    #[test]
    fn test_load_replaces_existing_content_and_clears_modified() {
        let storage = MemStorage::with_file("/src/B.java", "class B {}");
        let mut p = pane(storage, ScriptedHost::default());
        p.on_text_changed("scratch");
        p.load("/src/B.java").unwrap();
        assert_eq!(p.text(), "class B {}");
        assert_eq!(p.state(), DocumentState::BoundClean);
    }

    #[test]
    fn test_text_change_marks_modified_even_if_unchanged() {
        let storage = MemStorage::with_file("/src/A.java", "int x;");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        let same = p.text();
        p.on_text_changed(&same);
        assert!(p.is_modified());
        assert_eq!(p.state(), DocumentState::BoundDirty);
    }

    #[test]
    fn test_keystrokes_recompute_spans_and_notify_listeners() {
        let mut p = pane(MemStorage::default(), ScriptedHost::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        p.subscribe(move |spans| sink.borrow_mut().push(spans.categorized().count()));

        for ch in "int;".chars() {
            p.insert_char(ch);
        }
        assert_eq!(*seen.borrow(), vec![0, 0, 1, 2]);
        assert!(p.is_modified());
    }

    #[test]
    fn test_cursor_movement_does_not_mark_modified() {
        let storage = MemStorage::with_file("/src/A.java", "int x;\nint y;");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.move_cursor(Direction::Down);
        p.move_end();
        assert_eq!(p.cursor(), Cursor::at(1, 6));
        assert!(!p.is_modified());
    }

    #[test]
    fn test_noop_delete_does_not_mark_modified() {
        let storage = MemStorage::with_file("/src/A.java", "x");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.delete_back();
        assert!(!p.is_modified());
        p.move_end();
        p.delete_back();
        assert!(p.is_modified());
        assert_eq!(p.text(), "");
    }

    #[test]
    fn test_modified_notifications_fire_on_transitions_only() {
        let storage = MemStorage::with_file("/src/A.java", "x");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.insert_char('a');
        p.insert_char('b');
        p.save().unwrap();
        assert_eq!(
            p.host().modified_events,
            vec![("A.java".to_string(), true), ("A.java".to_string(), false)]
        );
    }

    #[test]
    fn test_save_bound_writes_trimmed_text() {
        let storage = MemStorage::with_file("/src/A.java", "int x;");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.on_text_changed("  int y;\n\n");
        let outcome = p.save().unwrap();
        assert_eq!(outcome, SaveOutcome::Saved(PathBuf::from("/src/A.java")));
        assert_eq!(p.storage.contents("/src/A.java").as_deref(), Some("int y;"));
        assert_eq!(p.state(), DocumentState::BoundClean);
        assert_eq!(p.host().logs, vec!["Saved /src/A.java".to_string()]);
    }

    #[test]
    fn test_save_unbound_declined_is_noop() {
        let mut p = pane(MemStorage::default(), ScriptedHost::default());
        p.on_text_changed("int x;");
        assert_eq!(p.save().unwrap(), SaveOutcome::Declined);
        assert_eq!(p.bound_path(), None);
        assert!(p.is_modified());
        assert_eq!(p.host().offered_dirs, vec![PathBuf::from("/sandbox")]);
        assert_eq!(*p.storage.dirs.borrow(), vec![PathBuf::from("/sandbox")]);
        assert!(p.host().logs.is_empty());
    }

    #[test]
    fn test_save_as_binds_chosen_path() {
        let host = ScriptedHost {
            destination: Some(PathBuf::from("/sandbox/Test.java")),
            ..ScriptedHost::default()
        };
        let mut p = pane(MemStorage::default(), host);
        p.on_text_changed("class Test {}");
        p.save().unwrap();
        assert_eq!(p.bound_path(), Some(Path::new("/sandbox/Test.java")));
        assert_eq!(p.display_name(), "Test.java");
        assert_eq!(p.state(), DocumentState::BoundClean);
        assert_eq!(
            p.storage.contents("/sandbox/Test.java").as_deref(),
            Some("class Test {}")
        );
    }

    #[test]
    fn test_failed_save_as_does_not_bind() {
        let storage = MemStorage {
            read_only: true,
            ..MemStorage::default()
        };
        let host = ScriptedHost {
            destination: Some(PathBuf::from("/sandbox/Test.java")),
            ..ScriptedHost::default()
        };
        let mut p = pane(storage, host);
        p.on_text_changed("class Test {}");
        let err = p.save().unwrap_err();
        assert!(matches!(err, DocumentError::Write { .. }));
        assert_eq!(p.bound_path(), None);
        assert_eq!(p.state(), DocumentState::UnboundDirty);
        assert_eq!(p.host().logs.len(), 1);
        assert!(p.host().logs[0].starts_with("Could not save file"));
    }

    #[test]
    fn test_failed_save_keeps_bound_document_dirty() {
        let mut storage = MemStorage::with_file("/src/A.java", "int x;");
        storage.read_only = true;
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.insert_char('x');
        assert!(p.save().is_err());
        assert_eq!(p.state(), DocumentState::BoundDirty);
        assert_eq!(p.storage.contents("/src/A.java").as_deref(), Some("int x;"));
    }

    #[test]
    fn test_prompt_save_unmodified_does_not_ask() {
        let mut p = pane(MemStorage::default(), ScriptedHost::default());
        assert_eq!(p.prompt_save().unwrap(), SaveOutcome::Unmodified);
        assert!(p.host().questions.is_empty());
    }

    #[test]
    fn test_prompt_save_no_discards() {
        let storage = MemStorage::with_file("/src/A.java", "int x;");
        let mut p = pane(storage, ScriptedHost::default());
        p.load("/src/A.java").unwrap();
        p.insert_char('x');
        assert_eq!(p.prompt_save().unwrap(), SaveOutcome::Discarded);
        assert_eq!(
            p.host().questions,
            vec![("Save modified file?".to_string(), "Save changes?".to_string())]
        );
        assert!(p.is_modified());
    }

    #[test]
    fn test_prompt_save_yes_saves() {
        let storage = MemStorage::with_file("/src/A.java", "int x;");
        let host = ScriptedHost {
            answer_yes: true,
            ..ScriptedHost::default()
        };
        let mut p = pane(storage, host);
        p.load("/src/A.java").unwrap();
        p.move_end();
        p.insert_str(" int y;");
        let outcome = p.prompt_save().unwrap();
        assert_eq!(outcome, SaveOutcome::Saved(PathBuf::from("/src/A.java")));
        assert_eq!(
            p.storage.contents("/src/A.java").as_deref(),
            Some("int x; int y;")
        );
    }

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source("\t\tx\t\n"), "x");
        assert_eq!(normalize_source("a\tb"), "a    b");
        assert_eq!(normalize_source("{\n\tint x;\n}"), "{\n    int x;\n}");
        assert_eq!(normalize_source("  "), "");
    }
}
