//! Collaborators supplied by the application hosting an editor pane.
//!
//! The pane never shows dialogs or owns a project tree itself; it asks the
//! host through [`EditorHost`]. [`TerminalHost`] is a line-oriented
//! implementation used by the CLI.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Host-side services an [`EditorPane`](crate::editor::EditorPane) relies on.
pub trait EditorHost {
    /// Ask a yes/no question; `true` means yes.
    fn ask_yes_no(&mut self, prompt: &str, detail: &str) -> bool;

    /// Pick a destination for an unbound document. `None` means the user
    /// declined.
    fn choose_save_destination(&mut self, default_dir: &Path) -> Option<PathBuf>;

    /// A loaded file's directory should be known as a source root.
    fn register_source_root(&mut self, dir: &Path);

    /// User-facing status line.
    fn log(&mut self, message: &str);

    /// The pane's modified flag changed.
    fn modified_changed(&mut self, _name: &str, _modified: bool) {}
}

/// [`EditorHost`] that talks to the user over a reader/writer pair.
#[derive(Debug)]
pub struct TerminalHost<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
    source_roots: Vec<PathBuf>,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume_yes: false,
            source_roots: Vec::new(),
        }
    }

    /// Answer every confirmation with yes without reading input.
    pub const fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> EditorHost for TerminalHost<R, W> {
    fn ask_yes_no(&mut self, prompt: &str, detail: &str) -> bool {
        let _ = write!(self.output, "{prompt} {detail} [y/N] ");
        if self.assume_yes {
            let _ = writeln!(self.output, "y");
            return true;
        }
        self.read_answer()
            .is_some_and(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn choose_save_destination(&mut self, default_dir: &Path) -> Option<PathBuf> {
        let _ = write!(
            self.output,
            "Save file as (relative to {}, empty to cancel): ",
            default_dir.display()
        );
        let answer = self.read_answer().filter(|answer| !answer.is_empty())?;
        let path = PathBuf::from(answer);
        if path.is_absolute() {
            Some(path)
        } else {
            Some(default_dir.join(path))
        }
    }

    fn register_source_root(&mut self, dir: &Path) {
        if !self.source_roots.iter().any(|root| root == dir) {
            tracing::debug!(dir = %dir.display(), "registered source root");
            self.source_roots.push(dir.to_path_buf());
        }
    }

    fn log(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn modified_changed(&mut self, name: &str, modified: bool) {
        tracing::debug!(name, modified, "modified state changed");
    }
}
