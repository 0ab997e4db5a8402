use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name used for text that does not come from a named file.
pub const STDIN: &str = "<stdin>";

/// Source location of a statement: a file name and a 1-based line number.
///
/// A context with a `parent` is *nested*: its `file` names a synthetic
/// source, such as the output of a shell script, that was produced while
/// processing the line the parent points at. Following the parent chain
/// always ends at a context that names a real file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub file: String,
    pub line: usize,
    pub parent: Option<Arc<Self>>,
}

impl Context {
    /// Location inside a real file.
    #[must_use]
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            parent: None,
        }
    }

    /// Location inside a synthetic source produced from `parent`.
    #[must_use]
    pub fn nested(file: impl Into<String>, line: usize, parent: Self) -> Self {
        Self {
            file: file.into(),
            line,
            parent: Some(Arc::new(parent)),
        }
    }

    #[must_use]
    pub const fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    /// The nearest context in the parent chain that points at a real file.
    #[must_use]
    pub fn origin(&self) -> &Self {
        let mut ctx = self;
        while let Some(parent) = ctx.parent() {
            ctx = parent;
        }
        ctx
    }

    /// Directory containing the nearest real file.
    #[must_use]
    pub fn directory(&self) -> &Path {
        Path::new(&self.origin().file)
            .parent()
            .unwrap_or_else(|| Path::new(""))
    }

    /// Resolve a path written at this location.
    ///
    /// Absolute paths are returned as-is. Relative paths are taken
    /// relative to the directory of the nearest real file, so a path
    /// printed by a shell script resolves against the file that ran it.
    #[must_use]
    pub fn resolve(&self, given: &str) -> PathBuf {
        let given = Path::new(given);
        if given.is_absolute() {
            given.to_path_buf()
        } else {
            self.directory().join(given)
        }
    }

    /// Name given to the output of a shell command run from here,
    /// e.g. `script<main.cmd (4)>`.
    #[must_use]
    pub fn script_name(&self) -> String {
        format!("script<{self}>")
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(STDIN, 1)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file, self.line)
    }
}
