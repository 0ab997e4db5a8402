use std::path::PathBuf;

use crate::context::Context;

/// Comment line. Empty lines are comments with empty text; otherwise
/// `text` is everything after the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub context: Context,
}

/// A directive: the name before the first space and the verbatim rest.
///
/// `params` is `None` when the statement has no space at all, and
/// `Some("")` when the name is followed by a single trailing space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub params: Option<String>,
    pub context: Context,
}

/// One element of a parsed command file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Comment(Comment),
    Command(Command),
}

/// Local file path referenced by a command's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedFile {
    pub path: String,
    pub context: Context,
}

impl Node {
    /// Where this node was read from.
    #[must_use]
    pub const fn context(&self) -> &Context {
        match self {
            Self::Comment(c) => &c.context,
            Self::Command(c) => &c.context,
        }
    }

    #[must_use]
    pub const fn as_command(&self) -> Option<&Command> {
        match self {
            Self::Command(c) => Some(c),
            Self::Comment(_) => None,
        }
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Self::Comment(comment)
    }
}

impl From<Command> for Node {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl UsedFile {
    /// Path of the file on the local machine, with relative paths taken
    /// from the directory of the command file that mentions it.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.context.resolve(&self.path)
    }
}
