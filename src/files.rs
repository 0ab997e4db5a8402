//! Local files referenced from command parameters.
//!
//! A [`FileCommands`] registry maps a directive name to a regex whose
//! first capture group is the path inside the parameter string. The same
//! match is used both to read the path and to replace it, so a
//! substitution only ever touches the span that [`FileCommands::extract`]
//! reported.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Command, Node, UsedFile};

/// Directives of `virt-customize` that read a local file.
const STANDARD_PATTERNS: &[(&str, &str)] = &[
    ("upload", r"\A([^:]+):.+\z"),
    ("copy-in", r"\A([^:]+):.+\z"),
    ("firstboot", r"\A(.+)\z"),
    ("password", r"\A[^:]+:(?:locked:)?file:(.*)\z"),
    ("root-password", r"\A(?:locked:)?file:(.*)\z"),
    ("run", r"\A(.+)\z"),
];

static STANDARD: LazyLock<FileCommands> = LazyLock::new(|| {
    let mut commands = FileCommands::empty();
    for (name, pattern) in STANDARD_PATTERNS {
        commands
            .register(name, pattern)
            .expect("standard path patterns must compile");
    }
    commands
});

/// Error registering a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("invalid path pattern for '{name}': {message}")]
    Invalid { name: String, message: String },
    #[error("path pattern for '{name}' has no capture group")]
    NoCaptureGroup { name: String },
}

/// Registry of directives whose parameters contain a local path.
#[derive(Debug, Clone, Default)]
pub struct FileCommands {
    patterns: HashMap<String, Regex>,
}

impl FileCommands {
    /// A registry that knows no directives.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The `virt-customize` table: `upload`, `copy-in`, `firstboot`,
    /// `run`, `password` and `root-password`.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    /// Add or replace the pattern for `name`.
    ///
    /// The first capture group of `pattern` must match the path.
    pub fn register(&mut self, name: &str, pattern: &str) -> Result<(), PatternError> {
        let regex = Regex::new(pattern).map_err(|err| PatternError::Invalid {
            name: name.to_string(),
            message: err.to_string(),
        })?;
        if regex.captures_len() < 2 {
            return Err(PatternError::NoCaptureGroup {
                name: name.to_string(),
            });
        }
        self.patterns.insert(name.to_string(), regex);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    fn path_span(&self, command: &Command) -> Option<Range<usize>> {
        let pattern = self.patterns.get(&command.name)?;
        let params = command.params.as_deref()?;
        pattern.captures(params)?.get(1).map(|m| m.range())
    }

    /// The local file `command` refers to, if any.
    #[must_use]
    pub fn extract(&self, command: &Command) -> Option<UsedFile> {
        let span = self.path_span(command)?;
        let params = command.params.as_deref()?;
        Some(UsedFile {
            path: params[span].to_string(),
            context: command.context.clone(),
        })
    }

    /// A copy of `command` with its file path replaced by `path`.
    ///
    /// Returns `None` when the command does not refer to a file.
    #[must_use]
    pub fn substitute(&self, command: &Command, path: &str) -> Option<Command> {
        let span = self.path_span(command)?;
        let params = command.params.as_deref()?;
        Some(Command {
            name: command.name.clone(),
            params: Some(splice(params, span, path)),
            context: command.context.clone(),
        })
    }

    /// Files referred to by the commands in `nodes`, in order.
    pub fn used_files<'a, I>(&'a self, nodes: I) -> impl Iterator<Item = UsedFile>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        nodes
            .into_iter()
            .filter_map(Node::as_command)
            .filter_map(|command| self.extract(command))
    }

    /// Replace every referenced file with the path `file_map` returns for it.
    ///
    /// Nodes that do not refer to a file pass through unchanged.
    pub fn substitute_files<I, F>(&self, nodes: I, mut file_map: F) -> impl Iterator<Item = Node>
    where
        I: IntoIterator<Item = Node>,
        F: FnMut(&UsedFile) -> String,
    {
        nodes.into_iter().map(move |node| match node {
            Node::Command(command) => match self.extract(&command) {
                Some(used) => {
                    let path = file_map(&used);
                    Node::Command(self.substitute(&command, &path).unwrap_or(command))
                }
                None => Node::Command(command),
            },
            Node::Comment(_) => node,
        })
    }
}

fn splice(params: &str, span: Range<usize>, path: &str) -> String {
    let mut out = String::with_capacity(params.len() - span.len() + path.len());
    out.push_str(&params[..span.start]);
    out.push_str(path);
    out.push_str(&params[span.end..]);
    out
}

/// [`FileCommands::extract`] with the standard table.
#[must_use]
pub fn extract(command: &Command) -> Option<UsedFile> {
    FileCommands::standard().extract(command)
}

/// [`FileCommands::substitute`] with the standard table.
#[must_use]
pub fn substitute(command: &Command, path: &str) -> Option<Command> {
    FileCommands::standard().substitute(command, path)
}

/// [`FileCommands::used_files`] with the standard table.
pub fn used_files<'a, I>(nodes: I) -> impl Iterator<Item = UsedFile>
where
    I: IntoIterator<Item = &'a Node>,
{
    FileCommands::standard().used_files(nodes)
}

/// [`FileCommands::substitute_files`] with the standard table.
pub fn substitute_files<I, F>(nodes: I, file_map: F) -> impl Iterator<Item = Node>
where
    I: IntoIterator<Item = Node>,
    F: FnMut(&UsedFile) -> String,
{
    FileCommands::standard().substitute_files(nodes, file_map)
}
