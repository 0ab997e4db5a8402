//! Expansion of file and shell inclusion directives.
//!
//! [`resolve_includes`] returns a lazy iterator. It keeps a stack of
//! frames, one per active inclusion. Each frame owns the set of real
//! files that are being included along its path, so a loop is detected
//! on the path that actually leads back to a file, and sibling
//! inclusions of the same file stay legal.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::ast::{Command, Node};
use crate::context::Context;
use crate::host::{Host, Process};
use crate::lexer::{DEFAULT_ESCAPE, RawLines};
use crate::parser::Parser;

/// Classifies a resolve error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// Included text is not valid UTF-8.
    Syntax { message: String },
    /// Inclusion directive without a parameter.
    MissingArgument { command: String },
    /// Included file cannot be opened.
    MissingFile { path: PathBuf, reason: String },
    /// Included file is already being included further up.
    InclusionLoop { path: PathBuf },
    /// Shell could not be started or waited for.
    ShellSpawn { reason: String },
    /// Shell command exited with a non-zero code (`None`: killed by signal).
    ShellFailed { code: Option<i32> },
    /// Reading included text failed.
    Read { reason: String },
}

impl fmt::Display for ResolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { message } => write!(f, "invalid input: {message}"),
            Self::MissingArgument { command } => {
                write!(f, "'{command}' requires an argument")
            }
            Self::MissingFile { path, reason } => {
                write!(f, "cannot include '{}': {reason}", path.display())
            }
            Self::InclusionLoop { path } => {
                write!(f, "file inclusion loop: '{}'", path.display())
            }
            Self::ShellSpawn { reason } => {
                write!(f, "cannot run shell command: {reason}")
            }
            Self::ShellFailed { code: Some(code) } => {
                write!(f, "shell command exited with code {code}")
            }
            Self::ShellFailed { code: None } => {
                write!(f, "shell command was killed by a signal")
            }
            Self::Read { reason } => write!(f, "read error: {reason}"),
        }
    }
}

/// Error produced while resolving inclusions.
///
/// `context` is the inclusion directive whose expansion failed, which is
/// the line the user wrote even when the failure happens deeper down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} in {context}")]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub context: Context,
}

impl ResolveError {
    fn new(kind: ResolveErrorKind, context: &Context) -> Self {
        Self {
            kind,
            context: context.clone(),
        }
    }

    fn read(err: &io::Error, context: &Context) -> Self {
        let kind = if err.kind() == io::ErrorKind::InvalidData {
            ResolveErrorKind::Syntax {
                message: err.to_string(),
            }
        } else {
            ResolveErrorKind::Read {
                reason: err.to_string(),
            }
        };
        Self::new(kind, context)
    }
}

/// Which directives to expand and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Directives whose parameter names a file to splice in.
    pub file_commands: BTreeSet<String>,
    /// Directives whose parameter is a shell command; its output is
    /// spliced in.
    pub shell_commands: BTreeSet<String>,
    /// Shell used to run shell directives.
    pub shell: String,
    /// Prefix of the `FILE` and `LINE` variables exported to shells.
    pub env_prefix: String,
    /// Line continuation character of included sources.
    pub escape: char,
    /// Directory for relative file inclusions printed by shell commands,
    /// instead of the directory of the file that ran them.
    pub include_dir: Option<PathBuf>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            file_commands: BTreeSet::from(["commands-from-file".to_string()]),
            shell_commands: BTreeSet::from(["commands-from-shell".to_string()]),
            shell: "/bin/sh".to_string(),
            env_prefix: "VIRT_COMMAND_".to_string(),
            escape: DEFAULT_ESCAPE,
            include_dir: None,
        }
    }
}

type NodeStream<'h> = Box<dyn Iterator<Item = Result<Node, ResolveError>> + 'h>;

/// One level of inclusion.
struct Frame<'h> {
    nodes: NodeStream<'h>,
    /// Real files being included on the path to this frame.
    includes: BTreeSet<PathBuf>,
    include_dir: Option<PathBuf>,
}

impl<'h> Frame<'h> {
    fn include_file(
        &self,
        host: &dyn Host,
        options: &ResolveOptions,
        command: &Command,
    ) -> Result<Self, ResolveError> {
        let context = &command.context;
        let target = command
            .params
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing_argument(command))?;
        let path = match &self.include_dir {
            Some(dir) if context.is_nested() && Path::new(target).is_relative() => {
                dir.join(target)
            }
            _ => context.resolve(target),
        };

        let mut includes = self.includes.clone();
        includes.insert(PathBuf::from(&context.origin().file));
        trace!("{context}: active includes {includes:?}");
        if includes.contains(&path) {
            return Err(ResolveError::new(
                ResolveErrorKind::InclusionLoop { path },
                context,
            ));
        }

        let reader = host.open(&path).map_err(|err| {
            ResolveError::new(
                ResolveErrorKind::MissingFile {
                    path: path.clone(),
                    reason: err.to_string(),
                },
                context,
            )
        })?;
        debug!("{context}: including {}", path.display());

        let origin = context.clone();
        let nodes = Parser::new(RawLines::new(reader), &path.to_string_lossy())
            .escape(options.escape)
            .map(move |item| item.map_err(|err| ResolveError::read(&err, &origin)));
        Ok(Self {
            nodes: Box::new(nodes),
            includes,
            include_dir: None,
        })
    }

    fn include_shell(
        &self,
        host: &dyn Host,
        options: &ResolveOptions,
        command: &Command,
    ) -> Result<Self, ResolveError> {
        let context = &command.context;
        let script = command
            .params
            .as_deref()
            .ok_or_else(|| missing_argument(command))?;
        let env = [
            (format!("{}FILE", options.env_prefix), context.file.clone()),
            (format!("{}LINE", options.env_prefix), context.line.to_string()),
        ];
        let process = host
            .spawn(&options.shell, script, &env)
            .map_err(|err| {
                ResolveError::new(
                    ResolveErrorKind::ShellSpawn {
                        reason: err.to_string(),
                    },
                    context,
                )
            })?;
        debug!("{context}: running shell command with {}", options.shell);

        let mut includes = self.includes.clone();
        includes.insert(PathBuf::from(&context.origin().file));
        Ok(Self {
            nodes: Box::new(ShellOutput::new(process, context.clone(), options.escape)),
            includes,
            include_dir: self.include_dir.clone(),
        })
    }
}

fn missing_argument(command: &Command) -> ResolveError {
    ResolveError::new(
        ResolveErrorKind::MissingArgument {
            command: command.name.clone(),
        },
        &command.context,
    )
}

/// Nodes parsed from a shell command's output, followed by its exit check.
struct ShellOutput {
    nodes: Parser<RawLines<Box<dyn Process>>>,
    context: Context,
    finished: bool,
}

impl ShellOutput {
    fn new(process: Box<dyn Process>, context: Context, escape: char) -> Self {
        let nodes = Parser::new(RawLines::new(process), &context.script_name())
            .nest_in(context.clone())
            .escape(escape);
        Self {
            nodes,
            context,
            finished: false,
        }
    }

    fn check_exit(&mut self) -> Result<(), ResolveError> {
        let status = self.nodes.source_mut().get_mut().wait().map_err(|err| {
            ResolveError::new(
                ResolveErrorKind::ShellSpawn {
                    reason: err.to_string(),
                },
                &self.context,
            )
        })?;
        debug!("{}: shell command finished with {status:?}", self.context);
        match status {
            Some(0) => Ok(()),
            code => Err(ResolveError::new(
                ResolveErrorKind::ShellFailed { code },
                &self.context,
            )),
        }
    }
}

impl Iterator for ShellOutput {
    type Item = Result<Node, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.nodes.next() {
            Some(Ok(node)) => Some(Ok(node)),
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(ResolveError::read(&err, &self.context)))
            }
            None => {
                self.finished = true;
                self.check_exit().err().map(Err)
            }
        }
    }
}

/// Iterator over nodes with all inclusions expanded.
///
/// Stops after the first error.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Includes<'h> {
    host: &'h dyn Host,
    options: ResolveOptions,
    stack: Vec<Frame<'h>>,
}

/// Expand inclusion directives in `nodes`, recursively.
///
/// File inclusions are resolved relative to the directory of the nearest
/// real file of the directive's context. Shell commands get the
/// directive's file and line in `<prefix>FILE` and `<prefix>LINE`, and
/// their output is parsed as `script<FILE (LINE)>` nested in that context.
/// A non-zero shell exit is reported after all of its output was
/// yielded.
pub fn resolve_includes<'h, I>(nodes: I, host: &'h dyn Host, options: &ResolveOptions) -> Includes<'h>
where
    I: IntoIterator<Item = Node>,
    I::IntoIter: 'h,
{
    let root = Frame {
        nodes: Box::new(nodes.into_iter().map(Ok)),
        includes: BTreeSet::new(),
        include_dir: options.include_dir.clone(),
    };
    Includes {
        host,
        options: options.clone(),
        stack: vec![root],
    }
}

impl Includes<'_> {
    fn abort(&mut self, err: ResolveError) -> ResolveError {
        debug!("aborting inclusion at {}: {}", err.context, err.kind);
        self.stack.clear();
        err
    }
}

impl Iterator for Includes<'_> {
    type Item = Result<Node, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = match frame.nodes.next() {
                Some(Ok(node)) => node,
                Some(Err(err)) => return Some(Err(self.abort(err))),
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            let command = match node {
                Node::Command(command) => command,
                comment @ Node::Comment(_) => return Some(Ok(comment)),
            };
            let child = if self.options.file_commands.contains(&command.name) {
                frame.include_file(self.host, &self.options, &command)
            } else if self.options.shell_commands.contains(&command.name) {
                frame.include_shell(self.host, &self.options, &command)
            } else {
                return Some(Ok(Node::Command(command)));
            };
            match child {
                Ok(child) => self.stack.push(child),
                Err(err) => return Some(Err(self.abort(err))),
            }
        }
    }
}
