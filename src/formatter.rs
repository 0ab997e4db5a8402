//! Serializes nodes back into command file text or tool arguments.

use std::fmt;

use crate::ast::{Comment, Command, Node};

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            None => f.write_str(&self.name),
            Some(params) => write!(f, "{} {}", self.name, params.replace('\n', "\\\n")),
        }
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            Ok(())
        } else {
            write!(f, "#{}", self.text)
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(c) => c.fmt(f),
            Self::Command(c) => c.fmt(f),
        }
    }
}

/// Canonical text of a single node, without a line terminator.
///
/// Newlines inside parameters become `\` continuations, so the text
/// parses back into the same node.
#[must_use]
pub fn to_text(node: &Node) -> String {
    node.to_string()
}

/// Command file text for `nodes`, one terminated line per node.
#[must_use]
pub fn format(nodes: &[Node]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for node in nodes {
        let _ = writeln!(out, "{node}");
    }
    out
}

/// Command line arguments for the customization tool.
///
/// Each command becomes `--name` followed by its parameters, if any.
/// Comments are skipped.
#[must_use]
pub fn to_arguments<'a, I>(nodes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Node>,
{
    let mut args = Vec::new();
    for command in nodes.into_iter().filter_map(Node::as_command) {
        args.push(format!("--{}", command.name));
        if let Some(params) = &command.params {
            args.push(params.clone());
        }
    }
    args
}

/// Shell command line running `program` with `args`, each quoted.
///
/// Fails if an argument contains a NUL byte.
pub fn command_line(program: &str, args: &[String]) -> Result<String, shlex::QuoteError> {
    shlex::try_join(std::iter::once(program).chain(args.iter().map(String::as_str)))
}
