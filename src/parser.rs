use std::convert::Infallible;

use crate::ast::{Comment, Command, Node};
use crate::context::Context;
use crate::lexer::{self, ContextLines, Line, Statements};

/// Turn one statement into a comment or a command.
///
/// Empty statements and statements starting with `#` are comments.
/// Anything else is split at the first space into a command name and
/// its parameters, so `" # x"` is a command with an empty name.
#[must_use]
pub fn classify(statement: Line) -> Node {
    let Line { text, context } = statement;
    if text.is_empty() {
        return Node::Comment(Comment { text, context });
    }
    if let Some(rest) = text.strip_prefix('#') {
        return Node::Comment(Comment {
            text: rest.to_string(),
            context,
        });
    }
    let command = match text.split_once(' ') {
        Some((name, params)) => Command {
            name: name.to_string(),
            params: Some(params.to_string()),
            context,
        },
        None => Command {
            name: text,
            params: None,
            context,
        },
    };
    Node::Command(command)
}

/// Streaming parser from raw lines to nodes.
///
/// `I` yields physical lines (terminators optional) or errors from the
/// underlying reader; errors are passed through untouched.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Parser<I> {
    statements: Statements<ContextLines<I>>,
}

impl<I> Parser<I> {
    /// Parse lines read from `file`, numbering them from 1.
    pub fn new<E>(lines: I, file: &str) -> Self
    where
        I: Iterator<Item = Result<String, E>>,
    {
        Self {
            statements: lexer::statements(
                lexer::add_context(file, lines, None, 1),
                lexer::DEFAULT_ESCAPE,
            ),
        }
    }

    /// Nest every produced context in `parent`.
    #[must_use]
    pub fn nest_in(mut self, parent: Context) -> Self {
        self.statements.get_mut().nest_in(parent);
        self
    }

    /// Number the first line `line` instead of 1.
    #[must_use]
    pub fn start_at(mut self, line: usize) -> Self {
        self.statements.get_mut().start_at(line);
        self
    }

    /// Use `escape` for line continuation.
    #[must_use]
    pub fn escape(mut self, escape: char) -> Self {
        self.statements.set_escape(escape);
        self
    }

    /// The underlying line source.
    pub const fn source_mut(&mut self) -> &mut I {
        self.statements.get_mut().get_mut()
    }
}

impl<I, E> Iterator for Parser<I>
where
    I: Iterator<Item = Result<String, E>>,
{
    type Item = Result<Node, E>;

    fn next(&mut self) -> Option<Self::Item> {
        self.statements.next().map(|item| item.map(classify))
    }
}

/// Parse command file text, naming its contexts after `file`.
#[must_use]
pub fn parse(text: &str, file: &str) -> Vec<Node> {
    Parser::new(
        text.split_inclusive('\n')
            .map(|line| Ok::<_, Infallible>(line.to_string())),
        file,
    )
    .map(|item| match item {
        Ok(node) => node,
        Err(never) => match never {},
    })
    .collect()
}
