//! Physical lines to logical statements.
//!
//! Lines are numbered with a [`Context`] first, then joined wherever a
//! line ends with the escape character. All stages are lazy iterators
//! over `Result` items so that read errors from the underlying source
//! surface in order.

use std::io::{self, BufRead};
use std::sync::Arc;

use log::debug;

use crate::context::Context;

/// Escape character used for line continuation unless configured otherwise.
pub const DEFAULT_ESCAPE: char = '\\';

/// A line (or joined statement) of text with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub context: Context,
}

impl Line {
    #[must_use]
    pub fn new(text: impl Into<String>, context: Context) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }
}

/// Reads physical lines from a buffered reader, terminators included.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct RawLines<R> {
    reader: R,
}

impl<R: BufRead> RawLines<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }

    pub const fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(buf)),
            Err(err) => Some(Err(err)),
        }
    }
}

/// Attaches consecutive line numbers to raw lines.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct ContextLines<I> {
    lines: I,
    file: String,
    parent: Option<Arc<Context>>,
    next_line: usize,
}

impl<I> ContextLines<I> {
    pub const fn get_mut(&mut self) -> &mut I {
        &mut self.lines
    }

    pub(crate) fn nest_in(&mut self, parent: Context) {
        self.parent = Some(Arc::new(parent));
    }

    pub(crate) const fn start_at(&mut self, line: usize) {
        self.next_line = line;
    }
}

impl<I, E> Iterator for ContextLines<I>
where
    I: Iterator<Item = Result<String, E>>,
{
    type Item = Result<Line, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.lines.next()?;
        Some(item.map(|text| {
            let context = Context {
                file: self.file.clone(),
                line: self.next_line,
                parent: self.parent.clone(),
            };
            self.next_line += 1;
            Line { text, context }
        }))
    }
}

/// Number `lines` as coming from `file`, starting at line `start_at`.
///
/// With `nest_in`, every produced context is nested in that context.
pub fn add_context<I, E>(
    file: &str,
    lines: I,
    nest_in: Option<Context>,
    start_at: usize,
) -> ContextLines<I::IntoIter>
where
    I: IntoIterator<Item = Result<String, E>>,
{
    ContextLines {
        lines: lines.into_iter(),
        file: file.to_string(),
        parent: nest_in.map(Arc::new),
        next_line: start_at,
    }
}

/// Joins lines ending with the escape character into single statements.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Statements<I> {
    lines: I,
    escape: char,
}

impl<I> Statements<I> {
    pub const fn get_mut(&mut self) -> &mut I {
        &mut self.lines
    }

    pub(crate) const fn set_escape(&mut self, escape: char) {
        self.escape = escape;
    }
}

/// Join physical lines into statements.
///
/// A line whose content (ignoring one trailing line terminator) ends with
/// `escape` continues on the next line: the escape is dropped and a `\n`
/// is kept in its place. Each statement carries the context of its first
/// line. A continuation still open at end of input is dropped.
pub fn statements<I, E>(lines: I, escape: char) -> Statements<I::IntoIter>
where
    I: IntoIterator<Item = Result<Line, E>>,
{
    Statements {
        lines: lines.into_iter(),
        escape,
    }
}

impl<I, E> Iterator for Statements<I>
where
    I: Iterator<Item = Result<Line, E>>,
{
    type Item = Result<Line, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = String::new();
        let mut first: Option<Context> = None;

        for item in self.lines.by_ref() {
            let line = match item {
                Ok(line) => line,
                Err(err) => return Some(Err(err)),
            };
            let (body, continued) = split_terminator(&line.text, self.escape);
            buffer.push_str(body);
            let context = first.take().unwrap_or(line.context);
            if !continued {
                return Some(Ok(Line {
                    text: buffer,
                    context,
                }));
            }
            buffer.push('\n');
            first = Some(context);
        }

        if let Some(context) = first {
            debug!("{context}: unterminated line continuation at end of input dropped");
        }
        None
    }
}

/// Strip one line terminator, then report whether the escape char ends
/// what remains (and strip it too).
fn split_terminator(text: &str, escape: char) -> (&str, bool) {
    let body = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .or_else(|| text.strip_suffix('\r'))
        .unwrap_or(text);
    body.strip_suffix(escape)
        .map_or((body, false), |joined| (joined, true))
}
