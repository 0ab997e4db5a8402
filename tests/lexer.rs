//! Lexer tests: line numbering and statement joining through the
//! public API.

use std::convert::Infallible;
use std::io::Cursor;

use virt_command_file::lexer::RawLines;
use virt_command_file::{Context, DEFAULT_ESCAPE, Line, add_context, statements};

fn ok_lines<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = Result<String, Infallible>> + 'a {
    lines.iter().map(|l| Ok(l.to_string()))
}

fn collect<I: Iterator<Item = Result<Line, Infallible>>>(iter: I) -> Vec<Line> {
    iter.map(|item| match item {
        Ok(line) => line,
        Err(never) => match never {},
    })
    .collect()
}

#[test]
fn numbers_lines_from_one() {
    let lines = collect(add_context(
        "some_file1",
        ok_lines(&["line1", "line2", "line3"]),
        None,
        1,
    ));
    assert_eq!(
        lines,
        vec![
            Line::new("line1", Context::new("some_file1", 1)),
            Line::new("line2", Context::new("some_file1", 2)),
            Line::new("line3", Context::new("some_file1", 3)),
        ]
    );
}

#[test]
fn continuation_without_terminator() {
    let result = collect(statements(
        add_context("f", ok_lines(&["a\\", "b"]), None, 1),
        DEFAULT_ESCAPE,
    ));
    assert_eq!(result, vec![Line::new("a\nb", Context::new("f", 1))]);
}

#[test]
fn reads_from_bufread() {
    let reader = Cursor::new("run /a\r\nrun \\\n/b\n".as_bytes());
    let result: Vec<Line> = statements(
        add_context("main", RawLines::new(reader), None, 1),
        DEFAULT_ESCAPE,
    )
    .collect::<std::io::Result<_>>()
    .expect("read");
    assert_eq!(
        result,
        vec![
            Line::new("run /a", Context::new("main", 1)),
            Line::new("run \n/b", Context::new("main", 2)),
        ]
    );
}

#[test]
fn invalid_utf8_is_an_error() {
    let reader = Cursor::new(&b"run /a\nrun \xff\n"[..]);
    let result: Vec<_> = statements(
        add_context("main", RawLines::new(reader), None, 1),
        DEFAULT_ESCAPE,
    )
    .collect();
    assert!(result[0].is_ok());
    assert_eq!(
        result[1].as_ref().map_err(std::io::Error::kind).err(),
        Some(std::io::ErrorKind::InvalidData)
    );
}
