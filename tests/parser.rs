//! Parser tests: command files read through `BufRead`.

use std::io::{self, BufRead, Cursor, Read};

use virt_command_file::lexer::RawLines;
use virt_command_file::{Command, Comment, Context, Node, Parser, parse};

fn ctx(line: usize) -> Context {
    Context::new("vm.cmd", line)
}

fn read(text: &str) -> io::Result<Vec<Node>> {
    Parser::new(RawLines::new(Cursor::new(text)), "vm.cmd").collect()
}

#[test]
fn realistic_file() {
    let text = concat!(
        "# Build a web server\r\n",
        "\r\n",
        "install nginx,certbot\r\n",
        "run-command \\\r\n",
        "  systemctl enable nginx\r\n",
        "hostname web1",
    );
    assert_eq!(
        read(text).expect("read"),
        vec![
            Comment::new(" Build a web server").at(ctx(1)).node(),
            Comment::blank().at(ctx(2)).node(),
            Command::new("install")
                .with_params("nginx,certbot")
                .at(ctx(3))
                .node(),
            Command::new("run-command")
                .with_params("\n  systemctl enable nginx")
                .at(ctx(4))
                .node(),
            Command::new("hostname").with_params("web1").at(ctx(6)).node(),
        ]
    );
}

#[test]
fn reader_and_text_agree() {
    let text = "# c\nrun /a\nwrite /f:x\\\ny\n\nselinux-relabel\n";
    assert_eq!(read(text).expect("read"), parse(text, "vm.cmd"));
}

#[test]
fn empty_input() {
    assert!(parse("", "vm.cmd").is_empty());
    assert!(read("").expect("read").is_empty());
}

/// Reader that fails after its content.
struct Broken(Cursor<&'static str>);

impl Read for Broken {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl BufRead for Broken {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.0.fill_buf()?.is_empty() {
            return Err(io::Error::other("device gone"));
        }
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt);
    }
}

#[test]
fn read_errors_pass_through() {
    let mut parser = Parser::new(RawLines::new(Broken(Cursor::new("run /a\n"))), "vm.cmd");
    assert_eq!(
        parser.next().map(|r| r.map_err(|e| e.kind())),
        Some(Ok(Command::new("run").with_params("/a").at(ctx(1)).node()))
    );
    let err = parser.next().expect("item").expect_err("read error");
    assert_eq!(err.to_string(), "device gone");
}
