#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, Cursor, Read};
use std::path::{Path, PathBuf};

use virt_command_file::{
    Host, Node, Process, ResolveError, ResolveOptions, System, format, parse, resolve_includes,
};

/// Parse `input`, format it, and assert the text comes back unchanged.
pub fn roundtrip(input: &str) {
    let nodes = parse(input, "main");
    let output = format(&nodes);
    assert_eq!(
        output, input,
        "round-trip mismatch:\n--- expected ---\n{input}\n--- got ---\n{output}"
    );
}

/// Shell output served from memory.
pub struct Canned {
    output: Cursor<Vec<u8>>,
    code: Option<i32>,
}

impl Read for Canned {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.output.read(buf)
    }
}

impl BufRead for Canned {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.output.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.output.consume(amt);
    }
}

impl Process for Canned {
    fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.code)
    }
}

/// Host serving command files from memory.
///
/// Scripts registered with [`MemHost::script`] return canned output;
/// any other script runs in the real shell.
#[derive(Default)]
pub struct MemHost {
    files: HashMap<PathBuf, String>,
    scripts: HashMap<String, (String, Option<i32>)>,
    /// Environment of every spawned shell, in order.
    pub spawned: RefCell<Vec<Vec<(String, String)>>>,
}

impl MemHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn script(mut self, script: &str, output: &str, code: Option<i32>) -> Self {
        self.scripts
            .insert(script.to_string(), (output.to_string(), code));
        self
    }
}

impl Host for MemHost {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>> {
        match self.files.get(path) {
            Some(content) => Ok(Box::new(Cursor::new(content.clone().into_bytes()))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("No such file or directory: '{}'", path.display()),
            )),
        }
    }

    fn spawn(
        &self,
        shell: &str,
        script: &str,
        env: &[(String, String)],
    ) -> io::Result<Box<dyn Process>> {
        self.spawned.borrow_mut().push(env.to_vec());
        match self.scripts.get(script) {
            Some((output, code)) => Ok(Box::new(Canned {
                output: Cursor::new(output.clone().into_bytes()),
                code: *code,
            })),
            None => System.spawn(shell, script, env),
        }
    }
}

/// Expand inclusions in `text` (named `file`) with default options.
pub fn resolve(host: &MemHost, text: &str, file: &str) -> Vec<Result<Node, ResolveError>> {
    resolve_includes(parse(text, file), host, &ResolveOptions::default()).collect()
}

/// Like [`resolve`], but panic on the first error.
pub fn resolve_ok(host: &MemHost, text: &str, file: &str) -> Vec<Node> {
    resolve(host, text, file)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| panic!("resolve failed: {e}"))
}

/// The error that ended resolution of `text`.
pub fn resolve_err(host: &MemHost, text: &str, file: &str) -> ResolveError {
    match resolve(host, text, file).pop() {
        Some(Err(err)) => err,
        other => panic!("expected an error, got {other:?}"),
    }
}
