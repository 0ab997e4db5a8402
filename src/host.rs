//! Access to local files and shell commands.
//!
//! The include resolver only talks to a [`Host`], so tests can serve
//! command files from memory and the resolver itself never manages
//! processes directly.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

/// A running command whose standard output is read through `BufRead`.
pub trait Process: BufRead {
    /// Close standard output and wait for the command to exit.
    ///
    /// Returns the exit code, or `None` if it was killed by a signal.
    fn wait(&mut self) -> io::Result<Option<i32>>;
}

/// Source of command files and shell output.
pub trait Host {
    /// Open a file for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>>;

    /// Run `script` with `shell -e -c`, adding `env` to the inherited
    /// environment, with standard output captured.
    fn spawn(
        &self,
        shell: &str,
        script: &str,
        env: &[(String, String)],
    ) -> io::Result<Box<dyn Process>>;
}

/// The local filesystem and process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl Host for System {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn spawn(
        &self,
        shell: &str,
        script: &str,
        env: &[(String, String)],
    ) -> io::Result<Box<dyn Process>> {
        let mut child = Command::new(shell)
            .arg("-e")
            .arg("-c")
            .arg(script)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::piped())
            .spawn()?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::other("shell output was not captured"));
        };
        Ok(Box::new(ShellProcess {
            child,
            stdout: Some(BufReader::new(stdout)),
        }))
    }
}

/// Child process with its piped standard output.
///
/// Dropping it closes the pipe and reaps the child.
struct ShellProcess {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
}

impl Read for ShellProcess {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Ok(0),
        }
    }
}

impl BufRead for ShellProcess {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.fill_buf(),
            None => Ok(&[]),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Some(stdout) = self.stdout.as_mut() {
            stdout.consume(amt);
        }
    }
}

impl Process for ShellProcess {
    fn wait(&mut self) -> io::Result<Option<i32>> {
        self.stdout = None;
        Ok(self.child.wait()?.code())
    }
}

impl Drop for ShellProcess {
    fn drop(&mut self) {
        self.stdout = None;
        let _ = self.child.wait();
    }
}
