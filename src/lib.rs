//! Command files for `virt-customize` and related tools.
//!
//! A command file holds one tool option per line: `run /path/script`
//! becomes `--run /path/script`. This crate parses such files, expands
//! `commands-from-file` and `commands-from-shell` inclusions while
//! tracking where every line came from, finds and remaps the local files
//! that directives refer to, and turns the result back into text or
//! command line arguments.
//!
//! # Quick start
//!
//! ## Parse and re-format a command file
//!
//! ```
//! use virt_command_file::{format, parse};
//!
//! let input = "# setup\nrun /tmp/setup.sh\nwrite /etc/motd:hello\\\nworld\n";
//! let nodes = parse(input, "setup.cmd");
//! assert_eq!(format(&nodes), input);
//! ```
//!
//! ## Remap local files and build tool arguments
//!
//! ```
//! use virt_command_file::{parse, substitute_files, to_arguments};
//!
//! let nodes = parse("upload keys.pub:/root/.ssh/authorized_keys\nselinux-relabel\n", "vm.cmd");
//! let remote: Vec<_> = substitute_files(nodes, |file| format!("/tmp/upload/{}", file.path)).collect();
//! assert_eq!(
//!     to_arguments(&remote),
//!     ["--upload", "/tmp/upload/keys.pub:/root/.ssh/authorized_keys", "--selinux-relabel"]
//! );
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod config;
pub mod context;
pub mod files;
pub mod formatter;
pub mod host;
pub mod include;
pub mod lexer;
pub mod parser;

use std::io;
use std::path::Path;

pub use ast::{Command, Comment, Node, UsedFile};
pub use config::{Config, ConfigError};
pub use context::Context;
pub use files::{FileCommands, PatternError, extract, substitute, substitute_files, used_files};
pub use formatter::{command_line, format, to_arguments, to_text};
pub use host::{Host, Process, System};
pub use include::{Includes, ResolveError, ResolveErrorKind, ResolveOptions, resolve_includes};
pub use lexer::{DEFAULT_ESCAPE, Line, add_context, statements};
pub use parser::{Parser, classify, parse};

/// Unified error type for the top-level entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The top-level file could not be read.
    #[error("{0}")]
    Io(#[from] io::Error),
    /// An inclusion failed.
    #[error("{0}")]
    Resolve(#[from] ResolveError),
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Read `path` and return its nodes with all inclusions expanded.
pub fn resolve_file(
    path: &Path,
    host: &dyn Host,
    options: &ResolveOptions,
) -> Result<Vec<Node>, Error> {
    let reader = host.open(path)?;
    let nodes = Parser::new(lexer::RawLines::new(reader), &path.to_string_lossy())
        .escape(options.escape)
        .collect::<io::Result<Vec<_>>>()?;
    Ok(resolve_includes(nodes, host, options).collect::<Result<Vec<_>, _>>()?)
}
