use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::files::{FileCommands, PatternError};
use crate::include::ResolveOptions;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// User configuration file, relative to `$HOME`.
const USER_CONFIG: &str = ".config/virt-command-file/config.toml";

/// Error loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Pattern(#[from] PatternError),
}

// ── Final (merged) config types ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub syntax: SyntaxConfig,
    #[serde(default)]
    pub include: IncludeConfig,
    #[serde(default)]
    pub tool: ToolConfig,
    /// Extra file-referencing directives: name to path regex.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyntaxConfig {
    pub escape_char: char,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self { escape_char: '\\' }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct IncludeConfig {
    #[serde(default)]
    pub file_commands: Vec<String>,
    #[serde(default)]
    pub shell_commands: Vec<String>,
    #[serde(default)]
    pub shell: String,
    #[serde(default)]
    pub env_prefix: String,
    /// Directory for relative inclusions printed by shell commands.
    #[serde(default)]
    pub include_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ToolConfig {
    #[serde(default)]
    pub program: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    syntax: SyntaxOverlay,
    #[serde(default)]
    include: IncludeOverlay,
    #[serde(default)]
    tool: ToolOverlay,
    #[serde(default)]
    files: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
struct SyntaxOverlay {
    escape_char: Option<char>,
}

#[derive(Debug, Deserialize, Default)]
struct IncludeOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    file_commands: Vec<String>,
    #[serde(default)]
    shell_commands: Vec<String>,
    #[serde(default)]
    remove_file_commands: Vec<String>,
    #[serde(default)]
    remove_shell_commands: Vec<String>,
    shell: Option<String>,
    env_prefix: Option<String>,
    include_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ToolOverlay {
    program: Option<String>,
}

fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    #[must_use]
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Embedded defaults merged with a user file.
    ///
    /// `path` is read if given; otherwise `~/.config/virt-command-file/config.toml`
    /// is used when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::user_config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(config),
            },
        };
        log::debug!("loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let overlay: ConfigOverlay =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
        config.apply_overlay(overlay);
        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(USER_CONFIG))
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(escape) = overlay.syntax.escape_char {
            self.syntax.escape_char = escape;
        }

        let i = overlay.include;
        merge_list(
            &mut self.include.file_commands,
            i.file_commands,
            &i.remove_file_commands,
            i.replace,
        );
        merge_list(
            &mut self.include.shell_commands,
            i.shell_commands,
            &i.remove_shell_commands,
            i.replace,
        );
        if let Some(shell) = i.shell {
            self.include.shell = shell;
        }
        if let Some(prefix) = i.env_prefix {
            self.include.env_prefix = prefix;
        }
        if i.include_dir.is_some() {
            self.include.include_dir = i.include_dir;
        }

        if let Some(program) = overlay.tool.program {
            self.tool.program = program;
        }

        self.files.extend(overlay.files);
    }

    /// Options for [`crate::resolve_includes`].
    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            file_commands: self.include.file_commands.iter().cloned().collect(),
            shell_commands: self.include.shell_commands.iter().cloned().collect(),
            shell: self.include.shell.clone(),
            env_prefix: self.include.env_prefix.clone(),
            escape: self.syntax.escape_char,
            include_dir: self.include.include_dir.clone(),
        }
    }

    /// The standard file-referencing table plus the `[files]` entries.
    pub fn file_commands(&self) -> Result<FileCommands, ConfigError> {
        let mut commands = FileCommands::standard().clone();
        for (name, pattern) in &self.files {
            commands.register(name, pattern)?;
        }
        Ok(commands)
    }

    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
