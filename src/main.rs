//! CLI tool to check command files and turn them into tool arguments.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use virt_command_file::{Config, FileCommands, Node, System};

fn usage() -> ExitCode {
    eprintln!("Usage: virt-cmdfile [-v] [--config FILE] <command> [files...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  check    Resolve inclusions, verify used files exist, print the result");
    eprintln!("  args     Print the tool arguments, one per line");
    eprintln!("  cmdline  Print the quoted tool command line");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v, --verbose    Log inclusions (repeat for more detail)");
    eprintln!("  --config FILE    Configuration file to merge over the defaults");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  virt-cmdfile check vm.cmd");
    eprintln!("  virt-cmdfile cmdline vm.cmd");
    ExitCode::from(2)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Replace used file paths with where they are on this machine.
fn localize(nodes: Vec<Node>, file_commands: &FileCommands) -> Vec<Node> {
    file_commands
        .substitute_files(nodes, |file| file.local_path().to_string_lossy().into_owned())
        .collect()
}

/// Report used files that do not exist. Returns true if all exist.
fn check_used_files(path: &str, nodes: &[Node], file_commands: &FileCommands) -> bool {
    let mut ok = true;
    for used in file_commands.used_files(nodes) {
        if !used.local_path().exists() {
            eprintln!(
                "{path}: File \"{}\" included from \"{}\" line {} not found!",
                used.path, used.context.file, used.context.line
            );
            ok = false;
        }
    }
    ok
}

fn main() -> ExitCode {
    let mut verbosity = 0u8;
    let mut config_path: Option<PathBuf> = None;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return usage(),
            "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
            "--config" => {
                let Some(file) = args.next() else {
                    eprintln!("Error: --config requires a file");
                    return ExitCode::from(2);
                };
                config_path = Some(PathBuf::from(file));
            }
            _ => positional.push(arg),
        }
    }

    if positional.is_empty() {
        return usage();
    }
    init_logging(verbosity);

    let command = positional[0].as_str();
    let files = &positional[1..];

    if !matches!(command, "check" | "args" | "cmdline") {
        eprintln!("Unknown command: {command}");
        return ExitCode::from(2);
    }
    if files.is_empty() {
        eprintln!("Error: no files specified");
        return ExitCode::from(2);
    }

    let config = match Config::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let file_commands = match config.file_commands() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    let options = config.resolve_options();

    let mut had_error = false;

    for path in files {
        let nodes = match virt_command_file::resolve_file(Path::new(path), &System, &options) {
            Ok(nodes) => nodes,
            Err(e) => {
                eprintln!("{path}: {e}");
                had_error = true;
                continue;
            }
        };

        match command {
            "check" => {
                if check_used_files(path, &nodes, &file_commands) {
                    print!("{}", virt_command_file::format(&nodes));
                } else {
                    had_error = true;
                }
            }
            "args" => {
                let nodes = localize(nodes, &file_commands);
                for arg in virt_command_file::to_arguments(&nodes) {
                    println!("{arg}");
                }
            }
            _ => {
                let nodes = localize(nodes, &file_commands);
                let args = virt_command_file::to_arguments(&nodes);
                match virt_command_file::command_line(&config.tool.program, &args) {
                    Ok(line) => println!("{line}"),
                    Err(e) => {
                        eprintln!("{path}: {e}");
                        had_error = true;
                    }
                }
            }
        }
    }

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
