//! chatkv CLI: inspect and edit a chatkv database.
//!
//! Two modes:
//! - **Shell mode**: `chatkv [flags] COMMAND` runs one command and exits
//! - **Pipe mode**: `echo "counter inc 7" | chatkv` runs each stdin line

mod commands;
mod execute;
mod parse;

use std::io::{BufRead, IsTerminal};
use std::process;

use chatkv::ChatKv;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

use commands::{build_cli, build_line_cli};
use execute::execute;
use parse::matches_to_action;

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let db = match open_database(&matches) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(1);
        }
    };

    let exit_code = if matches.subcommand().is_some() {
        run_line(&db, &matches)
    } else if std::io::stdin().is_terminal() {
        // Nothing to read; show usage instead of waiting on the terminal.
        let _ = build_cli().print_help();
        println!();
        1
    } else {
        run_pipe(&db)
    };

    if let Err(e) = db.close() {
        eprintln!("(error) {}", e);
        process::exit(1);
    }
    process::exit(exit_code);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_database(matches: &clap::ArgMatches) -> chatkv::Result<ChatKv> {
    let mut builder = ChatKv::builder();
    if matches.get_flag("ephemeral") {
        builder = builder.ephemeral();
    } else {
        let path = matches
            .get_one::<String>("db")
            .map(String::as_str)
            .unwrap_or(".chatkv");
        builder = builder.path(path);
    }
    if let Some(capacity) = matches.get_one::<usize>("lru") {
        builder = builder.lru(*capacity);
    }
    builder.open()
}

/// Run one parsed command line; returns the exit code.
fn run_line(db: &ChatKv, matches: &clap::ArgMatches) -> i32 {
    let action = match matches_to_action(matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            return 1;
        }
    };
    match execute(db, action) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("(error) {}", e);
            1
        }
    }
}

/// Run every stdin line as a command. Exit code is 1 if any line failed.
fn run_pipe(db: &ChatKv) -> i32 {
    let mut exit_code = 0;
    for (lineno, line) in std::io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("(error) {}", e);
                return 1;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(words) = shlex::split(trimmed) else {
            warn!("Unbalanced quotes on line {}", lineno + 1);
            eprintln!("(error) line {}: unbalanced quotes", lineno + 1);
            exit_code = 1;
            continue;
        };
        match build_line_cli().try_get_matches_from(words) {
            Ok(matches) => {
                if run_line(db, &matches) != 0 {
                    exit_code = 1;
                }
            }
            Err(e) => {
                eprintln!("(error) line {}: {}", lineno + 1, e.to_string().trim_end());
                exit_code = 1;
            }
        }
    }
    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::Output;
    use tempfile::TempDir;

    fn invoke(dir: &TempDir, words: &[&str]) -> chatkv::Result<Output> {
        let db_arg = dir.path().to_string_lossy().into_owned();
        let mut args = vec!["chatkv", "--db", db_arg.as_str()];
        args.extend_from_slice(words);
        let matches = build_cli().try_get_matches_from(args).unwrap();

        let db = open_database(&matches)?;
        let action = matches_to_action(&matches).unwrap();
        let output = execute(&db, action);
        db.close()?;
        output
    }

    #[test]
    fn test_tree_orders_persist_between_runs() {
        let dir = TempDir::new().unwrap();
        invoke(&dir, &["tree", "insert", "5", "x", "10", "--order", "asc"]).unwrap();
        invoke(&dir, &["tree", "insert", "5", "y", "9"]).unwrap();

        let listed = invoke(&dir, &["tree", "list", "5"]).unwrap();
        assert_eq!(listed.to_string(), "1) 9 => y\n2) 10 => x");

        let err = invoke(&dir, &["tree", "get", "5", "9", "--order", "lex"]).unwrap_err();
        assert!(err.is_order_mismatch());
    }

    #[test]
    fn test_counter_persists_between_runs() {
        let dir = TempDir::new().unwrap();
        invoke(&dir, &["counter", "inc", "3"]).unwrap();
        invoke(&dir, &["counter", "inc", "3"]).unwrap();
        assert_eq!(
            invoke(&dir, &["counter", "get", "3"]).unwrap(),
            Output::Integer(2)
        );
    }
}
