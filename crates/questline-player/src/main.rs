//! Interactive console player for quest files.
//!
//! Loads a quest (RON, JSON, or TOML), then runs a prompt loop: print the
//! current location's text and its numbered jumps, read a selection, apply
//! it, repeat until an end location is reached or the player quits.
//!
//! Run with: `cargo run -p questline-player -- quests/cave.json`
//! (`-i FILE` is accepted as an alternative spelling).

use questline_core::state::{JumpError, QuestState};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let path = match parse_args(std::env::args().skip(1)) {
        Ok(path) => path,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: questline-player [-i] QUEST_FILE");
            return ExitCode::FAILURE;
        }
    };

    let mut state = match questline_data::load_file(&path).map_err(|e| e.to_string()) {
        Ok(loaded) => match loaded.into_state() {
            Ok(state) => state,
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        Err(message) => {
            eprintln!("{}: {message}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_location(&state);
        if state.is_terminal() {
            println!("The quest is over.");
            return ExitCode::SUCCESS;
        }

        print!("> ");
        if std::io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            // EOF or a read error ends the session.
            _ => return ExitCode::SUCCESS,
        };

        match parse_command(&line) {
            Command::Quit => return ExitCode::SUCCESS,
            Command::Select(index) => {
                if let Err(err) = state.select_jump(index) {
                    report_jump_error(&err);
                }
            }
            Command::Invalid => {
                println!("enter a jump number, or q to quit");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Argument and command parsing
// ---------------------------------------------------------------------------

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<PathBuf, String> {
    match (args.next(), args.next(), args.next()) {
        (Some(file), None, _) if file != "-i" => Ok(PathBuf::from(file)),
        (Some(flag), Some(file), None) if flag == "-i" => Ok(PathBuf::from(file)),
        (None, ..) => Err("missing quest file argument".to_string()),
        _ => Err("unrecognized arguments".to_string()),
    }
}

enum Command {
    Select(usize),
    Quit,
    Invalid,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Command::Quit;
    }
    match line.parse::<usize>() {
        Ok(index) => Command::Select(index),
        Err(_) => Command::Invalid,
    }
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

fn print_location(state: &QuestState) {
    let location = state.current_location();
    println!();
    println!("{}", location.text);
    for option in state.available_jumps() {
        if option.enabled {
            println!("{}) {}", option.index, option.jump.text);
        } else {
            println!("[disabled] {}) {}", option.index, option.jump.text);
        }
    }
}

fn report_jump_error(err: &JumpError) {
    match err {
        JumpError::OutOfRange { index, count } => {
            println!("no jump {index} here (choose 0..{count})");
        }
        JumpError::Disabled { index } => {
            println!("jump {index} is not available right now");
        }
        // Authoring errors in the quest file; the session itself survives.
        other => println!("{other}"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
