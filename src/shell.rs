//! Line-oriented front end over a [`Session`].
//!
//! Reads commands from stdin while the host keeps ticking on the same
//! `LocalSet`, so program output interleaves with the prompt.
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::editor::InputBuffer;
use crate::session::{Command, Session};
use crate::transform::transpile;

const HELP: &str = "\
commands:
  run             transform the buffer and start it
  stop            stop the running program
  reset-input     replace the buffer with the template
  reset-output    clear the console
  load <file>     replace the buffer with a file's contents
  show            print the buffer
  emit            print the transformed buffer without running it
  help            show this list
  quit            stop and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Session(Command),
    Load(PathBuf),
    Show,
    Emit,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for ShellCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        match word {
            "run" => Ok(Self::Session(Command::Run)),
            "stop" => Ok(Self::Session(Command::Stop)),
            "reset-input" => Ok(Self::Session(Command::ResetInput)),
            "reset-output" | "clear" => Ok(Self::Session(Command::ResetOutput)),
            "load" if rest.is_empty() => Err(ParseCommandError::MissingArgument("load")),
            "load" => Ok(Self::Load(PathBuf::from(rest))),
            "show" => Ok(Self::Show),
            "emit" => Ok(Self::Emit),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

/// Serve commands until `quit` or end of input, then stop the program.
///
/// Must be awaited inside a `tokio::task::LocalSet`.
pub async fn serve(session: &mut Session) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else { break };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(error) => {
                eprintln!("{error}");
                continue;
            }
        };
        match command {
            ShellCommand::Session(command) => session.execute(command),
            ShellCommand::Load(path) => match InputBuffer::load(&path) {
                Ok(buffer) => {
                    *session.input_mut() = buffer;
                    println!("loaded {}", path.display());
                }
                Err(error) => eprintln!("failed to read {}: {error}", path.display()),
            },
            ShellCommand::Show => println!("{}", session.input().text()),
            ShellCommand::Emit => {
                let program = transpile(session.input().text(), &session.options());
                println!("{}", program.source);
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
    }
    session.stop();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}
