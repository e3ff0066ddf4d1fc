/*
[INPUT]:  One line typed at the control console
[OUTPUT]: Parsed Command or a CommandError explaining the mistake
[POS]:    Console layer - command grammar
[UPDATE]: When adding console commands
*/

use std::str::FromStr;

use thiserror::Error;
use valar_refresh::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Refresh the current page now
    Refresh,
    Enable,
    Disable,
    Interval(u64),
    Page(Route),
    Accounts(Vec<String>),
    /// Render the current page
    Show,
    Status,
    Presets,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid interval `{0}`; expected milliseconds")]
    InvalidInterval(String),
}

pub const HELP: &str = "\
commands:
  r | refresh            refresh the current page now
  on | off               toggle auto refresh
  interval <ms>          set the auto refresh interval (0 stops the timer)
  page <path>            navigate, e.g. `page /positions`
  accounts <a,b,...>     select accounts; `accounts -` clears the selection
  show                   render the current page
  status                 show refresh state
  presets                list preset intervals
  q | quit               exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let rest: Vec<&str> = parts.collect();
        let argument = rest.first().copied();

        match verb.to_ascii_lowercase().as_str() {
            "r" | "refresh" => Ok(Command::Refresh),
            "on" => Ok(Command::Enable),
            "off" => Ok(Command::Disable),
            "interval" | "i" => {
                let raw = argument.ok_or(CommandError::MissingArgument("interval"))?;
                raw.parse()
                    .map(Command::Interval)
                    .map_err(|_| CommandError::InvalidInterval(raw.to_string()))
            }
            "page" | "p" => {
                let path = argument.ok_or(CommandError::MissingArgument("page"))?;
                Ok(Command::Page(Route::from_path(path)))
            }
            "accounts" | "a" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("accounts"));
                }
                Ok(Command::Accounts(parse_accounts(&rest.join(" "))))
            }
            "show" | "s" => Ok(Command::Show),
            "status" => Ok(Command::Status),
            "presets" => Ok(Command::Presets),
            "help" | "h" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_accounts(raw: &str) -> Vec<String> {
    if raw == "-" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|account| !account.is_empty())
        .map(str::to_string)
        .collect()
}
