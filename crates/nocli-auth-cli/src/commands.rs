//! Command-line argument parsing.

use anyhow::{bail, Result};

pub const USAGE: &str = "\
Usage: nocli-auth [COMMAND]

Commands:
  status             Show the current session state (default)
  login [USERNAME]   Log in and store the issued token
  setup [USERNAME]   Create the first admin account, then log in
  logout             Forget the stored token
  token              Print the stored token
  health             Query the server health endpoint
  help               Show this message

Environment:
  NOCLI_API_BASE_URL  API base URL (default http://localhost:8193)
  RUST_LOG            Log filter (default warn)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { username: Option<String> },
    Setup { username: Option<String> },
    Logout,
    Token,
    Health,
    Help,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter().map(String::as_str);
        let command = match iter.next() {
            None | Some("status") => Command::Status,
            Some("login") => Command::Login {
                username: iter.next().map(str::to_string),
            },
            Some("setup") => Command::Setup {
                username: iter.next().map(str::to_string),
            },
            Some("logout") => Command::Logout,
            Some("token") => Command::Token,
            Some("health") => Command::Health,
            Some("help" | "-h" | "--help") => Command::Help,
            Some(other) => bail!("Unknown command: {}\n\n{}", other, USAGE),
        };

        if let Some(extra) = iter.next() {
            bail!("Unexpected argument: {}\n\n{}", extra, USAGE);
        }
        Ok(command)
    }
}
