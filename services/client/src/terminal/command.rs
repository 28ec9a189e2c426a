//! services/client/src/terminal/command.rs
//!
//! The line protocol between the reader and the terminal client: one command per line.

use std::str::FromStr;

/// A parsed input line. Card numbers are 1-based as typed; `card` converts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Switches between the login and registration forms.
    Mode,
    Username(String),
    Password(String),
    /// Submits the auth form as currently filled in.
    Submit,
    Login { username: String, password: String },
    Register { username: String, password: String },
    Logout,
    Topic(String),
    Language(String),
    /// Requests a digest for the current preferences.
    Digest,
    /// Redraws the current screen.
    Show,
    Read(usize),
    Like(usize),
    Dislike(usize),
    Open(usize),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a card number")]
    BadCard(String),
}

pub const HELP: &str = "\
Commands:
  mode                          switch between login and register
  user <name> / pass <password> fill in the form, then: submit
  login <user> <password>       log in directly
  register <user> <password>    create an account directly
  logout                        sign out
  topic <name>                  toggle a topic
  lang <code>                   choose the digest language
  digest                        fetch your digest
  read|like|dislike|open <n>    act on card n
  show                          redraw the screen
  help                          this text
  quit                          exit";

/// Converts a typed card number into an index.
pub fn card(n: usize) -> usize {
    n.saturating_sub(1)
}

fn card_number(arg: Option<&str>, usage: &'static str) -> Result<usize, ParseError> {
    let arg = arg.ok_or(ParseError::Usage(usage))?;
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::BadCard(arg.to_string())),
    }
}

fn credentials<'a>(
    mut args: impl Iterator<Item = &'a str>,
    usage: &'static str,
) -> Result<(String, String), ParseError> {
    match (args.next(), args.next(), args.next()) {
        (Some(user), Some(pass), None) => Ok((user.to_string(), pass.to_string())),
        _ => Err(ParseError::Usage(usage)),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Show);
        };

        let command = match head.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "mode" => Self::Mode,
            "user" => Self::Username(
                words
                    .next()
                    .ok_or(ParseError::Usage("user <name>"))?
                    .to_string(),
            ),
            // Passwords may contain spaces; take the rest of the line verbatim.
            "pass" => {
                let rest = line.trim_start()[head.len()..].trim();
                if rest.is_empty() {
                    return Err(ParseError::Usage("pass <password>"));
                }
                Self::Password(rest.to_string())
            }
            "submit" => Self::Submit,
            "login" => {
                let (username, password) = credentials(words.by_ref(), "login <user> <password>")?;
                Self::Login { username, password }
            }
            "register" => {
                let (username, password) =
                    credentials(words.by_ref(), "register <user> <password>")?;
                Self::Register { username, password }
            }
            "logout" => Self::Logout,
            "topic" => Self::Topic(
                words
                    .next()
                    .ok_or(ParseError::Usage("topic <name>"))?
                    .to_string(),
            ),
            "lang" | "language" => Self::Language(
                words
                    .next()
                    .ok_or(ParseError::Usage("lang <code>"))?
                    .to_string(),
            ),
            "digest" | "get" => Self::Digest,
            "show" => Self::Show,
            "read" => Self::Read(card_number(words.next(), "read <n>")?),
            "like" => Self::Like(card_number(words.next(), "like <n>")?),
            "dislike" => Self::Dislike(card_number(words.next(), "dislike <n>")?),
            "open" => Self::Open(card_number(words.next(), "open <n>")?),
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
