//! services/client/src/commands.rs
//!
//! Line commands understood by the terminal front end.

use crybaby_core::domain::Role;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  signup <email> <password> [student|parent]
  login <email> <password>
  logout
  upload <file> <subject>
  books
  delete <book-id> <content-location>
  ask <question...>
  videos <query...>
  event <start> <end> <summary...> [| <description...>]
  study <subject> <minutes>
  star
  progress <child-id>
  google-login
  help
  quit";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type `help` for the list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        role: Role,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Upload {
        path: PathBuf,
        subject: String,
    },
    Books,
    Delete {
        book_id: String,
        content_location: String,
    },
    Ask(String),
    Videos(String),
    Event {
        start: String,
        end: String,
        summary: String,
        description: String,
    },
    Study {
        subject: String,
        minutes: u32,
    },
    Star,
    Progress(String),
    GoogleLogin,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        let Some(word) = line.split_whitespace().next() else {
            return Ok(None);
        };
        let rest = line[word.len()..].trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word.to_lowercase().as_str() {
            "signup" => match args.as_slice() {
                [email, password] => Self::SignUp {
                    email: email.to_string(),
                    password: password.to_string(),
                    role: Role::Student,
                },
                [email, password, role] => Self::SignUp {
                    email: email.to_string(),
                    password: password.to_string(),
                    role: role.parse().map_err(|_| CommandError::Usage(SIGNUP_USAGE))?,
                },
                _ => return Err(CommandError::Usage(SIGNUP_USAGE)),
            },
            "login" => match args.as_slice() {
                [email, password] => Self::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(CommandError::Usage("login <email> <password>")),
            },
            "logout" => Self::Logout,
            "upload" => match args.as_slice() {
                [path, subject @ ..] if !subject.is_empty() => Self::Upload {
                    path: PathBuf::from(path),
                    subject: subject.join(" "),
                },
                _ => return Err(CommandError::Usage("upload <file> <subject>")),
            },
            "books" => Self::Books,
            "delete" => match args.as_slice() {
                [book_id, location] => Self::Delete {
                    book_id: book_id.to_string(),
                    content_location: location.to_string(),
                },
                _ => return Err(CommandError::Usage("delete <book-id> <content-location>")),
            },
            "ask" if !rest.is_empty() => Self::Ask(rest.to_string()),
            "ask" => return Err(CommandError::Usage("ask <question...>")),
            "videos" => Self::Videos(rest.to_string()),
            "event" => parse_event(rest)?,
            "study" => match args.as_slice() {
                [subject, minutes] => Self::Study {
                    subject: subject.to_string(),
                    minutes: minutes
                        .parse()
                        .map_err(|_| CommandError::Usage("study <subject> <minutes>"))?,
                },
                _ => return Err(CommandError::Usage("study <subject> <minutes>")),
            },
            "star" => Self::Star,
            "progress" => match args.as_slice() {
                [child] => Self::Progress(child.to_string()),
                _ => return Err(CommandError::Usage("progress <child-id>")),
            },
            "google-login" => Self::GoogleLogin,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

const SIGNUP_USAGE: &str = "signup <email> <password> [student|parent]";
const EVENT_USAGE: &str = "event <start> <end> <summary...> [| <description...>]";

fn parse_event(rest: &str) -> Result<Command, CommandError> {
    let (head, description) = match rest.split_once('|') {
        Some((head, description)) => (head, description.trim()),
        None => (rest, ""),
    };
    let mut parts = head.split_whitespace();
    let (Some(start), Some(end)) = (parts.next(), parts.next()) else {
        return Err(CommandError::Usage(EVENT_USAGE));
    };
    // An empty summary is passed through so the flow can reject it.
    let summary = parts.collect::<Vec<_>>().join(" ");
    Ok(Command::Event {
        start: start.to_string(),
        end: end.to_string(),
        summary,
        description: description.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn signup_defaults_to_student() {
        assert_eq!(
            Command::parse("signup kid@example.com secret1").unwrap(),
            Some(Command::SignUp {
                email: "kid@example.com".into(),
                password: "secret1".into(),
                role: Role::Student,
            })
        );
        assert_eq!(
            Command::parse("signup mum@example.com secret1 Parent").unwrap(),
            Some(Command::SignUp {
                email: "mum@example.com".into(),
                password: "secret1".into(),
                role: Role::Parent,
            })
        );
        assert!(Command::parse("signup a b guardian").is_err());
    }

    #[test]
    fn free_text_commands_keep_the_whole_line() {
        assert_eq!(
            Command::parse("ask what is 7 x 8?").unwrap(),
            Some(Command::Ask("what is 7 x 8?".into()))
        );
        assert_eq!(
            Command::parse("videos long division").unwrap(),
            Some(Command::Videos("long division".into()))
        );
        assert_eq!(
            Command::parse("upload ./notes.pdf social studies").unwrap(),
            Some(Command::Upload {
                path: PathBuf::from("./notes.pdf"),
                subject: "social studies".into(),
            })
        );
    }

    #[test]
    fn event_splits_description() {
        assert_eq!(
            Command::parse("event 2024-05-01T10:00 2024-05-01T11:00 Math practice | chapter 3")
                .unwrap(),
            Some(Command::Event {
                start: "2024-05-01T10:00".into(),
                end: "2024-05-01T11:00".into(),
                summary: "Math practice".into(),
                description: "chapter 3".into(),
            })
        );
        assert_eq!(
            Command::parse("event 2024-05-01T10:00"),
            Err(CommandError::Usage(EVENT_USAGE))
        );
    }

    #[test]
    fn errors_name_the_problem() {
        assert_eq!(
            Command::parse("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
        assert!(matches!(
            Command::parse("study math lots"),
            Err(CommandError::Usage(_))
        ));
        assert_eq!(Command::parse("QUIT").unwrap(), Some(Command::Quit));
    }
}
