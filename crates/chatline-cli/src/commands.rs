//! Input line parsing.
//!
//! Lines starting with `/` are commands; anything else is chat text.

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave and exit.
    Quit,
    /// Print the roster.
    Users,
    /// Leave the chat but keep running.
    Leave,
    /// (Re)join under a name.
    Join {
        /// Requested username.
        username: String,
    },
    /// Chat text to broadcast.
    Message {
        /// Trimmed text.
        content: String,
    },
    /// Unrecognized `/command`.
    Unknown {
        /// The line as typed.
        input: String,
    },
    /// Known command with bad arguments.
    InvalidArgs {
        /// Command name without the slash.
        command: &'static str,
        /// What was wrong.
        error: &'static str,
    },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<Command> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }

    let Some(command) = text.strip_prefix('/') else {
        return Some(Command::Message { content: text.to_string() });
    };

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let rest = rest.trim();

    let parsed = match name {
        "quit" | "exit" => Command::Quit,
        "users" | "who" => Command::Users,
        "leave" => Command::Leave,
        "join" if rest.is_empty() => {
            Command::InvalidArgs { command: "join", error: "usage: /join <name>" }
        },
        "join" if rest.contains(char::is_whitespace) => {
            Command::InvalidArgs { command: "join", error: "name cannot contain spaces" }
        },
        "join" => Command::Join { username: rest.to_string() },
        _ => Command::Unknown { input: text.to_string() },
    };

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   \t "), None);
    }

    #[test]
    fn text_is_trimmed_message() {
        assert_eq!(parse("  hello world \n"), Some(Command::Message {
            content: "hello world".to_string()
        }));
    }

    #[test]
    fn commands() {
        assert_eq!(parse("/quit"), Some(Command::Quit));
        assert_eq!(parse("/exit"), Some(Command::Quit));
        assert_eq!(parse("/users"), Some(Command::Users));
        assert_eq!(parse("/leave"), Some(Command::Leave));
        assert_eq!(parse("/join  alice "), Some(Command::Join { username: "alice".to_string() }));
    }

    #[test]
    fn join_requires_single_name() {
        assert!(matches!(parse("/join"), Some(Command::InvalidArgs { command: "join", .. })));
        assert!(matches!(parse("/join a b"), Some(Command::InvalidArgs { command: "join", .. })));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse("/dance now"), Some(Command::Unknown { input: "/dance now".to_string() }));
    }
}
