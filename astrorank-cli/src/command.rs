use astrorank_core::keys::KeyCombo;

/// Slash commands understood by the terminal session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType {
    Rank,    // /rank <value>
    Comment, // /comment [text]
    Goto,    // /goto <n|identifier>
    Status,  // /status
    Help,    // /help
    Quit,    // /quit
    Unknown, // Unrecognized command
}

impl CommandType {
    /// Parse command type from prefix
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix.to_lowercase().as_str() {
            "/rank" | "/r" => CommandType::Rank,
            "/comment" | "/k" => CommandType::Comment,
            "/goto" | "/g" => CommandType::Goto,
            "/status" | "/s" => CommandType::Status,
            "/help" | "/h" => CommandType::Help,
            "/quit" | "/q" => CommandType::Quit,
            _ => CommandType::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandType::Rank => "rank",
            CommandType::Comment => "comment",
            CommandType::Goto => "goto",
            CommandType::Status => "status",
            CommandType::Help => "help",
            CommandType::Quit => "quit",
            CommandType::Unknown => "unknown",
        }
    }
}

/// Parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command_type: CommandType,
    pub raw_text: String,
    pub arguments: String,
}

impl ParsedCommand {
    /// Parse a `/command args` line; `None` when the line has no `/` prefix
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (prefix, rest) = Self::extract_prefix(trimmed)?;
        Some(ParsedCommand {
            command_type: CommandType::from_prefix(prefix),
            raw_text: trimmed.to_string(),
            arguments: rest.trim().to_string(),
        })
    }

    fn extract_prefix(text: &str) -> Option<(&str, &str)> {
        if !text.starts_with('/') || text.len() < 2 {
            return None;
        }
        match text.find(char::is_whitespace) {
            Some(space_pos) => Some((&text[..space_pos], &text[space_pos..])),
            None => Some((text, "")),
        }
    }

    pub fn is_command(&self) -> bool {
        self.command_type != CommandType::Unknown
    }
}

/// One line of terminal input
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Blank line, acts as the submit key
    Empty,
    Command(ParsedCommand),
    Key(KeyCombo),
    Unrecognized(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Empty;
        }
        if let Some(command) = ParsedCommand::parse(trimmed) {
            return Input::Command(command);
        }
        match KeyCombo::parse(trimmed) {
            Some(combo) => Input::Key(combo),
            None => Input::Unrecognized(trimmed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_command() {
        let cmd = ParsedCommand::parse("/rank  2 ").unwrap();
        assert_eq!(cmd.command_type, CommandType::Rank);
        assert_eq!(cmd.arguments, "2");
        assert!(cmd.is_command());
    }

    #[test]
    fn test_comment_keeps_spaces() {
        let cmd = ParsedCommand::parse("/comment tidal tail, check  W2").unwrap();
        assert_eq!(cmd.command_type, CommandType::Comment);
        assert_eq!(cmd.arguments, "tidal tail, check  W2");
    }

    #[test]
    fn test_command_no_args() {
        let cmd = ParsedCommand::parse("/STATUS").unwrap();
        assert_eq!(cmd.command_type, CommandType::Status);
        assert_eq!(cmd.arguments, "");
    }

    #[test]
    fn test_unknown_command() {
        let cmd = ParsedCommand::parse("/launch now").unwrap();
        assert_eq!(cmd.command_type, CommandType::Unknown);
        assert!(!cmd.is_command());
    }

    #[test]
    fn test_input_kinds() {
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(Input::parse("3"), Input::Key(KeyCombo::plain("3")));
        assert_eq!(Input::parse("`"), Input::Key(KeyCombo::plain("backtick")));
        assert!(matches!(Input::parse("/quit"), Input::Command(_)));
        assert_eq!(Input::parse("/"), Input::Unrecognized("/".to_string()));
        assert_eq!(
            Input::parse("hello there"),
            Input::Unrecognized("hello there".to_string())
        );
    }
}
