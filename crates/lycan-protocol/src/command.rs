//! Inbound classification: command invocation or free text.
//!
//! The game core only ever sees an already tokenized command name and
//! its arguments. Stripping the prefix happens here, once.

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: char = '$';

/// A participant's chat line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// `"$vote Alice"` → `Command { name: "vote", args: ["Alice"] }`.
    Command { name: String, args: Vec<String> },
    /// Anything that does not start with the prefix.
    Chat(String),
}

impl Inbound {
    /// Classifies `content`.
    ///
    /// Arguments are split on any run of whitespace. A bare prefix (or a
    /// prefix followed only by whitespace) is treated as chat: there is no
    /// command name to look up.
    pub fn parse(content: &str, prefix: char) -> Self {
        let trimmed = content.trim();
        let Some(rest) = trimmed.strip_prefix(prefix) else {
            return Self::Chat(trimmed.to_string());
        };

        let mut words = rest.split_whitespace();
        match words.next() {
            Some(name) if !rest.starts_with(char::is_whitespace) => Self::Command {
                name: name.to_lowercase(),
                args: words.map(str::to_string).collect(),
            },
            _ => Self::Chat(trimmed.to_string()),
        }
    }

    /// Returns `true` for command invocations.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}
