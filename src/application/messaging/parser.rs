//! Message parser - finds the prefix and command name in message text

/// A parsed command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The prefix as it appeared in the message
    pub prefix: String,
    /// Command name as typed
    pub name: String,
    /// Whitespace separated arguments
    pub args: Vec<String>,
    /// Everything after the command name, untouched apart from leading whitespace
    pub rest: String,
}

/// Splits `<prefix><name> <args...>` messages
#[derive(Debug, Clone)]
pub struct MessageParser {
    prefixes: Vec<String>,
    mention: Option<String>,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefixes: vec![prefix.into()],
            mention: None,
        }
    }

    /// Accept another prefix, tried after the existing ones
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() && !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
        self
    }

    /// Also accept `@username ` as a prefix, and `name@username` command names
    pub fn with_mention(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        if !username.is_empty() {
            self.mention = Some(username);
        }
        self
    }

    /// Prefixes in the order they are tried. The mention comes first.
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes = Vec::with_capacity(self.prefixes.len() + 1);
        if let Some(username) = &self.mention {
            prefixes.push(format!("@{} ", username));
        }
        prefixes.extend(self.prefixes.iter().cloned());
        prefixes
    }

    /// Find the prefix used by `content`, returning it as typed
    fn match_prefix<'a>(&self, content: &'a str) -> Option<&'a str> {
        if let Some(username) = &self.mention {
            let mention = format!("@{}", username);
            if let Some(head) = content.get(..mention.len()) {
                let tail = &content[mention.len()..];
                if head.eq_ignore_ascii_case(&mention) && tail.starts_with(char::is_whitespace) {
                    return Some(head);
                }
            }
        }

        self.prefixes
            .iter()
            .find(|p| !p.is_empty() && content.starts_with(p.as_str()))
            .map(|p| &content[..p.len()])
    }

    /// Parse a message. Returns `None` when it is not a command.
    pub fn parse(&self, content: &str) -> Option<Invocation> {
        let prefix = self.match_prefix(content)?;
        let body = content[prefix.len()..].trim_start();

        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        let mut name = &body[..name_end];
        if name.is_empty() {
            return None;
        }

        // `help@mybot` is addressed to us, `help@otherbot` is not
        if let Some((bare, target)) = name.split_once('@') {
            match &self.mention {
                Some(username) if target.eq_ignore_ascii_case(username) => name = bare,
                _ => return None,
            }
            if name.is_empty() {
                return None;
            }
        }

        let rest = body[name_end..].trim_start();
        Some(Invocation {
            prefix: prefix.to_string(),
            name: name.to_string(),
            args: rest.split_whitespace().map(str::to_string).collect(),
            rest: rest.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_prefix() {
        let parser = MessageParser::new("!");
        let invocation = parser.parse("!reload developer events").unwrap();
        assert_eq!(invocation.prefix, "!");
        assert_eq!(invocation.name, "reload");
        assert_eq!(invocation.args, vec!["developer", "events"]);
        assert_eq!(invocation.rest, "developer events");
    }

    #[test]
    fn test_whitespace_after_prefix_is_stripped() {
        let parser = MessageParser::new("!");
        let invocation = parser.parse("!   help  sync").unwrap();
        assert_eq!(invocation.name, "help");
        assert_eq!(invocation.rest, "sync");
    }

    #[test]
    fn test_mention_prefix() {
        let parser = MessageParser::new("!").with_mention("cogbot");
        let invocation = parser.parse("@CogBot help").unwrap();
        assert_eq!(invocation.prefix, "@CogBot");
        assert_eq!(invocation.name, "help");

        // A mention glued to the next word is not a prefix
        assert!(parser.parse("@cogbothelp").is_none());
        assert_eq!(parser.prefixes(), vec!["@cogbot ".to_string(), "!".to_string()]);
    }

    #[test]
    fn test_rest_keeps_newlines() {
        let parser = MessageParser::new("!");
        let invocation = parser.parse("!exec ```\necho hi\n```").unwrap();
        assert_eq!(invocation.rest, "```\necho hi\n```");
    }

    #[test]
    fn test_native_prefix_with_bot_suffix() {
        let parser = MessageParser::new("!").with_prefix("/").with_mention("cogbot");
        assert_eq!(parser.parse("/sync@cogbot ~").unwrap().name, "sync");
        assert!(parser.parse("/sync@otherbot").is_none());
    }

    #[test]
    fn test_not_a_command() {
        let parser = MessageParser::new("!");
        assert!(parser.parse("hello there").is_none());
        assert!(parser.parse("!").is_none());
        assert!(parser.parse("!   ").is_none());
    }
}
