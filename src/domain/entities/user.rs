use std::fmt;

/// A user on the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            first_name: None,
            last_name: None,
            is_bot: false,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: Option<impl Into<String>>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last.map(|l| l.into());
        self
    }

    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }

    /// First and last name, falling back to the username, then the id
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            _ => self.username.clone().unwrap_or_else(|| self.id.clone()),
        }
    }

    /// `@username`, or the id when there is no username
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.id.clone(),
        }
    }

    /// `Display Name (@username, id: 123)`, the form used in audit logs
    pub fn describe(&self) -> String {
        format!("{} ({}, id: {})", self.display_name(), self.handle(), self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let user = User::new("42");
        assert_eq!(user.display_name(), "42");

        let user = user.with_username("sqd");
        assert_eq!(user.display_name(), "sqd");
        assert_eq!(user.handle(), "@sqd");

        let user = user.with_name("Ada", Some("Lovelace"));
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.describe(), "Ada Lovelace (@sqd, id: 42)");
    }
}
