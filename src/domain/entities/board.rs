use chrono::{DateTime, Utc};

/// A titled block of text with fields and a footer, rendered as plain
/// markdown so every platform can show it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub fields: Vec<BoardField>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardField {
    pub name: String,
    pub value: String,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(BoardField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        let mut head = String::new();
        if let Some(title) = &self.title {
            head.push_str(&format!("*{}*", title));
        }
        if let Some(url) = &self.url {
            if !head.is_empty() {
                head.push('\n');
            }
            head.push_str(url);
        }
        if !head.is_empty() {
            sections.push(head);
        }

        if let Some(description) = &self.description {
            sections.push(description.clone());
        }

        for field in &self.fields {
            sections.push(format!("*{}*\n{}", field.name, field.value));
        }

        let footer = match (&self.footer, &self.timestamp) {
            (Some(footer), Some(ts)) => Some(format!("_{} • {}_", footer, ts.format("%Y-%m-%d %H:%M:%S UTC"))),
            (Some(footer), None) => Some(format!("_{}_", footer)),
            (None, Some(ts)) => Some(format!("_{}_", ts.format("%Y-%m-%d %H:%M:%S UTC"))),
            (None, None) => None,
        };
        if let Some(footer) = footer {
            sections.push(footer);
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sections_in_order() {
        let board = Board::new()
            .title("Execution Successful")
            .description("done")
            .field("Execution Info", "Took `3ms`")
            .footer("Requested by Ada");

        assert_eq!(
            board.render(),
            "*Execution Successful*\n\ndone\n\n*Execution Info*\nTook `3ms`\n\n_Requested by Ada_"
        );
    }

    #[test]
    fn test_empty_board_renders_nothing() {
        assert_eq!(Board::new().render(), "");
    }
}
