/// Kind of chat a channel is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// A channel the bot can post text to (group, supergroup, channel)
    Text,
    /// A one-to-one chat
    Private,
    Other(String),
}

/// A chat channel as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: Option<String>,
    pub kind: ChannelKind,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }

    /// `#name`, or the id when the channel is unnamed
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("#{}", name),
            None => self.id.clone(),
        }
    }
}
