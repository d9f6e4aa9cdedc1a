use serde::{Deserialize, Serialize};

/// A single turn in a session's conversation history.
///
/// Turns are the unit the context store persists: a role (user or
/// assistant) and text content. The store appends them in write order and
/// never mutates them afterwards.
///
/// # Examples
///
/// ```
/// use tutorweave::message::Message;
///
/// let question = Message::user("What is the boiling point of benzene?");
/// let answer = Message::assistant("Benzene boils at 80.1 C.");
/// assert!(question.has_role(Message::USER));
/// assert!(answer.has_role(Message::ASSISTANT));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender, `"user"` or `"assistant"`.
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// Student input message role.
    pub const USER: &'static str = "user";
    /// Tutor response message role.
    pub const ASSISTANT: &'static str = "assistant";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a user message with the specified content.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message with the specified content.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convenience_constructors() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, Message::USER);
        assert_eq!(user_msg.content, "Hello");

        let assistant_msg = Message::assistant("Hi there!");
        assert_eq!(assistant_msg.role, Message::ASSISTANT);
        assert_eq!(assistant_msg.content, "Hi there!");
    }

    #[test]
    fn test_role_checking() {
        let user_msg = Message::user("Hello");
        assert!(user_msg.has_role(Message::USER));
        assert!(!user_msg.has_role(Message::ASSISTANT));
    }

    #[test]
    fn test_serialization() {
        let original = Message::user("Test message");
        let json = serde_json::to_string(&original).expect("serialize");
        let deserialized: Message = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(original, deserialized);
        assert_eq!(deserialized.role, "user");
    }
}
