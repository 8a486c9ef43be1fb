//! Chat message domain model and live-channel events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable chat entry on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub author_handle: String,
    /// Sanitized text as stored.
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a message, shared by the list endpoint and the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: Uuid,
    pub user: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessagePayload {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            user: m.author_handle,
            text: m.text,
            created_at: m.created_at,
        }
    }
}

/// Frames pushed to live-channel connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Message(MessagePayload),
    Warning { detail: String },
}

/// Result of posting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Posted(Message),
    /// Nothing was left after sanitizing; nothing was stored.
    Empty,
}

pub const EMPTY_MESSAGE_WARNING: &str = "Message cannot be empty";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_event_wire_format() {
        let created_at = Utc::now();
        let id = Uuid::new_v4();
        let event = ChatEvent::Message(MessagePayload {
            id,
            user: "translator1".into(),
            text: "hi<br>there".into(),
            created_at,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["user"], "translator1");
        assert_eq!(json["text"], "hi<br>there");
        assert_eq!(json["id"], id.to_string());

        let warning = serde_json::to_value(ChatEvent::Warning {
            detail: EMPTY_MESSAGE_WARNING.into(),
        })
        .unwrap();
        assert_eq!(warning["type"], "warning");
        assert_eq!(warning["detail"], "Message cannot be empty");
    }
}
