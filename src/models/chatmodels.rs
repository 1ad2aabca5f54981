// models/chatmodels.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::usermodel::UserRole;

/// Identifier of the conversation between two users.
///
/// Built from the sorted participant pair, so either side derives the same id,
/// and the participants can be read back out of it. Rendered as `low:high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId {
    low: Uuid,
    high: Uuid,
}

impl ConversationId {
    pub fn between(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn participants(&self) -> (Uuid, Uuid) {
        (self.low, self.high)
    }

    pub fn includes(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `user_id`, if `user_id` takes part.
    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if self.low == user_id {
            Some(self.high)
        } else if self.high == user_id {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed conversation id: {0}")]
pub struct ParseConversationIdError(pub String);

impl FromStr for ConversationId {
    type Err = ParseConversationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseConversationIdError(s.to_string());
        let (a, b) = s.split_once(':').ok_or_else(err)?;
        let a = Uuid::parse_str(a).map_err(|_| err())?;
        let b = Uuid::parse_str(b).map_err(|_| err())?;
        let id = ConversationId::between(a, b);
        // Only the canonical ordering round-trips; anything else was not minted here.
        if id.low != a || a == b {
            return Err(err());
        }
        Ok(id)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatParticipant {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Clone)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub other_user: ChatParticipant,
    pub last_message_preview: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub sender_role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ConversationId::between(a, b), ConversationId::between(b, a));
        assert_eq!(
            ConversationId::between(a, b).to_string(),
            ConversationId::between(b, a).to_string()
        );
    }

    #[test]
    fn test_conversation_id_parse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let id = ConversationId::between(a, b);
        let parsed: ConversationId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.other(a), Some(b));
        assert_eq!(parsed.other(Uuid::new_v4()), None);

        let (low, high) = id.participants();
        assert!(format!("{}:{}", high, low).parse::<ConversationId>().is_err());
        assert!(format!("{}:{}", low, low).parse::<ConversationId>().is_err());
        assert!("not-a-conversation".parse::<ConversationId>().is_err());
    }
}
