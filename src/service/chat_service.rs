// service/chat_service.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        chatmodels::{
            ChatParticipant, ConversationId, ConversationSummary, Message, MessageView, NewMessage,
        },
        usermodel::User,
    },
    service::{
        access_policy::{AccessPolicy, Action, Target},
        error::ServiceError,
    },
};

const PREVIEW_CHARS: usize = 100;
const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub conversation_id: ConversationId,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct ChatService {
    db_client: Arc<dyn Store>,
    policy: Arc<AccessPolicy>,
}

impl ChatService {
    pub fn new(db_client: Arc<dyn Store>, policy: Arc<AccessPolicy>) -> Self {
        Self { db_client, policy }
    }

    pub async fn send_direct_message(
        &self,
        sender: &User,
        receiver_id: Uuid,
        content: String,
    ) -> Result<SentMessage, ServiceError> {
        if sender.id == receiver_id {
            return Err(ServiceError::SelfMessage);
        }

        let receiver = self
            .db_client
            .get_user(receiver_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        self.policy
            .ensure(sender, Action::SendDirectMessage, Target::User(&receiver))?;

        if content.trim().is_empty() {
            return Err(ServiceError::Validation("Message cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Message must not be more than {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let conversation_id = ConversationId::between(sender.id, receiver.id);
        let message = self
            .db_client
            .save_message(NewMessage {
                conversation_id,
                sender_id: sender.id,
                receiver_id: receiver.id,
                content,
            })
            .await?;

        tracing::debug!(
            message_id = %message.id,
            conversation_id = %conversation_id,
            "direct message stored"
        );

        Ok(SentMessage {
            conversation_id,
            message,
        })
    }

    /// One entry per counterpart, most recent activity first.
    pub async fn list_conversations(
        &self,
        user: &User,
    ) -> Result<Vec<ConversationSummary>, ServiceError> {
        let messages = self.db_client.get_user_messages(user.id).await?;

        struct Thread<'a> {
            last: &'a Message,
            position: usize,
            unread: i64,
        }

        let mut threads: HashMap<Uuid, Thread> = HashMap::new();
        for (position, message) in messages.iter().enumerate() {
            let other = if message.sender_id == user.id {
                message.receiver_id
            } else {
                message.sender_id
            };
            let unread = i64::from(message.receiver_id == user.id && !message.is_read);

            threads
                .entry(other)
                .and_modify(|thread| {
                    if (message.created_at, position) >= (thread.last.created_at, thread.position) {
                        thread.last = message;
                        thread.position = position;
                    }
                    thread.unread += unread;
                })
                .or_insert(Thread {
                    last: message,
                    position,
                    unread,
                });
        }

        let mut ordered: Vec<(Uuid, Thread)> = threads.into_iter().collect();
        ordered.sort_by(|(_, a), (_, b)| {
            (b.last.created_at, b.position).cmp(&(a.last.created_at, a.position))
        });

        let mut summaries = Vec::with_capacity(ordered.len());
        for (other_id, thread) in ordered {
            let Some(other) = self.db_client.get_user(other_id).await? else {
                tracing::warn!(user_id = %other_id, "conversation partner missing, skipping");
                continue;
            };

            summaries.push(ConversationSummary {
                conversation_id: ConversationId::between(user.id, other_id),
                other_user: participant(&other),
                last_message_preview: thread.last.content.chars().take(PREVIEW_CHARS).collect(),
                last_message_at: thread.last.created_at,
                unread_count: thread.unread,
            });
        }

        Ok(summaries)
    }

    pub async fn get_messages(
        &self,
        user: &User,
        conversation_id: &str,
    ) -> Result<Vec<MessageView>, ServiceError> {
        let conversation = parse_conversation(conversation_id)?;

        self.policy
            .ensure(user, Action::ReadConversation, Target::Conversation(&conversation))?;

        let (low, high) = conversation.participants();
        let mut people: HashMap<Uuid, ChatParticipant> = HashMap::new();
        for id in [low, high] {
            if let Some(found) = self.db_client.get_user(id).await? {
                people.insert(id, participant(&found));
            }
        }

        let messages = self.db_client.get_conversation_messages(&conversation).await?;

        messages
            .into_iter()
            .map(|message| {
                let sender = people
                    .get(&message.sender_id)
                    .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;
                Ok(MessageView {
                    sender_name: sender.name.clone(),
                    sender_role: sender.role,
                    message,
                })
            })
            .collect()
    }

    /// Marks what the user received in the conversation as read. Returns the
    /// number of messages that changed; repeating the call changes nothing.
    pub async fn mark_conversation_read(
        &self,
        user: &User,
        conversation_id: &str,
    ) -> Result<u64, ServiceError> {
        let conversation = parse_conversation(conversation_id)?;

        self.policy
            .ensure(user, Action::ReadConversation, Target::Conversation(&conversation))?;

        let marked = self
            .db_client
            .mark_conversation_read(&conversation, user.id)
            .await?;

        tracing::debug!(conversation_id = %conversation, marked, "conversation marked read");
        Ok(marked)
    }

    pub async fn unread_total(&self, user: &User) -> Result<i64, ServiceError> {
        Ok(self.db_client.get_unread_count(user.id).await?)
    }
}

fn parse_conversation(raw: &str) -> Result<ConversationId, ServiceError> {
    raw.parse::<ConversationId>()
        .map_err(|e| ServiceError::Validation(e.to_string()))
}

fn participant(user: &User) -> ChatParticipant {
    ChatParticipant {
        id: user.id,
        name: user.name.clone(),
        role: user.role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conversation_maps_to_validation() {
        assert!(matches!(
            parse_conversation("not-a-conversation"),
            Err(ServiceError::Validation(_))
        ));

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let id = ConversationId::between(a, b);
        assert_eq!(parse_conversation(&id.to_string()).unwrap(), id);
    }
}
