// db/chatdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, StoreError};
use crate::models::chatmodels::*;

#[async_trait]
pub trait ChatExt {
    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Every message the user sent or received, oldest first.
    async fn get_user_messages(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError>;

    /// Oldest first.
    async fn get_conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, StoreError>;

    /// Marks the messages addressed to `receiver_id` as read; returns how many changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<u64, StoreError>;

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, StoreError>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, receiver_id, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, receiver_id, content, is_read, created_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn get_user_messages(&self, user_id: Uuid) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, receiver_id, content, is_read, created_at
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at ASC, seq ASC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, receiver_id, content, is_read, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, seq ASC
            "#
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#
        )
        .bind(conversation_id.to_string())
        .bind(receiver_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
