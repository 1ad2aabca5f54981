use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SendMessageDto {
    pub receiver_id: Uuid,

    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponseDto {
    pub status: String,
    pub marked: u64,
}
