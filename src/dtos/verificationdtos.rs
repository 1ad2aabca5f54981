use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{usermodel::Decision, verificationmodels::DocumentType};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SubmitDocumentDto {
    pub document_type: DocumentType,

    #[validate(url(message = "Invalid document URL"))]
    pub document_url: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ReviewDocumentDto {
    pub decision: Decision,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}
