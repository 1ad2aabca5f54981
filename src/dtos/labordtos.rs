use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use validator::Validate;

use crate::models::labourmodel::ContractStatus;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 5000, message = "Description must be between 10 and 5000 characters"))]
    pub description: String,

    pub budget: BigDecimal,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SubmitProposalDto {
    pub bid_amount: BigDecimal,

    #[validate(length(min = 1, max = 5000, message = "Cover letter must be between 1 and 5000 characters"))]
    pub cover_letter: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AcceptProposalDto {
    /// When present it must equal the proposal's bid.
    pub agreed_amount: Option<BigDecimal>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateContractStatusDto {
    pub status: ContractStatus,
}
