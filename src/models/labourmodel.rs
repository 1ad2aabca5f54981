use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Submitted,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ProposalStatus::Submitted => "submitted",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

// Contract states keep their capitalized names on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "contract_status", rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
}

impl ContractStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    /// Only `Active` moves, and only into a terminal state.
    pub fn can_transition_to(&self, next: ContractStatus) -> bool {
        matches!(
            (self, next),
            (ContractStatus::Active, ContractStatus::Completed)
                | (ContractStatus::Active, ContractStatus::Cancelled)
        )
    }

    /// Job status a contract in this state implies.
    pub fn job_status(&self) -> JobStatus {
        match self {
            ContractStatus::Active => JobStatus::InProgress,
            ContractStatus::Completed => JobStatus::Completed,
            ContractStatus::Cancelled => JobStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: BigDecimal,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub job_id: Uuid,
    pub freelancer_id: Uuid,
    pub bid_amount: BigDecimal,
    pub cover_letter: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub proposal_id: Uuid,
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: BigDecimal,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.freelancer_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub job_id: Uuid,
    pub freelancer_id: Uuid,
    pub bid_amount: BigDecimal,
    pub cover_letter: String,
}

/// Everything the acceptance transition group wrote.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptanceOutcome {
    pub job: Job,
    pub accepted: Proposal,
    pub rejected: Vec<Proposal>,
    pub contract: Contract,
}

/// Result of a contract status change together with the mirrored job.
#[derive(Debug, Clone, Serialize)]
pub struct ContractTransition {
    pub contract: Contract,
    pub job: Job,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContractStats {
    pub total_contracts: i64,
    pub total_amount: BigDecimal,
    pub active: i64,
    pub completed: i64,
    pub cancelled: i64,
}
