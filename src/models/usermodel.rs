use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Freelancer,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Client, UserRole::Freelancer, UserRole::Admin];

    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Client => "client",
            UserRole::Freelancer => "freelancer",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    PendingAdminApproval,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::PendingAdminApproval => "pending_admin_approval",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, VerificationStatus::Approved | VerificationStatus::Rejected)
    }
}

/// Outcome an approver picks for a pending request or document.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn to_str(&self) -> &str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    pub fn as_status(&self) -> VerificationStatus {
        match self {
            Decision::Approved => VerificationStatus::Approved,
            Decision::Rejected => VerificationStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub verification_status: VerificationStatus,
    /// Only meaningful for `UserRole::Admin`.
    pub admin_approved: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Domain part of the email, lower-cased. Empty when the address has no `@`.
    pub fn email_domain(&self) -> String {
        email_domain(&self.email)
    }

    pub fn is_active_admin(&self) -> bool {
        self.role == UserRole::Admin && self.admin_approved
    }

    pub fn is_verified_freelancer(&self) -> bool {
        self.role == UserRole::Freelancer
            && self.verification_status == VerificationStatus::Approved
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn email_domain(email: &str) -> String {
    email
        .trim()
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .unwrap_or_default()
}

/// Optional profile fields captured at registration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    pub name: String,
    pub department: Option<String>,
    pub reason: Option<String>,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
    pub verification_status: VerificationStatus,
    pub admin_approved: bool,
    pub department: Option<String>,
    pub reason: Option<String>,
}

/// State applied to a pending admin when an approver decides the request.
#[derive(Debug, Clone)]
pub struct AdminDecisionRecord {
    pub decision: Decision,
    pub approver_id: Uuid,
    pub decided_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("new.admin@Reserved-Domain.org"), "reserved-domain.org");
        assert_eq!(email_domain("a@b@corp.io"), "corp.io");
        assert_eq!(email_domain("no-at-sign"), "");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_decision_status() {
        assert_eq!(Decision::Approved.as_status(), VerificationStatus::Approved);
        assert_eq!(Decision::Rejected.as_status(), VerificationStatus::Rejected);
        assert!(VerificationStatus::Rejected.is_decided());
        assert!(!VerificationStatus::PendingAdminApproval.is_decided());
    }
}
