// service/admin_service.rs
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::Store,
    error::ErrorMessage,
    models::usermodel::{
        email_domain, AdminDecisionRecord, Decision, Profile, User, UserRole, VerificationStatus,
    },
    service::{
        access_policy::{AccessPolicy, Action, Target},
        error::ServiceError,
        identity_service::{IdentityService, Session},
        notification_service::{EventKind, LifecycleEvent, NotificationService},
    },
};

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: u32,
    pub limit: usize,
}

/// Lifecycle of administrator accounts: request, approval, sign in.
#[derive(Debug, Clone)]
pub struct AdminService {
    db_client: Arc<dyn Store>,
    identity: Arc<IdentityService>,
    policy: Arc<AccessPolicy>,
    notification_service: Arc<NotificationService>,
}

impl AdminService {
    pub fn new(
        db_client: Arc<dyn Store>,
        identity: Arc<IdentityService>,
        policy: Arc<AccessPolicy>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            identity,
            policy,
            notification_service,
        }
    }

    pub async fn register_request(
        &self,
        email: &str,
        credential: &str,
        profile: Profile,
    ) -> Result<User, ServiceError> {
        if !self.policy.is_reserved_domain(email) {
            tracing::warn!(domain = %email_domain(email), "admin request from unreserved domain");
            return Err(ServiceError::DomainRestricted(email_domain(email)));
        }

        let user = self
            .identity
            .create_user(email, credential, UserRole::Admin, profile)
            .await?;

        tracing::info!(user_id = %user.id, "admin access requested");

        self.notification_service
            .dispatch(vec![LifecycleEvent::new(
                EventKind::AdminRequested,
                user.email.clone(),
                json!({
                    "user_id": user.id,
                    "email": user.email,
                    "name": user.name,
                    "department": user.department,
                    "reason": user.reason,
                }),
            )]);

        Ok(user)
    }

    /// The eligibility gate runs before the credential check, so an account
    /// that may not sign in as admin is told so whatever password it sent.
    pub async fn login(&self, email: &str, credential: &str) -> Result<Session, ServiceError> {
        let user = self
            .identity
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

        self.policy.ensure(&user, Action::AdminLogin, Target::None)?;

        if !self.identity.verify_credential(&user, credential) {
            return Err(ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string()));
        }

        tracing::info!(user_id = %user.id, "admin signed in");
        self.identity.issue_session(user)
    }

    pub async fn approve_or_reject(
        &self,
        approver: &User,
        target_user_id: Uuid,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<User, ServiceError> {
        self.policy
            .ensure(approver, Action::DecideAdminRequest, Target::None)?;

        let target = self
            .db_client
            .get_user(target_user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Admin request".to_string()))?;

        if target.role != UserRole::Admin {
            return Err(ServiceError::NotFound("Admin request".to_string()));
        }
        if target.verification_status.is_decided() {
            return Err(ServiceError::InvalidState(format!(
                "admin request already {}",
                target.verification_status.to_str()
            )));
        }
        if target.verification_status != VerificationStatus::PendingAdminApproval {
            return Err(ServiceError::NotFound("Admin request".to_string()));
        }

        self.policy
            .ensure(approver, Action::DecideAdminRequest, Target::User(&target))?;

        let record = AdminDecisionRecord {
            decision,
            approver_id: approver.id,
            decided_at: Utc::now(),
            notes: notes.clone(),
        };

        let Some(decided) = self
            .db_client
            .decide_admin_request(target_user_id, record)
            .await?
        else {
            // Another approver got there first.
            return Err(ServiceError::InvalidState(
                "admin request was decided concurrently".to_string(),
            ));
        };

        tracing::info!(
            user_id = %decided.id,
            approver_id = %approver.id,
            decision = decision.to_str(),
            "admin request decided"
        );

        self.notification_service
            .dispatch(vec![LifecycleEvent::new(
                EventKind::AdminDecided,
                decided.email.clone(),
                json!({
                    "user_id": decided.id,
                    "decision": decision.to_str(),
                    "approver_id": approver.id,
                    "notes": notes,
                }),
            )]);

        Ok(decided)
    }

    pub async fn pending_requests(&self, approver: &User) -> Result<Vec<User>, ServiceError> {
        self.policy
            .ensure(approver, Action::DecideAdminRequest, Target::None)?;
        Ok(self.db_client.get_pending_admins().await?)
    }

    pub async fn list_users(
        &self,
        actor: &User,
        page: u32,
        limit: usize,
    ) -> Result<UserPage, ServiceError> {
        self.policy.ensure(actor, Action::ViewAllUsers, Target::None)?;

        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let users = self.db_client.get_users(page, limit).await?;
        let total = self.db_client.get_user_count().await?;

        Ok(UserPage {
            users,
            total,
            page,
            limit,
        })
    }

    /// Seeds the first approved admin so the pipeline has someone to approve
    /// requests. Does nothing if the account already exists.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        credential: &str,
        name: &str,
    ) -> Result<Option<User>, ServiceError> {
        if !self.policy.is_reserved_domain(email) {
            return Err(ServiceError::DomainRestricted(email_domain(email)));
        }
        if self.identity.find_by_email(email).await?.is_some() {
            tracing::debug!("bootstrap admin already present");
            return Ok(None);
        }

        let user = self
            .identity
            .create_user(
                email,
                credential,
                UserRole::Admin,
                Profile {
                    name: name.to_string(),
                    department: None,
                    reason: Some("bootstrap".to_string()),
                },
            )
            .await?;

        let record = AdminDecisionRecord {
            decision: Decision::Approved,
            approver_id: user.id,
            decided_at: Utc::now(),
            notes: None,
        };
        let approved = self
            .db_client
            .decide_admin_request(user.id, record)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("bootstrap admin was decided concurrently".to_string())
            })?;

        tracing::info!(user_id = %approved.id, "bootstrap admin created");
        Ok(Some(approved))
    }
}
