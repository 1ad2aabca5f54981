// service/verification_service.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::Store,
    models::{
        usermodel::{Decision, User, VerificationStatus},
        verificationmodels::{DocumentReview, DocumentStatus, DocumentType, VerificationDocument},
    },
    service::{
        access_policy::{AccessPolicy, Action, Target},
        error::ServiceError,
        notification_service::{EventKind, LifecycleEvent, NotificationService},
    },
};

/// Freelancer identity checks. An approved document is what makes a
/// freelancer eligible to bid.
#[derive(Debug, Clone)]
pub struct VerificationService {
    db_client: Arc<dyn Store>,
    policy: Arc<AccessPolicy>,
    notification_service: Arc<NotificationService>,
}

impl VerificationService {
    pub fn new(
        db_client: Arc<dyn Store>,
        policy: Arc<AccessPolicy>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            policy,
            notification_service,
        }
    }

    pub async fn submit_document(
        &self,
        freelancer: &User,
        document_type: DocumentType,
        document_url: String,
    ) -> Result<VerificationDocument, ServiceError> {
        self.policy
            .ensure(freelancer, Action::UploadVerificationDocument, Target::None)?;

        if freelancer.verification_status == VerificationStatus::Approved {
            return Err(ServiceError::InvalidState("user is already verified".to_string()));
        }

        let document_url = document_url.trim().to_string();
        if !is_http_url(&document_url) {
            return Err(ServiceError::Validation(
                "Document URL must start with http:// or https://".to_string(),
            ));
        }

        let document = self
            .db_client
            .create_verification_document(freelancer.id, document_type, document_url)
            .await?;

        tracing::info!(
            document_id = %document.id,
            user_id = %freelancer.id,
            document_type = document_type.to_str(),
            "verification document submitted"
        );
        Ok(document)
    }

    pub async fn my_documents(&self, user: &User) -> Result<Vec<VerificationDocument>, ServiceError> {
        Ok(self.db_client.get_user_verification_documents(user.id).await?)
    }

    pub async fn pending_documents(
        &self,
        admin: &User,
    ) -> Result<Vec<VerificationDocument>, ServiceError> {
        self.policy
            .ensure(admin, Action::ReviewVerificationDocument, Target::None)?;
        Ok(self.db_client.get_pending_verification_documents().await?)
    }

    pub async fn review_document(
        &self,
        admin: &User,
        document_id: Uuid,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<VerificationDocument, ServiceError> {
        self.policy
            .ensure(admin, Action::ReviewVerificationDocument, Target::None)?;

        let document = self
            .db_client
            .get_verification_document(document_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Verification document".to_string()))?;

        if document.status != DocumentStatus::Pending {
            return Err(ServiceError::InvalidState(
                "verification document was already reviewed".to_string(),
            ));
        }

        let review = DocumentReview {
            decision,
            reviewer_id: admin.id,
            notes: notes.clone(),
            reviewed_at: Utc::now(),
        };

        let (document, owner) = self
            .db_client
            .review_verification_document(document_id, review)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidState("verification document was already reviewed".to_string())
            })?;

        tracing::info!(
            document_id = %document.id,
            user_id = %owner.id,
            reviewer_id = %admin.id,
            decision = decision.to_str(),
            "verification document reviewed"
        );

        self.notification_service
            .dispatch(vec![LifecycleEvent::new(
                EventKind::VerificationDecided,
                owner.email.clone(),
                json!({
                    "user_id": owner.id,
                    "document_id": document.id,
                    "decision": decision.to_str(),
                    "notes": notes,
                }),
            )]);

        Ok(document)
    }
}

fn is_http_url(url: &str) -> bool {
    ["https://", "http://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.to_lowercase().starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_urls() {
        assert!(is_http_url("https://files.example.com/id.png"));
        assert!(is_http_url("HTTP://files.example.com/id.png"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://files.example.com/id.png"));
        assert!(!is_http_url("id.png"));
    }
}
