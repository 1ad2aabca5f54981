// db/verificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, is_unique_violation, StoreError};
use crate::models::{
    usermodel::User,
    verificationmodels::{DocumentReview, DocumentStatus, DocumentType, VerificationDocument},
};

#[async_trait]
pub trait VerificationExt {
    /// A user holds at most one pending document; a second is a `Conflict`.
    async fn create_verification_document(
        &self,
        user_id: Uuid,
        document_type: DocumentType,
        document_url: String,
    ) -> Result<VerificationDocument, StoreError>;

    async fn get_verification_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<VerificationDocument>, StoreError>;

    async fn get_user_verification_documents(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<VerificationDocument>, StoreError>;

    async fn get_pending_verification_documents(
        &self,
    ) -> Result<Vec<VerificationDocument>, StoreError>;

    /// Moves a pending document to the reviewed state and mirrors the decision onto
    /// the owner's `verification_status` in one unit. `None` when the document is
    /// no longer pending.
    async fn review_verification_document(
        &self,
        document_id: Uuid,
        review: DocumentReview,
    ) -> Result<Option<(VerificationDocument, User)>, StoreError>;
}

#[async_trait]
impl VerificationExt for DBClient {
    async fn create_verification_document(
        &self,
        user_id: Uuid,
        document_type: DocumentType,
        document_url: String,
    ) -> Result<VerificationDocument, StoreError> {
        sqlx::query_as::<_, VerificationDocument>(
            r#"
            INSERT INTO verification_documents (id, user_id, document_type, document_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, document_type, document_url, status, reviewed_by,
            review_notes, created_at, reviewed_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(document_type)
        .bind(document_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("a verification document is already pending review".into())
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn get_verification_document(
        &self,
        document_id: Uuid,
    ) -> Result<Option<VerificationDocument>, StoreError> {
        let document = sqlx::query_as::<_, VerificationDocument>(
            r#"
            SELECT id, user_id, document_type, document_url, status, reviewed_by,
            review_notes, created_at, reviewed_at
            FROM verification_documents
            WHERE id = $1
            "#
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn get_user_verification_documents(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<VerificationDocument>, StoreError> {
        let documents = sqlx::query_as::<_, VerificationDocument>(
            r#"
            SELECT id, user_id, document_type, document_url, status, reviewed_by,
            review_notes, created_at, reviewed_at
            FROM verification_documents
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn get_pending_verification_documents(
        &self,
    ) -> Result<Vec<VerificationDocument>, StoreError> {
        let documents = sqlx::query_as::<_, VerificationDocument>(
            r#"
            SELECT id, user_id, document_type, document_url, status, reviewed_by,
            review_notes, created_at, reviewed_at
            FROM verification_documents
            WHERE status = 'pending'::document_status
            ORDER BY created_at ASC
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn review_verification_document(
        &self,
        document_id: Uuid,
        review: DocumentReview,
    ) -> Result<Option<(VerificationDocument, User)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let document = sqlx::query_as::<_, VerificationDocument>(
            r#"
            UPDATE verification_documents
            SET status = $2, reviewed_by = $3, review_notes = $4, reviewed_at = $5
            WHERE id = $1 AND status = 'pending'::document_status
            RETURNING id, user_id, document_type, document_url, status, reviewed_by,
            review_notes, created_at, reviewed_at
            "#
        )
        .bind(document_id)
        .bind(DocumentStatus::from(review.decision))
        .bind(review.reviewer_id)
        .bind(review.notes)
        .bind(review.reviewed_at)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        let Some(document) = document else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verification_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            "#
        )
        .bind(document.user_id)
        .bind(review.decision.as_status())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((document, user)))
    }
}
