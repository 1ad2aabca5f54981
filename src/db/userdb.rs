// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{db::DBClient, is_unique_violation, StoreError};
use crate::models::usermodel::{
    AdminDecisionRecord, Decision, NewUser, User, UserRole, VerificationStatus,
};

#[async_trait]
pub trait UserExt {
    /// Fails with `StoreError::DuplicateEmail` when the email is taken in any casing.
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, StoreError>;

    async fn get_user_count(&self) -> Result<i64, StoreError>;

    async fn get_pending_admins(&self) -> Result<Vec<User>, StoreError>;

    /// Applies the decision only if the target is an admin still pending approval.
    /// `None` means no row matched.
    async fn decide_admin_request(
        &self,
        target_id: Uuid,
        record: AdminDecisionRecord,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
            (id, email, name, password, role, verification_status, admin_approved, department, reason)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            "#
        )
        .bind(Uuid::new_v4())
        .bind(user.email)
        .bind(user.name)
        .bind(user.password)
        .bind(user.role)
        .bind(user.verification_status)
        .bind(user.admin_approved)
        .bind(user.department)
        .bind(user.reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            FROM users
            WHERE id = $1
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, StoreError> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user_count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_pending_admins(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            FROM users
            WHERE role = $1 AND verification_status = $2
            ORDER BY created_at ASC
            "#
        )
        .bind(UserRole::Admin)
        .bind(VerificationStatus::PendingAdminApproval)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn decide_admin_request(
        &self,
        target_id: Uuid,
        record: AdminDecisionRecord,
    ) -> Result<Option<User>, StoreError> {
        let approved = record.decision == Decision::Approved;

        // The WHERE clause is the compare-and-swap: a second decision matches nothing.
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verification_status = $2,
                admin_approved = $3,
                approved_by = CASE WHEN $3::boolean THEN $4::uuid ELSE NULL END,
                approved_at = CASE WHEN $3::boolean THEN $5::timestamptz ELSE NULL END,
                rejection_reason = CASE WHEN $3::boolean THEN NULL ELSE $6::text END,
                updated_at = NOW()
            WHERE id = $1
              AND role = 'admin'::user_role
              AND verification_status = 'pending_admin_approval'::verification_status
            RETURNING id, email, name, password, role, verification_status, admin_approved,
            department, reason, approved_by, approved_at, rejection_reason, created_at, updated_at
            "#
        )
        .bind(target_id)
        .bind(record.decision.as_status())
        .bind(approved)
        .bind(record.approver_id)
        .bind(record.decided_at)
        .bind(record.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
