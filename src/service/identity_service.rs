// service/identity_service.rs
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::Store,
    error::ErrorMessage,
    models::usermodel::{normalize_email, NewUser, Profile, User, UserRole, VerificationStatus},
    service::error::ServiceError,
    utils::{password, token},
};

/// A signed-in user and the bearer token issued for them.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct IdentityService {
    db_client: Arc<dyn Store>,
    jwt_secret: String,
    jwt_maxage: i64,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("jwt_maxage", &self.jwt_maxage)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    pub fn new(db_client: Arc<dyn Store>, jwt_secret: impl Into<String>, jwt_maxage: i64) -> Self {
        Self {
            db_client,
            jwt_secret: jwt_secret.into(),
            jwt_maxage,
        }
    }

    /// Stores a new user with a hashed credential. The initial verification
    /// state follows from the role: admins wait for approval, clients are
    /// approved outright, freelancers start unverified.
    pub async fn create_user(
        &self,
        email: &str,
        credential: &str,
        role: UserRole,
        profile: Profile,
    ) -> Result<User, ServiceError> {
        let email = normalize_email(email);
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ServiceError::Validation(format!("'{}' is not an email address", email))),
        }

        let name = profile.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }

        let hashed = password::hash(credential).map_err(credential_error)?;

        let verification_status = match role {
            UserRole::Admin => VerificationStatus::PendingAdminApproval,
            UserRole::Client => VerificationStatus::Approved,
            UserRole::Freelancer => VerificationStatus::Unverified,
        };

        let user = self
            .db_client
            .save_user(NewUser {
                email,
                name,
                password: hashed,
                role,
                verification_status,
                admin_approved: false,
                department: profile.department,
                reason: profile.reason,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.to_str(), "user created");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.db_client.get_user_by_email(&normalize_email(email)).await?)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.db_client.get_user(user_id).await?)
    }

    /// A malformed stored hash or an over-long input counts as a mismatch.
    pub fn verify_credential(&self, user: &User, plaintext: &str) -> bool {
        match password::compare(plaintext, &user.password) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(user_id = %user.id, error = %e, "credential check failed");
                false
            }
        }
    }

    /// Self-service sign up for clients and freelancers.
    pub async fn register(
        &self,
        email: &str,
        credential: &str,
        role: UserRole,
        profile: Profile,
    ) -> Result<User, ServiceError> {
        if role == UserRole::Admin {
            return Err(ServiceError::forbidden(
                "admin accounts are created through an admin access request",
            ));
        }
        self.create_user(email, credential, role, profile).await
    }

    /// Sign in for clients and freelancers. Admins go through the admin login,
    /// which applies the domain and approval gate.
    pub async fn login(&self, email: &str, credential: &str) -> Result<Session, ServiceError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

        if !self.verify_credential(&user, credential) {
            return Err(ServiceError::Unauthorized(ErrorMessage::WrongCredentials.to_string()));
        }

        if user.role == UserRole::Admin {
            return Err(ServiceError::forbidden("administrators must use the admin login"));
        }

        self.issue_session(user)
    }

    pub fn issue_session(&self, user: User) -> Result<Session, ServiceError> {
        let token = token::create_token(
            &user.id.to_string(),
            user.role.to_str(),
            self.jwt_secret.as_bytes(),
            self.jwt_maxage,
        )?;
        Ok(Session { token, user })
    }

    /// Resolves a bearer token back to the user it was issued for.
    pub async fn authenticate(&self, bearer: &str) -> Result<User, ServiceError> {
        let claims = token::decode_token(bearer, self.jwt_secret.as_bytes())
            .map_err(|_| ServiceError::Unauthorized(ErrorMessage::InvalidToken.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized(ErrorMessage::InvalidToken.to_string()))?;

        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(ErrorMessage::UserNoLongerExist.to_string()))
    }
}

fn credential_error(error: ErrorMessage) -> ServiceError {
    match error {
        ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
            ServiceError::Validation(error.to_string())
        }
        other => ServiceError::Internal(other.to_string()),
    }
}
