pub mod access_policy;
pub mod admin_service;
pub mod chat_service;
pub mod error;
pub mod identity_service;
pub mod labour_service;
pub mod notification_service;
pub mod verification_service;
