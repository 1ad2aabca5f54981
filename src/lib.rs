pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use service::{
    access_policy::AccessPolicy,
    admin_service::AdminService,
    chat_service::ChatService,
    identity_service::IdentityService,
    labour_service::LabourService,
    notification_service::{Notifier, NotificationService},
    verification_service::VerificationService,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    pub policy: Arc<AccessPolicy>,
    // Services
    pub identity_service: Arc<IdentityService>,
    pub admin_service: Arc<AdminService>,
    pub labour_service: Arc<LabourService>,
    pub chat_service: Arc<ChatService>,
    pub verification_service: Arc<VerificationService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn Store>, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let policy = Arc::new(AccessPolicy::new(&config.admin_email_domains));
        let notification_service = Arc::new(NotificationService::new(notifier));

        let identity_service = Arc::new(IdentityService::new(
            db_client.clone(),
            config.jwt_secret.clone(),
            config.jwt_maxage,
        ));

        let admin_service = Arc::new(AdminService::new(
            db_client.clone(),
            identity_service.clone(),
            policy.clone(),
            notification_service.clone(),
        ));

        let labour_service = Arc::new(LabourService::new(
            db_client.clone(),
            policy.clone(),
            notification_service.clone(),
        ));

        let chat_service = Arc::new(ChatService::new(db_client.clone(), policy.clone()));

        let verification_service = Arc::new(VerificationService::new(
            db_client.clone(),
            policy.clone(),
            notification_service.clone(),
        ));

        Self {
            env: config,
            db_client,
            policy,
            identity_service,
            admin_service,
            labour_service,
            chat_service,
            verification_service,
            notification_service,
        }
    }
}
