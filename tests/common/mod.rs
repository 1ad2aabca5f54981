#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::types::BigDecimal;

use workbridge::{
    config::Config,
    db::MemoryStore,
    models::{
        usermodel::{Decision, Profile, User, UserRole},
        verificationmodels::DocumentType,
    },
    service::notification_service::{EventKind, LifecycleEvent, Notifier, NotifyError},
    AppState,
};

pub const PASSWORD: &str = "correct-horse-battery";
pub const ROOT_ADMIN: &str = "root@corp.io";

/// Keeps every event it is handed. Can be made slow or failing.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LifecycleEvent>>,
    delay: Option<Duration>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records each event, then reports a delivery failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sits on each event for `delay` before failing it.
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &LifecycleEvent) -> Result<(), NotifyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::Delivery("mail relay unavailable".to_string()));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> Config {
    Config::from_lookup(|name| match name {
        "JWT_SECRET_KEY" => Some("integration-test-secret".to_string()),
        "ADMIN_EMAIL_DOMAINS" => Some("corp.io, Staff.Corp.Net".to_string()),
        _ => None,
    })
    .expect("test config")
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(RecordingNotifier::default()).await
}

pub async fn spawn_app_with(notifier: RecordingNotifier) -> TestApp {
    let notifier = Arc::new(notifier);
    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::default()),
        test_config(),
        notifier.clone(),
    ));

    state
        .admin_service
        .bootstrap_admin(ROOT_ADMIN, PASSWORD, "Root")
        .await
        .expect("bootstrap admin");

    TestApp { state, notifier }
}

pub fn money(amount: &str) -> BigDecimal {
    BigDecimal::from_str(amount).expect("decimal literal")
}

fn profile(name: &str) -> Profile {
    Profile {
        name: name.to_string(),
        department: None,
        reason: None,
    }
}

impl TestApp {
    /// Waits for queued notifications to be handed to the notifier.
    pub async fn settle(&self) {
        self.state.notification_service.flush().await;
    }

    pub async fn events(&self) -> Vec<LifecycleEvent> {
        self.settle().await;
        self.notifier.events()
    }

    pub async fn kinds(&self) -> Vec<EventKind> {
        self.events().await.into_iter().map(|e| e.kind).collect()
    }

    pub async fn clear_events(&self) {
        self.settle().await;
        self.notifier.clear();
    }

    pub async fn root_admin(&self) -> User {
        self.user(ROOT_ADMIN).await
    }

    pub async fn user(&self, email: &str) -> User {
        self.state
            .identity_service
            .find_by_email(email)
            .await
            .unwrap()
            .expect("user exists")
    }

    pub async fn client(&self, email: &str) -> User {
        self.state
            .identity_service
            .register(email, PASSWORD, UserRole::Client, profile("Client"))
            .await
            .unwrap()
    }

    pub async fn freelancer(&self, email: &str) -> User {
        self.state
            .identity_service
            .register(email, PASSWORD, UserRole::Freelancer, profile("Freelancer"))
            .await
            .unwrap()
    }

    /// Registers a freelancer and takes them through document approval.
    pub async fn verified_freelancer(&self, email: &str) -> User {
        let freelancer = self.freelancer(email).await;
        let document = self
            .state
            .verification_service
            .submit_document(
                &freelancer,
                DocumentType::NationalId,
                "https://files.example.com/id.png".to_string(),
            )
            .await
            .unwrap();

        let root = self.root_admin().await;
        self.state
            .verification_service
            .review_document(&root, document.id, Decision::Approved, None)
            .await
            .unwrap();

        self.user(email).await
    }

    /// Requests admin access and has the root admin approve it.
    pub async fn approved_admin(&self, email: &str) -> User {
        let requested = self
            .state
            .admin_service
            .register_request(email, PASSWORD, profile("Admin"))
            .await
            .unwrap();

        let root = self.root_admin().await;
        self.state
            .admin_service
            .approve_or_reject(&root, requested.id, Decision::Approved, None)
            .await
            .unwrap()
    }
}
