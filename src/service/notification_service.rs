// service/notification_service.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    AdminRequested,
    AdminDecided,
    ProposalAccepted,
    VerificationDecided,
}

impl EventKind {
    pub fn to_str(&self) -> &str {
        match self {
            EventKind::AdminRequested => "admin_requested",
            EventKind::AdminDecided => "admin_decided",
            EventKind::ProposalAccepted => "proposal_accepted",
            EventKind::VerificationDecided => "verification_decided",
        }
    }
}

/// Something that happened after a committed state change.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    /// Usually the email address the event concerns.
    pub recipient_hint: Option<String>,
    pub payload: Value,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind, recipient_hint: impl Into<Option<String>>, payload: Value) -> Self {
        Self {
            kind,
            recipient_hint: recipient_hint.into(),
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("event has no recipient")]
    NoRecipient,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &LifecycleEvent) -> Result<(), NotifyError>;
}

/// Writes events to the log and nothing else.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &LifecycleEvent) -> Result<(), NotifyError> {
        tracing::info!(
            kind = event.kind.to_str(),
            recipient = event.recipient_hint.as_deref().unwrap_or("-"),
            payload = %event.payload,
            "lifecycle event"
        );
        Ok(())
    }
}

/// Long enough for the mailer's own retries to run out first.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(60);

enum Envelope {
    Event(LifecycleEvent),
    Flush(oneshot::Sender<()>),
}

/// Hands committed events to the configured notifier on a background task.
/// Callers never wait for delivery; a failure or a stalled notifier is logged
/// and never reaches them. Events are delivered in the order dispatched.
#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    sender: mpsc::UnboundedSender<Envelope>,
    // Taken by the first dispatch, which starts the delivery task.
    receiver: Arc<Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>>,
    delivery_timeout: Duration,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            notifier,
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
            delivery_timeout: DELIVERY_TIMEOUT,
        }
    }

    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    /// Queues the events and returns at once.
    pub fn dispatch(&self, events: Vec<LifecycleEvent>) {
        self.ensure_worker();
        for event in events {
            let kind = event.kind;
            if self.sender.send(Envelope::Event(event)).is_err() {
                tracing::warn!(kind = kind.to_str(), "notification queue closed, event dropped");
            }
        }
    }

    /// Resolves once everything dispatched before the call has been handled.
    pub async fn flush(&self) {
        self.ensure_worker();
        let (done, handled) = oneshot::channel();
        if self.sender.send(Envelope::Flush(done)).is_ok() {
            let _ = handled.await;
        }
    }

    fn ensure_worker(&self) {
        let receiver = match self.receiver.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut receiver) = receiver else {
            return;
        };

        let notifier = self.notifier.clone();
        let delivery_timeout = self.delivery_timeout;
        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                match envelope {
                    Envelope::Event(event) => {
                        deliver(notifier.as_ref(), &event, delivery_timeout).await
                    }
                    Envelope::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
    }
}

async fn deliver(notifier: &dyn Notifier, event: &LifecycleEvent, delivery_timeout: Duration) {
    match timeout(delivery_timeout, notifier.notify(event)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(
            kind = event.kind.to_str(),
            error = %e,
            "notification failed, state change stands"
        ),
        Err(_) => tracing::warn!(
            kind = event.kind.to_str(),
            timeout_secs = delivery_timeout.as_secs(),
            "notification timed out, state change stands"
        ),
    }
}
