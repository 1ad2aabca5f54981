use async_trait::async_trait;
use serde_json::Value;

use super::sendmail::Mailer;
use crate::service::notification_service::{EventKind, LifecycleEvent, Notifier, NotifyError};

const ADMIN_REQUESTED_TEMPLATE: &str = "<p>Hello {{name}},</p>\
<p>Your request for administrator access has been received and is waiting for approval.</p>";

const ADMIN_APPROVED_TEMPLATE: &str = "<p>Your administrator access has been approved.</p>\
<p>You can now sign in through the admin login.</p>";

const ADMIN_REJECTED_TEMPLATE: &str = "<p>Your request for administrator access was declined.</p>\
<p>{{notes}}</p>";

const PROPOSAL_ACCEPTED_TEMPLATE: &str = "<p>Your proposal for <strong>{{job_title}}</strong> was accepted.</p>\
<p>Contract amount: {{amount}}</p>";

const VERIFICATION_APPROVED_TEMPLATE: &str = "<p>Your identity document was approved. \
You can now submit proposals.</p>";

const VERIFICATION_REJECTED_TEMPLATE: &str = "<p>Your identity document was not approved.</p>\
<p>{{notes}}</p>";

/// Delivers lifecycle events as emails through Resend.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    mailer: Mailer,
}

impl EmailNotifier {
    pub fn new(mailer: Mailer) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, event: &LifecycleEvent) -> Result<(), NotifyError> {
        let to_email = event
            .recipient_hint
            .as_deref()
            .ok_or(NotifyError::NoRecipient)?;
        let (subject, body) = render(event);

        self.mailer
            .send_email(to_email, subject, &body)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

pub fn render(event: &LifecycleEvent) -> (&'static str, String) {
    let approved = field(&event.payload, "decision") == "approved";

    let (subject, template) = match event.kind {
        EventKind::AdminRequested => ("Admin access requested", ADMIN_REQUESTED_TEMPLATE),
        EventKind::AdminDecided if approved => ("Admin access approved", ADMIN_APPROVED_TEMPLATE),
        EventKind::AdminDecided => ("Admin access declined", ADMIN_REJECTED_TEMPLATE),
        EventKind::ProposalAccepted => ("Your proposal was accepted", PROPOSAL_ACCEPTED_TEMPLATE),
        EventKind::VerificationDecided if approved => {
            ("Verification approved", VERIFICATION_APPROVED_TEMPLATE)
        }
        EventKind::VerificationDecided => ("Verification declined", VERIFICATION_REJECTED_TEMPLATE),
    };

    let placeholders = [
        ("{{name}}", field(&event.payload, "name")),
        ("{{notes}}", field(&event.payload, "notes")),
        ("{{job_title}}", field(&event.payload, "job_title")),
        ("{{amount}}", field(&event.payload, "amount")),
    ];

    // Payload text comes from users; it is inserted as text, never as markup.
    let mut body = template.to_string();
    for (key, value) in placeholders {
        body = body.replace(key, &ammonia::clean_text(&value));
    }

    (subject, body)
}

fn field(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_proposal_accepted() {
        let event = LifecycleEvent::new(
            EventKind::ProposalAccepted,
            "dev@work.io".to_string(),
            json!({ "job_title": "Roofing", "amount": "4500" }),
        );
        let (subject, body) = render(&event);
        assert_eq!(subject, "Your proposal was accepted");
        assert!(body.contains("<strong>Roofing</strong>"));
        assert!(body.contains("4500"));
        assert!(!body.contains("{{"));
    }

    #[test]
    fn test_render_picks_decision_variant() {
        let rejected = LifecycleEvent::new(
            EventKind::AdminDecided,
            None,
            json!({ "decision": "rejected", "notes": "Unverifiable" }),
        );
        let (subject, body) = render(&rejected);
        assert_eq!(subject, "Admin access declined");
        assert!(body.contains("<p>Unverifiable</p>"));

        let approved = LifecycleEvent::new(
            EventKind::VerificationDecided,
            None,
            json!({ "decision": "approved", "notes": null }),
        );
        assert_eq!(render(&approved).0, "Verification approved");
    }

    #[test]
    fn test_render_escapes_user_text() {
        let event = LifecycleEvent::new(
            EventKind::ProposalAccepted,
            "dev@work.io".to_string(),
            json!({
                "job_title": "<a href=\"https://evil.example/login\">Verify your account</a><script>x()</script>",
                "amount": "4500",
            }),
        );
        let (_, body) = render(&event);
        assert!(!body.contains("<a "));
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.starts_with("<p>Your proposal for <strong>"));

        let requested = LifecycleEvent::new(
            EventKind::AdminRequested,
            None,
            json!({ "name": "<img src=x onerror=alert(1)>" }),
        );
        let (_, body) = render(&requested);
        assert!(!body.contains("<img"));
        assert!(body.contains("&lt;img"));
    }

    #[tokio::test]
    async fn test_missing_recipient() {
        let notifier = EmailNotifier::new(Mailer::new("key", "noreply@workbridge.dev").unwrap());
        let event = LifecycleEvent::new(EventKind::AdminRequested, None, json!({}));
        assert!(matches!(
            notifier.notify(&event).await,
            Err(NotifyError::NoRecipient)
        ));
    }
}
