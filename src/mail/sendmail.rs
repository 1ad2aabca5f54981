use serde_json::json;
use thiserror::Error;
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;
const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidRecipient(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resend API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Thin client for the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    endpoint: String,
    retry_delay_ms: u64,
}

impl Mailer {
    pub fn new(
        api_key: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            from_email: from_email.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
            retry_delay_ms: RETRY_DELAY_MS,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, retry_delay_ms: u64) -> Self {
        self.endpoint = endpoint.into();
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Sends with exponential backoff between attempts. Returns the provider's
    /// message id.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, MailError> {
        if to_email.is_empty() || !to_email.contains('@') {
            return Err(MailError::InvalidRecipient(to_email.to_string()));
        }

        let mut attempt = 1;
        loop {
            match self.send_via_resend(to_email, subject, html_body).await {
                Ok(email_id) => {
                    tracing::info!(to = to_email, id = %email_id, "email sent");
                    return Ok(email_id);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let delay = self.retry_delay_ms * 2_u64.pow(attempt - 1);
                    tracing::warn!(
                        to = to_email,
                        attempt,
                        delay_ms = delay,
                        error = %e,
                        "email send failed, retrying"
                    );
                    sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(to = to_email, attempts = attempt, error = %e, "email failed");
                    return Err(e);
                }
            }
        }
    }

    async fn send_via_resend(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, MailError> {
        let request_body = json!({
            "from": self.from_email,
            "to": to_email,
            "subject": subject,
            "html": html_body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());

        if !status.is_success() {
            return Err(MailError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let id = serde_json::from_str::<serde_json::Value>(&response_text)
            .ok()
            .and_then(|body| body.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| "success".to_string());
        Ok(id)
    }
}
