use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use thiserror::Error;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail provider rejected message with status {0}")]
    Rejected(u16),

    #[error("mail delivery is not configured")]
    NotConfigured,
}

/// OutgoingMail
///
/// A single plain-text message handed to the email provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer
///
/// The transactional-email collaborator. `send` returns the provider's delivery status code.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<u16, MailError>;
}

/// SendGridMailer
///
/// Posts to SendGrid's v3 send endpoint. Any 2xx status counts as accepted.
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: String,
    sender: String,
}

impl SendGridMailer {
    pub fn new(api_key: &str, sender: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<u16, MailError> {
        if self.api_key.is_empty() {
            return Err(MailError::NotConfigured);
        }

        let payload = json!({
            "personalizations": [{ "to": [{ "email": mail.to }] }],
            "from": { "email": self.sender },
            "subject": mail.subject,
            "content": [{ "type": "text/plain", "value": mail.body }],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            Ok(status)
        } else {
            Err(MailError::Rejected(status))
        }
    }
}

/// MockMailer
///
/// Keeps every message in memory. `new_failing` simulates a provider outage.
#[derive(Clone, Default)]
pub struct MockMailer {
    pub should_fail: bool,
    pub sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn sent_messages(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<u16, MailError> {
        if self.should_fail {
            return Err(MailError::Rejected(503));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
        Ok(202)
    }
}

/// welcome_mail
///
/// The confirmation message sent after a successful registration.
pub fn welcome_mail(to: &str, username: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Welcome to the Gallery!".to_string(),
        body: format!(
            "Hello {},\n\nThank you for registering! We're excited to have you on board.\n\nBest regards,\nThe Gallery Team",
            username
        ),
    }
}

/// send_best_effort
///
/// Delivers a message and logs the outcome. Failures never propagate.
pub async fn send_best_effort(mailer: &dyn Mailer, mail: OutgoingMail) {
    let to = mail.to.clone();
    match mailer.send(mail).await {
        Ok(status) => tracing::info!(to = %to, status, "email sent"),
        Err(e) => tracing::warn!(to = %to, error = %e, "email delivery failed"),
    }
}

pub type MailerState = Arc<dyn Mailer>;
