//! Outgoing email
//!
//! `EmailService` renders the account emails and hands them to an
//! `EmailSender`. Development uses `LogEmailSender`; deployments post to
//! a transactional mail API through `HttpEmailSender`.

use crate::config::EmailConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A rendered email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Delivery backend
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// Writes emails to the log instead of delivering them
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        info!(to = %message.to, subject = %message.subject, "email (log sender)");
        // Bodies can carry reset links
        debug!(to = %message.to, body = %message.text, "email body (log sender)");
        Ok(())
    }
}

/// Posts emails as JSON to a mail API with a bearer key
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
}

impl HttpEmailSender {
    pub fn new(api_url: impl Into<String>, api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&message)
            .send()
            .await
            .context("Email API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email API returned {}: {}", status, body);
        }

        info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Account email templates
#[derive(Clone)]
pub struct EmailService {
    sender: Arc<dyn EmailSender>,
    from_address: String,
    frontend_url: String,
}

impl EmailService {
    pub fn new(sender: Arc<dyn EmailSender>, from_address: &str, frontend_url: &str) -> Self {
        Self {
            sender,
            from_address: from_address.to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// Pick the sender named by `email.provider`
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let sender: Arc<dyn EmailSender> = match config.provider.as_str() {
            "log" => Arc::new(LogEmailSender),
            "http" => Arc::new(HttpEmailSender::new(
                config.api_url.clone(),
                SecretString::new(config.api_key.clone()),
            )?),
            other => anyhow::bail!("Unknown email provider: {}", other),
        };
        Ok(Self::new(sender, &config.from_address, &config.frontend_url))
    }

    pub fn welcome_message(&self, to: &str, username: &str) -> EmailMessage {
        EmailMessage {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: "Welcome to FitTrack".to_string(),
            text: format!(
                "Hi {},\n\nYour FitTrack account is ready. Log your first meal or workout at {}.\n",
                username, self.frontend_url
            ),
            html: Some(format!(
                "<p>Hi {},</p><p>Your FitTrack account is ready. \
                 <a href=\"{}\">Log your first meal or workout</a>.</p>",
                username, self.frontend_url
            )),
        }
    }

    pub fn password_reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub fn password_reset_message(&self, to: &str, token: &str, valid_minutes: i64) -> EmailMessage {
        let link = self.password_reset_link(token);
        EmailMessage {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: "Reset your FitTrack password".to_string(),
            text: format!(
                "Someone asked to reset the password for this account.\n\n\
                 Open {} within {} minutes to choose a new password.\n\n\
                 If this wasn't you, ignore this email.\n",
                link, valid_minutes
            ),
            html: Some(format!(
                "<p>Someone asked to reset the password for this account.</p>\
                 <p><a href=\"{}\">Choose a new password</a> (valid for {} minutes).</p>\
                 <p>If this wasn't you, ignore this email.</p>",
                link, valid_minutes
            )),
        }
    }

    pub async fn send_welcome(&self, to: &str, username: &str) -> Result<()> {
        self.sender.send(self.welcome_message(to, username)).await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str, valid_minutes: i64) -> Result<()> {
        self.sender
            .send(self.password_reset_message(to, token, valid_minutes))
            .await
    }
}
