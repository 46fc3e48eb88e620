//! Mail gateway boundary.
//!
//! The pipeline only needs "send an HTML-bodied message"; transport is an
//! external collaborator behind the [`MailGateway`] trait. The
//! [`LoggingMailGateway`] implementation records what would have been sent
//! and is what tests and dry runs wire in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during mail operations.
#[derive(Debug, Error)]
pub enum MailError {
    /// Mail configuration error.
    #[error("mail configuration error: {0}")]
    Configuration(String),

    /// Failed to hand the message to the gateway.
    #[error("failed to send mail: {0}")]
    SendFailed(String),
}

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

/// SMTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    /// SMTP host.
    pub host: String,

    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// From address for all reports.
    pub from_address: String,

    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "embark".to_string()
}

impl SmtpSettings {
    /// Validate the settings.
    pub fn validate(&self) -> MailResult<()> {
        if self.host.is_empty() {
            return Err(MailError::Configuration("SMTP host not configured".into()));
        }
        if self.from_address.is_empty() {
            return Err(MailError::Configuration(
                "From address not configured".into(),
            ));
        }
        Ok(())
    }
}

/// One outbound HTML message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Sender address.
    pub from: String,

    /// Recipient addresses.
    pub to: Vec<String>,

    /// Subject line.
    pub subject: String,

    /// HTML body.
    pub html_body: String,
}

/// Gateway capable of delivering an HTML-bodied message.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Send one message. Implementations must not silently drop failures.
    async fn send_html(&self, message: &OutboundMessage) -> MailResult<()>;
}

/// Gateway that logs messages instead of delivering them.
///
/// Used in tests and dry runs; the log line carries enough detail to
/// verify what would have gone out.
#[derive(Debug, Default)]
pub struct LoggingMailGateway;

impl LoggingMailGateway {
    /// Create a new logging gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailGateway for LoggingMailGateway {
    async fn send_html(&self, message: &OutboundMessage) -> MailResult<()> {
        if message.to.is_empty() {
            return Err(MailError::SendFailed("no recipients".into()));
        }

        info!(
            to = %message.to.join(", "),
            subject = %message.subject,
            body_bytes = message.html_body.len(),
            "Mail gateway (logging): message not delivered to a real gateway"
        );
        debug!(body = %message.html_body, "Rendered message body");

        Ok(())
    }
}
