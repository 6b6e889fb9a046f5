//! Email delivery
//!
//! Appointment decisions are mailed to the patient when SMTP is configured.
//! With `smtp.enabled = false` the service logs the message instead of
//! sending, so email never blocks the appointment workflow.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound email service.
pub struct EmailService {
    config: SmtpConfig,
}

impl EmailService {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send a plain-text email. A disabled transport logs and returns Ok.
    pub async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        if !self.config.enabled {
            info!(to = to_email, subject, "SMTP disabled, skipping email");
            return Ok(());
        }

        if self.config.host.is_empty() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from);
        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(self.config.port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_transport_is_a_noop() {
        let service = EmailService::new(SmtpConfig::default());
        assert!(!service.is_enabled());
        service
            .send("patient@example.com", "Appointment confirmed", "See you soon")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_enabled_without_host_fails() {
        let config = SmtpConfig {
            enabled: true,
            ..SmtpConfig::default()
        };
        let service = EmailService::new(config);
        assert!(service
            .send("patient@example.com", "subject", "body")
            .await
            .is_err());
    }
}
