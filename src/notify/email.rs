use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{render_lead_summary, subject_line, LeadNotifier};
use crate::config::EmailConfig;
use crate::models::Lead;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// Sends lead notifications to staff over SMTP (STARTTLS).
pub struct SmtpNotifier {
    config: EmailConfig,
    staff_email: String,
    brand_name: String,
    app_url: String,
}

impl SmtpNotifier {
    pub fn new(
        config: EmailConfig,
        staff_email: impl Into<String>,
        brand_name: impl Into<String>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            config,
            staff_email: staff_email.into(),
            brand_name: brand_name.into(),
            app_url: app_url.into(),
        }
    }

    fn build_message(&self, lead: &Lead) -> Result<Message, EmailError> {
        Message::builder()
            .from(self.config.from_address.parse()?)
            .to(self.staff_email.parse()?)
            .subject(subject_line(&self.brand_name, lead))
            .header(ContentType::TEXT_PLAIN)
            .body(render_lead_summary(&self.brand_name, &self.app_url, lead))
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl LeadNotifier for SmtpNotifier {
    async fn notify_new_lead(&self, lead: &Lead) -> Result<(), EmailError> {
        let email = self.build_message(lead)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        info!(to = %self.staff_email, lead_id = %lead.id, "Sent new lead notification");
        Ok(())
    }
}
