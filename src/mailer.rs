use crate::config::MailConfig;
use crate::record::SubmissionRecord;
use crate::schema::FeedbackCategory;
use crate::service::Notifier;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use std::error::Error;

/// Sends "thank you" mails once a submission has been stored
pub struct Mailer {
    smtp: SmtpTransport,
    from: String,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let tls_parameters = TlsParameters::new(config.host.clone())?;

        let smtp = SmtpTransport::relay(&config.host)?
            .credentials(creds)
            .port(config.port)
            .tls(Tls::Wrapper(tls_parameters))
            .build();

        Ok(Mailer {
            smtp,
            from: config.from.clone(),
        })
    }

    /// Build the confirmation message for a stored submission
    pub fn confirmation(
        &self,
        category: FeedbackCategory,
        to_email: &str,
        name: &str,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to_email.parse()?)
            .subject(format!("Thank you for your {} feedback", category.sheet_title().to_lowercase()))
            .body(format!(
                "Dear {name},\n\nWe have received your {} feedback.\nThank you for helping us improve the event.\n",
                category.as_str()
            ))?;
        Ok(email)
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn submission_stored(
        &self,
        category: FeedbackCategory,
        record: &SubmissionRecord,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let Some(to_email) = record.text("email") else {
            return Ok(());
        };
        let name = record.text("full_name").unwrap_or_else(|| "participant".to_string());
        let email = self.confirmation(category, &to_email, &name)?;

        let smtp = self.smtp.clone();
        tokio::task::spawn_blocking(move || smtp.send(&email)).await??;
        Ok(())
    }
}
