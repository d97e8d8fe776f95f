// src/mailer.rs

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{config::SmtpConfig, error::AppError, models::email::VerificationMail};

/// Pause between inline delivery attempts, multiplied by the attempt number.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Outbound email collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, mail: &VerificationMail) -> Result<(), AppError>;
}

/// SMTP delivery through lettre (STARTTLS relay).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, AppError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalServerError(format!("invalid MAIL_FROM: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| AppError::InternalServerError(format!("smtp relay: {}", e)))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, mail: &VerificationMail) -> Result<(), AppError> {
        let to = mail
            .email
            .parse::<Mailbox>()
            .map_err(|e| AppError::InternalServerError(format!("invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body())
            .map_err(|e| AppError::InternalServerError(format!("build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::InternalServerError(format!("smtp send: {}", e)))?;

        Ok(())
    }
}

/// Used when no SMTP host is configured: the activation link goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, mail: &VerificationMail) -> Result<(), AppError> {
        tracing::info!(
            to = %mail.email,
            subject = %mail.subject,
            activation_url = %mail.activation_url,
            "SMTP not configured, logging email instead of sending"
        );
        Ok(())
    }
}

/// Tries to send `mail` up to `max_attempts` times, returning the last error
/// if every attempt fails.
pub async fn deliver_with_retry(
    mailer: &dyn Mailer,
    mail: &VerificationMail,
    max_attempts: u32,
) -> Result<(), AppError> {
    let mut attempt = 1;
    loop {
        match mailer.send_verification(mail).await {
            Ok(()) => {
                tracing::info!(to = %mail.email, attempt, "Verification email sent");
                return Ok(());
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(to = %mail.email, attempt, error = %e, "Email delivery failed, retrying");
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(to = %mail.email, attempt, error = %e, "Email delivery failed");
                return Err(e);
            }
        }
    }
}
