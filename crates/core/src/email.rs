//! Outgoing e-mail.
//!
//! Delivery sits behind the [`Mailer`] trait. The only transport shipped here
//! is [`LoggingMailer`], which records the message in the log and reports it
//! as queued.

use crate::error::{AskaraError, AskaraResult};
use askara_types::{EmailAddress, NonEmptyText};
use askara_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: NonEmptyText,
    pub body: String,
}

impl EmailMessage {
    /// The subject is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if the subject is blank.
    pub fn new(
        to: EmailAddress,
        subject: impl AsRef<str>,
        body: impl Into<String>,
    ) -> AskaraResult<Self> {
        let subject = NonEmptyText::new(subject)
            .map_err(|_| AskaraError::InvalidInput("e-mail subject cannot be empty".into()))?;
        Ok(Self {
            to,
            subject,
            body: body.into(),
        })
    }
}

/// Acknowledgement returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub id: String,
    pub queued_at: DateTime<Utc>,
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> AskaraResult<EmailReceipt>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMailer;

impl Mailer for LoggingMailer {
    fn send(&self, message: &EmailMessage) -> AskaraResult<EmailReceipt> {
        let receipt = EmailReceipt {
            id: RecordId::new().to_string(),
            queued_at: Utc::now(),
        };
        tracing::info!(
            "e-mail {} to {} queued: '{}' ({} chars)",
            receipt.id,
            message.to,
            message.subject,
            message.body.chars().count()
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_mailer_returns_receipt() {
        let to = EmailAddress::parse("patient@example.org").unwrap();
        let message = EmailMessage::new(to, "Votre ordonnance", "Bonjour").unwrap();
        let receipt = LoggingMailer.send(&message).unwrap();
        assert_eq!(receipt.id.len(), 32);
        assert!(receipt.queued_at <= Utc::now());
    }

    #[test]
    fn test_blank_subject_is_rejected() {
        let to = EmailAddress::parse("patient@example.org").unwrap();
        assert!(EmailMessage::new(to.clone(), " ", "x").is_err());
        let message = EmailMessage::new(to, "  Résultats ", "x").unwrap();
        assert_eq!(message.subject.as_str(), "Résultats");
    }
}
