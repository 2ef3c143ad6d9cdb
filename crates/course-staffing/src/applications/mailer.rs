use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};

use super::notification::{MailError, StatusEmail, StatusMailer};
use crate::config::SmtpConfig;

/// Blocking SMTP relay delivery. Callers on the async runtime should hop onto a blocking thread.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, MailError> {
        let from = from_address
            .parse::<Mailbox>()
            .map_err(|err| MailError::Address {
                address: from_address.to_string(),
                reason: err.to_string(),
            })?;

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    fn message_for(&self, email: &StatusEmail) -> Result<Message, MailError> {
        let address = email
            .to
            .parse::<Address>()
            .map_err(|err| MailError::Address {
                address: email.to.clone(),
                reason: err.to_string(),
            })?;
        let to = Mailbox::new(Some(email.recipient_name.clone()), address);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|err| MailError::Message(err.to_string()))
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl StatusMailer for SmtpMailer {
    fn deliver(&self, email: &StatusEmail) -> Result<(), MailError> {
        let message = self.message_for(email)?;
        self.transport
            .send(&message)
            .map_err(|err| MailError::Transport(err.to_string()))?;
        tracing::info!(to = %email.to, status = email.status.label(), "status e-mail sent");
        Ok(())
    }
}
