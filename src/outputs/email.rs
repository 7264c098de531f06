//! Digest delivery over SMTP.
//!
//! Sends the digest as `multipart/alternative` (plain text first, HTML last)
//! through an authenticated SMTPS connection on port 465. Failures are split
//! into authentication, protocol and connection errors so the operator can
//! tell a bad app password from a network outage.

use crate::error::DeliveryError;
use crate::models::Digest;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::transport::smtp::response::Response;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// Implicit-TLS submission port.
pub const SMTPS_PORT: u16 = 465;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can hand a digest to its recipient.
pub trait DeliveryChannel {
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError>;
}

/// Authenticated SMTPS sender.
pub struct SmtpDelivery {
    host: String,
    sender: String,
    password: String,
    recipient: String,
}

impl fmt::Debug for SmtpDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpDelivery")
            .field("host", &self.host)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl SmtpDelivery {
    /// `sender` doubles as the SMTP username.
    pub fn new(
        host: impl Into<String>,
        sender: impl Into<String>,
        password: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            sender: sender.into(),
            password: password.into(),
            recipient: recipient.into(),
        }
    }
}

impl DeliveryChannel for SmtpDelivery {
    #[instrument(level = "info", skip_all, fields(host = %self.host, to = %self.recipient))]
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let message = build_message(&self.sender, &self.recipient, digest)?;

        let creds = Credentials::new(self.sender.clone(), self.password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
                .map_err(classify)?
                .port(SMTPS_PORT)
                .credentials(creds)
                .timeout(Some(SMTP_TIMEOUT))
                .build();

        let response = send(&mailer, message).await?;
        info!(
            code = %response.code(),
            subject = %digest.subject,
            "Digest sent"
        );
        Ok(())
    }
}

/// Hand `message` to `mailer`, sorting any failure into a [`DeliveryError`].
async fn send(
    mailer: &AsyncSmtpTransport<Tokio1Executor>,
    message: Message,
) -> Result<Response, DeliveryError> {
    mailer.send(message).await.map_err(classify)
}

/// Build the `multipart/alternative` message for `digest`.
pub fn build_message(
    sender: &str,
    recipient: &str,
    digest: &Digest,
) -> Result<Message, DeliveryError> {
    let from = parse_mailbox(sender)?;
    let to = parse_mailbox(recipient)?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(digest.subject.as_str())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(digest.plain_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(digest.rich_body.clone()),
                ),
        )?;
    Ok(message)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse::<Mailbox>()
        .map_err(|source| DeliveryError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// Sort an SMTP failure into authentication, protocol or connection.
///
/// A server offering none of our AUTH mechanisms counts as an
/// authentication failure: the credentials cannot be used on that host.
fn classify(err: SmtpError) -> DeliveryError {
    let code = err
        .status()
        .and_then(|c| c.to_string().parse::<u16>().ok());
    match code {
        Some(code) if is_auth_rejection(code) => DeliveryError::Authentication(err),
        Some(_) => DeliveryError::Protocol(err),
        None if err.is_client() && is_missing_auth_mechanism(&err) => {
            DeliveryError::Authentication(err)
        }
        None if err.is_response() || err.is_client() => DeliveryError::Protocol(err),
        None => DeliveryError::Connection(err),
    }
}

fn is_missing_auth_mechanism(err: &SmtpError) -> bool {
    err.to_string()
        .to_ascii_lowercase()
        .contains("no compatible authentication mechanism")
}

/// Reply codes servers use to refuse credentials (RFC 4954).
fn is_auth_rejection(code: u16) -> bool {
    matches!(code, 454 | 530 | 534 | 535 | 538)
}
