//! Validation mail composition and submission.
//!
//! Messages are built with lettre's builder from askama templates (plain text
//! and HTML alternatives) and handed to the configured sendmail pipeline,
//! which reads the RFC 822 message on stdin (`msmtp -t` by default).

use std::io;

use askama::Template;
use lettre::{
    Message,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
};
use thiserror::Error;

use super::process::{run_with_stdin, text};
use crate::config::MailConfig;

/// HTML template for the validation mail.
#[derive(Template)]
#[template(path = "mail/validation.html")]
struct ValidationMailHtml<'a> {
    url: &'a str,
}

/// Plain text template for the validation mail.
#[derive(Template)]
#[template(path = "mail/validation.txt")]
struct ValidationMailText<'a> {
    url: &'a str,
}

/// Errors that can occur when building or sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Validation link could not be built.
    #[error("Invalid validation URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The sendmail pipeline could not be started.
    #[error("failed to run sendmail command: {0}")]
    Spawn(#[source] io::Error),

    /// The sendmail pipeline failed or complained on stderr.
    #[error("{0}")]
    Rejected(String),
}

/// Delivers a finished message.
pub trait MailSender: Send + Sync {
    /// Send `message`.
    ///
    /// # Errors
    ///
    /// Returns `MailError` if the message was not accepted.
    fn send(&self, message: &Message) -> Result<(), MailError>;
}

/// Pipes messages into `sh -e -c <command>`.
///
/// A non-zero exit status or any output on stderr is a failure.
#[derive(Debug, Clone)]
pub struct CommandMailer {
    command: String,
}

impl CommandMailer {
    /// Create a mailer for a shell pipeline.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl MailSender for CommandMailer {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let raw = text(&message.formatted());
        let output =
            run_with_stdin("sh", &["-e", "-c", &self.command], &raw).map_err(MailError::Spawn)?;

        let stderr = text(&output.stderr);
        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("sendmail command {}", output.status)
            } else {
                stderr.trim_end().to_owned()
            };
            return Err(MailError::Rejected(detail));
        }
        if !stderr.is_empty() {
            return Err(MailError::Rejected(stderr.trim_end().to_owned()));
        }

        tracing::info!(command = %self.command, "Mail submitted");
        Ok(())
    }
}

/// Link a user follows to confirm their address:
/// `<base>?mcode=<ecode>&email=<email>`.
///
/// # Errors
///
/// Returns `MailError::InvalidUrl` if `base` is not a URL.
pub fn validation_url(base: &str, ecode: &str, email: &str) -> Result<String, MailError> {
    let url = url::Url::parse_with_params(base, [("mcode", ecode), ("email", email)])?;
    Ok(url.into())
}

/// Build the validation mail sent to `to`.
///
/// # Errors
///
/// Returns error if an address is malformed or a template fails to render.
pub fn compose_validation_mail(
    config: &MailConfig,
    to: &str,
    url: &str,
) -> Result<Message, MailError> {
    let html = ValidationMailHtml { url }.render()?;
    let text = ValidationMailText { url }.render()?;

    let message = Message::builder()
        .from(parse_mailbox(&config.from)?)
        .to(parse_mailbox(to)?)
        .subject(config.subject.as_str())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html),
                ),
        )?;

    Ok(message)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|_| MailError::InvalidAddress(address.to_owned()))
}
