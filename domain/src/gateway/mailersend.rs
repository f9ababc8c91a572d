use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use email_address::EmailAddress;
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;

/// MailerSend API client for sending transactional emails
#[derive(Clone)]
pub struct MailerSendClient {
    client: reqwest::Client,
    base_url: String,
}

/// Email recipient with name and email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub email: String,
    pub name: Option<String>,
}

/// Email sender with name and email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSender {
    pub email: String,
    pub name: Option<String>,
}

/// Request payload for sending an email via MailerSend
#[derive(Debug, Clone, Serialize)]
pub struct SendEmailRequest {
    pub from: EmailSender,
    pub to: Vec<EmailRecipient>,
    pub subject: String,
    pub text: String,
}

/// Response from MailerSend API
#[derive(Debug, Deserialize)]
pub struct SendEmailResponse {
    pub message_id: Option<String>,
}

/// Assembles a [`SendEmailRequest`], checking that the required parts are present.
#[derive(Debug, Default)]
pub struct SendEmailRequestBuilder {
    from: Option<EmailSender>,
    to: Vec<EmailRecipient>,
    subject: Option<String>,
    text: Option<String>,
}

impl SendEmailRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, email: impl Into<String>) -> Self {
        self.from = Some(EmailSender {
            email: email.into(),
            name: None,
        });
        self
    }

    pub fn from_with_name(mut self, email: impl Into<String>, name: impl Into<String>) -> Self {
        self.from = Some(EmailSender {
            email: email.into(),
            name: Some(name.into()),
        });
        self
    }

    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.to.push(EmailRecipient {
            email: email.into(),
            name: None,
        });
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn build(self) -> Result<SendEmailRequest, Error> {
        let missing = |part: &str| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(format!(
                "Email request is missing {part}"
            ))),
        };

        let from = self.from.ok_or_else(|| missing("a sender"))?;
        if self.to.is_empty() {
            return Err(missing("recipients"));
        }
        let subject = self.subject.ok_or_else(|| missing("a subject"))?;
        let text = self.text.ok_or_else(|| missing("a body"))?;

        Ok(SendEmailRequest {
            from,
            to: self.to,
            subject,
            text,
        })
    }
}

impl MailerSendClient {
    /// Create a new MailerSend client with authentication
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = build_client(config)?;
        let base_url = config.mailersend_base_url().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Send an email using MailerSend API
    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, Error> {
        // Validate email addresses before sending
        if !is_valid_email(&request.from.email) {
            warn!("Invalid sender email: {}", request.from.email);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Invalid sender email address".to_string(),
                )),
            });
        }

        for recipient in &request.to {
            if !is_valid_email(&recipient.email) {
                warn!("Invalid recipient email: {}", recipient.email);
                return Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(format!(
                        "Invalid recipient email address: {}",
                        recipient.email
                    ))),
                });
            }
        }

        let url = format!("{}/email", self.base_url);
        debug!(
            "Sending email '{}' to {} recipient(s)",
            request.subject,
            request.to.len()
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to send email request: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            info!("Email sent successfully, message_id: {:?}", message_id);

            Ok(SendEmailResponse { message_id })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Failed to send email: {} - {}", status, error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                    "MailerSend responded with {status}"
                ))),
            })
        }
    }
}

/// Build HTTP client with MailerSend authentication
fn build_client(config: &Config) -> Result<reqwest::Client, Error> {
    let headers = build_auth_headers(config)?;

    Ok(reqwest::Client::builder()
        .use_rustls_tls()
        .default_headers(headers)
        .build()?)
}

/// Build authentication headers for MailerSend API
fn build_auth_headers(config: &Config) -> Result<reqwest::header::HeaderMap, Error> {
    let api_key = config.mailersend_api_key().ok_or_else(|| {
        warn!("Failed to get MailerSend API key from config");
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    })?;

    let mut headers = reqwest::header::HeaderMap::new();
    let mut auth_header = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|err| {
            warn!("Failed to create authorization header value: {err:?}");
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to create authorization header value".to_string(),
                )),
            }
        })?;
    auth_header.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth_header);

    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    Ok(headers)
}

/// Validate email address format using email_address crate
pub fn is_valid_email(email: &str) -> bool {
    EmailAddress::is_valid(email)
}
