//! Administrator email side channel for broadcast notifications.
//!
//! [`AdminNotifier`] is registered with the broadcaster as a
//! [`NotificationSink`]. `notify` only enqueues; a single worker task drains
//! the queue and talks to MailerSend. Failures are logged and counted, never
//! retried and never reported back to whoever triggered the broadcast.

use crate::error::Error;
use crate::gateway::mailersend::{MailerSendClient, SendEmailRequest, SendEmailRequestBuilder};
use events::NotificationSink;
use log::*;
use serde::Serialize;
use serde_json::Value;
use service::config::Config;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use utoipa::ToSchema;

pub const SUBJECT_PREFIX: &str = "[Driving School]";

/// One broadcast envelope waiting to be emailed.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminNotification {
    pub event_type: String,
    pub data: Value,
    pub timestamp: String,
}

#[derive(Debug, Default)]
pub struct EmailMetrics {
    queued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`EmailMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmailStats {
    pub queued: u64,
    pub sent: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl EmailMetrics {
    pub fn snapshot(&self) -> EmailStats {
        EmailStats {
            queued: self.queued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

pub struct AdminNotifier {
    queue: UnboundedSender<AdminNotification>,
    metrics: Arc<EmailMetrics>,
}

impl AdminNotifier {
    /// Starts the delivery worker. Must be called from within a Tokio runtime.
    pub fn spawn(client: MailerSendClient, from: String, to: String) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(EmailMetrics::default());

        tokio::spawn(run_worker(rx, client, from, to, metrics.clone()));

        Self { queue, metrics }
    }

    /// Builds a notifier from configuration, or `None` when no API key or
    /// administrator address is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, Error> {
        let Some(admin_email) = config.admin_notification_email() else {
            info!("ADMIN_NOTIFICATION_EMAIL not set, admin notification emails disabled");
            return Ok(None);
        };
        if config.mailersend_api_key().is_none() {
            info!("MAILERSEND_API_KEY not set, admin notification emails disabled");
            return Ok(None);
        }

        let client = MailerSendClient::new(config)?;
        info!("Admin notification emails go to {admin_email}");
        Ok(Some(Self::spawn(
            client,
            config.notification_from_email().to_string(),
            admin_email,
        )))
    }

    pub fn metrics(&self) -> Arc<EmailMetrics> {
        self.metrics.clone()
    }
}

impl NotificationSink for AdminNotifier {
    fn name(&self) -> &'static str {
        "admin-email"
    }

    fn notify(&self, event_type: &str, data: &Value, timestamp: &str) {
        let notification = AdminNotification {
            event_type: event_type.to_string(),
            data: data.clone(),
            timestamp: timestamp.to_string(),
        };

        match self.queue.send(notification) {
            Ok(()) => {
                self.metrics.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Admin email worker is gone, dropping '{}' notification",
                    e.0.event_type
                );
            }
        }
    }
}

/// Renders the plain-text email for one notification.
pub fn build_admin_email(
    from: &str,
    to: &str,
    notification: &AdminNotification,
) -> Result<SendEmailRequest, Error> {
    let details = serde_json::to_string_pretty(&notification.data)?;
    let body = format!(
        "Event: {}\nTime: {}\n\n{}\n",
        notification.event_type, notification.timestamp, details
    );

    SendEmailRequestBuilder::new()
        .from_with_name(from, "Driving School Notifications")
        .to(to)
        .subject(format!("{SUBJECT_PREFIX} {}", notification.event_type))
        .text(body)
        .build()
}

pub async fn send_admin_notification(
    client: &MailerSendClient,
    from: &str,
    to: &str,
    notification: &AdminNotification,
) -> Result<(), Error> {
    let request = build_admin_email(from, to, notification)?;
    client.send_email(&request).await?;
    Ok(())
}

async fn run_worker(
    mut rx: UnboundedReceiver<AdminNotification>,
    client: MailerSendClient,
    from: String,
    to: String,
    metrics: Arc<EmailMetrics>,
) {
    while let Some(notification) = rx.recv().await {
        match send_admin_notification(&client, &from, &to, &notification).await {
            Ok(()) => {
                metrics.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Failed to email '{}' notification to admin: {e}",
                    notification.event_type
                );
            }
        }
    }
    debug!("Admin email queue closed");
}
