use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_checkout_link(&self, to: &str, checkout_url: &str) -> Result<()>;

    async fn send_welcome_credentials(
        &self,
        to: &str,
        password: &str,
        login_url: &str,
    ) -> Result<()>;
}

#[derive(Clone, PartialEq)]
pub enum Notification {
    CheckoutLink {
        to: String,
        checkout_url: String,
    },
    WelcomeCredentials {
        to: String,
        password: String,
        login_url: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::CheckoutLink { .. } => "checkout_link",
            Notification::WelcomeCredentials { .. } => "welcome_credentials",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::CheckoutLink { to, .. } | Notification::WelcomeCredentials { to, .. } => {
                to
            }
        }
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::CheckoutLink { to, checkout_url } => f
                .debug_struct("CheckoutLink")
                .field("to", to)
                .field("checkout_url", checkout_url)
                .finish(),
            Notification::WelcomeCredentials { to, login_url, .. } => f
                .debug_struct("WelcomeCredentials")
                .field("to", to)
                .field("password", &"<redacted>")
                .field("login_url", login_url)
                .finish(),
        }
    }
}

/// Fire-and-forget email queue.
///
/// Delivery runs on a task spawned at construction, so it outlives whichever request submitted
/// the notification. Failures are logged and dropped.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    pub fn spawn(sender: Arc<dyn EmailSender>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                deliver(sender.as_ref(), &notification).await;
            }
        });

        Self { tx }
    }

    pub fn submit(&self, notification: Notification) {
        let kind = notification.kind();
        if self.tx.send(notification).is_err() {
            warn!(kind, "notifications: dispatcher closed; dropping notification");
        }
    }
}

async fn deliver(sender: &dyn EmailSender, notification: &Notification) {
    let kind = notification.kind();
    let recipient = notification.recipient();

    let result = match notification {
        Notification::CheckoutLink { to, checkout_url } => {
            sender.send_checkout_link(to, checkout_url).await
        }
        Notification::WelcomeCredentials {
            to,
            password,
            login_url,
        } => sender.send_welcome_credentials(to, password, login_url).await,
    };

    match result {
        Ok(()) => info!(kind, recipient, "notifications: delivered"),
        Err(err) => warn!(kind, recipient, error = ?err, "notifications: delivery failed"),
    }
}
