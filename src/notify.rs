//! Transient user-visible notifications.
//!
//! Domain operations report their outcome as a [`Notification`] ("toast")
//! rather than as an error. Notifications are broadcast to every subscriber
//! and the most recent ones are kept for consumers that poll.
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

const RECENT_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Success => write!(f, "Success"),
            Severity::Info => write!(f, "Info"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// How long the notification should stay visible.
    pub life: Duration,
}

/// How long each kind of notification stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationLife {
    pub success: Duration,
    /// Longer-lived success for sign-in / sign-out.
    pub session: Duration,
    pub error: Duration,
}

impl Default for NotificationLife {
    fn default() -> Self {
        Self {
            success: Duration::from_millis(3000),
            session: Duration::from_millis(5000),
            error: Duration::from_millis(3000),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
    recent: Arc<Mutex<VecDeque<Notification>>>,
    life: NotificationLife,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").field("life", &self.life).finish_non_exhaustive()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NotificationLife::default())
    }
}

impl Notifier {
    pub fn new(life: NotificationLife) -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            tx,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_LIMIT))),
            life,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, detail: impl Into<String>) -> Notification {
        self.publish(Severity::Success, detail.into(), self.life.success)
    }

    /// Success notification for session transitions (sign-in, sign-out).
    pub fn session_success(&self, detail: impl Into<String>) -> Notification {
        self.publish(Severity::Success, detail.into(), self.life.session)
    }

    pub fn info(&self, detail: impl Into<String>) -> Notification {
        self.publish(Severity::Info, detail.into(), self.life.success)
    }

    pub fn error(&self, detail: impl Into<String>) -> Notification {
        self.publish(Severity::Error, detail.into(), self.life.error)
    }

    /// Most recent notifications, oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        match self.recent.lock() {
            Ok(r) => r.iter().cloned().collect(),
            Err(e) => e.into_inner().iter().cloned().collect(),
        }
    }

    pub fn last(&self) -> Option<Notification> {
        self.recent().pop()
    }

    fn publish(&self, severity: Severity, detail: String, life: Duration) -> Notification {
        let n = Notification {
            id: Uuid::new_v4(),
            severity,
            summary: severity.to_string(),
            detail,
            life,
        };

        match severity {
            Severity::Error => log::warn!("notify[{severity}]: {}", n.detail),
            _ => log::info!("notify[{severity}]: {}", n.detail),
        }

        {
            let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
            if recent.len() == RECENT_LIMIT {
                recent.pop_front();
            }
            recent.push_back(n.clone());
        }

        // No subscribers is fine; recent() still has it.
        let _ = self.tx.send(n.clone());
        n
    }
}
