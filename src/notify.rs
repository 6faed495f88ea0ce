//! Toast Notifications
//!
//! Transient success and error messages raised by the flows. Whatever
//! presents them drains the queue after each interaction.

use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

/// One user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.level {
            ToastLevel::Success => "✓",
            ToastLevel::Error => "✕",
        };
        write!(f, "{} {}", icon, self.message)
    }
}

/// Pending notifications, oldest first
#[derive(Debug, Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.queue.push_back(Toast {
            level: ToastLevel::Success,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.queue.push_back(Toast {
            level: ToastLevel::Error,
            message: message.into(),
        });
    }

    /// Most recent notification, if any
    pub fn last(&self) -> Option<&Toast> {
        self.queue.back()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every pending notification
    pub fn drain(&mut self) -> Vec<Toast> {
        self.queue.drain(..).collect()
    }
}
