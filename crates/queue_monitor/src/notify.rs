use std::collections::VecDeque;

use monitor_logging::{monitor_error, monitor_info};
use queue_core::{Notification, NotificationLevel};

const MAX_NOTICES: usize = 5;

/// Fire-and-forget sink for user-facing messages.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Keeps the last few notices for the status area under the table.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: VecDeque<Notification>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest first.
    pub fn notices(&self) -> impl Iterator<Item = &Notification> {
        self.notices.iter()
    }
}

impl Notifier for NoticeBoard {
    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => monitor_info!("{}", notification.message),
            NotificationLevel::Error => monitor_error!("{}", notification.message),
        }
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notification);
    }
}
