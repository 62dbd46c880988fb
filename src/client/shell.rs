//! Shell-owned coordination primitives.
//!
//! [`Mailbox`] is the single-slot channel for transient cross-view notices
//! (toasts): any view posts, the shell reads once, a newer notice replaces
//! an unread one. [`RefreshSignal`] is the explicit refresh trigger the
//! list projections watch — views bump it after a mutation instead of each
//! other polling the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient, read-once notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Single-slot mailbox. Posting overwrites any unread notice.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<Notice>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, notice: Notice) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(notice);
    }

    /// Take the pending notice, leaving the slot empty.
    pub fn take(&self) -> Option<Notice> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// Monotonic refresh trigger. Bumped after any mutation; list projections
/// re-fetch when they see a value newer than their last sync.
#[derive(Debug, Default)]
pub struct RefreshSignal {
    counter: AtomicU64,
}

impl RefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_reads_once() {
        let mailbox = Mailbox::new();
        mailbox.post(Notice::success("request submitted"));
        assert_eq!(
            mailbox.take(),
            Some(Notice::success("request submitted"))
        );
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn newer_notice_replaces_unread_one() {
        let mailbox = Mailbox::new();
        mailbox.post(Notice::success("saved"));
        mailbox.post(Notice::error("store unreachable"));
        assert_eq!(mailbox.take(), Some(Notice::error("store unreachable")));
    }

    #[test]
    fn refresh_signal_is_monotonic() {
        let signal = RefreshSignal::new();
        assert_eq!(signal.current(), 0);
        signal.bump();
        signal.bump();
        assert_eq!(signal.current(), 2);
    }
}
