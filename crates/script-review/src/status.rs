//! Transient status line. Each notice clears itself after its duration; a
//! newer notice cancels the pending clear of the previous one.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Default)]
struct StatusInner {
    current: Option<Notice>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl StatusInner {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for StatusInner {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<StatusInner>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>, duration: Duration) {
        let message = message.into();
        match level {
            NoticeLevel::Info => tracing::info!(target: "script_review", "{}", message),
            NoticeLevel::Error => tracing::error!(target: "script_review", "{}", message),
        }

        let mut inner = self.inner.lock();
        inner.cancel_timer();
        inner.generation += 1;
        inner.current = Some(Notice { level, message });

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(target: "script_review", "No runtime; notice will not expire");
            return;
        };
        let generation = inner.generation;
        let weak: Weak<Mutex<StatusInner>> = Arc::downgrade(&self.inner);
        inner.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock();
                if inner.generation == generation {
                    inner.current = None;
                    inner.timer = None;
                }
            }
        }));
    }

    pub fn info(&self, message: impl Into<String>, duration: Duration) {
        self.notify(NoticeLevel::Info, message, duration);
    }

    pub fn error(&self, message: impl Into<String>, duration: Duration) {
        self.notify(NoticeLevel::Error, message, duration);
    }

    pub fn current(&self) -> Option<Notice> {
        self.inner.lock().current.clone()
    }

    pub fn message(&self) -> Option<String> {
        self.current().map(|notice| notice.message)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_timer();
        inner.generation += 1;
        inner.current = None;
    }
}

impl std::fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBoard")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires() {
        let board = StatusBoard::new();
        board.info("Script updated successfully!", Duration::from_millis(2000));
        assert_eq!(board.message().as_deref(), Some("Script updated successfully!"));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(board.message().is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(board.message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notice_supersedes_pending_clear() {
        let board = StatusBoard::new();
        board.info("first", Duration::from_millis(2000));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        board.error("second", Duration::from_millis(2000));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(
            board.current(),
            Some(Notice {
                level: NoticeLevel::Error,
                message: "second".to_string(),
            })
        );
        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(board.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_timer() {
        let board = StatusBoard::new();
        board.info("first", Duration::from_millis(500));
        board.clear();
        assert!(board.current().is_none());
        board.info("second", Duration::from_millis(5000));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(board.message().as_deref(), Some("second"));
    }

    #[test]
    fn test_notice_without_runtime_is_kept() {
        let board = StatusBoard::new();
        board.info("offline", Duration::from_millis(10));
        assert_eq!(board.message().as_deref(), Some("offline"));
    }
}
