//! Pasteboard Watcher
//!
//! Polls the clipboard change version on a tokio interval and feeds new text or
//! image content into the store. Each tick holds the version lock for its whole
//! duration, so ticks never overlap even across a restart.

use crate::config::effective_poll_interval;
use crate::interface::{ClipStashError, ClipboardAccess, ClipboardPayload, NotificationSink};
use crate::models::{ClipboardItem, ItemId};
use crate::store::ClipboardStore;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const NOTIFICATION_TITLE: &str = "New Clipboard Item";
const NOTIFICATION_PREVIEW_CHARS: usize = 100;

/// A running polling task
struct Schedule {
    token: CancellationToken,
    handle: JoinHandle<()>,
    interval: watch::Receiver<Duration>,
}

pub struct PasteboardWatcher {
    store: Arc<ClipboardStore>,
    clipboard: Arc<dyn ClipboardAccess>,
    notifier: Option<Arc<dyn NotificationSink>>,
    last_version: Mutex<i64>,
    schedule: Mutex<Option<Schedule>>,
}

impl PasteboardWatcher {
    /// Content already on the clipboard at construction is not captured.
    pub fn new(store: Arc<ClipboardStore>, clipboard: Arc<dyn ClipboardAccess>) -> Self {
        let last_version = clipboard.current_change_version();
        Self {
            store,
            clipboard,
            notifier: None,
            last_version: Mutex::new(last_version),
            schedule: Mutex::new(None),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn store(&self) -> &Arc<ClipboardStore> {
        &self.store
    }

    /// One polling tick. Returns the captured item, if any.
    pub fn check_once(&self) -> Option<ClipboardItem> {
        let mut last_version = self.last_version.lock();
        let version = self.clipboard.current_change_version();
        if version == *last_version {
            return None;
        }
        *last_version = version;

        let captured = self.capture_text().or_else(|| self.capture_image());
        match &captured {
            Some(item) => {
                debug!(version, id = %item.id(), "clipboard change captured");
                self.notify(item);
            }
            None => debug!(version, "clipboard change ignored"),
        }
        captured
    }

    fn capture_text(&self) -> Option<ClipboardItem> {
        let text = self.clipboard.read_text().filter(|t| !t.is_empty())?;
        self.store.capture(ClipboardPayload::Text(text))
    }

    fn capture_image(&self) -> Option<ClipboardItem> {
        let data = self.clipboard.read_image_bytes().filter(|d| !d.is_empty())?;
        self.store.capture(ClipboardPayload::Image(data))
    }

    fn notify(&self, item: &ClipboardItem) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if self.store.config().notifications_enabled {
            notifier.notify(NOTIFICATION_TITLE, &item.preview(NOTIFICATION_PREVIEW_CHARS));
        }
    }

    /// Write a stored item back to the clipboard. The resulting change version
    /// is recorded so the next tick does not capture it again.
    /// Returns false if the id is unknown.
    pub fn copy_to_clipboard(&self, id: ItemId) -> Result<bool, ClipStashError> {
        let Some(item) = self.store.get(id) else {
            return Ok(false);
        };

        let mut last_version = self.last_version.lock();
        match item.payload() {
            ClipboardPayload::Text(text) => self.clipboard.write_text(text)?,
            ClipboardPayload::Image(data) => self.clipboard.write_image_bytes(data)?,
        }
        *last_version = self.clipboard.current_change_version();
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Polling schedule
    // ─────────────────────────────────────────────────────────────────────────────

    /// Start polling at the configured interval. Must be called inside a tokio
    /// runtime. Restarts the schedule if already running.
    ///
    /// The running schedule follows the store's poll interval: any
    /// `update_config` that changes it re-arms the ticker in place.
    pub fn start(self: &Arc<Self>) -> Result<Duration, ClipStashError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClipStashError::ClipboardError(format!("no tokio runtime: {}", e)))?;

        let mut schedule = self.schedule.lock();
        if let Some(previous) = schedule.take() {
            previous.token.cancel();
        }

        let interval = self.store.subscribe_poll_interval();
        let period = *interval.borrow();
        let token = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(
            Arc::downgrade(self),
            self.store.subscribe_poll_interval(),
            token.clone(),
        ));
        *schedule = Some(Schedule { token, handle, interval });

        info!(interval_ms = period.as_millis() as u64, "clipboard watcher started");
        Ok(period)
    }

    /// Change the polling interval through the store config. Clamped to the
    /// supported range; a running schedule picks it up before its next tick.
    pub fn set_interval(&self, secs: f64) -> Duration {
        let mut config = self.store.config();
        config.poll_interval_secs = secs;
        self.store.update_config(config);
        effective_poll_interval(secs)
    }

    pub fn is_running(&self) -> bool {
        self.schedule.lock().is_some()
    }

    /// Interval of the running schedule
    pub fn interval(&self) -> Option<Duration> {
        self.schedule.lock().as_ref().map(|s| *s.interval.borrow())
    }

    /// Stop scheduling ticks. A tick already in progress completes.
    pub fn stop(&self) {
        if let Some(schedule) = self.schedule.lock().take() {
            schedule.token.cancel();
            info!("clipboard watcher stopped");
        }
    }
}

impl Drop for PasteboardWatcher {
    fn drop(&mut self) {
        if let Some(schedule) = self.schedule.get_mut().take() {
            schedule.token.cancel();
            schedule.handle.abort();
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Ticks until cancelled. An interval change replaces the ticker inside this
/// task, so the old and new periods can never tick concurrently.
async fn poll_loop(
    watcher: Weak<PasteboardWatcher>,
    mut interval: watch::Receiver<Duration>,
    token: CancellationToken,
) {
    let mut period = *interval.borrow_and_update();
    let mut ticks = ticker(period);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            changed = interval.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = *interval.borrow_and_update();
                if next != period {
                    period = next;
                    ticks = ticker(period);
                    info!(interval_ms = period.as_millis() as u64, "clipboard watcher rescheduled");
                }
            }
            _ = ticks.tick() => {
                let Some(watcher) = watcher.upgrade() else { break };
                if token.is_cancelled() {
                    break;
                }
                watcher.check_once();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StashConfig;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Default)]
    struct FakeClipboard {
        version: AtomicI64,
        text: Mutex<Option<String>>,
        image: Mutex<Option<Vec<u8>>>,
    }

    impl FakeClipboard {
        fn set_text(&self, text: &str) {
            *self.text.lock() = Some(text.to_string());
            *self.image.lock() = None;
            self.version.fetch_add(1, Ordering::SeqCst);
        }

        fn set_image(&self, data: &[u8]) {
            *self.text.lock() = None;
            *self.image.lock() = Some(data.to_vec());
            self.version.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ClipboardAccess for FakeClipboard {
        fn current_change_version(&self) -> i64 {
            self.version.load(Ordering::SeqCst)
        }

        fn read_text(&self) -> Option<String> {
            self.text.lock().clone()
        }

        fn read_image_bytes(&self) -> Option<Vec<u8>> {
            self.image.lock().clone()
        }

        fn write_text(&self, text: &str) -> Result<(), ClipStashError> {
            self.set_text(text);
            Ok(())
        }

        fn write_image_bytes(&self, data: &[u8]) -> Result<(), ClipStashError> {
            self.set_image(data);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, title: &str, body_preview: &str) {
            self.seen.lock().push((title.to_string(), body_preview.to_string()));
        }
    }

    fn setup(config: StashConfig) -> (Arc<FakeClipboard>, Arc<RecordingSink>, PasteboardWatcher) {
        let clipboard = Arc::new(FakeClipboard::default());
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(ClipboardStore::new_in_memory(config));
        let watcher = PasteboardWatcher::new(store, clipboard.clone()).with_notifier(sink.clone());
        (clipboard, sink, watcher)
    }

    #[test]
    fn test_unchanged_version_does_nothing() {
        let (clipboard, _, watcher) = setup(StashConfig::default());
        *clipboard.text.lock() = Some("already there".into());
        assert!(watcher.check_once().is_none());
        assert!(watcher.store().is_empty());
    }

    #[test]
    fn test_captures_text_and_image() {
        let (clipboard, _, watcher) = setup(StashConfig::default());

        clipboard.set_text("user@example.com");
        let item = watcher.check_once().unwrap();
        assert!(item.tags().contains("Emails"));

        clipboard.set_image(&[1, 2, 3]);
        let item = watcher.check_once().unwrap();
        assert!(item.tags().contains("Images"));
        assert_eq!(watcher.store().len(), 2);
    }

    #[test]
    fn test_version_recorded_even_when_nothing_captured() {
        let (clipboard, _, watcher) = setup(StashConfig::default());
        clipboard.set_text("");
        assert!(watcher.check_once().is_none());

        // Same version with content appearing later is not reprocessed
        *clipboard.text.lock() = Some("late".into());
        assert!(watcher.check_once().is_none());
        assert!(watcher.store().is_empty());
    }

    #[test]
    fn test_duplicate_content_is_skipped() {
        let (clipboard, sink, watcher) = setup(StashConfig::default());
        clipboard.set_text("same");
        assert!(watcher.check_once().is_some());
        clipboard.set_text("same");
        assert!(watcher.check_once().is_none());
        assert_eq!(watcher.store().len(), 1);
        assert_eq!(sink.seen.lock().len(), 1);
    }

    #[test]
    fn test_notification_preview() {
        let (clipboard, sink, watcher) = setup(StashConfig::default());
        clipboard.set_text(&format!("line one\n\n{}", "x".repeat(200)));
        watcher.check_once();

        let seen = sink.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, NOTIFICATION_TITLE);
        assert!(seen[0].1.starts_with("line one x"));
        assert_eq!(seen[0].1.chars().count(), 100);
    }

    #[test]
    fn test_notifications_disabled() {
        let (clipboard, sink, watcher) = setup(StashConfig {
            notifications_enabled: false,
            ..StashConfig::default()
        });
        clipboard.set_text("quiet");
        assert!(watcher.check_once().is_some());
        assert!(sink.seen.lock().is_empty());
    }

    #[test]
    fn test_copy_to_clipboard_is_not_recaptured() {
        let (clipboard, _, watcher) = setup(StashConfig::default());
        clipboard.set_text("first");
        let first = watcher.check_once().unwrap();
        clipboard.set_text("second");
        watcher.check_once().unwrap();

        assert!(watcher.copy_to_clipboard(first.id()).unwrap());
        assert_eq!(clipboard.read_text().as_deref(), Some("first"));

        // Without the stored copy, a recapture would show up as a new item
        watcher.store().delete(first.id());
        assert!(watcher.check_once().is_none());
        assert_eq!(watcher.store().len(), 1);

        assert!(!watcher.copy_to_clipboard(uuid::Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_copy_image_to_clipboard() {
        let (clipboard, _, watcher) = setup(StashConfig::default());
        clipboard.set_image(&[7, 7, 7]);
        let item = watcher.check_once().unwrap();
        clipboard.set_text("other");
        watcher.check_once();

        assert!(watcher.copy_to_clipboard(item.id()).unwrap());
        assert_eq!(clipboard.read_image_bytes(), Some(vec![7, 7, 7]));
        assert!(watcher.check_once().is_none());
    }

    #[test]
    fn test_start_requires_runtime() {
        let (_, _, watcher) = setup(StashConfig::default());
        let watcher = Arc::new(watcher);
        assert!(matches!(watcher.start(), Err(ClipStashError::ClipboardError(_))));
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_set_interval_while_stopped_updates_config() {
        let (_, _, watcher) = setup(StashConfig::default());
        assert_eq!(watcher.set_interval(2.0), Duration::from_secs(2));
        assert_eq!(watcher.store().config().poll_interval_secs, 2.0);
        assert_eq!(watcher.set_interval(0.0), Duration::from_millis(500));
        assert!(!watcher.is_running());
        assert_eq!(watcher.interval(), None);
    }
}
