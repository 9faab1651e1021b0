//! Transient Notifier: one-shot success/error messages per UI slot.
//!
//! Each slot owns at most one pending dismissal task. A new `show` on a slot aborts the
//! previous task outright, so only the latest notification's timer can hide the slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::view::SharedUi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Page-level message area.
    Main,
    /// Message area inside the login modal.
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: Kind,
    /// `None` stays visible until superseded or the slot is hidden.
    pub expires_after: Option<Duration>,
}

impl Notification {
    pub fn success<S: Into<String>>(text: S, after: Duration) -> Self {
        Self { text: text.into(), kind: Kind::Success, expires_after: Some(after) }
    }

    pub fn error<S: Into<String>>(text: S, after: Duration) -> Self {
        Self { text: text.into(), kind: Kind::Error, expires_after: Some(after) }
    }

    pub fn sticky_error<S: Into<String>>(text: S) -> Self {
        Self { text: text.into(), kind: Kind::Error, expires_after: None }
    }

    pub fn expires_after_ms(&self) -> Option<u64> {
        self.expires_after.map(|d| d.as_millis() as u64)
    }
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct Notifier {
    ui: SharedUi,
    pending: Arc<Mutex<HashMap<Slot, Pending>>>,
    generation: Arc<Mutex<u64>>,
}

impl Notifier {
    pub fn new(ui: SharedUi) -> Self {
        Self { ui, pending: Arc::new(Mutex::new(HashMap::new())), generation: Arc::new(Mutex::new(0)) }
    }

    /// Show `n` in `slot` now, replacing whatever is there, and schedule its dismissal.
    pub fn show(&self, slot: Slot, n: Notification) {
        let generation = {
            let mut g = self.generation.lock();
            *g += 1;
            *g
        };
        let expires = n.expires_after;
        debug!(target: "signup::notifier", ?slot, kind = ?n.kind, expires_ms = ?n.expires_after_ms(), "show");

        // lock order is pending then ui, same as the dismissal task
        let mut pending = self.pending.lock();
        if let Some(prev) = pending.remove(&slot) {
            prev.handle.abort();
        }
        self.ui.update(|s| *s.message_mut(slot) = Some(n));
        let Some(after) = expires else { return };
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            warn!(target: "signup::notifier", ?slot, "no runtime; notification will not auto-dismiss");
            return;
        };
        let ui = self.ui.clone();
        let pending_map = self.pending.clone();
        let handle = rt.spawn(async move {
            tokio::time::sleep(after).await;
            let mut map = pending_map.lock();
            // an abort can lose the race once the sleep has fired; a newer show has already
            // replaced the entry under this lock, so the generation check settles it
            if map.get(&slot).map(|p| p.generation) == Some(generation) {
                map.remove(&slot);
                ui.update(|s| *s.message_mut(slot) = None);
            }
        });
        pending.insert(slot, Pending { generation, handle });
    }

    /// Hide the slot immediately and drop its pending dismissal.
    pub fn hide(&self, slot: Slot) {
        let mut pending = self.pending.lock();
        if let Some(prev) = pending.remove(&slot) {
            prev.handle.abort();
        }
        self.ui.update(|s| *s.message_mut(slot) = None);
    }

    pub fn visible(&self, slot: Slot) -> Option<Notification> {
        self.ui.snapshot().message(slot).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn hides_after_expiry() {
        let n = Notifier::new(SharedUi::new());
        n.show(Slot::Main, Notification::error("Please login to register students.", Duration::from_millis(3000)));
        assert!(n.visible(Slot::Main).is_some());
        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert!(n.visible(Slot::Main).is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(n.visible(Slot::Main).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_show_cancels_earlier_timer() {
        let n = Notifier::new(SharedUi::new());
        n.show(Slot::Main, Notification::error("first", Duration::from_millis(3000)));
        tokio::time::sleep(Duration::from_millis(2000)).await;
        n.show(Slot::Main, Notification::success("second", Duration::from_millis(5000)));
        // the first timer would have fired at t=3000
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(n.visible(Slot::Main).map(|m| m.text), Some("second".to_string()));
        tokio::time::sleep(Duration::from_millis(3501)).await;
        assert!(n.visible(Slot::Main).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slots_are_independent() {
        let n = Notifier::new(SharedUi::new());
        n.show(Slot::Login, Notification::sticky_error("Invalid credentials"));
        n.show(Slot::Main, Notification::success("Welcome", Duration::from_millis(3000)));
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert!(n.visible(Slot::Main).is_none());
        assert_eq!(n.visible(Slot::Login).map(|m| m.kind), Some(Kind::Error));
        n.hide(Slot::Login);
        assert!(n.visible(Slot::Login).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn expiring_timer_never_hides_a_newer_message() {
        let n = Notifier::new(SharedUi::new());
        for i in 0..200u32 {
            n.show(Slot::Main, Notification::success("old", Duration::from_micros(u64::from(i % 7) * 50)));
            if i % 2 == 0 { tokio::task::yield_now().await; }
            n.show(Slot::Main, Notification::sticky_error(format!("new {}", i)));
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert_eq!(n.visible(Slot::Main).map(|m| m.text), Some(format!("new {}", i)));
        }
    }

    #[test]
    fn show_without_runtime_stays_visible() {
        let n = Notifier::new(SharedUi::new());
        n.show(Slot::Main, Notification::success("ok", Duration::from_millis(10)));
        assert_eq!(n.visible(Slot::Main).and_then(|m| m.expires_after_ms()), Some(10));
    }
}
