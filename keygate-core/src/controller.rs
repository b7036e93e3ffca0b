// SPDX-License-Identifier: MIT

//! Key-gate state machine
//!
//! The controller owns the whole key lifecycle: referrer gating, generation,
//! persistence, lazy expiration, revocation, clipboard copy, and the countdown
//! handle. It renders into a [`GateView`] so a frontend has a single rendering
//! function driven by state instead of scattered visibility toggles.
//!
//! Storage is the source of truth: every operation re-reads the slot rather than
//! trusting an in-memory copy, and any read of an expired or malformed slot
//! deletes it.

use crate::clock::Clock;
use crate::config::GateConfig;
use crate::countdown::Countdown;
use crate::gate::ReferrerGate;
use crate::store::KeyStore;
use crate::token::{generate_key, AccessKey};
use crate::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Clipboard capability; failures are deliberately unobserved by the UI
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Blocking confirmation dialog; revocation proceeds only on an affirmative answer
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// UI-visible states of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Referrer invalid; terminal for the session
    GateClosed,
    /// Gate open, no stored valid key
    NoKey,
    /// Gate open, valid key present
    HasKey,
}

/// Render description for the frontend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// Only the referrer warning is visible
    Closed,
    /// The generate control is visible
    Locked,
    /// Key display, copy and revoke controls, and the live countdown are visible
    Unlocked { key: String, remaining: String },
}

const REVOKE_PROMPT: &str =
    "Are you sure you want to revoke this key? This action cannot be undone.";

/// The key-gate controller
pub struct KeyGateController {
    config: GateConfig,
    store: Box<dyn KeyStore>,
    clock: Box<dyn Clock>,
    clipboard: Box<dyn Clipboard>,
    confirm: Box<dyn ConfirmPrompt>,
    gate_open: bool,
    countdown: Countdown,
    ticks: UnboundedSender<()>,
}

impl KeyGateController {
    /// Build the controller, evaluating the referrer gate once for the session
    pub fn new(
        config: GateConfig,
        store: Box<dyn KeyStore>,
        clock: Box<dyn Clock>,
        clipboard: Box<dyn Clipboard>,
        confirm: Box<dyn ConfirmPrompt>,
        referrer: Option<&str>,
        ticks: UnboundedSender<()>,
    ) -> Self {
        let gate_open = ReferrerGate::new(&config.trusted_domain).is_valid(referrer);
        Self {
            config,
            store,
            clock,
            clipboard,
            confirm,
            gate_open,
            countdown: Countdown::new(),
            ticks,
        }
    }

    pub fn gate_open(&self) -> bool {
        self.gate_open
    }

    pub fn countdown_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    /// Current state, derived from the gate and a fresh storage read
    pub fn state(&mut self) -> GateState {
        if !self.gate_open {
            return GateState::GateClosed;
        }
        match self.load_key() {
            Some(_) => GateState::HasKey,
            None => GateState::NoKey,
        }
    }

    /// Read the slot, purging expired or malformed contents (lazy expiration)
    ///
    /// This is the only read path; storage faults and junk both degrade to absent.
    pub fn load_key(&mut self) -> Option<AccessKey> {
        let raw = match self.store.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Slot read failed, treating as absent: {}", e);
                return None;
            }
        };

        let key = match AccessKey::from_json(&raw) {
            Ok(key) => key,
            Err(e) => {
                warn!("Malformed slot contents, clearing: {}", e);
                self.clear_slot();
                return None;
            }
        };

        if key.is_expired(self.clock.now_ms()) {
            debug!("Stored key expired, purging");
            self.clear_slot();
            return None;
        }

        Some(key)
    }

    /// Persist a key with the fixed 24-hour expiration, overwriting any previous one
    pub fn persist_key(&mut self, key: String) -> Result<AccessKey> {
        let access = AccessKey::issue(key, self.clock.now_ms());
        self.store.write(&access.to_json()?)?;
        Ok(access)
    }

    /// Re-read the key and synchronize the view and the countdown
    pub fn refresh(&mut self) -> GateView {
        if !self.gate_open {
            return GateView::Closed;
        }

        match self.load_key() {
            Some(access) => {
                let remaining = access.format_remaining(self.clock.now_ms());
                self.countdown
                    .arm(self.config.tick_interval(), self.ticks.clone());
                GateView::Unlocked {
                    key: access.key,
                    remaining,
                }
            }
            None => {
                self.countdown.disarm();
                GateView::Locked
            }
        }
    }

    /// Generate and persist a new key (explicit user action; overwrites silently)
    pub fn generate(&mut self) -> GateView {
        if !self.gate_open {
            return GateView::Closed;
        }

        let key = generate_key();
        if let Err(e) = self.persist_key(key) {
            warn!("Failed to persist generated key: {}", e);
        }
        self.refresh()
    }

    /// Revoke the stored key after interactive confirmation
    ///
    /// A declined confirmation leaves the key intact; this is a normal negative
    /// branch, not an error.
    pub fn revoke(&mut self) -> GateView {
        if !self.gate_open {
            return GateView::Closed;
        }

        if self.confirm.confirm(REVOKE_PROMPT) {
            self.clear_slot();
        }
        self.refresh()
    }

    /// Copy the stored key to the clipboard
    ///
    /// Returns true when a key was present and the copy was attempted. Clipboard
    /// failures are unobserved; success is assumed.
    pub fn copy_key(&mut self) -> bool {
        if !self.gate_open {
            return false;
        }

        let Some(access) = self.load_key() else {
            return false;
        };

        if let Err(e) = self.clipboard.set_text(&access.key) {
            debug!("Clipboard copy failed: {}", e);
        }
        true
    }

    /// Handle a countdown tick: recompute remaining time, purge on observed expiry
    ///
    /// On expiry the ticker cancels itself and the view transitions to locked.
    pub fn handle_tick(&mut self) -> GateView {
        if !self.gate_open {
            return GateView::Closed;
        }

        match self.load_key() {
            Some(access) => GateView::Unlocked {
                remaining: access.format_remaining(self.clock.now_ms()),
                key: access.key,
            },
            None => {
                self.countdown.disarm();
                GateView::Locked
            }
        }
    }

    fn clear_slot(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear slot: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{KeyStore, MemoryStore};
    use crate::{KEY_ALPHABET, KEY_LENGTH, KEY_TTL_MS};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct StaticConfirm(bool);

    impl ConfirmPrompt for StaticConfirm {
        fn confirm(&self, _prompt: &str) -> bool {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct RecordingClipboard {
        copied: std::sync::Arc<parking_lot::RwLock<Option<String>>>,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&self, text: &str) -> crate::Result<()> {
            *self.copied.write() = Some(text.to_string());
            Ok(())
        }
    }

    struct FailingClipboard;

    impl Clipboard for FailingClipboard {
        fn set_text(&self, _text: &str) -> crate::Result<()> {
            Err(crate::Error::Clipboard("no display".to_string()))
        }
    }

    struct Harness {
        controller: KeyGateController,
        store: MemoryStore,
        clock: ManualClock,
        ticks: UnboundedReceiver<()>,
        clipboard: RecordingClipboard,
    }

    fn harness_with(referrer: Option<&str>, confirm: bool) -> Harness {
        let store = MemoryStore::new();
        let clock = ManualClock::new(1_700_000_000_000);
        let clipboard = RecordingClipboard::default();
        let (tx, rx) = unbounded_channel();

        let controller = KeyGateController::new(
            GateConfig::default(),
            Box::new(store.clone()),
            Box::new(clock.clone()),
            Box::new(clipboard.clone()),
            Box::new(StaticConfirm(confirm)),
            referrer,
            tx,
        );

        Harness {
            controller,
            store,
            clock,
            ticks: rx,
            clipboard,
        }
    }

    fn harness() -> Harness {
        harness_with(None, true)
    }

    #[test]
    fn test_referrer_gating() {
        assert!(harness_with(None, true).controller.gate_open());
        assert!(harness_with(Some("https://linkvertise.com/x"), true)
            .controller
            .gate_open());
        assert!(harness_with(Some("http://localhost:8000"), true)
            .controller
            .gate_open());

        let mut h = harness_with(Some("https://evil.example.com"), true);
        assert!(!h.controller.gate_open());
        assert_eq!(h.controller.state(), GateState::GateClosed);
        assert_eq!(h.controller.refresh(), GateView::Closed);
        // No key operations possible behind a closed gate
        assert_eq!(h.controller.generate(), GateView::Closed);
        assert!(!h.controller.copy_key());
        assert_eq!(h.store.read().unwrap(), None);
    }

    #[tokio::test]
    async fn test_generate_transitions_to_has_key() {
        let mut h = harness();
        assert_eq!(h.controller.state(), GateState::NoKey);

        let view = h.controller.generate();
        let GateView::Unlocked { key, remaining } = view else {
            panic!("expected unlocked view, got {:?}", view);
        };
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)));
        assert_eq!(remaining, "Expires in 24h 0m");
        assert_eq!(h.controller.state(), GateState::HasKey);
        assert!(h.controller.countdown_armed());
    }

    #[tokio::test]
    async fn test_regenerate_overwrites() {
        let mut h = harness();
        let GateView::Unlocked { key: first, .. } = h.controller.generate() else {
            panic!("expected unlocked view");
        };
        let GateView::Unlocked { key: second, .. } = h.controller.generate() else {
            panic!("expected unlocked view");
        };
        // Previous key is discarded, the slot holds only the latest
        let stored = AccessKey::from_json(&h.store.read().unwrap().unwrap()).unwrap();
        assert_eq!(stored.key, second);
        assert_ne!(stored.key, first);
    }

    #[test]
    fn test_persist_load_round_trip() {
        let mut h = harness();
        let persisted = h.controller.persist_key("A".repeat(KEY_LENGTH)).unwrap();
        let loaded = h.controller.load_key().unwrap();
        assert_eq!(loaded, persisted);
        assert_eq!(loaded.expiration, h.clock.now_ms() + KEY_TTL_MS);
    }

    #[test]
    fn test_lazy_expiration_is_idempotent() {
        let mut h = harness();
        h.controller.persist_key("A".repeat(KEY_LENGTH)).unwrap();

        h.clock.advance(KEY_TTL_MS + 1);
        assert_eq!(h.controller.load_key(), None);
        assert_eq!(h.store.read().unwrap(), None);

        // Reading again is a no-op with no residual state
        assert_eq!(h.controller.load_key(), None);
        assert_eq!(h.store.read().unwrap(), None);
    }

    #[test]
    fn test_key_readable_at_exact_expiration() {
        let mut h = harness();
        h.controller.persist_key("A".repeat(KEY_LENGTH)).unwrap();
        h.clock.advance(KEY_TTL_MS);
        // Valid through the expiration instant; displayed as Expired
        let key = h.controller.load_key().unwrap();
        assert_eq!(key.format_remaining(h.clock.now_ms()), "Expired");
    }

    #[test]
    fn test_malformed_slot_cleared() {
        let mut h = harness();
        h.store.write("{ not json").unwrap();
        assert_eq!(h.controller.load_key(), None);
        assert_eq!(h.store.read().unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_declined_keeps_key() {
        let mut h = harness_with(None, false);
        h.controller.generate();

        let view = h.controller.revoke();
        assert!(matches!(view, GateView::Unlocked { .. }));
        assert_eq!(h.controller.state(), GateState::HasKey);
        assert!(h.store.read().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_confirmed_clears_key() {
        let mut h = harness_with(None, true);
        h.controller.generate();

        assert_eq!(h.controller.revoke(), GateView::Locked);
        assert_eq!(h.controller.state(), GateState::NoKey);
        assert_eq!(h.store.read().unwrap(), None);
        assert!(!h.controller.countdown_armed());
    }

    #[tokio::test]
    async fn test_copy_key() {
        let mut h = harness();
        assert!(!h.controller.copy_key());

        let GateView::Unlocked { key, .. } = h.controller.generate() else {
            panic!("expected unlocked view");
        };
        assert!(h.controller.copy_key());
        assert_eq!(h.clipboard.copied.read().as_deref(), Some(key.as_str()));
    }

    #[tokio::test]
    async fn test_clipboard_failure_is_silent() {
        let store = MemoryStore::new();
        let (tx, _rx) = unbounded_channel();
        let mut controller = KeyGateController::new(
            GateConfig::default(),
            Box::new(store),
            Box::new(ManualClock::new(0)),
            Box::new(FailingClipboard),
            Box::new(StaticConfirm(true)),
            None,
            tx,
        );
        controller.generate();
        // Failure is unobserved; success is assumed
        assert!(controller.copy_key());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_refresh_keeps_single_timer() {
        let mut h = harness();
        h.controller.generate();

        h.controller.refresh();
        h.controller.refresh();
        assert!(h.controller.countdown_armed());
        // Let the surviving ticker task start before moving time
        tokio::task::yield_now().await;

        tokio::time::advance(GateConfig::default().tick_interval()).await;
        tokio::task::yield_now().await;

        // Exactly one ticker fired, not one per refresh
        assert!(h.ticks.try_recv().is_ok());
        assert!(h.ticks.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tick_detects_expiry_and_purges() {
        let mut h = harness();
        h.controller.generate();

        h.clock.advance(30 * 60 * 1000);
        let view = h.controller.handle_tick();
        assert!(
            matches!(&view, GateView::Unlocked { remaining, .. } if remaining == "Expires in 23h 30m")
        );

        h.clock.advance(KEY_TTL_MS);
        assert_eq!(h.controller.handle_tick(), GateView::Locked);
        assert_eq!(h.store.read().unwrap(), None);
        assert!(!h.controller.countdown_armed());
    }
}
