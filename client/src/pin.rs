//! # PIN Capability
//!
//! The transaction PIN is the one secret this engine handles but never
//! owns: it arrives for a single credential construction, rides inside
//! the envelope, and must be gone -- unlogged, unpersisted, uncached --
//! the moment the outer encryption completes.
//!
//! Call sites depend only on the [`PinProvider`] trait, so a fixed PIN
//! (tests, kiosks) and an interactive prompt (real apps) are
//! interchangeable, including their suspension behavior: resolution may
//! block indefinitely on a human, and it holds no engine lock while it
//! does. Resolution happens fresh per operation; nothing here or
//! upstream caches a resolved PIN across calls.

use async_trait::async_trait;
use std::fmt;
use tokio::sync::{mpsc, Mutex};
use zeroize::Zeroizing;

use crate::error::VeloError;

// ---------------------------------------------------------------------------
// Pin
// ---------------------------------------------------------------------------

/// A transaction PIN. The backing memory is zeroed on drop, `Debug` is
/// redacted, and there is deliberately no `Display`: the only way to get
/// the digits out is [`expose`](Self::expose), which keeps accidental
/// formatting from leaking them.
#[derive(Clone)]
pub struct Pin(Zeroizing<String>);

impl Pin {
    /// Wrap a PIN entered by the user.
    pub fn new(pin: impl Into<String>) -> Self {
        Self(Zeroizing::new(pin.into()))
    }

    /// The PIN digits. Call this only at the envelope construction site.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Provider Capability
// ---------------------------------------------------------------------------

/// Source of transaction PINs, resolved fresh for every operation.
#[async_trait]
pub trait PinProvider: Send + Sync {
    /// Produce the PIN for the operation in flight. May suspend
    /// indefinitely (interactive entry); a provider that can no longer
    /// produce one returns [`VeloError::PinUnavailable`] and the whole
    /// operation aborts.
    async fn resolve_pin(&self) -> Result<Pin, VeloError>;
}

/// A fixed PIN. Hands out a fresh clone per call.
pub struct StaticPin {
    pin: Pin,
}

impl StaticPin {
    /// Create a provider that always resolves to `pin`.
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: Pin::new(pin),
        }
    }
}

#[async_trait]
impl PinProvider for StaticPin {
    async fn resolve_pin(&self) -> Result<Pin, VeloError> {
        Ok(self.pin.clone())
    }
}

/// An interactive provider backed by a channel: some UI task pushes a
/// PIN through the [`mpsc::Sender`] whenever the user finishes typing,
/// and `resolve_pin` suspends until one arrives. Dropping the sender
/// (user dismissed the prompt, app shutting down) resolves every pending
/// and future call to [`VeloError::PinUnavailable`].
pub struct ChannelPin {
    rx: Mutex<mpsc::Receiver<Pin>>,
}

impl ChannelPin {
    /// Create the provider and the sender half the UI keeps.
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<Pin>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { rx: Mutex::new(rx) }, tx)
    }
}

#[async_trait]
impl PinProvider for ChannelPin {
    async fn resolve_pin(&self) -> Result<Pin, VeloError> {
        // The mutex serializes concurrent resolutions so each delivered
        // PIN goes to exactly one operation.
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(VeloError::PinUnavailable)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
