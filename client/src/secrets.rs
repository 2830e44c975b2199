//! # Device Secrets -- Token & K0
//!
//! Two long-lived 256-bit secrets anchor the whole protocol: the device
//! **Token** and **K0**. Both are minted on this device, disclosed to the
//! verifying authority exactly once (inside the initial challenge), and
//! then referenced forever after -- K0 keys every credential's inner AEAD
//! layer, and the verifier holds the only other copy.
//!
//! That "exactly once" is why generation is the one genuinely
//! concurrency-sensitive spot in the engine. If two initializers each
//! generate a K0 and the second overwrites the first, the device now
//! encrypts with a key the verifier never saw, and every credential it
//! produces is garbage that *looks* fine locally. So generation goes
//! through the store's compare-and-set: at most one generated value per
//! secret is ever persisted, and a losing initializer adopts the winner's
//! value.
//!
//! Secrets are persisted as lowercase hex. This engine never rotates
//! them; `rotate` is a declared-but-unimplemented challenge type.

use rand::RngCore;
use std::fmt;
use std::sync::Arc;

use crate::config::{KEY_K0, KEY_TOKEN, SECRET_HEX_LENGTH, SECRET_LENGTH};
use crate::error::VeloError;
use crate::store::StoreBucket;

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A 256-bit device secret, held in both its persisted form (lowercase
/// hex) and its raw bytes (the AEAD key form).
///
/// `Debug` is redacted. If a secret ends up in a log line, the log line
/// is the vulnerability.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    hex: String,
    bytes: [u8; SECRET_LENGTH],
}

impl Secret {
    /// Parse a persisted secret: exactly 64 lowercase hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::CryptoConfig`] for anything else -- a
    /// malformed persisted secret means the store was corrupted or
    /// foreign-written, and no credential built from it would verify.
    pub fn from_hex(hex: &str) -> Result<Self, VeloError> {
        let well_formed = hex.len() == SECRET_HEX_LENGTH
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(VeloError::CryptoConfig(format!(
                "secret is not {SECRET_HEX_LENGTH} lowercase hex characters"
            )));
        }

        let decoded = hex::decode(hex)
            .map_err(|e| VeloError::CryptoConfig(format!("undecodable secret: {e}")))?;
        let mut bytes = [0u8; SECRET_LENGTH];
        bytes.copy_from_slice(&decoded);

        Ok(Self {
            hex: hex.to_string(),
            bytes,
        })
    }

    /// Generate a fresh secret from the OS CSPRNG.
    fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            hex: hex::encode(bytes),
            bytes,
        }
    }

    /// The persisted/wire form: lowercase hex.
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// The raw key form, used to key the credential AEAD.
    pub fn as_bytes(&self) -> &[u8; SECRET_LENGTH] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// SecretStore
// ---------------------------------------------------------------------------

/// Owner of the Token/K0 lifecycle over one backing bucket.
///
/// Cloning shares the bucket handle; all clones see the same secrets.
/// No other component may generate or write these keys.
#[derive(Clone)]
pub struct SecretStore {
    bucket: Arc<dyn StoreBucket>,
}

impl SecretStore {
    /// Bind to a backing bucket. Performs no I/O; call [`init`](Self::init)
    /// before issuing challenges or credentials.
    pub fn new(bucket: Arc<dyn StoreBucket>) -> Self {
        Self { bucket }
    }

    /// Idempotently ensure both secrets exist, generating whichever are
    /// absent. Safe to call any number of times, from any number of
    /// concurrent initializers sharing the bucket: each secret is
    /// generated at most once, and racers adopt the first writer's value.
    ///
    /// # Errors
    ///
    /// Fails if the backing store is unavailable ([`VeloError::Store`])
    /// or an already-persisted value is malformed
    /// ([`VeloError::CryptoConfig`]). Either way the whole init fails;
    /// there is no fallback to ephemeral secrets.
    pub async fn init(&self) -> Result<(), VeloError> {
        self.ensure(KEY_TOKEN).await?;
        self.ensure(KEY_K0).await?;
        Ok(())
    }

    async fn ensure(&self, key: &'static str) -> Result<(), VeloError> {
        if let Some(existing) = self.bucket.get(key).await? {
            // Validate eagerly so a corrupted store fails init, not some
            // later credential call.
            Secret::from_hex(&existing)?;
            return Ok(());
        }

        let fresh = Secret::generate();
        let stored = self.bucket.set_if_absent(key, fresh.as_hex()).await?;
        if stored == fresh.as_hex() {
            tracing::info!(key, "generated device secret");
        } else {
            // Someone beat us between the get and the publish. Their
            // value is the bound one; ours is discarded unpersisted.
            Secret::from_hex(&stored)?;
            tracing::debug!(key, "lost generation race, adopting stored secret");
        }
        Ok(())
    }

    /// The device token, if set.
    pub async fn token(&self) -> Result<Option<Secret>, VeloError> {
        self.read(KEY_TOKEN).await
    }

    /// K0, if set.
    pub async fn k0(&self) -> Result<Option<Secret>, VeloError> {
        self.read(KEY_K0).await
    }

    /// Overwrite the device token. Exists to complete the store contract
    /// (restoring provisioned state); nothing in this engine rotates a
    /// live token.
    pub async fn set_token(&self, secret: &Secret) -> Result<(), VeloError> {
        Ok(self.bucket.set(KEY_TOKEN, secret.as_hex()).await?)
    }

    /// Overwrite K0. Same caveats as [`set_token`](Self::set_token).
    pub async fn set_k0(&self, secret: &Secret) -> Result<(), VeloError> {
        Ok(self.bucket.set(KEY_K0, secret.as_hex()).await?)
    }

    async fn read(&self, key: &str) -> Result<Option<Secret>, VeloError> {
        match self.bucket.get(key).await? {
            Some(hex) => Ok(Some(Secret::from_hex(&hex)?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
