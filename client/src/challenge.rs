//! # Device Challenge Issuance
//!
//! The initial authentication challenge is the one moment Token and K0
//! leave this device: both secrets plus the device identifier, encrypted
//! for the verifying authority's certificate and framed with the
//! protocol version. The verifier decrypts it out-of-band during
//! provisioning and from then on holds the only other copy of K0.
//!
//! ## Wire Format
//!
//! ```text
//! <version> "|" base64( RSA_OAEP_SHA256( token "|" k0 "|" deviceId ) )
//! ```
//!
//! Exact field order, exact pipe separators -- the verifier splits on `|`
//! and binds the three fields positionally.
//!
//! A challenge is ephemeral: computed, returned, forgotten. Nothing is
//! cached or persisted, and a failed call produces no partial output.
//!
//! The type surface declares a `rotate` challenge, but no rotation
//! protocol is defined anywhere; requesting it fails with an
//! unsupported-operation error rather than an invented scheme.

use std::fmt;
use std::str::FromStr;

use crate::config::DEVICE_ID_LENGTH;
use crate::crypto::WrappingKey;
use crate::error::VeloError;
use crate::secrets::SecretStore;

// ---------------------------------------------------------------------------
// Challenge Type
// ---------------------------------------------------------------------------

/// The kind of challenge requested from the verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeType {
    /// First-time device registration. The only implemented kind.
    Initial,
    /// Key rotation. Declared in the protocol surface, undefined in the
    /// protocol itself; always fails as unsupported.
    Rotate,
}

impl ChallengeType {
    /// The wire tag for this challenge type.
    pub const fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Initial => "initial",
            ChallengeType::Rotate => "rotate",
        }
    }
}

impl FromStr for ChallengeType {
    type Err = VeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(ChallengeType::Initial),
            "rotate" => Ok(ChallengeType::Rotate),
            other => Err(VeloError::Validation(format!(
                "unknown challenge type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChallengeIssuer
// ---------------------------------------------------------------------------

/// Builds device authentication challenges from the stored secrets and
/// the verifier's certificate key.
pub struct ChallengeIssuer {
    secrets: SecretStore,
    verifier: WrappingKey,
    version: String,
}

impl ChallengeIssuer {
    /// Bind the issuer to its secret store, the verifier's wrapping key,
    /// and the framing version tag.
    pub fn new(secrets: SecretStore, verifier: WrappingKey, version: impl Into<String>) -> Self {
        Self {
            secrets,
            verifier,
            version: version.into(),
        }
    }

    /// Issue a challenge for the given device identifier.
    ///
    /// # Errors
    ///
    /// - [`VeloError::Validation`] -- `device_id` is not exactly 32 hex
    ///   characters.
    /// - [`VeloError::MissingSecret`] -- Token or K0 is absent. Fatal:
    ///   the initialization sequence never ran; retrying cannot help.
    /// - [`VeloError::Unsupported`] -- any challenge type other than
    ///   [`ChallengeType::Initial`].
    pub async fn challenge(
        &self,
        challenge_type: ChallengeType,
        device_id: &str,
    ) -> Result<String, VeloError> {
        if device_id.len() != DEVICE_ID_LENGTH
            || !device_id.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(VeloError::Validation(format!(
                "device id must be exactly {DEVICE_ID_LENGTH} hex characters"
            )));
        }

        let token = self
            .secrets
            .token()
            .await?
            .ok_or(VeloError::MissingSecret("token"))?;
        let k0 = self
            .secrets
            .k0()
            .await?
            .ok_or(VeloError::MissingSecret("k0"))?;

        match challenge_type {
            ChallengeType::Initial => {
                let plaintext = format!("{}|{}|{}", token.as_hex(), k0.as_hex(), device_id);
                let encoded = self.verifier.encrypt_base64(plaintext.as_bytes())?;
                tracing::debug!(device_id, "issued initial device challenge");
                Ok(format!("{}|{}", self.version, encoded))
            }
            ChallengeType::Rotate => Err(VeloError::Unsupported(
                "rotate challenge has no defined protocol".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
