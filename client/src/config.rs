//! # Protocol Configuration & Constants
//!
//! Every magic number in VELO lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are wire contract with the payment switch. Changing
//! them unilaterally doesn't break your build; it breaks interop with a
//! verifier you don't control, which is worse.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Credential Framing
// ---------------------------------------------------------------------------

/// Default version tag prefixed (pipe-separated) to every encrypted
/// challenge and credential string. The verifier dispatches on this tag
/// before attempting decryption.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2.0";

/// Number of pipe-joined fields in the credential salt. The switch
/// recomputes the salt on its side with the same field order; a mismatch
/// here means every credential fails verification.
pub const SALT_FIELD_COUNT: usize = 8;

/// Number of pipe-delimited fields in the credential envelope:
/// `pin|txnId|b64(sealed salt hash)|b64(iv)`.
pub const ENVELOPE_FIELD_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Length in bytes of each long-lived device secret (Token, K0).
pub const SECRET_LENGTH: usize = 32;

/// Length of a device secret once hex-encoded for persistence and framing.
pub const SECRET_HEX_LENGTH: usize = SECRET_LENGTH * 2;

/// Length of a device identifier in hex characters (16 bytes). Challenge
/// issuance rejects anything else.
pub const DEVICE_ID_LENGTH: usize = 32;

/// AES-256-GCM for the inner credential layer. 256-bit keys (K0 raw bytes).
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// Credential IV length in bytes. The switch contract uses 16-byte IVs,
/// not GCM's usual 12. Sixteen. The IV travels beside the ciphertext in
/// the envelope, so both sides agree without negotiation.
pub const CRED_IV_LENGTH: usize = 16;

/// AES-256-GCM authentication tag length in bytes, appended to the
/// ciphertext in the envelope.
pub const AES_TAG_LENGTH: usize = 16;

/// SHA-256 digest length in bytes. The salt hash is always exactly this
/// long, so the sealed inner layer is always digest + tag bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// RSA-OAEP with SHA-256 digest and MGF1-SHA-256 mask, for both the
/// challenge (verifier certificate) and the credential envelope (switch
/// public key). Matches `RSA/ECB/OAEPwithSHA-256andMGF1Padding` on the
/// verifier side.
pub const WRAPPING_ALGORITHM: &str = "RSA-OAEP-SHA256";

// ---------------------------------------------------------------------------
// Store Layout
// ---------------------------------------------------------------------------

/// Backing-store bucket holding the device secrets.
pub const ENGINE_BUCKET: &str = "secrets";

/// Key under [`ENGINE_BUCKET`] for the device token.
pub const KEY_TOKEN: &str = "token";

/// Key under [`ENGINE_BUCKET`] for K0.
pub const KEY_K0: &str = "k0";

/// Bucket-name prefix for PSP-owned state; the PSP's own id is appended so
/// two providers sharing a store never collide.
pub const PSP_BUCKET_PREFIX: &str = "psp/";

// ---------------------------------------------------------------------------
// Switch Parameters
// ---------------------------------------------------------------------------

/// Static configuration provisioned by the payment network. Supplied, not
/// computed: the engine carries these values verbatim into challenges and
/// credential blocks.
///
/// The key code and key index identify which provisioned switch key was
/// used for the envelope wrap, so the verifier can pick the matching
/// private key. They are opaque to this engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwitchParams {
    /// Version tag for challenge and credential framing.
    #[serde(default = "default_version")]
    pub version: String,

    /// PEM X.509 certificate of the verifying authority. Challenge
    /// plaintexts are encrypted for this certificate's public key. Test
    /// and demo provisioning may supply a bare SPKI public key instead.
    pub signer_certificate_pem: String,

    /// PEM SPKI RSA public key of the payment switch. Credential envelopes
    /// are encrypted for this key.
    pub switch_public_key_pem: String,

    /// Key code identifying the provisioned switch key. Carried verbatim
    /// into every credential block.
    pub key_code: String,

    /// Key index ("ki") of the provisioned switch key. Carried verbatim
    /// into every credential block.
    pub key_index: String,
}

fn default_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SECRET_LENGTH, 32);
        assert_eq!(SECRET_HEX_LENGTH, 64);
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(CRED_IV_LENGTH, 16);
        assert_eq!(AES_TAG_LENGTH, 16);
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
        // Secrets double as AES keys; if these ever diverge the credential
        // pipeline can't key the cipher from K0.
        assert_eq!(SECRET_LENGTH, AES_KEY_LENGTH);
    }

    #[test]
    fn test_device_id_is_hex_of_16_bytes() {
        assert_eq!(DEVICE_ID_LENGTH, 32);
        assert_eq!(DEVICE_ID_LENGTH % 2, 0);
    }

    #[test]
    fn test_switch_params_version_defaults() {
        let params: SwitchParams = serde_json::from_str(
            r#"{
                "signer_certificate_pem": "cert",
                "switch_public_key_pem": "key",
                "key_code": "NAC",
                "key_index": "20240101"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(params.version, DEFAULT_PROTOCOL_VERSION);
    }

    #[test]
    fn test_switch_params_explicit_version_wins() {
        let params: SwitchParams = serde_json::from_str(
            r#"{
                "version": "3.0",
                "signer_certificate_pem": "cert",
                "switch_public_key_pem": "key",
                "key_code": "NAC",
                "key_index": "20240101"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(params.version, "3.0");
    }
}
