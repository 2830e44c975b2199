//! # Credential Cipher
//!
//! Turns a transaction descriptor plus a PIN into the verifier-opaque
//! credential block an account operation submits to the switch. This is
//! the pipeline the rest of the crate exists to feed:
//!
//! ```text
//! salt      = amountOrEmpty|txnId|payerAddr|payeeAddr|appId|mobile|deviceId|credType
//! iv        = 16 fresh random bytes
//! saltHash  = SHA-256( iv || salt )
//! sealed    = AES-256-GCM( saltHash, key = K0, nonce = iv )      // ct || tag
//! envelope  = pin|txnId|base64(sealed)|base64(iv)
//! wire      = <version> "|" base64( RSA_OAEP_SHA256( envelope ) )
//! ```
//!
//! Every byte of this is interop contract. The salt's field order and its
//! empty-string placeholder for an absent amount are fixed: the verifier
//! rebuilds the same string from its copy of the transaction and compares
//! digests. The IV is hashed *before* the salt bytes. The GCM tag rides
//! appended to the ciphertext. Deviate anywhere and credentials fail
//! verification with no diagnostic better than "invalid".
//!
//! ## PIN containment
//!
//! The raw PIN exists in exactly one place: the envelope string, which
//! lives in zeroized memory for the microseconds between formatting and
//! the OAEP wrap, and is never logged, persisted, or returned. The block
//! handed back to the caller carries only ciphertext the switch can open.
//!
//! The block structure is open-ended on the wire (method -> type ->
//! payload), but this engine supports exactly one method: `PIN`/`MPIN`.
//! The method and subtype tags are closed enums; a future credential
//! method is a new variant and a new arm, not a stringly-typed hole.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zeroize::Zeroizing;

use crate::crypto::{encrypt_with_iv, generate_iv, sha256_multi, WrappingKey};
use crate::error::VeloError;
use crate::pin::Pin;
use crate::secrets::SecretStore;
use crate::types::{CredType, CredentialRequest};

// ---------------------------------------------------------------------------
// Salt
// ---------------------------------------------------------------------------

/// The deterministic per-transaction salt: eight descriptor fields joined
/// with `|` in fixed order. Recomputed per call, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt(String);

impl Salt {
    /// The salt as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Build the salt for a descriptor.
///
/// An absent amount contributes an empty string, NOT a dropped field:
/// the balance-inquiry salt starts with a bare `|` and always has the
/// same eight positions as a payment salt.
pub fn build_salt(req: &CredentialRequest) -> Salt {
    let amount = req
        .txn_amount
        .as_ref()
        .map(|a| a.value.as_str())
        .unwrap_or("");
    Salt(format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        amount,
        req.txn_id,
        req.payer_addr,
        req.payee_addr,
        req.app_id,
        req.mobile_number,
        req.device_id,
        req.cred_type,
    ))
}

// ---------------------------------------------------------------------------
// Credential Block
// ---------------------------------------------------------------------------

/// Supported credential methods. One today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredMethod {
    /// PIN-based authorization.
    #[serde(rename = "PIN")]
    Pin,
}

/// Supported credential sub-types under [`CredMethod::Pin`]. One today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredSubType {
    /// The mobile transaction PIN.
    #[serde(rename = "MPIN")]
    Mpin,
}

/// The finished, verifier-opaque credential structure.
///
/// Serializes to the exact nested shape the switch expects:
///
/// ```text
/// { "credBlocks": { "MPIN": { "<credType>": {
///     "type": "PIN", "subType": "MPIN",
///     "data": { "code", "ki", "encryptedBase64String",
///               "hmac": null, "oda": null, "pid": null,
///               "skey": null, "type": null } } } } }
/// ```
///
/// Built fresh per call; contains no secret material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialBlock {
    /// Credential payloads keyed by method tag.
    #[serde(rename = "credBlocks")]
    pub cred_blocks: CredBlocks,
}

/// The method-keyed layer. Only the MPIN method exists, so it is a named
/// field rather than a free-form map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredBlocks {
    /// MPIN credential entries, keyed by the descriptor's credential type.
    #[serde(rename = "MPIN")]
    pub mpin: BTreeMap<CredType, CredBlockEntry>,
}

/// One credential entry: method/subtype tags plus the payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredBlockEntry {
    /// Credential method tag.
    #[serde(rename = "type")]
    pub method: CredMethod,
    /// Credential sub-type tag.
    #[serde(rename = "subType")]
    pub sub_type: CredSubType,
    /// Key metadata and the encrypted credential itself.
    pub data: CredBlockData,
}

/// The credential payload. `code` and `ki` identify which provisioned
/// switch key wrapped the envelope; they are static configuration carried
/// verbatim, not derived. The trailing `Option` fields are legacy slots
/// other credential methods once used -- the switch requires them present
/// and null.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredBlockData {
    /// Key code of the provisioned switch key.
    pub code: String,
    /// Key index of the provisioned switch key.
    pub ki: String,
    /// `<version>|base64(OAEP(envelope))` -- the credential itself.
    #[serde(rename = "encryptedBase64String")]
    pub encrypted_base64_string: String,
    /// Legacy slot, always null.
    pub hmac: Option<String>,
    /// Legacy slot, always null.
    pub oda: Option<String>,
    /// Legacy slot, always null.
    pub pid: Option<String>,
    /// Legacy slot, always null.
    pub skey: Option<String>,
    /// Legacy slot, always null.
    #[serde(rename = "type")]
    pub legacy_type: Option<String>,
}

impl CredentialBlock {
    /// Assemble an MPIN block for one credential type.
    pub(crate) fn mpin(cred_type: CredType, code: &str, ki: &str, encrypted: String) -> Self {
        let entry = CredBlockEntry {
            method: CredMethod::Pin,
            sub_type: CredSubType::Mpin,
            data: CredBlockData {
                code: code.to_string(),
                ki: ki.to_string(),
                encrypted_base64_string: encrypted,
                hmac: None,
                oda: None,
                pid: None,
                skey: None,
                legacy_type: None,
            },
        };
        let mut mpin = BTreeMap::new();
        mpin.insert(cred_type, entry);
        Self {
            cred_blocks: CredBlocks { mpin },
        }
    }

    /// The entry for a credential type, if the block carries one.
    pub fn entry(&self, cred_type: CredType) -> Option<&CredBlockEntry> {
        self.cred_blocks.mpin.get(&cred_type)
    }
}

// ---------------------------------------------------------------------------
// CredentialCipher
// ---------------------------------------------------------------------------

/// The credential construction pipeline, bound to the secret store and
/// the switch's provisioned wrapping key.
pub struct CredentialCipher {
    secrets: SecretStore,
    switch_key: WrappingKey,
    version: String,
    key_code: String,
    key_index: String,
}

impl CredentialCipher {
    /// Bind the cipher to its collaborators and static key metadata.
    pub fn new(
        secrets: SecretStore,
        switch_key: WrappingKey,
        version: impl Into<String>,
        key_code: impl Into<String>,
        key_index: impl Into<String>,
    ) -> Self {
        Self {
            secrets,
            switch_key,
            version: version.into(),
            key_code: key_code.into(),
            key_index: key_index.into(),
        }
    }

    /// Build the credential block for a descriptor and PIN.
    ///
    /// Fresh randomness (IV, OAEP seed) makes the output different on
    /// every call, including byte-identical inputs -- required, not
    /// incidental. No observable side effects; the PIN and envelope are
    /// gone when this returns.
    ///
    /// # Errors
    ///
    /// - [`VeloError::MissingSecret`] -- K0 absent. Fatal; the device was
    ///   never initialized.
    /// - [`VeloError::EncryptFailed`] -- a cipher layer failed (in
    ///   practice: a switch key too small for the envelope).
    pub async fn issue(
        &self,
        req: &CredentialRequest,
        pin: &Pin,
    ) -> Result<CredentialBlock, VeloError> {
        let k0 = self
            .secrets
            .k0()
            .await?
            .ok_or(VeloError::MissingSecret("k0"))?;

        let salt = build_salt(req);
        let iv = generate_iv();
        let salt_hash = sha256_multi(&[&iv, salt.as_str().as_bytes()]);
        let sealed = encrypt_with_iv(k0.as_bytes(), &iv, &salt_hash)?;

        // The one existence of the raw PIN outside its provider: zeroized
        // on drop, never logged, dead before this function returns.
        let envelope = Zeroizing::new(format!(
            "{}|{}|{}|{}",
            pin.expose(),
            req.txn_id,
            B64.encode(&sealed),
            B64.encode(iv),
        ));
        let encrypted = self.switch_key.encrypt_base64(envelope.as_bytes())?;

        let framed = format!("{}|{}", self.version, encrypted);
        tracing::debug!(txn_id = %req.txn_id, cred_type = %req.cred_type, "credential block issued");
        Ok(CredentialBlock::mpin(
            req.cred_type,
            &self.key_code,
            &self.key_index,
            framed,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
