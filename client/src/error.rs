//! Error types for the credential engine.
//!
//! Every engine operation that can fail returns a [`VeloError`]. The enum
//! is exhaustive over the failure modes of the challenge and credential
//! flows; store-level failures carry their own [`StoreError`](crate::store::StoreError)
//! and are wrapped in transit.
//!
//! Two variants deserve special caller attention: [`VeloError::MissingSecret`]
//! and [`VeloError::CryptoConfig`] indicate a broken initialization sequence
//! or bad provisioned key material. Retrying them blindly will fail forever;
//! they require operator intervention.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during challenge issuance, credential
/// construction, or an orchestrated account operation.
#[derive(Debug, Error)]
pub enum VeloError {
    /// An input failed shape validation (device id, address, amount).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Token or K0 was absent when an operation required it. Fatal: the
    /// initialization sequence did not run, or the backing store was
    /// wiped out from under an already-provisioned device.
    #[error("missing device secret '{0}': initialization did not run")]
    MissingSecret(&'static str),

    /// The requested operation is declared but not implemented (e.g. the
    /// `rotate` challenge type).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Provisioned key material is malformed (bad PEM, non-RSA key,
    /// undecodable secret). Fatal until the configuration is fixed.
    #[error("crypto configuration error: {0}")]
    CryptoConfig(String),

    /// A cipher operation failed at runtime. Deliberately vague; the
    /// distinction between failure causes is nobody's business but ours.
    #[error("encryption failed")]
    EncryptFailed,

    /// The referenced account is not known to the payment-service
    /// provider. Raised by the PSP collaborator, propagated unchanged.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The interactive PIN provider shut down or declined to produce a
    /// PIN. The whole operation aborts; nothing partial is retained.
    #[error("PIN entry unavailable: provider closed or cancelled")]
    PinUnavailable,

    /// The backing key-value store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Any other failure reported by the PSP collaborator (transport
    /// faults, rejected correlation tokens, switch-side declines).
    #[error("switch error: {0}")]
    Switch(String),
}
