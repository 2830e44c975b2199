//! # Payment-Service Provider Capability
//!
//! Everything that actually talks to the switch lives behind this trait:
//! account listing, address lookup, payment and collect transport,
//! transaction history. Production clients and test doubles implement
//! the same surface, so the engine never knows which it's wired to.
//!
//! ## The two-step credential handshake
//!
//! Operations that need a credential (balance inquiry, payment) are
//! split in half on purpose:
//!
//! 1. `begin_*` returns a [`PendingCredential`] -- a serializable
//!    transaction descriptor plus an opaque single-use correlation
//!    token. No closure, no captured state on the engine side.
//! 2. The engine builds the credential block (PIN stays inside the
//!    engine) and hands it to the matching `complete_*` call along with
//!    the token, which resolves to the operation's typed result.
//!
//! The boundary carries the descriptor outward and the opaque block
//! inward. The PIN and the credential envelope never cross it in either
//! direction -- that containment is the entire reason the split exists.
//!
//! Retry and backoff for flaky transport belong to implementations of
//! this trait, never to the engine above it.

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use mock::MockPsp;

use crate::credential::CredentialBlock;
use crate::error::VeloError;
use crate::store::StoreBucket;
use crate::types::{
    Account, AddressLookup, Amount, AmountValue, CollectRequest, CorrelationToken,
    CredentialRequest, PaymentOutcome, TxnRecord, Vpa,
};

/// Phase-one output of a credential-bearing operation: the descriptor
/// the cipher salts over, and the token that resumes the operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingCredential {
    /// Transaction descriptor for the credential cipher.
    pub request: CredentialRequest,
    /// Single-use handle for the matching `complete_*` call.
    pub token: CorrelationToken,
}

/// A payment-service provider client.
///
/// All methods may suspend on network I/O. Implementations own their
/// transport concerns (retries, timeouts); errors they surface are
/// propagated unchanged by the engine -- [`VeloError::AccountNotFound`]
/// in particular arrives here and is never remapped.
#[async_trait]
pub trait PspClient: Send + Sync {
    /// Stable provider identifier; also names the provider's store
    /// bucket, so it must be unique per provider.
    fn id(&self) -> &str;

    /// Hand the provider its private bucket. Called once during client
    /// initialization, before any operation.
    async fn init(&self, bucket: Arc<dyn StoreBucket>) -> Result<(), VeloError>;

    /// All bank accounts linked with this provider.
    async fn accounts(&self) -> Result<Vec<Account>, VeloError>;

    /// Start a balance inquiry on an account.
    async fn begin_balance(&self, account: &Account) -> Result<PendingCredential, VeloError>;

    /// Finish a balance inquiry with the constructed credential block.
    async fn complete_balance(
        &self,
        token: CorrelationToken,
        block: CredentialBlock,
    ) -> Result<AmountValue, VeloError>;

    /// Resolve a payment address.
    async fn lookup_address(&self, address: &Vpa) -> Result<AddressLookup, VeloError>;

    /// Start a payment from an account to a payee address.
    async fn begin_payment(
        &self,
        account: &Account,
        payee: &Vpa,
        amount: &Amount,
    ) -> Result<PendingCredential, VeloError>;

    /// Finish a payment with the constructed credential block.
    async fn complete_payment(
        &self,
        token: CorrelationToken,
        block: CredentialBlock,
    ) -> Result<PaymentOutcome, VeloError>;

    /// Send a collect (pull) request. No credential is constructed on
    /// this side; the payer approves on theirs.
    async fn collect(
        &self,
        account: &Account,
        request: &CollectRequest,
    ) -> Result<PaymentOutcome, VeloError>;

    /// Transaction history, newest first.
    async fn txn_history(&self) -> Result<Vec<TxnRecord>, VeloError>;

    /// A single transaction by id, if the provider knows it.
    async fn txn_by_id(&self, txn_id: &str) -> Result<Option<TxnRecord>, VeloError>;
}
