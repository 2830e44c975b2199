//! # Mock Provider
//!
//! An in-process test double for the switch side of the protocol. It
//! validates the same things a real provider would (known accounts,
//! live correlation tokens, a credential block that actually carries the
//! right credential type) and answers with fixed fixtures: a three-
//! account portfolio, a small address directory, a balance of `12.00`,
//! and the retrieval reference number `112233445566`.
//!
//! The mock never decrypts anything -- it can't, it holds no private
//! keys -- which mirrors production exactly: the provider forwards the
//! opaque block to the switch and relays the verdict. Here the verdict
//! is always success.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{PendingCredential, PspClient};
use crate::credential::CredentialBlock;
use crate::error::VeloError;
use crate::store::StoreBucket;
use crate::types::{
    Account, AddressLookup, Amount, AmountValue, CollectRequest, CorrelationToken,
    CredentialRequest, CredType, PaymentOutcome, TxnRecord, TxnStatus, Vpa,
};

/// Fixed balance every inquiry resolves to.
const MOCK_BALANCE: &str = "12.00";

/// Fixed retrieval reference number for settled operations.
const MOCK_RRN: &str = "112233445566";

/// App identifier the mock stamps into descriptors.
const MOCK_APP_ID: &str = "mock.psp";

/// Mobile number bound to all mock accounts.
const MOCK_MOBILE: &str = "9876543210";

/// The payer address behind every mock account.
const MOCK_PAYER_ADDR: &str = "9876543210@mockpsp";

/// What kind of operation a correlation token belongs to.
enum PendingKind {
    Balance,
    Payment,
}

/// A phase-one operation parked until its `complete_*` call.
struct PendingOp {
    kind: PendingKind,
    request: CredentialRequest,
}

/// The mock payment-service provider.
pub struct MockPsp {
    /// Operations between their begin and complete calls, keyed by
    /// correlation token. Entries are removed on completion, which is
    /// what makes the tokens single-use.
    pending: DashMap<CorrelationToken, PendingOp>,
    /// Completed transactions, newest last.
    history: Mutex<Vec<TxnRecord>>,
}

impl MockPsp {
    /// Create a fresh mock with empty history.
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// The fixture accounts.
    fn fixture_accounts() -> Vec<Account> {
        vec![
            Account {
                id: "account1".to_string(),
                label: "Account 1".to_string(),
                description: Some("Set transaction PIN".to_string()),
            },
            Account {
                id: "account2".to_string(),
                label: "Account 2".to_string(),
                description: None,
            },
            Account {
                id: "account3".to_string(),
                label: "Account 3".to_string(),
                description: None,
            },
        ]
    }

    fn require_known(account: &Account) -> Result<(), VeloError> {
        if Self::fixture_accounts().iter().any(|a| a.id == account.id) {
            Ok(())
        } else {
            Err(VeloError::AccountNotFound(account.id.clone()))
        }
    }

    /// A descriptor for an operation on a mock account. Device ids are
    /// minted per call as 32-hex uuid strings, matching the registered-
    /// device shape the challenge path validates.
    fn descriptor(
        cred_type: CredType,
        payee: &Vpa,
        amount: Option<Amount>,
    ) -> Result<CredentialRequest, VeloError> {
        Ok(CredentialRequest {
            txn_id: uuid::Uuid::new_v4().to_string(),
            cred_type,
            device_id: uuid::Uuid::new_v4().simple().to_string(),
            app_id: MOCK_APP_ID.to_string(),
            mobile_number: MOCK_MOBILE.to_string(),
            payer_addr: Vpa::parse(MOCK_PAYER_ADDR)?,
            payee_addr: payee.clone(),
            txn_amount: amount,
        })
    }

    fn park(&self, kind: PendingKind, request: CredentialRequest) -> PendingCredential {
        let token = CorrelationToken::mint();
        self.pending.insert(
            token.clone(),
            PendingOp {
                kind,
                request: request.clone(),
            },
        );
        PendingCredential { request, token }
    }

    fn claim(&self, token: &CorrelationToken) -> Result<PendingOp, VeloError> {
        self.pending
            .remove(token)
            .map(|(_, op)| op)
            .ok_or_else(|| {
                VeloError::Switch(format!(
                    "unknown or already-used correlation token {token}"
                ))
            })
    }

    /// The check a real provider's switch would make for it: the block
    /// must carry a credential under the type the descriptor asked for.
    fn require_credential(
        block: &CredentialBlock,
        request: &CredentialRequest,
    ) -> Result<(), VeloError> {
        if block.entry(request.cred_type).is_none() {
            return Err(VeloError::Switch(format!(
                "credential block carries no '{}' credential",
                request.cred_type
            )));
        }
        Ok(())
    }

    fn record(&self, record: TxnRecord) {
        self.history.lock().push(record);
    }
}

impl Default for MockPsp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PspClient for MockPsp {
    fn id(&self) -> &str {
        "mockpsp"
    }

    async fn init(&self, bucket: Arc<dyn StoreBucket>) -> Result<(), VeloError> {
        // Stamp first-time provisioning on this store; later inits keep
        // the original stamp. The mock needs no other persistent state.
        bucket
            .set_if_absent("provisioned_at", &Utc::now().to_rfc3339())
            .await?;
        tracing::debug!(psp = self.id(), "mock provider initialized");
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<Account>, VeloError> {
        Ok(Self::fixture_accounts())
    }

    async fn begin_balance(&self, account: &Account) -> Result<PendingCredential, VeloError> {
        Self::require_known(account)?;
        // Balance inquiries pay yourself, carry no amount.
        let payer = Vpa::parse(MOCK_PAYER_ADDR)?;
        let request = Self::descriptor(CredType::BalanceInquiry, &payer, None)?;
        Ok(self.park(PendingKind::Balance, request))
    }

    async fn complete_balance(
        &self,
        token: CorrelationToken,
        block: CredentialBlock,
    ) -> Result<AmountValue, VeloError> {
        let op = self.claim(&token)?;
        if !matches!(op.kind, PendingKind::Balance) {
            return Err(VeloError::Switch(format!(
                "correlation token {token} does not belong to a balance inquiry"
            )));
        }
        Self::require_credential(&block, &op.request)?;

        tracing::debug!(txn_id = %op.request.txn_id, "mock balance inquiry settled");
        self.record(TxnRecord {
            txn_id: op.request.txn_id,
            status: TxnStatus::Success,
            payee: None,
            amount: None,
            timestamp: Utc::now(),
        });
        AmountValue::parse(MOCK_BALANCE)
    }

    async fn lookup_address(&self, address: &Vpa) -> Result<AddressLookup, VeloError> {
        // A tiny fixed directory stands in for the switch's resolution
        // service.
        let directory = [
            ("asha@velobank", "Asha Rao"),
            ("vikram@velobank", "Vikram Iyer"),
            (MOCK_PAYER_ADDR, "Demo User"),
        ];
        Ok(match directory.iter().find(|(a, _)| *a == address.as_str()) {
            Some((_, name)) => AddressLookup::Found {
                name: (*name).to_string(),
            },
            None => AddressLookup::NotFound {
                reason: "no such address".to_string(),
            },
        })
    }

    async fn begin_payment(
        &self,
        account: &Account,
        payee: &Vpa,
        amount: &Amount,
    ) -> Result<PendingCredential, VeloError> {
        Self::require_known(account)?;
        let request = Self::descriptor(CredType::Pay, payee, Some(amount.clone()))?;
        Ok(self.park(PendingKind::Payment, request))
    }

    async fn complete_payment(
        &self,
        token: CorrelationToken,
        block: CredentialBlock,
    ) -> Result<PaymentOutcome, VeloError> {
        let op = self.claim(&token)?;
        if !matches!(op.kind, PendingKind::Payment) {
            return Err(VeloError::Switch(format!(
                "correlation token {token} does not belong to a payment"
            )));
        }
        Self::require_credential(&block, &op.request)?;

        tracing::debug!(txn_id = %op.request.txn_id, "mock payment settled");
        self.record(TxnRecord {
            txn_id: op.request.txn_id.clone(),
            status: TxnStatus::Success,
            payee: Some(op.request.payee_addr.clone()),
            amount: op.request.txn_amount.clone(),
            timestamp: Utc::now(),
        });
        Ok(PaymentOutcome {
            status: TxnStatus::Success,
            rrn: MOCK_RRN.to_string(),
            txn_id: op.request.txn_id,
        })
    }

    async fn collect(
        &self,
        account: &Account,
        request: &CollectRequest,
    ) -> Result<PaymentOutcome, VeloError> {
        Self::require_known(account)?;

        let txn_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(txn_id = %txn_id, payer = %request.address, "mock collect request accepted");
        self.record(TxnRecord {
            txn_id: txn_id.clone(),
            status: TxnStatus::Success,
            payee: Some(request.address.clone()),
            amount: Some(request.amount.clone()),
            timestamp: Utc::now(),
        });
        Ok(PaymentOutcome {
            status: TxnStatus::Success,
            rrn: MOCK_RRN.to_string(),
            txn_id,
        })
    }

    async fn txn_history(&self) -> Result<Vec<TxnRecord>, VeloError> {
        let mut records = self.history.lock().clone();
        records.reverse(); // newest first
        Ok(records)
    }

    async fn txn_by_id(&self, txn_id: &str) -> Result<Option<TxnRecord>, VeloError> {
        Ok(self
            .history
            .lock()
            .iter()
            .find(|r| r.txn_id == txn_id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};

    fn block_for(cred_type: CredType) -> CredentialBlock {
        CredentialBlock::mpin(cred_type, "NAC", "20240101", "2.0|AAAA".to_string())
    }

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            label: id.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn lists_three_fixture_accounts() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0].id, "account1");
        assert_eq!(accounts[0].description.as_deref(), Some("Set transaction PIN"));
    }

    #[tokio::test]
    async fn balance_handshake_resolves_fixture_balance() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();

        let pending = psp.begin_balance(&accounts[0]).await.unwrap();
        assert_eq!(pending.request.cred_type, CredType::BalanceInquiry);
        assert!(pending.request.txn_amount.is_none());
        assert_eq!(pending.request.device_id.len(), 32);

        let balance = psp
            .complete_balance(pending.token, block_for(CredType::BalanceInquiry))
            .await
            .unwrap();
        assert_eq!(balance.as_str(), "12.00");
    }

    #[tokio::test]
    async fn payment_handshake_resolves_outcome() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let payee = Vpa::parse("asha@velobank").unwrap();
        let amount = Amount::inr("250.00").unwrap();

        let pending = psp
            .begin_payment(&accounts[1], &payee, &amount)
            .await
            .unwrap();
        assert_eq!(pending.request.cred_type, CredType::Pay);
        assert_eq!(pending.request.payee_addr, payee);

        let outcome = psp
            .complete_payment(pending.token, block_for(CredType::Pay))
            .await
            .unwrap();
        assert_eq!(outcome.status, TxnStatus::Success);
        assert_eq!(outcome.rrn, MOCK_RRN);
        assert_eq!(outcome.txn_id, pending.request.txn_id);
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let psp = MockPsp::new();
        let ghost = account("account99");

        assert!(matches!(
            psp.begin_balance(&ghost).await,
            Err(VeloError::AccountNotFound(_))
        ));
        let payee = Vpa::parse("asha@velobank").unwrap();
        let amount = Amount::inr("1.00").unwrap();
        assert!(matches!(
            psp.begin_payment(&ghost, &payee, &amount).await,
            Err(VeloError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn correlation_tokens_are_single_use() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let pending = psp.begin_balance(&accounts[0]).await.unwrap();

        psp.complete_balance(pending.token.clone(), block_for(CredType::BalanceInquiry))
            .await
            .unwrap();

        let replay = psp
            .complete_balance(pending.token, block_for(CredType::BalanceInquiry))
            .await;
        assert!(matches!(replay, Err(VeloError::Switch(_))));
    }

    #[tokio::test]
    async fn token_kind_mismatch_is_rejected() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let pending = psp.begin_balance(&accounts[0]).await.unwrap();

        // A balance token can't complete a payment.
        let result = psp
            .complete_payment(pending.token, block_for(CredType::Pay))
            .await;
        assert!(matches!(result, Err(VeloError::Switch(_))));
    }

    #[tokio::test]
    async fn block_missing_credential_type_is_rejected() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let pending = psp.begin_balance(&accounts[0]).await.unwrap();

        // Pay credential offered for a balance inquiry: wrong slot.
        let result = psp
            .complete_balance(pending.token, block_for(CredType::Pay))
            .await;
        assert!(matches!(result, Err(VeloError::Switch(_))));
    }

    #[tokio::test]
    async fn lookup_resolves_directory_entries() {
        let psp = MockPsp::new();

        let hit = psp
            .lookup_address(&Vpa::parse("asha@velobank").unwrap())
            .await
            .unwrap();
        assert_eq!(
            hit,
            AddressLookup::Found {
                name: "Asha Rao".to_string()
            }
        );

        let miss = psp
            .lookup_address(&Vpa::parse("nobody@nowhere").unwrap())
            .await
            .unwrap();
        assert!(!miss.is_found());
    }

    #[tokio::test]
    async fn history_accumulates_completed_operations() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        assert!(psp.txn_history().await.unwrap().is_empty());

        let pending = psp.begin_balance(&accounts[0]).await.unwrap();
        let txn_id = pending.request.txn_id.clone();
        psp.complete_balance(pending.token, block_for(CredType::BalanceInquiry))
            .await
            .unwrap();

        let history = psp.txn_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].txn_id, txn_id);

        let found = psp.txn_by_id(&txn_id).await.unwrap();
        assert!(found.is_some());
        assert!(psp.txn_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn abandoned_begin_leaves_no_history() {
        // A phase-one call whose credential never arrives settles
        // nothing.
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let _pending = psp.begin_balance(&accounts[0]).await.unwrap();
        assert!(psp.txn_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collect_settles_with_fresh_txn_id() {
        let psp = MockPsp::new();
        let accounts = psp.accounts().await.unwrap();
        let request = CollectRequest {
            address: Vpa::parse("vikram@velobank").unwrap(),
            amount: Amount::inr("99.00").unwrap(),
            note: Some("rent".to_string()),
            expiry: Utc::now() + chrono::Duration::hours(1),
        };

        let outcome = psp.collect(&accounts[0], &request).await.unwrap();
        assert_eq!(outcome.status, TxnStatus::Success);
        assert_eq!(outcome.rrn, MOCK_RRN);
        assert!(psp.txn_by_id(&outcome.txn_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn init_stamps_provisioning_once() {
        let psp = MockPsp::new();
        let store = MemoryStore::new();
        let bucket = store.bucket("psp/mockpsp").await.unwrap();

        psp.init(Arc::clone(&bucket)).await.unwrap();
        let first = bucket.get("provisioned_at").await.unwrap().unwrap();

        psp.init(bucket.clone()).await.unwrap();
        let second = bucket.get("provisioned_at").await.unwrap().unwrap();
        assert_eq!(first, second);
    }
}
