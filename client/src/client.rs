//! # VeloClient -- Account-Operation Orchestrator
//!
//! The facade a host application holds. It owns the wiring between the
//! secret store, the challenge issuer, the credential cipher, the PIN
//! provider, and the payment-service provider, and it drives every
//! credential-bearing operation through the same strict pipeline:
//!
//! ```text
//! REQUEST_DESCRIPTOR -> OBTAIN_PIN -> ENCRYPT_CREDENTIAL -> COMPLETE
//! ```
//!
//! That is a linear flow, not a state machine. No intermediate state
//! survives a failure: if PIN entry is cancelled, if the cipher rejects
//! the descriptor, if the provider declines the block -- the operation
//! returns an error and nothing partial is returned, persisted, or
//! retried. Retry policy lives with the provider, never here.
//!
//! The PIN is resolved fresh per operation and exists only between
//! phases two and three. What crosses the provider boundary is the
//! opaque credential block, nothing else.

use std::sync::Arc;

use crate::challenge::{ChallengeIssuer, ChallengeType};
use crate::config::{SwitchParams, ENGINE_BUCKET, PSP_BUCKET_PREFIX};
use crate::credential::CredentialCipher;
use crate::crypto::WrappingKey;
use crate::error::VeloError;
use crate::pin::PinProvider;
use crate::psp::PspClient;
use crate::secrets::SecretStore;
use crate::store::Store;
use crate::types::{
    Account, AddressLookup, Amount, AmountValue, CollectRequest, PaymentOutcome, TxnRecord, Vpa,
};

/// The client engine, generic over the wired payment-service provider.
pub struct VeloClient<P: PspClient> {
    psp: Arc<P>,
    secrets: SecretStore,
    issuer: ChallengeIssuer,
    cipher: CredentialCipher,
    pin_provider: Arc<dyn PinProvider>,
}

impl<P: PspClient> VeloClient<P> {
    /// Initialize the engine: parse the provisioned keys, open the
    /// engine and provider buckets, ensure the device secrets exist, and
    /// hand the provider its bucket. Returns a ready client; there is no
    /// half-initialized state to misuse.
    ///
    /// Key parsing happens first on purpose -- malformed provisioning
    /// should fail the whole init up front, not the first payment at
    /// 2 a.m.
    ///
    /// # Errors
    ///
    /// - [`VeloError::CryptoConfig`] -- certificate or public key is
    ///   malformed. Requires fixed provisioning, not a retry.
    /// - [`VeloError::Store`] -- the backing store is unavailable. The
    ///   engine never falls back to ephemeral secrets.
    pub async fn init(
        store: Arc<dyn Store>,
        psp: Arc<P>,
        params: SwitchParams,
        pin_provider: Arc<dyn PinProvider>,
    ) -> Result<Self, VeloError> {
        let verifier = WrappingKey::from_pem(&params.signer_certificate_pem)?;
        let switch_key = WrappingKey::from_public_key_pem(&params.switch_public_key_pem)?;

        let secrets = SecretStore::new(store.bucket(ENGINE_BUCKET).await?);
        secrets.init().await?;

        let psp_bucket = store
            .bucket(&format!("{PSP_BUCKET_PREFIX}{}", psp.id()))
            .await?;
        psp.init(psp_bucket).await?;

        let issuer = ChallengeIssuer::new(secrets.clone(), verifier, params.version.clone());
        let cipher = CredentialCipher::new(
            secrets.clone(),
            switch_key,
            params.version,
            params.key_code,
            params.key_index,
        );

        tracing::info!(psp = psp.id(), "velo client initialized");
        Ok(Self {
            psp,
            secrets,
            issuer,
            cipher,
            pin_provider,
        })
    }

    /// The secret store backing this client. Host applications use this
    /// for provisioning flows (restoring a Token/K0 pair the verifier
    /// already knows); normal operation never needs it.
    pub fn secret_store(&self) -> &SecretStore {
        &self.secrets
    }

    /// Issue a device authentication challenge for out-of-band
    /// registration with the verifier.
    pub async fn challenge(
        &self,
        challenge_type: ChallengeType,
        device_id: &str,
    ) -> Result<String, VeloError> {
        self.issuer.challenge(challenge_type, device_id).await
    }

    /// All bank accounts linked with the provider.
    pub async fn get_accounts(&self) -> Result<Vec<Account>, VeloError> {
        self.psp.accounts().await
    }

    /// Balance inquiry: the full four-phase credential pipeline,
    /// resolving to the account balance.
    pub async fn get_balance(&self, account: &Account) -> Result<AmountValue, VeloError> {
        tracing::debug!(account = %account.id, "balance inquiry started");

        let pending = self.psp.begin_balance(account).await?;
        let pin = self.pin_provider.resolve_pin().await?;
        let block = self.cipher.issue(&pending.request, &pin).await?;
        drop(pin);
        let balance = self.psp.complete_balance(pending.token, block).await?;

        tracing::info!(account = %account.id, "balance inquiry settled");
        Ok(balance)
    }

    /// Resolve a payment address with the provider.
    pub async fn lookup_address(&self, address: &Vpa) -> Result<AddressLookup, VeloError> {
        self.psp.lookup_address(address).await
    }

    /// Pay a payee address from an account: the full four-phase
    /// credential pipeline, resolving to the payment outcome.
    pub async fn pay(
        &self,
        account: &Account,
        payee: &Vpa,
        amount: &Amount,
    ) -> Result<PaymentOutcome, VeloError> {
        tracing::debug!(account = %account.id, payee = %payee, "payment started");

        let pending = self.psp.begin_payment(account, payee, amount).await?;
        let pin = self.pin_provider.resolve_pin().await?;
        let block = self.cipher.issue(&pending.request, &pin).await?;
        drop(pin);
        let outcome = self.psp.complete_payment(pending.token, block).await?;

        tracing::info!(
            account = %account.id,
            txn_id = %outcome.txn_id,
            rrn = %outcome.rrn,
            "payment settled"
        );
        Ok(outcome)
    }

    /// Send a collect (pull) request. No local credential is built; the
    /// payer authorizes on their own device.
    pub async fn collect(
        &self,
        account: &Account,
        request: &CollectRequest,
    ) -> Result<PaymentOutcome, VeloError> {
        self.psp.collect(account, request).await
    }

    /// Transaction history, newest first.
    pub async fn get_txn_history(&self) -> Result<Vec<TxnRecord>, VeloError> {
        self.psp.txn_history().await
    }

    /// A single transaction by id.
    pub async fn get_txn_by_id(&self, txn_id: &str) -> Result<Option<TxnRecord>, VeloError> {
        if txn_id.is_empty() {
            return Err(VeloError::Validation(
                "transaction id is empty".to_string(),
            ));
        }
        self.psp.txn_by_id(txn_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{ChannelPin, StaticPin};
    use crate::psp::MockPsp;
    use crate::store::MemoryStore;
    use crate::types::TxnStatus;
    use base64::engine::general_purpose::STANDARD as B64;
    use base64::Engine;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::{Oaep, RsaPrivateKey};
    use sha2::Sha256;
    use std::sync::OnceLock;

    /// One provisioned keypair for the whole module. The demo setup uses
    /// the same RSA key for the verifier and the switch, which is fine:
    /// the engine treats them as unrelated wrapping keys.
    fn provisioned() -> &'static (RsaPrivateKey, SwitchParams) {
        static PROVISIONED: OnceLock<(RsaPrivateKey, SwitchParams)> = OnceLock::new();
        PROVISIONED.get_or_init(|| {
            let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("keygen");
            let pem = private
                .to_public_key()
                .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
                .expect("pem");
            let params = SwitchParams {
                version: "2.0".to_string(),
                signer_certificate_pem: pem.clone(),
                switch_public_key_pem: pem,
                key_code: "NAC".to_string(),
                key_index: "20240101".to_string(),
            };
            (private, params)
        })
    }

    async fn test_client(
        store: MemoryStore,
        pin: Arc<dyn PinProvider>,
    ) -> (VeloClient<MockPsp>, Arc<MockPsp>) {
        let (_, params) = provisioned();
        let psp = Arc::new(MockPsp::new());
        let client = VeloClient::init(
            Arc::new(store),
            Arc::clone(&psp),
            params.clone(),
            pin,
        )
        .await
        .expect("init");
        (client, psp)
    }

    #[tokio::test]
    async fn balance_flow_end_to_end() {
        let (client, _) =
            test_client(MemoryStore::new(), Arc::new(StaticPin::new("4521"))).await;

        let accounts = client.get_accounts().await.unwrap();
        let balance = client.get_balance(&accounts[0]).await.unwrap();
        assert_eq!(balance.as_str(), "12.00");
    }

    #[tokio::test]
    async fn payment_flow_end_to_end() {
        let (client, _psp) =
            test_client(MemoryStore::new(), Arc::new(StaticPin::new("4521"))).await;

        let accounts = client.get_accounts().await.unwrap();
        let payee = Vpa::parse("asha@velobank").unwrap();
        let amount = Amount::inr("250.00").unwrap();

        let outcome = client.pay(&accounts[0], &payee, &amount).await.unwrap();
        assert_eq!(outcome.status, TxnStatus::Success);
        assert_eq!(outcome.rrn, "112233445566");

        // The settled payment is visible in history through the client.
        let history = client.get_txn_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].txn_id, outcome.txn_id);
    }

    #[tokio::test]
    async fn challenge_through_client_binds_generated_secrets() {
        let (private, _) = provisioned();
        let (client, _) =
            test_client(MemoryStore::new(), Arc::new(StaticPin::new("4521"))).await;

        let device_id = "a1".repeat(16);
        let challenge = client
            .challenge(ChallengeType::Initial, &device_id)
            .await
            .unwrap();

        let token = client.secret_store().token().await.unwrap().unwrap();
        let k0 = client.secret_store().k0().await.unwrap().unwrap();

        let (_, body) = challenge.split_once('|').unwrap();
        let plaintext = private
            .decrypt(Oaep::new::<Sha256>(), &B64.decode(body).unwrap())
            .unwrap();
        assert_eq!(
            String::from_utf8(plaintext).unwrap(),
            format!("{}|{}|{}", token.as_hex(), k0.as_hex(), device_id)
        );
    }

    #[tokio::test]
    async fn reinit_on_same_store_keeps_secrets() {
        let store = MemoryStore::new();
        let (first, _) =
            test_client(store.clone(), Arc::new(StaticPin::new("4521"))).await;
        let token = first.secret_store().token().await.unwrap().unwrap();

        let (second, _) =
            test_client(store, Arc::new(StaticPin::new("4521"))).await;
        assert_eq!(
            second.secret_store().token().await.unwrap().unwrap(),
            token
        );
    }

    #[tokio::test]
    async fn malformed_provisioning_fails_init() {
        let (_, params) = provisioned();
        let mut broken = params.clone();
        broken.switch_public_key_pem = "not a key".to_string();

        let result = VeloClient::init(
            Arc::new(MemoryStore::new()),
            Arc::new(MockPsp::new()),
            broken,
            Arc::new(StaticPin::new("4521")),
        )
        .await;
        assert!(matches!(result, Err(VeloError::CryptoConfig(_))));
    }

    #[tokio::test]
    async fn cancelled_pin_aborts_with_nothing_settled() {
        let (provider, tx) = ChannelPin::new(1);
        drop(tx); // user dismissed the prompt before anything happened
        let (client, psp) = test_client(MemoryStore::new(), Arc::new(provider)).await;

        let accounts = client.get_accounts().await.unwrap();
        let payee = Vpa::parse("asha@velobank").unwrap();
        let amount = Amount::inr("10.00").unwrap();

        let result = client.pay(&accounts[0], &payee, &amount).await;
        assert!(matches!(result, Err(VeloError::PinUnavailable)));

        // The aborted operation settled nothing.
        assert!(psp.txn_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_account_propagates_unchanged() {
        let (client, _) =
            test_client(MemoryStore::new(), Arc::new(StaticPin::new("4521"))).await;

        let ghost = Account {
            id: "account99".to_string(),
            label: "Ghost".to_string(),
            description: None,
        };
        assert!(matches!(
            client.get_balance(&ghost).await,
            Err(VeloError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_txn_id_is_a_validation_error() {
        let (client, _) =
            test_client(MemoryStore::new(), Arc::new(StaticPin::new("4521"))).await;
        assert!(matches!(
            client.get_txn_by_id("").await,
            Err(VeloError::Validation(_))
        ));
    }
}
