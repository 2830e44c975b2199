//! # Domain Types
//!
//! Validated building blocks for the credential engine: payment addresses,
//! amounts, credential descriptors, and the typed results account
//! operations resolve to.
//!
//! The rule of this module is parse-at-construction. A [`Vpa`] or an
//! [`AmountValue`] that exists is valid; nothing downstream re-checks
//! shapes. Wire-visible structs serialize with the exact camelCase field
//! names the switch contract uses (`txnId`, `payerAddr`, ...), so a
//! serialized descriptor is byte-for-byte what the verifier recomputes
//! salts from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VeloError;

// ---------------------------------------------------------------------------
// Payment Address (VPA)
// ---------------------------------------------------------------------------

/// A virtual payment address in `name@provider` form.
///
/// Validation matches the switch contract: non-empty, with an `@` that is
/// neither the first nor the last character. Anything past that (length
/// caps, charset) is the provider's problem, not ours.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vpa(String);

impl Vpa {
    /// Parse and validate an address.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::Validation`] when the shape is wrong.
    pub fn parse(s: &str) -> Result<Self, VeloError> {
        if s.is_empty() {
            return Err(VeloError::Validation("address is empty".to_string()));
        }
        match s.find('@') {
            None => Err(VeloError::Validation(format!(
                "address '{s}' has no '@' separator"
            ))),
            Some(0) => Err(VeloError::Validation(format!(
                "address '{s}' has an empty name part"
            ))),
            Some(at) if at == s.len() - 1 => Err(VeloError::Validation(format!(
                "address '{s}' has an empty provider part"
            ))),
            Some(_) => Ok(Self(s.to_string())),
        }
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Vpa {
    type Err = VeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Vpa {
    type Error = VeloError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Vpa> for String {
    fn from(vpa: Vpa) -> Self {
        vpa.0
    }
}

impl fmt::Display for Vpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Supported transaction currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Indian rupee, the only currency the switch settles today.
    #[serde(rename = "INR")]
    Inr,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Inr => f.write_str("INR"),
        }
    }
}

/// A decimal amount string with exactly two fractional digits, e.g.
/// `"120.50"`. Stored as a string because the salt embeds it verbatim;
/// re-formatting a float would change bytes the verifier hashes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AmountValue(String);

impl AmountValue {
    /// Parse a `digits.dd` amount value. The whole string must match;
    /// no signs, separators, or trailing garbage.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::Validation`] when the shape is wrong.
    pub fn parse(s: &str) -> Result<Self, VeloError> {
        let malformed = || {
            VeloError::Validation(format!(
                "amount '{s}' is not a decimal with two fractional digits"
            ))
        };
        let (whole, frac) = s.split_once('.').ok_or_else(malformed)?;
        let whole_ok = !whole.is_empty() && whole.bytes().all(|b| b.is_ascii_digit());
        let frac_ok = frac.len() == 2 && frac.bytes().all(|b| b.is_ascii_digit());
        if !whole_ok || !frac_ok {
            return Err(malformed());
        }
        Ok(Self(s.to_string()))
    }

    /// The amount as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AmountValue {
    type Err = VeloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AmountValue {
    type Error = VeloError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AmountValue> for String {
    fn from(v: AmountValue) -> Self {
        v.0
    }
}

impl fmt::Display for AmountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A currency-qualified transaction amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Settlement currency.
    pub currency: Currency,
    /// Decimal value with two fractional digits.
    pub value: AmountValue,
}

impl Amount {
    /// Convenience constructor for an INR amount from a decimal string.
    pub fn inr(value: &str) -> Result<Self, VeloError> {
        Ok(Self {
            currency: Currency::Inr,
            value: AmountValue::parse(value)?,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

// ---------------------------------------------------------------------------
// Credential Type
// ---------------------------------------------------------------------------

/// What the credential authorizes. The wire tag doubles as the last salt
/// field and as the key into the credential block, so the serde names
/// here are contract, not taste.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CredType {
    /// Balance inquiry on a linked account.
    #[serde(rename = "reqBalEnq")]
    BalanceInquiry,
    /// Debit authorization for an outgoing payment.
    #[serde(rename = "pay")]
    Pay,
}

impl CredType {
    /// The wire tag for this credential type.
    pub const fn as_str(self) -> &'static str {
        match self {
            CredType::BalanceInquiry => "reqBalEnq",
            CredType::Pay => "pay",
        }
    }
}

impl fmt::Display for CredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A bank account linked through the payment-service provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Provider-scoped account identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Optional provider-supplied note (e.g. "Set transaction PIN").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Transaction Descriptor
// ---------------------------------------------------------------------------

/// The transaction descriptor a PSP hands back in phase one of the
/// credential handshake. Carries every field the credential cipher folds
/// into the salt; the serde names are the switch's camelCase contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// Switch-unique transaction identifier.
    pub txn_id: String,
    /// What the credential authorizes.
    pub cred_type: CredType,
    /// Device identifier of the handset performing the operation.
    pub device_id: String,
    /// Application identifier registered with the provider.
    pub app_id: String,
    /// Mobile number bound to the account.
    pub mobile_number: String,
    /// Paying address.
    pub payer_addr: Vpa,
    /// Receiving address.
    pub payee_addr: Vpa,
    /// Transaction amount; absent for balance inquiries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_amount: Option<Amount>,
}

// ---------------------------------------------------------------------------
// Collect Requests
// ---------------------------------------------------------------------------

/// Parameters for a collect (pull) request sent to a payer address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectRequest {
    /// Address the money is requested from.
    pub address: Vpa,
    /// Requested amount.
    pub amount: Amount,
    /// Optional free-text note shown to the payer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the request lapses if the payer doesn't act.
    pub expiry: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operation Results
// ---------------------------------------------------------------------------

/// Terminal state of a switch transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnStatus {
    /// Settled.
    Success,
    /// Accepted, not yet settled.
    Pending,
    /// Declined or expired.
    Failed,
}

/// Result of a completed payment or collect operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    /// Terminal transaction status.
    pub status: TxnStatus,
    /// Retrieval reference number assigned by the switch.
    pub rrn: String,
    /// The transaction this outcome settles.
    pub txn_id: String,
}

/// One entry in the provider's transaction history.
///
/// The provider-side history API is still settling; this carries the
/// fields every provider returns today.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxnRecord {
    /// Transaction identifier.
    pub txn_id: String,
    /// Terminal or in-flight status.
    pub status: TxnStatus,
    /// Counterparty address, when the operation had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<Vpa>,
    /// Amount moved, when the operation had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    /// When the provider recorded the transaction.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Address Lookup
// ---------------------------------------------------------------------------

/// Outcome of resolving a payment address with the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AddressLookup {
    /// The address exists; `name` is the registered holder name.
    Found {
        /// Registered display name of the address holder.
        name: String,
    },
    /// The address does not resolve.
    NotFound {
        /// Provider-supplied reason.
        reason: String,
    },
}

impl AddressLookup {
    /// `true` when the address resolved.
    pub fn is_found(&self) -> bool {
        matches!(self, AddressLookup::Found { .. })
    }
}

// ---------------------------------------------------------------------------
// Correlation Tokens
// ---------------------------------------------------------------------------

/// Opaque token correlating the two phases of a credential handshake.
///
/// A `begin_*` PSP call mints one beside the descriptor; the matching
/// `complete_*` call consumes it. Tokens are single-use and carry no
/// meaning outside the PSP that minted them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Mint a fresh token.
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpa_accepts_name_at_provider() {
        let vpa = Vpa::parse("alice@bank").unwrap();
        assert_eq!(vpa.as_str(), "alice@bank");
    }

    #[test]
    fn vpa_rejects_malformed_shapes() {
        assert!(Vpa::parse("").is_err());
        assert!(Vpa::parse("alicebank").is_err());
        assert!(Vpa::parse("@bank").is_err());
        assert!(Vpa::parse("alice@").is_err());
    }

    #[test]
    fn vpa_allows_second_at_sign() {
        // Only the first '@' position is contract; providers with '@' in
        // the suffix exist in the wild.
        assert!(Vpa::parse("a@b@c").is_ok());
    }

    #[test]
    fn vpa_serde_validates_on_deserialize() {
        let ok: Result<Vpa, _> = serde_json::from_str("\"alice@bank\"");
        assert!(ok.is_ok());
        let bad: Result<Vpa, _> = serde_json::from_str("\"no-at-sign\"");
        assert!(bad.is_err());
    }

    #[test]
    fn amount_value_accepts_two_fraction_digits() {
        assert_eq!(AmountValue::parse("12.00").unwrap().as_str(), "12.00");
        assert_eq!(AmountValue::parse("0.01").unwrap().as_str(), "0.01");
        assert_eq!(
            AmountValue::parse("100000.99").unwrap().as_str(),
            "100000.99"
        );
    }

    #[test]
    fn amount_value_rejects_everything_else() {
        for bad in ["", "12", "12.0", "12.000", ".00", "a.00", "12.ab", "-1.00", "1,00", " 12.00"] {
            assert!(AmountValue::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn amount_inr_display() {
        let amount = Amount::inr("42.50").unwrap();
        assert_eq!(amount.to_string(), "42.50 INR");
    }

    #[test]
    fn cred_type_wire_tags() {
        assert_eq!(CredType::BalanceInquiry.as_str(), "reqBalEnq");
        assert_eq!(CredType::Pay.as_str(), "pay");
        assert_eq!(
            serde_json::to_string(&CredType::BalanceInquiry).unwrap(),
            "\"reqBalEnq\""
        );
    }

    #[test]
    fn credential_request_serializes_camel_case() {
        let req = CredentialRequest {
            txn_id: "T1".to_string(),
            cred_type: CredType::Pay,
            device_id: "dev1".to_string(),
            app_id: "app1".to_string(),
            mobile_number: "9999999999".to_string(),
            payer_addr: Vpa::parse("a@b").unwrap(),
            payee_addr: Vpa::parse("c@d").unwrap(),
            txn_amount: Some(Amount::inr("10.00").unwrap()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["txnId"], "T1");
        assert_eq!(json["credType"], "pay");
        assert_eq!(json["payerAddr"], "a@b");
        assert_eq!(json["txnAmount"]["currency"], "INR");
        assert_eq!(json["txnAmount"]["value"], "10.00");
    }

    #[test]
    fn credential_request_omits_absent_amount() {
        let req = CredentialRequest {
            txn_id: "T2".to_string(),
            cred_type: CredType::BalanceInquiry,
            device_id: "dev1".to_string(),
            app_id: "app1".to_string(),
            mobile_number: "9999999999".to_string(),
            payer_addr: Vpa::parse("a@b").unwrap(),
            payee_addr: Vpa::parse("a@b").unwrap(),
            txn_amount: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("txnAmount").is_none());
    }

    #[test]
    fn txn_status_screaming_tags() {
        assert_eq!(
            serde_json::to_string(&TxnStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
    }

    #[test]
    fn correlation_tokens_are_unique_and_opaque() {
        let a = CorrelationToken::mint();
        let b = CorrelationToken::mint();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn address_lookup_tagged_serialization() {
        let found = AddressLookup::Found {
            name: "Asha".to_string(),
        };
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["name"], "Asha");

        let missing = AddressLookup::NotFound {
            reason: "no such address".to_string(),
        };
        assert!(!missing.is_found());
    }
}
