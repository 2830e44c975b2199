// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # VELO Client -- Core Library
//!
//! The client-side credential engine for an instant push-payment switch.
//! VELO proves a device's identity to the verifying authority and
//! encrypts the user's transaction PIN so the authority can validate it
//! without ever seeing it in cleartext -- the two jobs where a bug isn't
//! a crash, it's somebody's money.
//!
//! The cryptography is dictated by the switch, not chosen by us:
//! AES-256-GCM for the inner credential layer, RSA-OAEP with SHA-256 and
//! MGF1-SHA-256 for everything wrapped toward the verifier, SHA-256 for
//! salt digests. Exact wire framing throughout -- the other side of every
//! ciphertext is a system we don't operate.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of a
//! payment client:
//!
//! - **crypto** -- Low-level primitives. Don't roll your own.
//! - **store** -- The bucketed key-value contract secrets persist behind.
//! - **secrets** -- Token/K0 lifecycle: generated once, never rotated here.
//! - **challenge** -- The initial device-authentication challenge.
//! - **credential** -- Descriptor + PIN in, verifier-opaque block out.
//! - **pin** -- The PIN capability. The PIN never outlives one operation.
//! - **psp** -- The provider boundary: accounts, lookup, transport.
//! - **client** -- The orchestrator tying the pipeline together.
//! - **config** -- Protocol constants and provisioned switch parameters.
//! - **types** -- Validated addresses, amounts, descriptors, results.
//!
//! ## Design Philosophy
//!
//! 1. Parse at the edges; the core never re-validates.
//! 2. Secrets have one owner each and redacted `Debug` everywhere.
//! 3. Fail fast and whole -- no partial challenge, envelope, or block
//!    ever escapes on an error path.
//! 4. If it touches money, it has tests. Plural.

pub mod challenge;
pub mod client;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod pin;
pub mod psp;
pub mod secrets;
pub mod store;
pub mod types;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use challenge::{ChallengeIssuer, ChallengeType};
pub use client::VeloClient;
pub use config::SwitchParams;
pub use credential::{CredentialBlock, CredentialCipher};
pub use error::VeloError;
pub use pin::{ChannelPin, Pin, PinProvider, StaticPin};
pub use psp::{MockPsp, PendingCredential, PspClient};
pub use secrets::{Secret, SecretStore};
pub use store::{MemoryStore, SledStore, Store, StoreBucket};
pub use types::{
    Account, AddressLookup, Amount, AmountValue, CollectRequest, CorrelationToken, CredType,
    Currency, PaymentOutcome, TxnRecord, TxnStatus, Vpa,
};
