//! # Cryptographic Primitives for VELO
//!
//! This module is the foundation of everything security-related in the
//! engine. Every salt hash, every sealed envelope, every wrapped
//! challenge flows through here.
//!
//! We deliberately chose boring, well-audited cryptography -- and more to
//! the point, the cryptography the verifier already speaks:
//!
//! - **AES-256-GCM** for the inner credential layer -- AEAD done right,
//!   with the switch's 16-byte IV convention.
//! - **RSA-OAEP (SHA-256/MGF1-SHA-256)** for wrapping challenges and
//!   envelopes toward keys we don't hold the private half of.
//! - **SHA-256** for salt hashing -- the only hash the switch recomputes.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod encryption;
pub mod hash;
pub mod wrap;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use encryption::{encrypt_with_iv, generate_iv};
pub use hash::{sha256, sha256_multi};
pub use wrap::WrappingKey;
