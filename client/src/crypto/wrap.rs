//! # RSA-OAEP Wrapping Keys
//!
//! The outer layer of both wire formats: challenge plaintexts are
//! encrypted for the verifying authority's certificate, credential
//! envelopes for the payment switch's public key. Both use RSA-OAEP with
//! SHA-256 as the digest and MGF1-SHA-256 as the mask -- what a JCE
//! deployment calls `RSA/ECB/OAEPwithSHA-256andMGF1Padding`.
//!
//! A [`WrappingKey`] is encrypt-only by construction: it holds a public
//! key and nothing else. The matching private keys live with the verifier
//! and the switch; this engine could not decrypt its own output if it
//! tried, which is exactly the property the protocol wants.
//!
//! OAEP overhead with SHA-256 is 66 bytes, so a 2048-bit key fits
//! plaintexts up to 190 bytes. Challenge plaintexts (162 bytes) and
//! credential envelopes (~130 bytes) both fit; provisioned keys below
//! 2048 bits do not and will fail at encrypt time.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use x509_cert::der::{DecodePem, Encode};
use x509_cert::Certificate;

use crate::error::VeloError;

/// Marker a PEM certificate must start with. Checked before parsing so a
/// pasted public key (or garbage) fails with a message naming the actual
/// problem.
const CERT_PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";

/// An RSA public key used to wrap data for an external party.
#[derive(Clone, Debug)]
pub struct WrappingKey {
    key: RsaPublicKey,
}

impl WrappingKey {
    /// Build a wrapping key from whatever PEM the provisioning bundle
    /// carries: an X.509 certificate (`BEGIN CERTIFICATE`) or a bare
    /// SPKI public key (`BEGIN PUBLIC KEY`). Production verifiers ship
    /// certificates; test rigs and demo setups provision bare keys.
    pub fn from_pem(pem: &str) -> Result<Self, VeloError> {
        if pem.trim_start().starts_with(CERT_PEM_HEADER) {
            Self::from_certificate_pem(pem)
        } else {
            Self::from_public_key_pem(pem)
        }
    }

    /// Build a wrapping key from an X.509 certificate in PEM form,
    /// taking the certificate's subject public key.
    ///
    /// This is the provisioning path for the verifier's signer
    /// certificate.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::CryptoConfig`] when the input is not PEM, not
    /// a certificate, or carries a non-RSA key. All of these mean the
    /// provisioned configuration is wrong; retrying cannot help.
    pub fn from_certificate_pem(pem: &str) -> Result<Self, VeloError> {
        if !pem.trim_start().starts_with(CERT_PEM_HEADER) {
            return Err(VeloError::CryptoConfig(
                "verifier certificate is not a PEM certificate".to_string(),
            ));
        }

        let cert = Certificate::from_pem(pem.as_bytes())
            .map_err(|e| VeloError::CryptoConfig(format!("unparseable certificate: {e}")))?;

        // Re-encode the SPKI and decode it as an RSA key. Going through
        // DER keeps us independent of which spki version x509-cert and
        // rsa happen to agree on.
        let spki_der = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| VeloError::CryptoConfig(format!("unreadable subject key: {e}")))?;

        let key = RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| {
            VeloError::CryptoConfig(format!("certificate key is not RSA: {e}"))
        })?;

        Ok(Self { key })
    }

    /// Build a wrapping key from an SPKI public key in PEM form
    /// (`-----BEGIN PUBLIC KEY-----`).
    ///
    /// This is the provisioning path for the switch's envelope key.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::CryptoConfig`] when the input is not a PEM
    /// RSA public key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, VeloError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| VeloError::CryptoConfig(format!("unparseable public key: {e}")))?;
        Ok(Self { key })
    }

    /// Encrypt with RSA-OAEP (SHA-256 digest, MGF1-SHA-256 mask).
    ///
    /// OAEP is randomized: two calls on the same plaintext produce
    /// different ciphertexts, and that is load-bearing for the protocol.
    ///
    /// # Errors
    ///
    /// Returns [`VeloError::EncryptFailed`] -- in practice only when the
    /// plaintext exceeds what the modulus can carry.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VeloError> {
        self.key
            .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|_| VeloError::EncryptFailed)
    }

    /// Encrypt and base64-encode in one step -- every wire format carries
    /// the OAEP output as standard base64.
    pub fn encrypt_base64(&self, plaintext: &[u8]) -> Result<String, VeloError> {
        Ok(B64.encode(self.encrypt(plaintext)?))
    }
}
