use std::fs;
use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha512};

use crate::error::{IntegrityError, InvalidSignature, Result};

/// Checks signatures over raw messages.
pub trait VerifyingKeyHandle {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()>;
}

/// Private key able to produce signatures a [`VerifyingKeyHandle`] accepts.
pub trait SigningKeyHandle {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()>;
}

fn document_scheme() -> Pkcs1v15Sign {
    Pkcs1v15Sign::new::<Sha512>()
}

/// RSA public key verifying RSASSA-PKCS1-v1_5 / SHA-512 signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaVerifyingKey(RsaPublicKey);

impl RsaVerifyingKey {
    pub fn from_public_key_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_public_key_der(der)
            .map(Self)
            .map_err(|e| IntegrityError::Key(format!("public key: {e}")))
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl VerifyingKeyHandle for RsaVerifyingKey {
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let digest = Sha512::digest(message);
        self.0
            .verify(document_scheme(), &digest, signature)
            .map_err(|_| InvalidSignature::SignatureMismatch.into())
    }
}

pub struct RsaSigningKey(RsaPrivateKey);

impl RsaSigningKey {
    /// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> Result<Self> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map(Self)
            .map_err(|e| IntegrityError::Key(format!("private key: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let pem = fs::read_to_string(path).map_err(|e| IntegrityError::io(path, e))?;
        Self::from_pem(&pem)
    }

    pub fn verifying_key(&self) -> RsaVerifyingKey {
        RsaVerifyingKey(self.0.to_public_key())
    }
}

impl SigningKeyHandle for RsaSigningKey {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha512::digest(message);
        self.0
            .sign(document_scheme(), &digest)
            .map_err(|e| IntegrityError::Key(format!("sign: {e}")))
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        self.verifying_key().verify(message, signature)
    }
}
