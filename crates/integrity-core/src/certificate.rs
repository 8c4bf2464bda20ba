use std::fs;
use std::path::Path;

use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::der::asn1::ObjectIdentifier;
use x509_cert::der::{DecodePem, Encode, Tag, Tagged};
use x509_cert::Certificate;

use crate::error::{IntegrityError, Result};
use crate::keys::{RsaVerifyingKey, VerifyingKeyHandle};

const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// The certificate operations signing and verification depend on.
pub trait CertificateHandle {
    type PublicKey: VerifyingKeyHandle;

    /// First Common Name in the subject, if any.
    fn subject_cn(&self) -> Option<String>;
    /// Subject rendered per RFC 4514, e.g. `CN=SomeApp`.
    fn subject_dn(&self) -> String;
    fn issuer_dn(&self) -> String;
    /// Checks that this certificate was signed by `issuer`.
    fn verify_issued_by(&self, issuer: &Self::PublicKey) -> Result<()>;
    fn public_key(&self) -> Result<Self::PublicKey>;
    fn to_pem(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct X509Certificate {
    inner: Certificate,
    pem: String,
}

impl X509Certificate {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = pem.trim();
        let inner = Certificate::from_pem(pem.as_bytes())
            .map_err(|e| IntegrityError::Certificate(format!("parse: {e}")))?;
        Ok(Self {
            inner,
            pem: pem.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let pem = fs::read_to_string(path).map_err(|e| IntegrityError::io(path, e))?;
        Self::from_pem(&pem)
    }

    fn signature_scheme(&self, tbs: &[u8]) -> Result<(Pkcs1v15Sign, Vec<u8>)> {
        let oid = self.inner.signature_algorithm.oid;
        if oid != self.inner.tbs_certificate.signature.oid {
            return Err(IntegrityError::Certificate(
                "signature algorithm differs from the signed one".into(),
            ));
        }
        if oid == SHA256_WITH_RSA {
            Ok((Pkcs1v15Sign::new::<Sha256>(), Sha256::digest(tbs).to_vec()))
        } else if oid == SHA384_WITH_RSA {
            Ok((Pkcs1v15Sign::new::<Sha384>(), Sha384::digest(tbs).to_vec()))
        } else if oid == SHA512_WITH_RSA {
            Ok((Pkcs1v15Sign::new::<Sha512>(), Sha512::digest(tbs).to_vec()))
        } else {
            Err(IntegrityError::Certificate(format!(
                "unsupported signature algorithm {oid}"
            )))
        }
    }
}

impl CertificateHandle for X509Certificate {
    type PublicKey = RsaVerifyingKey;

    fn subject_cn(&self) -> Option<String> {
        self.inner
            .tbs_certificate
            .subject
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .filter(|atv| atv.oid == COMMON_NAME)
            .find_map(|atv| match atv.value.tag() {
                Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
                    std::str::from_utf8(atv.value.value()).ok().map(String::from)
                }
                _ => None,
            })
    }

    fn subject_dn(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    fn issuer_dn(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    fn verify_issued_by(&self, issuer: &RsaVerifyingKey) -> Result<()> {
        let tbs = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| IntegrityError::Certificate(format!("encode: {e}")))?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| IntegrityError::Certificate("unaligned signature bits".into()))?;
        let (scheme, digest) = self.signature_scheme(&tbs)?;
        issuer
            .as_rsa()
            .verify(scheme, &digest, signature)
            .map_err(|_| IntegrityError::Certificate("issuer signature mismatch".into()))
    }

    fn public_key(&self) -> Result<RsaVerifyingKey> {
        let der = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| IntegrityError::Certificate(format!("encode public key: {e}")))?;
        RsaVerifyingKey::from_public_key_der(&der)
    }

    fn to_pem(&self) -> String {
        self.pem.clone()
    }
}
