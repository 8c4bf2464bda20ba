use tracing::{debug, warn};

use crate::certificate::{CertificateHandle, X509Certificate};
use crate::error::{IntegrityError, InvalidSignature, Result};
use crate::keys::RsaVerifyingKey;
use crate::paths::{Environment, CORE_SCOPE};
use crate::storage::FileAccess;

/// Root certificate every signing certificate has to chain to.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    certificate: X509Certificate,
}

impl TrustAnchor {
    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Self {
            certificate: X509Certificate::from_pem(pem)?,
        })
    }

    /// Reads the root certificate shipped at `resources/codesigning/root.crt`.
    pub fn load(files: &dyn FileAccess, environment: &Environment) -> Result<Self> {
        let path = environment.root_certificate_path();
        let bytes = files.read(&path)?;
        let pem = String::from_utf8(bytes).map_err(|_| {
            IntegrityError::Certificate(format!(
                "{} is not PEM text",
                path.display()
            ))
        })?;
        Self::from_pem(&pem)
    }
}

pub struct TrustValidator {
    anchor: TrustAnchor,
}

impl TrustValidator {
    pub fn new(anchor: TrustAnchor) -> Self {
        Self { anchor }
    }

    /// The certificate must name the anchor as issuer and carry a signature
    /// made by the anchor's key.
    pub fn validate_certificate<C>(&self, certificate: &C) -> Result<()>
    where
        C: CertificateHandle<PublicKey = RsaVerifyingKey>,
    {
        let root = &self.anchor.certificate;
        if certificate.issuer_dn() != root.subject_dn() {
            warn!(
                "Certificate issuer {} is not the trust anchor {}",
                certificate.issuer_dn(),
                root.subject_dn()
            );
            return Err(InvalidSignature::CertificateNotValid.into());
        }
        let root_key = root.public_key()?;
        if let Err(e) = certificate.verify_issued_by(&root_key) {
            warn!("Certificate {} rejected: {}", certificate.subject_dn(), e);
            return Err(InvalidSignature::CertificateNotValid.into());
        }
        debug!("Certificate {} chains to trust anchor", certificate.subject_dn());
        Ok(())
    }

    /// Subject CN must equal `requested` or the always trusted `core` scope.
    pub fn check_scope<C: CertificateHandle>(&self, certificate: &C, requested: &str) -> Result<()> {
        match certificate.subject_cn() {
            Some(cn) if cn == requested || cn == CORE_SCOPE => Ok(()),
            _ => {
                let current = certificate.subject_dn();
                warn!(
                    "Certificate scope mismatch (requested {}, current {})",
                    requested, current
                );
                Err(InvalidSignature::ScopeMismatch {
                    requested: requested.to_string(),
                    current,
                }
                .into())
            }
        }
    }
}
