//! Signing and verification entry points.
//!
//! Signing walks a tree, hashes it, signs the canonical hash map and writes
//! the signature document next to the code. Verification runs the same
//! pipeline backwards: trust and scope of the embedded certificate first,
//! then the document signature, and only then a fresh hash of the tree.

use std::fmt;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::certificate::{CertificateHandle, X509Certificate};
use crate::codec::{self, SignatureDocument};
use crate::enumerator::{ExclusionRules, FileEnumerator};
use crate::error::{IntegrityError, InvalidSignature, Result};
use crate::hashes::hash_tree;
use crate::keys::{SigningKeyHandle, VerifyingKeyHandle};
use crate::paths::{join_relative, Environment, APP_SIGNATURE_FILE, CORE_SCOPE, CORE_SIGNATURE_FILE};
use crate::reconcile::{self, DifferenceReport};
use crate::settings::IntegritySettings;
use crate::storage::{AppPathResolver, AppsDirectory, FileAccess, LocalFileAccess};
use crate::trust::{TrustAnchor, TrustValidator};

/// What a signature covers: one application or the platform core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    App(String),
    Core,
}

impl Scope {
    /// `core` maps to [`Scope::Core`], anything else is an app id.
    pub fn from_name(name: &str) -> Self {
        if name == CORE_SCOPE {
            Scope::Core
        } else {
            Scope::App(name.to_string())
        }
    }

    /// Name a certificate CN has to carry to sign this scope.
    pub fn name(&self) -> &str {
        match self {
            Scope::App(id) => id,
            Scope::Core => CORE_SCOPE,
        }
    }

    /// Location of the signature document relative to the signed root.
    pub fn signature_file(&self) -> &'static str {
        match self {
            Scope::App(_) => APP_SIGNATURE_FILE,
            Scope::Core => CORE_SIGNATURE_FILE,
        }
    }

    pub fn exclusion_rules(&self, settings: &IntegritySettings) -> ExclusionRules {
        match self {
            Scope::App(_) => ExclusionRules::for_app(&settings.exclusions),
            Scope::Core => ExclusionRules::for_core(&settings.exclusions),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Checker {
    environment: Environment,
    settings: IntegritySettings,
    trust: TrustValidator,
    apps: Box<dyn AppPathResolver>,
    files: Box<dyn FileAccess>,
}

impl Checker {
    /// Checker over the local filesystem with apps installed below
    /// `<server_root>/apps`.
    pub fn new(
        environment: Environment,
        settings: IntegritySettings,
        anchor: TrustAnchor,
    ) -> Result<Self> {
        settings.validate()?;
        let apps = AppsDirectory::new(environment.server_root().join("apps"));
        Ok(Self {
            environment,
            settings,
            trust: TrustValidator::new(anchor),
            apps: Box::new(apps),
            files: Box::new(LocalFileAccess),
        })
    }

    /// Like [`Checker::new`] with the anchor read from
    /// `<server_root>/resources/codesigning/root.crt`.
    pub fn open(environment: Environment, settings: IntegritySettings) -> Result<Self> {
        Self::open_with(environment, settings, LocalFileAccess)
    }

    /// Like [`Checker::open`] with the anchor, and every signature document
    /// afterwards, read and written through `files`.
    pub fn open_with(
        environment: Environment,
        settings: IntegritySettings,
        files: impl FileAccess + 'static,
    ) -> Result<Self> {
        let anchor = TrustAnchor::load(&files, &environment)?;
        Ok(Self::new(environment, settings, anchor)?.with_file_access(files))
    }

    pub fn with_app_resolver(mut self, apps: impl AppPathResolver + 'static) -> Self {
        self.apps = Box::new(apps);
        self
    }

    pub fn with_file_access(mut self, files: impl FileAccess + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    fn enumerator(&self, scope: &Scope) -> FileEnumerator {
        FileEnumerator::new(scope.exclusion_rules(&self.settings))
    }

    /// Hashes `root`, signs the result with `key` and writes the document to
    /// the scope's signature file below `root`. The certificate is embedded
    /// as is; its trust is only checked on verification. `key` must belong
    /// to the certificate.
    pub fn sign<C, K>(
        &self,
        root: &Path,
        scope: &Scope,
        certificate: &C,
        key: &K,
    ) -> Result<SignatureDocument>
    where
        C: CertificateHandle,
        K: SigningKeyHandle,
    {
        info!("Signing {} scope at {}", scope, root.display());
        let hashes = hash_tree(&self.enumerator(scope), root)?;
        let payload = codec::canonicalize(&hashes)?;
        let signature = key.sign(&payload)?;
        certificate
            .public_key()?
            .verify(&payload, &signature)
            .map_err(|_| IntegrityError::KeyMismatch)?;

        let document = SignatureDocument {
            hashes,
            signature,
            certificate: certificate.to_pem(),
        };
        let path = join_relative(root, scope.signature_file());
        self.files.write(&path, &codec::encode(&document)?)?;
        info!(
            "Wrote signature over {} files to {}",
            document.hashes.len(),
            path.display()
        );
        Ok(document)
    }

    pub fn write_app_signature<C, K>(
        &self,
        app_id: &str,
        certificate: &C,
        key: &K,
    ) -> Result<SignatureDocument>
    where
        C: CertificateHandle,
        K: SigningKeyHandle,
    {
        let app_path = self.apps.app_path(app_id)?;
        self.sign(&app_path, &Scope::App(app_id.to_string()), certificate, key)
    }

    pub fn write_core_signature<C, K>(&self, certificate: &C, key: &K) -> Result<SignatureDocument>
    where
        C: CertificateHandle,
        K: SigningKeyHandle,
    {
        self.sign(self.environment.server_root(), &Scope::Core, certificate, key)
    }

    /// Verifies the document at `signature_path` and compares its hashes
    /// with the current content of `base_path`. `core` selects the core
    /// scope, any other name an app.
    ///
    /// Trust, scope and signature failures are returned as errors before the
    /// tree is touched. Discrepancies in the tree are data: an empty report
    /// means the code is exactly what was signed.
    pub fn verify(
        &self,
        signature_path: &Path,
        base_path: &Path,
        scope_name: &str,
    ) -> Result<DifferenceReport> {
        self.verify_scope(signature_path, base_path, &Scope::from_name(scope_name))
    }

    fn verify_scope(
        &self,
        signature_path: &Path,
        base_path: &Path,
        scope: &Scope,
    ) -> Result<DifferenceReport> {
        let scope_name = scope.name();
        debug!(
            "Verifying {} against {} for scope {}",
            base_path.display(),
            signature_path.display(),
            scope_name
        );
        let document = self.read_document(signature_path)?;

        let certificate = X509Certificate::from_pem(&document.certificate).map_err(|e| {
            warn!("Embedded certificate unusable: {}", e);
            InvalidSignature::CertificateNotValid
        })?;
        self.trust.validate_certificate(&certificate)?;
        self.trust.check_scope(&certificate, scope_name)?;

        let payload = codec::canonicalize(&document.hashes)?;
        let public_key = certificate
            .public_key()
            .map_err(|_| InvalidSignature::CertificateNotValid)?;
        if let Err(e) = public_key.verify(&payload, &document.signature) {
            warn!("Signature over {} does not verify", signature_path.display());
            return Err(e);
        }

        let current = hash_tree(&self.enumerator(scope), base_path)?;
        let report = reconcile::diff(&document.hashes, &current)?;
        if report.is_empty() {
            info!("{} matches its signature", base_path.display());
        } else {
            error!(
                "{} differs from its signature in {} files",
                base_path.display(),
                report.len()
            );
            for (kind, path, _) in report.iter() {
                debug!("{:?}: {}", kind, path);
            }
        }
        Ok(report)
    }

    pub fn verify_app_signature(&self, app_id: &str) -> Result<DifferenceReport> {
        let app_path = self.apps.app_path(app_id)?;
        self.verify_scope(
            &join_relative(&app_path, APP_SIGNATURE_FILE),
            &app_path,
            &Scope::App(app_id.to_string()),
        )
    }

    pub fn verify_core_signature(&self) -> Result<DifferenceReport> {
        self.verify_scope(
            &self.environment.core_signature_path(),
            self.environment.server_root(),
            &Scope::Core,
        )
    }

    fn read_document(&self, path: &Path) -> Result<SignatureDocument> {
        let bytes = self.files.read(path).map_err(|e| {
            debug!("No signature document: {}", e);
            InvalidSignature::SignatureDataNotFound
        })?;
        let document = codec::decode(&bytes).map_err(|e| {
            debug!("Unreadable signature document: {}", e);
            InvalidSignature::SignatureDataNotFound
        })?;
        if document.signature.is_empty() || document.certificate.trim().is_empty() {
            return Err(InvalidSignature::SignatureDataNotFound.into());
        }
        Ok(document)
    }
}
