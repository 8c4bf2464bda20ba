//! integrity-core: code signing and integrity verification.
//!
//! Signs a code tree (one application or the platform core) as a SHA-512
//! hash map covered by an RSA signature and an X.509 certificate, and later
//! verifies the tree against that document:
//!
//! - `enumerator`: pruned directory walk with configurable exclusions
//! - `hashes`: SHA-512 hash set keyed by `/`-rooted relative path
//! - `codec`: `signature.json` document and its canonical signed form
//! - `certificate` / `keys`: X.509 and RSA behind narrow handle traits
//! - `trust`: chain to the root certificate and scope (CN) checks
//! - `reconcile`: three-way diff of expected and current hashes
//! - `checker`: sign / verify orchestration and app/core entry points

pub mod certificate;
pub mod checker;
pub mod codec;
pub mod enumerator;
pub mod error;
pub mod hashes;
pub mod keys;
pub mod paths;
pub mod reconcile;
pub mod settings;
pub mod storage;
pub mod trust;

pub use certificate::{CertificateHandle, X509Certificate};
pub use checker::{Checker, Scope};
pub use codec::SignatureDocument;
pub use error::{IntegrityError, InvalidSignature, Result};
pub use hashes::FileHashes;
pub use keys::{RsaSigningKey, RsaVerifyingKey, SigningKeyHandle, VerifyingKeyHandle};
pub use paths::Environment;
pub use reconcile::{DifferenceKind, DifferenceReport, FileDifference};
pub use settings::IntegritySettings;
pub use storage::{AppPathResolver, AppsDirectory, FileAccess, LocalFileAccess};
pub use trust::{TrustAnchor, TrustValidator};
