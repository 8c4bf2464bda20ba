use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntegrityError>;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed signature document: {0}")]
    MalformedDocument(String),

    #[error(transparent)]
    InvalidSignature(#[from] InvalidSignature),

    #[error("Invalid behaviour in file hash comparison experienced for {0}. Please report this error to the developers.")]
    InternalConsistency(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Key error: {0}")]
    Key(String),

    #[error("Private key does not match the certificate public key")]
    KeyMismatch,

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Unknown application: {0}")]
    UnknownApp(String),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl IntegrityError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Trust failures raised while verifying a signature document. Any of these
/// stops verification before the tree is hashed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSignature {
    #[error("Signature data not found.")]
    SignatureDataNotFound,

    #[error("Certificate is not valid.")]
    CertificateNotValid,

    #[error("Certificate is not valid for required scope. (Requested: {requested}, current: {current})")]
    ScopeMismatch { requested: String, current: String },

    #[error("Signature could not get verified.")]
    SignatureMismatch,
}
