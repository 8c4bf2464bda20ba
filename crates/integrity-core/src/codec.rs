//! Persisted signature document and the canonical byte form that gets signed.
//!
//! The document is stored as pretty-printed JSON:
//!
//! ```json
//! {
//!     "hashes": { "/relative/path": "<sha512 hex>" },
//!     "signature": "<base64 RSA signature>",
//!     "certificate": "-----BEGIN CERTIFICATE-----..."
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{IntegrityError, Result};
use crate::hashes::FileHashes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDocument {
    pub hashes: FileHashes,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    pub certificate: String,
}

/// Compact JSON of `hashes` with keys in byte order. This is the exact input
/// to signing and signature verification.
pub fn canonicalize(hashes: &FileHashes) -> Result<Vec<u8>> {
    serde_json::to_vec(hashes).map_err(|e| IntegrityError::MalformedDocument(e.to_string()))
}

pub fn encode(document: &SignatureDocument) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    document
        .serialize(&mut serializer)
        .map_err(|e| IntegrityError::MalformedDocument(e.to_string()))?;
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<SignatureDocument> {
    serde_json::from_slice(bytes).map_err(|e| IntegrityError::MalformedDocument(e.to_string()))
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignatureDocument {
        let mut hashes = FileHashes::new();
        hashes.insert("/subfolder/file.txt".into(), "ab".repeat(64));
        hashes.insert("/AnotherFile.txt".into(), "cd".repeat(64));
        SignatureDocument {
            hashes,
            signature: vec![0, 1, 2, 254, 255],
            certificate: "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----".into(),
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let document = sample();
        let decoded = decode(&encode(&document).unwrap()).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn encoding_is_pretty_with_four_spaces() {
        let text = String::from_utf8(encode(&sample()).unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"hashes\": {\n        \"/AnotherFile.txt\""));
        assert!(text.contains("\n    \"signature\": \"AAEC/v8=\""));
    }

    #[test]
    fn canonical_form_ignores_insertion_order() {
        let pairs = [("/b", "2"), ("/a", "1"), ("/c/d", "3"), ("/B", "4")];
        let forward: FileHashes = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let backward: FileHashes = pairs
            .iter()
            .rev()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let canonical = canonicalize(&forward).unwrap();
        assert_eq!(canonical, canonicalize(&backward).unwrap());
        assert_eq!(
            canonical,
            br#"{"/B":"4","/a":"1","/b":"2","/c/d":"3"}"#.to_vec()
        );
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let err = decode(br#"{"hashes": {}, "signature": ""}"#).unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedDocument(_)));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err =
            decode(br#"{"hashes": {}, "signature": "***", "certificate": ""}"#).unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedDocument(_)));
    }

    #[test]
    fn decode_rejects_non_json() {
        assert!(decode(b"not a document").is_err());
        assert!(decode(b"[1, 2, 3]").is_err());
    }

    #[test]
    fn decode_accepts_escaped_slashes() {
        let document = decode(
            br#"{"hashes": {"\/sub\/file.txt": "00"}, "signature": "AA==", "certificate": "c"}"#,
        )
        .unwrap();
        assert_eq!(document.hashes["/sub/file.txt"], "00");
        assert_eq!(document.signature, vec![0]);
    }
}
