//! Content identifiers and sandbox labels.
//!
//! A [`ContentId`] is the 43-character URL-safe base64 name of a piece of
//! permanent data, addressed by cryptographic identity. Decoded it is a
//! 32-byte digest; the decoded bytes re-encoded as lowercase unpadded base32
//! form the [`sandbox label`](ContentId::sandbox_label) used as the
//! security-isolating subdomain.

use crate::error::GatewayError;
use base64::alphabet;
use base64::engine::{self, Engine as _};
use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a content identifier in its base64url form.
pub const CONTENT_ID_LENGTH: usize = 43;

// The original gateway decodes ids with Node's tolerant base64 parser, which
// ignores nonzero trailing bits in the final character. Match that rather
// than rejecting non-canonical encodings.
const B64_URL_TOLERANT: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    engine::GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent),
);

/// A validated 43-character URL-safe base64 content identifier.
///
/// Construction goes through [`FromStr`] / [`TryFrom<String>`], so every
/// `ContentId` in the system is known to match `[A-Za-z0-9_-]{43}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// The identifier as its original base64url string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the identifier to its raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, GatewayError> {
        B64_URL_TOLERANT
            .decode(self.0.as_bytes())
            .map_err(|_| GatewayError::InvalidContentId(self.0.clone()))
    }

    /// Canonical sandbox label: the lowercase, unpadded base32 encoding of
    /// the decoded identifier bytes.
    ///
    /// A pure function of the identifier — recomputed per request, never
    /// stored.
    pub fn sandbox_label(&self) -> Result<String, GatewayError> {
        Ok(BASE32_NOPAD.encode(&self.decode()?).to_ascii_lowercase())
    }
}

impl FromStr for ContentId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CONTENT_ID_LENGTH
            || !s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(GatewayError::InvalidContentId(s.to_string()));
        }
        Ok(ContentId(s.to_string()))
    }
}

impl TryFrom<String> for ContentId {
    type Error = GatewayError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ID: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    #[test]
    fn accepts_43_char_urlsafe_ids() {
        let id: ContentId = "Cr0RVzYurZsGS2A7jsLmmjjTIPBOTyYXIWqYPkSdb3E"
            .parse()
            .unwrap();
        assert_eq!(id.as_str().len(), CONTENT_ID_LENGTH);
    }

    #[test]
    fn rejects_wrong_length_and_charset() {
        assert!("too-short".parse::<ContentId>().is_err());
        assert!(
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA" // 44 chars
                .parse::<ContentId>()
                .is_err()
        );
        assert!(
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA+" // '+' not urlsafe
                .parse::<ContentId>()
                .is_err()
        );
    }

    #[test]
    fn decodes_to_32_bytes() {
        let id: ContentId = ZERO_ID.parse().unwrap();
        assert_eq!(id.decode().unwrap(), vec![0u8; 32]);
    }

    #[test]
    fn sandbox_label_is_lowercase_unpadded_base32() {
        let id: ContentId = ZERO_ID.parse().unwrap();
        let label = id.sandbox_label().unwrap();
        // 32 zero bytes encode to 52 base32 'a's.
        assert_eq!(label, "a".repeat(52));
        assert!(!label.contains('='));
    }

    #[test]
    fn sandbox_label_is_deterministic() {
        let id: ContentId = "Cr0RVzYurZsGS2A7jsLmmjjTIPBOTyYXIWqYPkSdb3E"
            .parse()
            .unwrap();
        let first = id.sandbox_label().unwrap();
        let second = id.sandbox_label().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 52);
        assert_eq!(first, first.to_ascii_lowercase());
    }

    #[test]
    fn tolerates_nonzero_trailing_bits() {
        // 'B' carries a nonzero low bit in the final sextet; the tolerant
        // engine must still decode it, as the original gateway does.
        let id: ContentId = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAB"
            .parse()
            .unwrap();
        assert!(id.sandbox_label().is_ok());
    }

    #[test]
    fn serde_round_trip() {
        let id: ContentId = ZERO_ID.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{ZERO_ID}\""));
        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ContentId>("\"nope\"").is_err());
    }
}
