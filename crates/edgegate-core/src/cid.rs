//! Content identifiers
//!
//! A [`ContentId`] names an immutable piece of content-addressed data. The
//! gateway never decodes the multihash inside it; it only checks that the
//! string form is a well-formed CIDv0 or multibase-prefixed CIDv1 and keeps
//! that string as the stable encoding used for attribution.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const BASE58_BTC: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BASE32_LOWER: &str = "abcdefghijklmnopqrstuvwxyz234567";
const BASE32_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const BASE36_LOWER: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const BASE36_UPPER: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE16_LOWER: &str = "0123456789abcdef";
const BASE16_UPPER: &str = "0123456789ABCDEF";

const CID_V0_LEN: usize = 46;
const MIN_V1_PAYLOAD: usize = 8;

/// Errors produced while parsing a content identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidError {
    #[error("content identifier is empty")]
    Empty,
    #[error("unsupported multibase prefix '{0}'")]
    UnsupportedMultibase(char),
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },
    #[error("content identifier is too short")]
    TooShort,
}

/// CID version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidVersion {
    V0,
    V1,
}

/// An immutable, cheaply clonable content identifier
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(Arc<str>);

impl ContentId {
    /// Parse and validate a content identifier string
    pub fn parse(s: &str) -> Result<Self, CidError> {
        validate(s)?;
        Ok(Self(Arc::from(s)))
    }

    /// The stable string encoding
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CIDv0 identifiers are bare base58btc `Qm...` strings
    pub fn version(&self) -> CidVersion {
        if is_v0_shape(&self.0) {
            CidVersion::V0
        } else {
            CidVersion::V1
        }
    }
}

fn is_v0_shape(s: &str) -> bool {
    s.len() == CID_V0_LEN && s.starts_with("Qm")
}

fn validate(s: &str) -> Result<(), CidError> {
    let mut chars = s.chars();
    let prefix = chars.next().ok_or(CidError::Empty)?;

    if is_v0_shape(s) {
        return check_alphabet(s, BASE58_BTC, 0);
    }

    let alphabet = match prefix {
        'b' => BASE32_LOWER,
        'B' => BASE32_UPPER,
        'z' => BASE58_BTC,
        'k' => BASE36_LOWER,
        'K' => BASE36_UPPER,
        'f' => BASE16_LOWER,
        'F' => BASE16_UPPER,
        other => return Err(CidError::UnsupportedMultibase(other)),
    };

    let payload = chars.as_str();
    if payload.len() < MIN_V1_PAYLOAD {
        return Err(CidError::TooShort);
    }
    check_alphabet(payload, alphabet, 1)
}

fn check_alphabet(s: &str, alphabet: &str, offset: usize) -> Result<(), CidError> {
    match s.chars().position(|c| !alphabet.contains(c)) {
        Some(position) => Err(CidError::InvalidCharacter {
            // position came from the same iterator, so nth cannot miss
            ch: s.chars().nth(position).unwrap_or_default(),
            position: position + offset,
        }),
        None => Ok(()),
    }
}

impl FromStr for ContentId {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
