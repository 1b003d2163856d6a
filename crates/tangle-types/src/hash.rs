//! 81-tryte hashes and 27-tryte tags.

use crate::errors::CodecError;
use crate::trytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;
use std::fmt;
use std::str::FromStr;

/// Width of a hash in trytes.
pub const HASH_SIZE: usize = 81;

/// Width of a tag in trytes.
pub const TAG_SIZE: usize = 27;

/// The all-`9` hash. Names the genesis record every graph bottoms out at.
pub const NULL_HASH: Hash = Hash([b'9'; HASH_SIZE]);

/// An 81-tryte identifier for transactions, addresses and bundles.
///
/// Stored as ASCII tryte symbols so equality is byte-exact and display is
/// free.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Build a hash from a tryte slice of exactly [`HASH_SIZE`] symbols.
    pub fn from_trytes(input: &[u8]) -> Result<Self, CodecError> {
        if input.len() != HASH_SIZE {
            return Err(CodecError::InvalidLength {
                expected: HASH_SIZE,
                actual: input.len(),
            });
        }
        if let Some(position) = input.iter().position(|b| !trytes::is_tryte(*b as char)) {
            return Err(CodecError::InvalidTryte {
                found: input[position] as char,
                position,
            });
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(input);
        Ok(Self(bytes))
    }

    /// Hash a tryte payload.
    ///
    /// SHAKE256 is squeezed to one byte per output tryte and each byte is
    /// reduced into the alphabet.
    pub fn digest(payload: &[u8]) -> Self {
        let mut hasher = Shake256::default();
        hasher.update(payload);
        let mut reader = hasher.finalize_xof();
        let mut raw = [0u8; HASH_SIZE];
        reader.read(&mut raw);

        let mut bytes = [0u8; HASH_SIZE];
        for (out, byte) in bytes.iter_mut().zip(raw.iter()) {
            *out = trytes::symbol_from_byte(*byte);
        }
        Self(bytes)
    }

    /// Tryte symbols of this hash.
    pub fn as_trytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Whether this is the null (genesis) hash.
    pub fn is_null(&self) -> bool {
        *self == NULL_HASH
    }

    /// Number of trailing zero trits, i.e. the proof-of-work weight this
    /// hash demonstrates.
    pub fn weight_magnitude(&self) -> u8 {
        let mut weight = 0u8;
        for &symbol in self.0.iter().rev() {
            if symbol == b'9' {
                weight += 3;
                continue;
            }
            for trit in trytes::trits(&[symbol]).iter().rev() {
                if *trit != 0 {
                    return weight;
                }
                weight += 1;
            }
        }
        weight
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bytes are alphabet symbols by construction.
        f.write_str(std::str::from_utf8(&self.0).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = std::str::from_utf8(&self.0).map_err(|_| fmt::Error)?;
        write!(f, "Hash({}..)", &s[..12])
    }
}

impl FromStr for Hash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_trytes(s.as_bytes())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 27-tryte tag. Shorter inputs are right-padded with `9`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; TAG_SIZE]);

impl Tag {
    /// The all-`9` tag.
    pub const EMPTY: Tag = Tag([b'9'; TAG_SIZE]);

    /// Build a tag from up to [`TAG_SIZE`] trytes, padding with `9`.
    pub fn padded(input: &str) -> Result<Self, CodecError> {
        Self::from_trytes(input.as_bytes())
    }

    /// Byte-level form of [`Tag::padded`].
    pub fn from_trytes(input: &[u8]) -> Result<Self, CodecError> {
        if input.len() > TAG_SIZE {
            return Err(CodecError::TagTooLong {
                actual: input.len(),
                max: TAG_SIZE,
            });
        }
        if let Some(position) = input.iter().position(|b| !trytes::is_tryte(*b as char)) {
            return Err(CodecError::InvalidTryte {
                found: input[position] as char,
                position,
            });
        }
        let mut bytes = [trytes::TRYTE_ALPHABET[0]; TAG_SIZE];
        bytes[..input.len()].copy_from_slice(input);
        Ok(Self(bytes))
    }

    pub fn as_trytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl FromStr for Tag {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::padded(s)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
