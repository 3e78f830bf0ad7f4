use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, ops::Deref, str::FromStr};

/// A fixed-size digest or key hash, `BYTES` long, carried as hex on every boundary.
///
/// # Common Hash Sizes in Cardano
///
/// - **32 bytes**: transaction hashes, VRF key hashes, anchor data hashes
/// - **28 bytes**: policy ids, script hashes, payment / stake / pool key hashes
///
/// # Examples
///
/// ```ignore
/// let hash: TxHash = "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21"
///     .parse()
///     .unwrap();
/// assert_eq!(hash.to_string().len(), 64);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash<const BYTES: usize>([u8; BYTES]);

impl<const BYTES: usize> Default for Hash<BYTES> {
    fn default() -> Self {
        Self::new([0u8; BYTES])
    }
}

// Generic const arrays don't auto-derive serde
impl<const BYTES: usize> Serialize for Hash<BYTES> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de, const BYTES: usize> Deserialize<'de> for Hash<BYTES> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<const BYTES: usize> Hash<BYTES> {
    #[inline]
    pub const fn new(bytes: [u8; BYTES]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    #[inline]
    pub fn into_inner(self) -> [u8; BYTES] {
        self.0
    }
}

impl<const BYTES: usize> From<[u8; BYTES]> for Hash<BYTES> {
    #[inline]
    fn from(bytes: [u8; BYTES]) -> Self {
        Self::new(bytes)
    }
}

impl<const BYTES: usize> TryFrom<&[u8]> for Hash<BYTES> {
    type Error = std::array::TryFromSliceError;

    /// Fails if the slice length does not match `BYTES`.
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let hash: [u8; BYTES] = value.try_into()?;
        Ok(Self::new(hash))
    }
}

impl<const BYTES: usize> From<pallas::crypto::hash::Hash<BYTES>> for Hash<BYTES> {
    fn from(value: pallas::crypto::hash::Hash<BYTES>) -> Self {
        Self::new(*value)
    }
}

impl<const BYTES: usize> AsRef<[u8]> for Hash<BYTES> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const BYTES: usize> Deref for Hash<BYTES> {
    type Target = [u8; BYTES];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const BYTES: usize> fmt::Debug for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Hash<{BYTES}>")).field(&hex::encode(self)).finish()
    }
}

impl<const BYTES: usize> fmt::Display for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self))
    }
}

impl<const BYTES: usize> FromStr for Hash<BYTES> {
    type Err = hex::FromHexError;

    /// Parses a hex string of exactly `BYTES * 2` characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; BYTES];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self::new(bytes))
    }
}

/// Transaction id: Blake2b-256 of the transaction body
pub type TxHash = Hash<32>;

/// Minting policy id (the hash of the policy script)
pub type PolicyId = Hash<28>;

/// Hash of a Plutus or native script
pub type ScriptHash = Hash<28>;

/// Blake2b-224 hash of a verification key
pub type KeyHash = Hash<28>;

/// Hash of a pool VRF verification key
pub type VrfKeyHash = Hash<32>;

/// Hash of an off-chain document (anchors, pool metadata)
pub type DataHash = Hash<32>;
