//! BIP-32 hierarchical deterministic keys.
//!
//! Extended private and public keys with child key derivation and the
//! Base58Check `xprv`/`xpub` string encoding.  The serialized payload is
//! 78 bytes: version(4) + depth(1) + parent fingerprint(4) + child
//! index(4, big-endian) + chain code(32) + key(33).

use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::ScalarPrimitive;
use k256::{ProjectivePoint, Scalar, Secp256k1};

use crate::base58;
use crate::ec::{PrivateKey, PublicKey};
use crate::hash::{hash160, sha512_hmac};
use crate::PrimitivesError;

/// Child indices at or above this value use hardened derivation.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key used to derive a master key from a seed.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Mainnet extended private key version bytes ("xprv").
const VERSION_XPRV: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
/// Mainnet extended public key version bytes ("xpub").
const VERSION_XPUB: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
/// Testnet extended private key version bytes ("tprv").
const VERSION_TPRV: [u8; 4] = [0x04, 0x35, 0x83, 0x94];
/// Testnet extended public key version bytes ("tpub").
const VERSION_TPUB: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];

/// Serialized extended key payload length (without checksum).
const EXTENDED_KEY_LEN: usize = 78;

/// Network selector for extended key version bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyNetwork {
    /// Mainnet (`xprv` / `xpub`).
    Mainnet,
    /// Testnet (`tprv` / `tpub`).
    Testnet,
}

/// A BIP-32 extended private key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedPrivateKey {
    network: KeyNetwork,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: [u8; 32],
    key: PrivateKey,
}

/// A BIP-32 extended public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    network: KeyNetwork,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: [u8; 32],
    key: PublicKey,
}

impl ExtendedPrivateKey {
    /// Derive the master key from a seed.
    ///
    /// Computes HMAC-SHA512 over the seed with the key `"Bitcoin seed"`;
    /// the left half becomes the private key, the right half the chain
    /// code.
    ///
    /// # Arguments
    /// * `seed` - Seed bytes, 16 to 64 bytes long.
    /// * `network` - Network for the string encoding.
    ///
    /// # Returns
    /// `Ok(ExtendedPrivateKey)` or an error for an invalid seed length
    /// or an out-of-range left half.
    pub fn from_seed(seed: &[u8], network: KeyNetwork) -> Result<Self, PrimitivesError> {
        if seed.len() < 16 || seed.len() > 64 {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "seed length {} outside 16..=64 bytes",
                seed.len()
            )));
        }

        let i = sha512_hmac(MASTER_HMAC_KEY, seed);
        let (il, ir) = i.split_at(32);

        let key = PrivateKey::from_bytes(il).map_err(|e| {
            PrimitivesError::InvalidExtendedKey(format!("invalid master key: {}", e))
        })?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(ExtendedPrivateKey {
            network,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
            chain_code,
            key,
        })
    }

    /// Access the underlying private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        self.key.pub_key()
    }

    /// Return the chain code.
    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Return the depth in the derivation tree (0 for the master key).
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Return the child index this key was derived with.
    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    /// Compute this key's fingerprint: the first 4 bytes of
    /// hash160(compressed public key).
    pub fn fingerprint(&self) -> [u8; 4] {
        let h = hash160(&self.public_key().to_compressed());
        let mut fp = [0u8; 4];
        fp.copy_from_slice(&h[..4]);
        fp
    }

    /// Convert to the corresponding extended public key.
    pub fn to_extended_public(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            network: self.network,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            chain_code: self.chain_code,
            key: self.public_key(),
        }
    }

    /// Derive a child extended private key (CKDpriv).
    ///
    /// Indices at or above [`HARDENED_OFFSET`] use hardened derivation
    /// (HMAC over `0x00 || key || index`); lower indices use the
    /// compressed public key instead.
    ///
    /// # Arguments
    /// * `index` - The child index.
    ///
    /// # Returns
    /// `Ok(ExtendedPrivateKey)` for the child, or an error if the
    /// derived scalar is invalid.
    pub fn derive_child(&self, index: u32) -> Result<Self, PrimitivesError> {
        let mut data = Vec::with_capacity(37);
        if index >= HARDENED_OFFSET {
            data.push(0x00);
            data.extend_from_slice(&self.key.to_bytes());
        } else {
            data.extend_from_slice(&self.public_key().to_compressed());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let i = sha512_hmac(&self.chain_code, &data);
        let (il, ir) = i.split_at(32);

        // child = (IL + parent) mod n; zero result is invalid.
        let tweak = scalar_from_be_bytes(il);
        let child_scalar = self.key.to_scalar() + tweak;
        let primitive: ScalarPrimitive<Secp256k1> = child_scalar.into();
        let child_bytes = primitive.to_bytes();
        let key = PrivateKey::from_bytes(&child_bytes).map_err(|e| {
            PrimitivesError::InvalidExtendedKey(format!("invalid child key: {}", e))
        })?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(ExtendedPrivateKey {
            network: self.network,
            depth: self.depth.wrapping_add(1),
            parent_fingerprint: self.fingerprint(),
            child_index: index,
            chain_code,
            key,
        })
    }

    /// Derive a key along a path string such as `m/0'/1/2'/2`.
    ///
    /// Accepts `'` or `h` as the hardened marker; a leading `m` (or
    /// `m/`) refers to this key itself.
    ///
    /// # Arguments
    /// * `path` - The derivation path string.
    ///
    /// # Returns
    /// `Ok(ExtendedPrivateKey)` at the end of the path, or an error for
    /// a malformed path.
    pub fn derive_path(&self, path: &str) -> Result<Self, PrimitivesError> {
        let mut key = self.clone();
        for index in parse_path(path)? {
            key = key.derive_child(index)?;
        }
        Ok(key)
    }

    /// Parse an extended private key from its Base58Check string.
    ///
    /// # Arguments
    /// * `s` - An `xprv` or `tprv` string.
    ///
    /// # Returns
    /// `Ok(ExtendedPrivateKey)` on success, or an error for a bad
    /// checksum, length, or version.
    pub fn from_string(s: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(s)?;
        if payload.len() != EXTENDED_KEY_LEN {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "payload length {} != {}",
                payload.len(),
                EXTENDED_KEY_LEN
            )));
        }

        let network = match &payload[0..4] {
            v if v == VERSION_XPRV => KeyNetwork::Mainnet,
            v if v == VERSION_TPRV => KeyNetwork::Testnet,
            v => {
                return Err(PrimitivesError::InvalidExtendedKey(format!(
                    "unknown private key version {}",
                    hex::encode(v)
                )));
            }
        };

        if payload[45] != 0x00 {
            return Err(PrimitivesError::InvalidExtendedKey(
                "private key payload must begin with 0x00".to_string(),
            ));
        }

        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&payload[5..9]);
        let child_index = u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let key = PrivateKey::from_bytes(&payload[46..78])?;

        Ok(ExtendedPrivateKey {
            network,
            depth: payload[4],
            parent_fingerprint,
            child_index,
            chain_code,
            key,
        })
    }

    /// Serialize to the Base58Check `xprv`/`tprv` string form.
    pub fn to_string(&self) -> String {
        let version = match self.network {
            KeyNetwork::Mainnet => VERSION_XPRV,
            KeyNetwork::Testnet => VERSION_TPRV,
        };
        let mut payload = Vec::with_capacity(EXTENDED_KEY_LEN);
        payload.extend_from_slice(&version);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_index.to_be_bytes());
        payload.extend_from_slice(&self.chain_code);
        payload.push(0x00);
        payload.extend_from_slice(&self.key.to_bytes());
        base58::check_encode(&payload)
    }
}

impl ExtendedPublicKey {
    /// Access the underlying public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// Return the chain code.
    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Return the depth in the derivation tree.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Return the child index this key was derived with.
    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    /// Compute this key's fingerprint.
    pub fn fingerprint(&self) -> [u8; 4] {
        let h = hash160(&self.key.to_compressed());
        let mut fp = [0u8; 4];
        fp.copy_from_slice(&h[..4]);
        fp
    }

    /// Derive a child extended public key (CKDpub).
    ///
    /// Only non-hardened derivation is possible; indices at or above
    /// [`HARDENED_OFFSET`] fail with
    /// [`PrimitivesError::HardenedFromPublic`].
    ///
    /// # Arguments
    /// * `index` - The child index (must be below `HARDENED_OFFSET`).
    ///
    /// # Returns
    /// `Ok(ExtendedPublicKey)` for the child, or an error.
    pub fn derive_child(&self, index: u32) -> Result<Self, PrimitivesError> {
        if index >= HARDENED_OFFSET {
            return Err(PrimitivesError::HardenedFromPublic);
        }

        let mut data = Vec::with_capacity(37);
        data.extend_from_slice(&self.key.to_compressed());
        data.extend_from_slice(&index.to_be_bytes());

        let i = sha512_hmac(&self.chain_code, &data);
        let (il, ir) = i.split_at(32);

        // child = IL*G + parent point.
        let tweak = scalar_from_be_bytes(il);
        let parent_point = self.key.to_projective_point()?;
        let child_point = ProjectivePoint::GENERATOR * tweak + parent_point;
        let encoded = child_point.to_affine().to_encoded_point(true);
        let key = PublicKey::from_bytes(encoded.as_bytes())?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(ExtendedPublicKey {
            network: self.network,
            depth: self.depth.wrapping_add(1),
            parent_fingerprint: self.fingerprint(),
            child_index: index,
            chain_code,
            key,
        })
    }

    /// Parse an extended public key from its Base58Check string.
    ///
    /// # Arguments
    /// * `s` - An `xpub` or `tpub` string.
    ///
    /// # Returns
    /// `Ok(ExtendedPublicKey)` on success, or an error for a bad
    /// checksum, length, or version.
    pub fn from_string(s: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(s)?;
        if payload.len() != EXTENDED_KEY_LEN {
            return Err(PrimitivesError::InvalidExtendedKey(format!(
                "payload length {} != {}",
                payload.len(),
                EXTENDED_KEY_LEN
            )));
        }

        let network = match &payload[0..4] {
            v if v == VERSION_XPUB => KeyNetwork::Mainnet,
            v if v == VERSION_TPUB => KeyNetwork::Testnet,
            v => {
                return Err(PrimitivesError::InvalidExtendedKey(format!(
                    "unknown public key version {}",
                    hex::encode(v)
                )));
            }
        };

        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&payload[5..9]);
        let child_index = u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&payload[13..45]);
        let key = PublicKey::from_bytes(&payload[45..78])?;

        Ok(ExtendedPublicKey {
            network,
            depth: payload[4],
            parent_fingerprint,
            child_index,
            chain_code,
            key,
        })
    }

    /// Serialize to the Base58Check `xpub`/`tpub` string form.
    pub fn to_string(&self) -> String {
        let version = match self.network {
            KeyNetwork::Mainnet => VERSION_XPUB,
            KeyNetwork::Testnet => VERSION_TPUB,
        };
        let mut payload = Vec::with_capacity(EXTENDED_KEY_LEN);
        payload.extend_from_slice(&version);
        payload.push(self.depth);
        payload.extend_from_slice(&self.parent_fingerprint);
        payload.extend_from_slice(&self.child_index.to_be_bytes());
        payload.extend_from_slice(&self.chain_code);
        payload.extend_from_slice(&self.key.to_compressed());
        base58::check_encode(&payload)
    }
}

impl fmt::Display for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl FromStr for ExtendedPrivateKey {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// Parse a derivation path string into child indices.
///
/// Accepts an optional leading `m` segment and `'`/`h` hardened markers.
fn parse_path(path: &str) -> Result<Vec<u32>, PrimitivesError> {
    let trimmed = path.strip_prefix("m/").unwrap_or_else(|| {
        if path == "m" {
            ""
        } else {
            path
        }
    });

    let mut indices = Vec::new();
    for part in trimmed.split('/') {
        if part.is_empty() {
            continue;
        }
        let hardened = part.ends_with('\'') || part.ends_with('h') || part.ends_with('H');
        let digits = if hardened {
            &part[..part.len() - 1]
        } else {
            part
        };
        let index: u32 = digits.parse().map_err(|_| {
            PrimitivesError::InvalidDerivationPath(format!("bad segment '{}'", part))
        })?;
        if index >= HARDENED_OFFSET {
            return Err(PrimitivesError::InvalidDerivationPath(format!(
                "index {} out of range",
                index
            )));
        }
        indices.push(if hardened { index + HARDENED_OFFSET } else { index });
    }
    Ok(indices)
}

/// Convert a 32-byte big-endian array to a k256 Scalar, reducing mod n.
fn scalar_from_be_bytes(bytes: &[u8]) -> Scalar {
    let uint = k256::U256::from_be_slice(bytes);
    <Scalar as Reduce<k256::U256>>::reduce(uint)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// BIP-32 test vector 1: master key from seed 000102030405060708090a0b0c0d0e0f.
    #[test]
    fn test_vector1_master() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();

        assert_eq!(
            master.to_string(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_extended_public().to_string(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
    }

    /// BIP-32 test vector 1: full chain m/0'/1/2'/2/1000000000.
    #[test]
    fn test_vector1_chain() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();
        let key = master.derive_path("m/0'/1/2'/2/1000000000").unwrap();

        assert_eq!(key.depth(), 5);
        assert_eq!(key.child_index(), 1000000000);
        assert_eq!(
            key.to_string(),
            "xprvA41z7zogVVwxVSgdKUHDy1SKmdb533PjDz7J6N6mV6uS3ze1ai8FHa8kmHScGpWmj4WggLyQjgPie1rFSruoUihUZREPSL39UNdE3BBDu76"
        );
        assert_eq!(
            key.to_extended_public().to_string(),
            "xpub6H1LXWLaKsWFhvm6RVpEL9P4KfRZSW7abD2ttkWP3SSQvnyA8FSVqNTEcYFgJS2UaFcxupHiYkro49S8yGasTvXEYBVPamhGW6cFJodrTHy"
        );
    }

    /// Private and public derivation agree for non-hardened children.
    #[test]
    fn test_public_derivation_matches_private() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();

        let child_priv = master.derive_child(7).unwrap();
        let child_pub = master.to_extended_public().derive_child(7).unwrap();

        assert_eq!(child_priv.public_key(), *child_pub.public_key());
        assert_eq!(child_priv.chain_code(), child_pub.chain_code());
    }

    /// Hardened derivation from a public key is rejected.
    #[test]
    fn test_hardened_from_public_fails() {
        let seed = [7u8; 32];
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();
        let result = master.to_extended_public().derive_child(HARDENED_OFFSET);
        assert!(matches!(result, Err(PrimitivesError::HardenedFromPublic)));
    }

    /// String round-trip for private and public extended keys.
    #[test]
    fn test_string_roundtrip() {
        let seed = [42u8; 32];
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();
        let child = master.derive_path("m/44'/0'/0'/0/5").unwrap();

        let parsed = ExtendedPrivateKey::from_string(&child.to_string()).unwrap();
        assert_eq!(child, parsed);

        let xpub = child.to_extended_public();
        let parsed_pub = ExtendedPublicKey::from_string(&xpub.to_string()).unwrap();
        assert_eq!(xpub, parsed_pub);
    }

    /// Testnet version bytes round-trip as tprv/tpub.
    #[test]
    fn test_testnet_versions() {
        let seed = [1u8; 16];
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Testnet).unwrap();
        let s = master.to_string();
        assert!(s.starts_with("tprv"));
        let parsed = ExtendedPrivateKey::from_string(&s).unwrap();
        assert_eq!(master, parsed);

        // mainnet parser rejects nothing: version selects the network
        assert!(master.to_extended_public().to_string().starts_with("tpub"));
    }

    /// Malformed paths are rejected.
    #[test]
    fn test_bad_paths() {
        let seed = [1u8; 16];
        let master = ExtendedPrivateKey::from_seed(&seed, KeyNetwork::Mainnet).unwrap();
        assert!(master.derive_path("m/abc").is_err());
        assert!(master.derive_path("m/2147483648").is_err());
        // "m" alone is the key itself
        assert_eq!(master.derive_path("m").unwrap(), master);
    }

    /// Seeds outside 16..=64 bytes are rejected.
    #[test]
    fn test_seed_length() {
        assert!(ExtendedPrivateKey::from_seed(&[0u8; 15], KeyNetwork::Mainnet).is_err());
        assert!(ExtendedPrivateKey::from_seed(&[0u8; 65], KeyNetwork::Mainnet).is_err());
        assert!(ExtendedPrivateKey::from_seed(&[0u8; 16], KeyNetwork::Mainnet).is_ok());
    }
}
