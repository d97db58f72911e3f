/// Bitcoin address handling.
///
/// Supports P2PKH and P2SH address generation and parsing for mainnet
/// and testnet. One version byte selects both the network and the
/// address type; the payload is a 20-byte Hash160 and the string form
/// is Base58Check.

use std::fmt;

use svkit_primitives::ec::PublicKey;
use svkit_primitives::hash::{hash160, sha256d};

use crate::{Script, ScriptError};

/// Mainnet P2PKH address version byte.
const MAINNET_P2PKH: u8 = 0x00;
/// Mainnet P2SH address version byte.
const MAINNET_P2SH: u8 = 0x05;
/// Testnet P2PKH address version byte.
const TESTNET_P2PKH: u8 = 0x6f;
/// Testnet P2SH address version byte.
const TESTNET_P2SH: u8 = 0xc4;

/// Bitcoin network type for address prefix selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Mainnet (P2PKH prefix 0x00, P2SH prefix 0x05).
    Mainnet,
    /// Testnet (P2PKH prefix 0x6f, P2SH prefix 0xc4).
    Testnet,
}

/// The script template an address pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressType {
    /// Pay-to-public-key-hash.
    P2PKH,
    /// Pay-to-script-hash.
    P2SH,
}

/// A Bitcoin address.
///
/// Contains the 20-byte Hash160 payload, the network, and the address
/// type.  The type and network are a pure function of the version byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The human-readable Base58Check address string.
    pub address_string: String,
    /// The 20-byte Hash160 payload.
    pub hash160: [u8; 20],
    /// The network this address belongs to.
    pub network: Network,
    /// Whether this pays to a public key hash or a script hash.
    pub address_type: AddressType,
}

/// Map a version byte to its (network, address type) pair.
fn decode_version(version: u8) -> Option<(Network, AddressType)> {
    match version {
        MAINNET_P2PKH => Some((Network::Mainnet, AddressType::P2PKH)),
        MAINNET_P2SH => Some((Network::Mainnet, AddressType::P2SH)),
        TESTNET_P2PKH => Some((Network::Testnet, AddressType::P2PKH)),
        TESTNET_P2SH => Some((Network::Testnet, AddressType::P2SH)),
        _ => None,
    }
}

/// Map a (network, address type) pair to its version byte.
fn encode_version(network: Network, address_type: AddressType) -> u8 {
    match (network, address_type) {
        (Network::Mainnet, AddressType::P2PKH) => MAINNET_P2PKH,
        (Network::Mainnet, AddressType::P2SH) => MAINNET_P2SH,
        (Network::Testnet, AddressType::P2PKH) => TESTNET_P2PKH,
        (Network::Testnet, AddressType::P2SH) => TESTNET_P2SH,
    }
}

impl Address {
    /// Parse a Base58Check-encoded address string.
    ///
    /// Decodes the string, validates the checksum, and detects the
    /// network and address type from the version byte.
    ///
    /// # Arguments
    /// * `addr` - The Base58Check address string.
    ///
    /// # Returns
    /// An `Address` or an error if the string is invalid.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::InvalidAddress(format!("bad char for '{}'", addr)))?;

        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }

        // Verify checksum: last 4 bytes should equal sha256d of first 21 bytes.
        let checksum = sha256d(&decoded[..21]);
        if decoded[21..25] != checksum[..4] {
            return Err(ScriptError::ChecksumFailed);
        }

        let (network, address_type) = decode_version(decoded[0])
            .ok_or(ScriptError::UnknownVersionByte(decoded[0]))?;

        let mut h160 = [0u8; 20];
        h160.copy_from_slice(&decoded[1..21]);

        Ok(Address {
            address_string: addr.to_string(),
            hash160: h160,
            network,
            address_type,
        })
    }

    /// Create an address from a 20-byte Hash160 payload.
    ///
    /// # Arguments
    /// * `hash` - The 20-byte Hash160.
    /// * `network` - The target network.
    /// * `address_type` - P2PKH or P2SH.
    ///
    /// # Returns
    /// A new `Address` with the encoded Base58Check string.
    pub fn from_hash160(hash: &[u8; 20], network: Network, address_type: AddressType) -> Self {
        let version = encode_version(network, address_type);

        let mut payload = Vec::with_capacity(25);
        payload.push(version);
        payload.extend_from_slice(hash);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);

        Address {
            address_string: bs58::encode(&payload).into_string(),
            hash160: *hash,
            network,
            address_type,
        }
    }

    /// Create a P2PKH address from raw public key bytes.
    ///
    /// Hashes the bytes exactly as supplied, so the compressed and
    /// uncompressed encodings of the same key produce different
    /// addresses.
    ///
    /// # Arguments
    /// * `pub_key_bytes` - SEC1-encoded public key bytes.
    /// * `network` - The target network.
    ///
    /// # Returns
    /// A P2PKH `Address`.
    pub fn from_public_key_bytes(pub_key_bytes: &[u8], network: Network) -> Self {
        let h = hash160(pub_key_bytes);
        Self::from_hash160(&h, network, AddressType::P2PKH)
    }

    /// Create a P2PKH address from a public key (compressed encoding).
    ///
    /// # Arguments
    /// * `pub_key` - The public key.
    /// * `network` - The target network.
    ///
    /// # Returns
    /// A P2PKH `Address` over the compressed key bytes.
    pub fn from_public_key(pub_key: &PublicKey, network: Network) -> Self {
        Self::from_public_key_bytes(&pub_key.to_compressed(), network)
    }

    /// Create a P2PKH address from a hex-encoded public key string.
    ///
    /// # Arguments
    /// * `pub_key_hex` - Hex-encoded public key (compressed or uncompressed).
    /// * `network` - The target network.
    ///
    /// # Returns
    /// A P2PKH `Address`, or an error if the hex is invalid.
    pub fn from_public_key_hex(pub_key_hex: &str, network: Network) -> Result<Self, ScriptError> {
        let pub_key_bytes = hex::decode(pub_key_hex)
            .map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Self::from_public_key_bytes(&pub_key_bytes, network))
    }

    /// Create a P2SH address from a redeem script.
    ///
    /// The payload is hash160 of the script bytes.
    ///
    /// # Arguments
    /// * `script` - The redeem script.
    /// * `network` - The target network.
    ///
    /// # Returns
    /// A P2SH `Address`.
    pub fn from_script(script: &Script, network: Network) -> Self {
        let h = hash160(script.to_bytes());
        Self::from_hash160(&h, network, AddressType::P2SH)
    }
}

impl fmt::Display for Address {
    /// Display the address as its Base58Check string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_string)
    }
}

#[cfg(test)]
mod tests {
    //! Tests for Bitcoin address parsing, generation, and validation.
    //!
    //! Covers the four-version table, checksum validation, construction
    //! from public keys (compressed vs uncompressed), construction from
    //! scripts, and error cases.

    use super::*;

    /// The public key hash shared across several test vectors.
    const TEST_PUBLIC_KEY_HASH: &str = "00ac6144c4db7b5790f343cf0477a65fb8a02eb7";

    // -----------------------------------------------------------------------
    // from_string
    // -----------------------------------------------------------------------

    /// Parse a known mainnet P2PKH address.
    #[test]
    fn test_from_string_mainnet_p2pkh() {
        let address_str = "1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMr";
        let addr = Address::from_string(address_str).expect("should parse mainnet");
        assert_eq!(addr.address_string, address_str);
        assert_eq!(
            hex::encode(addr.hash160),
            "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b"
        );
        assert_eq!(addr.network, Network::Mainnet);
        assert_eq!(addr.address_type, AddressType::P2PKH);
    }

    /// Parse a known testnet P2PKH address with the same payload.
    #[test]
    fn test_from_string_testnet_p2pkh() {
        let addr = Address::from_string("mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd")
            .expect("should parse testnet");
        assert_eq!(
            hex::encode(addr.hash160),
            "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b"
        );
        assert_eq!(addr.network, Network::Testnet);
        assert_eq!(addr.address_type, AddressType::P2PKH);
    }

    /// P2SH version bytes map to the P2SH address type on both networks.
    #[test]
    fn test_from_string_p2sh_versions() {
        let hash_bytes = hex::decode(TEST_PUBLIC_KEY_HASH).expect("valid hex");
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&hash_bytes);

        let main = Address::from_hash160(&hash, Network::Mainnet, AddressType::P2SH);
        assert!(main.address_string.starts_with('3'));
        let parsed = Address::from_string(&main.address_string).expect("should parse");
        assert_eq!(parsed.address_type, AddressType::P2SH);
        assert_eq!(parsed.network, Network::Mainnet);
        assert_eq!(parsed.hash160, hash);

        let test = Address::from_hash160(&hash, Network::Testnet, AddressType::P2SH);
        assert!(test.address_string.starts_with('2'));
        let parsed = Address::from_string(&test.address_string).expect("should parse");
        assert_eq!(parsed.address_type, AddressType::P2SH);
        assert_eq!(parsed.network, Network::Testnet);
    }

    /// A short address fails with a length error.
    #[test]
    fn test_from_string_short_address() {
        assert!(matches!(
            Address::from_string("ADD8E55"),
            Err(ScriptError::InvalidAddressLength(_))
        ));
    }

    /// An address with an unrecognized version byte is rejected.
    #[test]
    fn test_from_string_unknown_version() {
        // version 0x0b with a valid checksum
        let mut payload = vec![0x0b];
        payload.extend_from_slice(&[0u8; 20]);
        let checksum = sha256d(&payload);
        payload.extend_from_slice(&checksum[..4]);
        let addr = bs58::encode(payload).into_string();
        assert!(matches!(
            Address::from_string(&addr),
            Err(ScriptError::UnknownVersionByte(0x0b))
        ));
    }

    /// A tampered checksum is rejected.
    #[test]
    fn test_from_string_bad_checksum() {
        let addr = "1E7ucTTWRTahCyViPhxSMor2pj4VGQdFMs";
        assert!(Address::from_string(addr).is_err());
    }

    // -----------------------------------------------------------------------
    // from_public_key*
    // -----------------------------------------------------------------------

    /// Create a mainnet address from a compressed public key hex string.
    #[test]
    fn test_from_public_key_hex_mainnet() {
        let addr = Address::from_public_key_hex(
            "026cf33373a9f3f6c676b75b543180703df225f7f8edbffedc417718a8ad4e89ce",
            Network::Mainnet,
        )
        .expect("should create address");
        assert_eq!(hex::encode(addr.hash160), TEST_PUBLIC_KEY_HASH);
        assert_eq!(addr.address_string, "114ZWApV4EEU8frr7zygqQcB1V2BodGZuS");
        assert_eq!(addr.network, Network::Mainnet);
    }

    /// Create a testnet address from the same compressed public key.
    #[test]
    fn test_from_public_key_hex_testnet() {
        let addr = Address::from_public_key_hex(
            "026cf33373a9f3f6c676b75b543180703df225f7f8edbffedc417718a8ad4e89ce",
            Network::Testnet,
        )
        .expect("should create address");
        assert_eq!(hex::encode(addr.hash160), TEST_PUBLIC_KEY_HASH);
        assert_eq!(addr.address_string, "mfaWoDuTsFfiunLTqZx4fKpVsUctiDV9jk");
        assert_eq!(addr.network, Network::Testnet);
    }

    /// Compressed and uncompressed encodings of the same key produce
    /// different addresses.
    #[test]
    fn test_compressed_vs_uncompressed_differ() {
        let pk = PublicKey::from_hex(
            "0411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5c\
             b2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3",
        )
        .expect("valid key");
        let compressed = Address::from_public_key_bytes(&pk.to_compressed(), Network::Mainnet);
        let uncompressed = Address::from_public_key_bytes(&pk.to_uncompressed(), Network::Mainnet);
        assert_ne!(compressed.hash160, uncompressed.hash160);
        assert_ne!(compressed.address_string, uncompressed.address_string);
    }

    /// The textbook key-to-address vector.
    #[test]
    fn test_known_key_vector() {
        let addr = Address::from_public_key_hex(
            "0250863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352",
            Network::Mainnet,
        )
        .expect("should create address");
        assert_eq!(addr.address_string, "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs");
    }

    /// An invalid public key hex returns an error.
    #[test]
    fn test_from_public_key_hex_invalid() {
        assert!(Address::from_public_key_hex("invalid_pubkey", Network::Mainnet).is_err());
    }

    // -----------------------------------------------------------------------
    // from_script
    // -----------------------------------------------------------------------

    /// A P2SH address hashes the script bytes with the P2SH version.
    #[test]
    fn test_from_script() {
        let redeem = Script::from_hex("5221022222222222222222222222222222222222222222222222222222222222222222210333333333333333333333333333333333333333333333333333333333333333332102444444444444444444444444444444444444444444444444444444444444444453ae").expect("valid hex");
        let addr = Address::from_script(&redeem, Network::Mainnet);
        assert_eq!(addr.address_type, AddressType::P2SH);
        assert_eq!(addr.hash160, hash160(redeem.to_bytes()));

        let parsed = Address::from_string(&addr.address_string).expect("round-trip");
        assert_eq!(parsed, addr);
    }

    // -----------------------------------------------------------------------
    // Roundtrip
    // -----------------------------------------------------------------------

    /// from_hash160 -> from_string round-trip is consistent.
    #[test]
    fn test_hash160_roundtrip() {
        let hash_bytes = hex::decode(TEST_PUBLIC_KEY_HASH).expect("valid hex");
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&hash_bytes);

        for (network, address_type) in [
            (Network::Mainnet, AddressType::P2PKH),
            (Network::Mainnet, AddressType::P2SH),
            (Network::Testnet, AddressType::P2PKH),
            (Network::Testnet, AddressType::P2SH),
        ] {
            let addr = Address::from_hash160(&hash, network, address_type);
            let parsed = Address::from_string(&addr.address_string).expect("should parse back");
            assert_eq!(addr, parsed);
        }
    }
}
