/// svkit - Cryptographic primitives, hashing, and wire codecs.
///
/// This crate provides the foundational building blocks for the library:
/// - Hash functions (SHA-256, SHA-256d, RIPEMD-160, SHA-512, HMAC, PBKDF2)
/// - Chain hash type for transaction identification
/// - Elliptic curve cryptography (secp256k1 keys and signatures)
/// - Variable-length integer encoding and byte readers/writers
/// - Base58 / Base58Check encoding
/// - BIP-32 hierarchical deterministic keys
/// - BIP-39 mnemonic phrases

pub mod base58;
pub mod bip32;
pub mod bip39;
pub mod chainhash;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
