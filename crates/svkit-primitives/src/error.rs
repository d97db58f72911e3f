/// Unified error type for all primitives operations.
///
/// Covers errors from hashing, EC operations, encoding, and key management.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// Invalid private key data (zero or out of range scalar).
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid public key data.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid signature data.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Malformed WIF-encoded key.
    #[error("invalid WIF format: {0}")]
    InvalidWif(String),

    /// Base58Check checksum did not match.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Invalid hexadecimal string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Invalid hash value.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// Invalid Base58 encoding.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// Malformed BIP-32 extended key.
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    /// Hardened derivation requested on an extended public key.
    #[error("cannot derive a hardened child from a public key")]
    HardenedFromPublic,

    /// Malformed BIP-32 derivation path string.
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    /// Malformed or checksum-failing BIP-39 mnemonic.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// BIP-39 entropy length outside 128..=256 bits in 32-bit steps.
    #[error("invalid entropy length: {0} bytes")]
    InvalidEntropyLength(usize),

    /// Unexpected end of input data.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Elliptic curve error (from k256).
    #[error("elliptic curve error: {0}")]
    EllipticCurve(#[from] k256::elliptic_curve::Error),

    /// ECDSA signature error (from k256/signature).
    #[error("ecdsa error: {0}")]
    Ecdsa(#[from] k256::ecdsa::signature::Error),
}
