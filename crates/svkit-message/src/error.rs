/// Error types for message signing and verification.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The signature is not valid base64.
    #[error("invalid base64 signature: {0}")]
    InvalidBase64(String),

    /// The decoded signature is not 65 bytes or has a bad header byte.
    #[error("invalid compact signature: {0}")]
    InvalidSignature(String),

    /// The recovered key does not match the claimed address.
    #[error("signature does not match address {0}")]
    AddressMismatch(String),

    /// Error from the primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] svkit_primitives::PrimitivesError),

    /// Error from the script crate (address handling).
    #[error("script error: {0}")]
    Script(#[from] svkit_script::ScriptError),
}
