/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid (e.g. bad index).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// An error occurred during input signing.
    #[error("signing error: {0}")]
    SigningError(String),

    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The sighash base type is not ALL, NONE, or SINGLE.
    #[error("invalid sighash type 0x{0:02x}")]
    InvalidSighashType(u32),

    /// Inputs do not cover outputs plus the fee.
    #[error("insufficient funds: {needed} satoshis needed, {available} available")]
    InsufficientFunds {
        /// Satoshis required to cover outputs and fee.
        needed: u64,
        /// Satoshis available from the inputs.
        available: u64,
    },

    /// An input has no source output value/script attached.
    #[error("missing source output on input {0}")]
    MissingSourceOutput(usize),

    /// An input has no unlocking template to sign with.
    #[error("missing unlocking template on input {0}")]
    MissingUnlocker(usize),

    /// Change was requested but no change address was set.
    #[error("change address not set")]
    NoChangeAddress,

    /// Output value exceeds the maximum money supply.
    #[error("output value {0} exceeds the maximum of 21000000 BSV")]
    ExcessiveSatoshis(u64),

    /// A script does not match the expected standard template.
    #[error("not a standard {0} template")]
    NotStandardTemplate(&'static str),

    /// Script verification failed for an input.
    #[error("script verification failed: {0}")]
    ScriptVerification(String),

    /// An underlying script error.
    #[error("script error: {0}")]
    Script(#[from] svkit_script::ScriptError),

    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] svkit_primitives::PrimitivesError),
}
