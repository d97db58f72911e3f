//! Bitcoin signed message framing.
//!
//! Signs and verifies arbitrary messages against Bitcoin addresses
//! using the classic `\x18Bitcoin Signed Message:\n` digest and
//! base64-encoded 65-byte recoverable signatures.

pub mod signed;

mod error;
pub use error::MessageError;
pub use signed::{message_digest, sign_message, verify_message};
