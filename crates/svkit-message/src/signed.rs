//! Message signing against Bitcoin addresses.
//!
//! The signed digest is
//! `sha256d("\x18Bitcoin Signed Message:\n" || varint(len(msg)) || msg)`;
//! the signature is the base64 encoding of a 65-byte compact recoverable
//! ECDSA signature whose header byte carries the recovery id and the
//! compressed-key flag.

use base64::Engine;

use svkit_primitives::ec::{PrivateKey, Signature};
use svkit_primitives::hash::sha256d;
use svkit_primitives::util::{ByteWriter, VarInt};
use svkit_script::{Address, Network};

use crate::MessageError;

/// The magic prefix, including its own length byte (0x18 = 24).
const MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

/// Compute the digest that is signed for a message.
///
/// # Arguments
/// * `message` - The raw message bytes.
///
/// # Returns
/// The 32-byte double-SHA256 digest of the framed message.
pub fn message_digest(message: &[u8]) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(MESSAGE_MAGIC.len() + 9 + message.len());
    writer.write_bytes(MESSAGE_MAGIC);
    writer.write_varint(VarInt::from(message.len()));
    writer.write_bytes(message);
    sha256d(writer.as_bytes())
}

/// Sign a message with a private key.
///
/// # Arguments
/// * `message` - The raw message bytes.
/// * `private_key` - The signing key.
///
/// # Returns
/// The base64 string of the 65-byte compact recoverable signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Result<String, MessageError> {
    let digest = message_digest(message);
    let signature = private_key.sign(&digest)?;
    let compact = signature.to_compact(&digest, private_key)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(compact))
}

/// Verify a signed message against an address.
///
/// Recovers the public key from the signature, derives the P2PKH
/// address for the claimed address's network (respecting the
/// compressed-key flag in the signature header), and compares payloads.
///
/// # Arguments
/// * `address` - The claimed signer address string.
/// * `signature_b64` - The base64 compact signature.
/// * `message` - The raw message bytes.
///
/// # Returns
/// `Ok(true)` when the signature was produced by the address's key over
/// this message, `Ok(false)` when recovery yields a different key, or
/// an error for malformed inputs.
pub fn verify_message(
    address: &str,
    signature_b64: &str,
    message: &[u8],
) -> Result<bool, MessageError> {
    let compact = base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|e| MessageError::InvalidBase64(e.to_string()))?;

    if compact.len() != 65 {
        return Err(MessageError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            compact.len()
        )));
    }
    let header = compact[0];
    if !(27..=34).contains(&header) {
        return Err(MessageError::InvalidSignature(format!(
            "header byte {} out of range",
            header
        )));
    }
    let compressed = header >= 31;

    let claimed = Address::from_string(address)?;

    let digest = message_digest(message);
    let recovered = match Signature::recover_public_key(&compact, &digest) {
        Ok(key) => key,
        // A structurally valid signature that fails point recovery was
        // simply not produced over this digest.
        Err(_) => return Ok(false),
    };

    let recovered_addr = if compressed {
        Address::from_public_key_bytes(&recovered.to_compressed(), claimed.network)
    } else {
        Address::from_public_key_bytes(&recovered.to_uncompressed(), claimed.network)
    };

    Ok(recovered_addr.hash160 == claimed.hash160)
}

/// Sign a message and return the signer's mainnet address with the
/// signature, for callers that do not track the address separately.
pub fn sign_message_with_address(
    message: &[u8],
    private_key: &PrivateKey,
    network: Network,
) -> Result<(String, String), MessageError> {
    let signature = sign_message(message, private_key)?;
    let address = if private_key.is_compressed() {
        Address::from_public_key_bytes(&private_key.pub_key().to_compressed(), network)
    } else {
        Address::from_public_key_bytes(&private_key.pub_key().to_uncompressed(), network)
    };
    Ok((address.address_string, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> PrivateKey {
        PrivateKey::from_hex(
            "12b004fff7f4b69ef8650e767f18f11ede158148b425660723b9f9a66e61f747",
        )
        .unwrap()
    }

    /// The framed digest commits to the message length and content.
    #[test]
    fn test_message_digest_changes_with_message() {
        assert_ne!(message_digest(b"hello"), message_digest(b"hello!"));
        assert_ne!(message_digest(b""), message_digest(b"\x00"));
    }

    /// Sign then verify round trip against the derived address.
    #[test]
    fn test_sign_verify_roundtrip() {
        let key = test_key();
        let message = b"svkit signed message test";

        let (address, signature) =
            sign_message_with_address(message, &key, Network::Mainnet).unwrap();
        assert!(verify_message(&address, &signature, message).unwrap());
    }

    /// A tampered message fails verification.
    #[test]
    fn test_tampered_message_fails() {
        let key = test_key();
        let message = b"original message";

        let (address, signature) =
            sign_message_with_address(message, &key, Network::Mainnet).unwrap();
        assert!(!verify_message(&address, &signature, b"tampered message").unwrap());
    }

    /// A different signer's address fails verification.
    #[test]
    fn test_wrong_address_fails() {
        let key = test_key();
        let other = PrivateKey::from_hex(
            "0000000000000000000000000000000000000000000000000000000000000002",
        )
        .unwrap();
        let message = b"who signed this";

        let signature = sign_message(message, &key).unwrap();
        let other_addr = Address::from_public_key_bytes(
            &other.pub_key().to_compressed(),
            Network::Mainnet,
        );
        assert!(!verify_message(&other_addr.address_string, &signature, message).unwrap());
    }

    /// Malformed signatures are rejected with typed errors.
    #[test]
    fn test_malformed_signatures() {
        let key = test_key();
        let (address, _) =
            sign_message_with_address(b"x", &key, Network::Mainnet).unwrap();

        assert!(matches!(
            verify_message(&address, "not-base64!!!", b"x"),
            Err(MessageError::InvalidBase64(_))
        ));

        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 10]);
        assert!(matches!(
            verify_message(&address, &short, b"x"),
            Err(MessageError::InvalidSignature(_))
        ));
    }

    /// Verification works for testnet addresses as well.
    #[test]
    fn test_testnet_roundtrip() {
        let key = test_key();
        let message = b"testnet message";
        let (address, signature) =
            sign_message_with_address(message, &key, Network::Testnet).unwrap();
        assert!(address.starts_with('m') || address.starts_with('n'));
        assert!(verify_message(&address, &signature, message).unwrap());
    }
}
