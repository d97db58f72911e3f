//! Pay-to-Public-Key-Hash (P2PKH) script template.
//!
//! Creates standard P2PKH locking scripts (`OP_DUP OP_HASH160 <hash>
//! OP_EQUALVERIFY OP_CHECKSIG`) and unlocking scripts (`<sig> <pubkey>`).

use svkit_primitives::ec::PrivateKey;
use svkit_script::opcodes::*;
use svkit_script::{Address, AddressType, Script};

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::{make_signature, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Standard estimate for a P2PKH unlocking script:
/// 1 (push len) + 71 (DER sig) + 1 (sighash byte) + 1 (push len) +
/// 33 (compressed pubkey).
const UNLOCK_ESTIMATE: usize = 107;

/// Create a P2PKH locking script from an address.
///
/// Produces: `OP_DUP OP_HASH160 <20-byte pubkey hash> OP_EQUALVERIFY OP_CHECKSIG`
///
/// # Arguments
/// * `address` - A P2PKH address.
///
/// # Returns
/// `Ok(Script)` containing the 25-byte P2PKH locking script, or an
/// error if the address is not a P2PKH address.
pub fn lock(address: &Address) -> Result<Script, TransactionError> {
    if address.address_type != AddressType::P2PKH {
        return Err(TransactionError::NotStandardTemplate("P2PKH"));
    }

    let mut bytes = Vec::with_capacity(25);
    bytes.push(OP_DUP);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(&address.hash160);
    bytes.push(OP_EQUALVERIFY);
    bytes.push(OP_CHECKSIG);

    Ok(Script::from_bytes(&bytes))
}

/// Recover the public key hash from a P2PKH locking script.
///
/// # Arguments
/// * `script` - A candidate locking script.
///
/// # Returns
/// The 20-byte public key hash, or `NotStandardTemplate` if the script
/// does not match the P2PKH pattern.
pub fn parse_lock(script: &Script) -> Result<[u8; 20], TransactionError> {
    if !script.is_p2pkh() {
        return Err(TransactionError::NotStandardTemplate("P2PKH"));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&script.to_bytes()[3..23]);
    Ok(hash)
}

/// Create a P2PKH unlocker for signing transaction inputs.
///
/// # Arguments
/// * `private_key` - The private key used to sign.
/// * `sighash_flag` - Optional sighash flags. Defaults to
///   `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// # Returns
/// A [`P2PKHUnlock`] implementing `UnlockingScriptTemplate`.
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2PKHUnlock {
    P2PKHUnlock {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// P2PKH signing template holding a private key and sighash flags.
///
/// Produces unlocking scripts of the form
/// `<DER_signature || sighash_byte> <compressed_pubkey>`.
pub struct P2PKHUnlock {
    /// The private key used for ECDSA signing.
    private_key: PrivateKey,

    /// The sighash flags to use.
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2PKHUnlock {
    /// Sign the specified input and produce the unlocking script.
    ///
    /// Computes the signature hash for the input over the previous
    /// locking script, signs it with deterministic ECDSA, and builds
    /// `<sig> <pubkey>`.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let input = tx
            .inputs
            .get(input_index)
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;
        let source = input
            .source_tx_output()
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;

        let sig_buf = make_signature(
            tx,
            input_index,
            source.locking_script.to_bytes(),
            &self.private_key,
            self.sighash_flag,
        )?;

        let pub_key_bytes = self.private_key.pub_key().to_compressed();

        let mut script = Script::new();
        script.append_push_data(&sig_buf)?;
        script.append_push_data(&pub_key_bytes)?;

        Ok(script)
    }

    fn estimate_length(&self) -> usize {
        UNLOCK_ESTIMATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svkit_script::Network;

    #[test]
    fn test_lock_shape() {
        let addr = Address::from_public_key_hex(
            "026cf33373a9f3f6c676b75b543180703df225f7f8edbffedc417718a8ad4e89ce",
            Network::Mainnet,
        )
        .unwrap();
        let script = lock(&addr).unwrap();
        assert!(script.is_p2pkh());
        assert_eq!(parse_lock(&script).unwrap(), addr.hash160);
    }

    #[test]
    fn test_lock_rejects_p2sh_address() {
        let addr = Address::from_hash160(&[7u8; 20], Network::Mainnet, AddressType::P2SH);
        assert!(matches!(
            lock(&addr),
            Err(TransactionError::NotStandardTemplate("P2PKH"))
        ));
    }

    #[test]
    fn test_parse_lock_rejects_other_scripts() {
        let script = Script::from_hex("a9149de5aeaff9c48431ba4dd6e8af73d51f38e451cb87").unwrap();
        assert!(parse_lock(&script).is_err());
    }

    #[test]
    fn test_estimate_length() {
        let unlocker = unlock(PrivateKey::new(), None);
        assert_eq!(unlocker.estimate_length(), 107);
    }
}
