//! Pay-to-Public-Key (P2PK) script template.
//!
//! Locking: `<pubkey> OP_CHECKSIG`.  Unlocking: `<sig>`.

use svkit_primitives::ec::{PrivateKey, PublicKey};
use svkit_script::opcodes::OP_CHECKSIG;
use svkit_script::Script;

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::{make_signature, UnlockingScriptTemplate, MAX_SIGNATURE_LEN};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Create a P2PK locking script from a public key (compressed form).
///
/// # Arguments
/// * `pub_key` - The public key to lock to.
///
/// # Returns
/// A `<pubkey> OP_CHECKSIG` script.
pub fn lock(pub_key: &PublicKey) -> Result<Script, TransactionError> {
    let mut script = Script::new();
    script.append_push_data(&pub_key.to_compressed())?;
    script.append_opcodes(&[OP_CHECKSIG])?;
    Ok(script)
}

/// Recover the public key from a P2PK locking script.
///
/// # Arguments
/// * `script` - A candidate locking script.
///
/// # Returns
/// The public key, or `NotStandardTemplate` on a mismatch.
pub fn parse_lock(script: &Script) -> Result<PublicKey, TransactionError> {
    if !script.is_p2pk() {
        return Err(TransactionError::NotStandardTemplate("P2PK"));
    }
    let chunks = script.chunks()?;
    let key_bytes = chunks[0]
        .data
        .as_ref()
        .ok_or(TransactionError::NotStandardTemplate("P2PK"))?;
    Ok(PublicKey::from_bytes(key_bytes)?)
}

/// Create a P2PK unlocker for signing transaction inputs.
///
/// # Arguments
/// * `private_key` - The private key used to sign.
/// * `sighash_flag` - Optional sighash flags. Defaults to
///   `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// # Returns
/// A [`P2PKUnlock`] implementing `UnlockingScriptTemplate`.
pub fn unlock(private_key: PrivateKey, sighash_flag: Option<u32>) -> P2PKUnlock {
    P2PKUnlock {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// P2PK signing template producing a bare `<sig>` unlocking script.
pub struct P2PKUnlock {
    private_key: PrivateKey,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2PKUnlock {
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

        let mut script = Script::new();
        script.append_push_data(&sig_buf)?;
        Ok(script)
    }

    fn estimate_length(&self) -> usize {
        1 + MAX_SIGNATURE_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_and_parse_roundtrip() {
        let key = PrivateKey::new();
        let pub_key = key.pub_key();
        let script = lock(&pub_key).unwrap();
        assert!(script.is_p2pk());
        assert_eq!(parse_lock(&script).unwrap(), pub_key);
    }

    #[test]
    fn test_parse_lock_rejects_p2pkh() {
        let script = Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        assert!(matches!(
            parse_lock(&script),
            Err(TransactionError::NotStandardTemplate("P2PK"))
        ));
    }
}
