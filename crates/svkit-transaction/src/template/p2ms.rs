//! Naked multisig (P2MS) script template.
//!
//! Locking: `OP_M <pk1>..<pkN> OP_N OP_CHECKMULTISIG`.  Unlocking:
//! `OP_0 <sig1>..<sigM>`, where the leading OP_0 feeds the extra
//! element OP_CHECKMULTISIG consumes.

use svkit_primitives::ec::{PrivateKey, PublicKey};
use svkit_script::opcodes::*;
use svkit_script::Script;

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::{make_signature, UnlockingScriptTemplate, MAX_SIGNATURE_LEN};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Create an M-of-N multisig locking script.
///
/// # Arguments
/// * `required` - Number of signatures required (M).
/// * `pub_keys` - The N public keys (compressed form is emitted).
///
/// # Returns
/// `Ok(Script)` or an error when M/N are out of the 1..=16 small
/// integer range or M exceeds N.
pub fn lock(required: usize, pub_keys: &[PublicKey]) -> Result<Script, TransactionError> {
    let n = pub_keys.len();
    if required == 0 || n == 0 || required > n || n > 16 {
        return Err(TransactionError::NotStandardTemplate("P2MS"));
    }

    let mut script = Script::new();
    script.append_opcodes(&[OP_1 + (required as u8) - 1])?;
    for key in pub_keys {
        script.append_push_data(&key.to_compressed())?;
    }
    script.append_opcodes(&[OP_1 + (n as u8) - 1, OP_CHECKMULTISIG])?;
    Ok(script)
}

/// Recover (M, public keys) from a multisig locking script.
///
/// # Arguments
/// * `script` - A candidate locking script.
///
/// # Returns
/// The required signature count and the raw public key byte strings,
/// or `NotStandardTemplate` on a mismatch.
pub fn parse_lock(script: &Script) -> Result<(usize, Vec<Vec<u8>>), TransactionError> {
    if !script.is_multisig_out() {
        return Err(TransactionError::NotStandardTemplate("P2MS"));
    }

    let chunks = script.chunks()?;
    let m_op = chunks[0].op;
    let n_op = chunks[chunks.len() - 2].op;
    if m_op < OP_1 || n_op < OP_1 {
        return Err(TransactionError::NotStandardTemplate("P2MS"));
    }

    let required = (m_op - OP_1 + 1) as usize;
    let n = (n_op - OP_1 + 1) as usize;

    let keys: Vec<Vec<u8>> = chunks[1..chunks.len() - 2]
        .iter()
        .filter_map(|c| c.data.clone())
        .collect();

    if keys.len() != n || required > n {
        return Err(TransactionError::NotStandardTemplate("P2MS"));
    }

    Ok((required, keys))
}

/// Create a multisig unlocker for signing transaction inputs.
///
/// The keys must be supplied in the order their public keys appear in
/// the locking script, since OP_CHECKMULTISIG matches greedily in
/// order.
///
/// # Arguments
/// * `private_keys` - The M signing keys.
/// * `sighash_flag` - Optional sighash flags. Defaults to
///   `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// # Returns
/// A [`P2MSUnlock`] implementing `UnlockingScriptTemplate`.
pub fn unlock(private_keys: Vec<PrivateKey>, sighash_flag: Option<u32>) -> P2MSUnlock {
    P2MSUnlock {
        private_keys,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// Multisig signing template producing `OP_0 <sig1>..<sigM>`.
pub struct P2MSUnlock {
    private_keys: Vec<PrivateKey>,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2MSUnlock {
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let input = tx
            .inputs
            .get(input_index)
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;
        let source = input
            .source_tx_output()
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;
        let script_code = source.locking_script.to_bytes().to_vec();

        let mut script = Script::new();
        script.append_opcodes(&[OP_0])?;
        for key in &self.private_keys {
            let sig_buf =
                make_signature(tx, input_index, &script_code, key, self.sighash_flag)?;
            script.append_push_data(&sig_buf)?;
        }
        Ok(script)
    }

    fn estimate_length(&self) -> usize {
        1 + (1 + MAX_SIGNATURE_LEN) * self.private_keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<PublicKey> {
        (1..=n)
            .map(|i| {
                let mut bytes = [0u8; 32];
                bytes[31] = i as u8;
                PrivateKey::from_bytes(&bytes).unwrap().pub_key()
            })
            .collect()
    }

    #[test]
    fn test_lock_and_parse_roundtrip() {
        let pub_keys = keys(3);
        let script = lock(2, &pub_keys).unwrap();
        assert!(script.is_multisig_out());

        let (required, parsed) = parse_lock(&script).unwrap();
        assert_eq!(required, 2);
        assert_eq!(parsed.len(), 3);
        for (key, parsed_bytes) in pub_keys.iter().zip(&parsed) {
            assert_eq!(&key.to_compressed()[..], parsed_bytes.as_slice());
        }
    }

    #[test]
    fn test_lock_rejects_bad_shapes() {
        let pub_keys = keys(3);
        assert!(lock(0, &pub_keys).is_err());
        assert!(lock(4, &pub_keys).is_err());
        assert!(lock(1, &[]).is_err());
        assert!(lock(1, &keys(17)).is_err());
    }

    #[test]
    fn test_parse_lock_rejects_p2pkh() {
        let script = Script::from_hex("76a91403ececf2d12a7f614aef4c82ecf13c303bd9975d88ac").unwrap();
        assert!(parse_lock(&script).is_err());
    }
}
