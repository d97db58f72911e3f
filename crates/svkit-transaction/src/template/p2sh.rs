//! Pay-to-Script-Hash (P2SH) script template.
//!
//! Locking: `OP_HASH160 <20-byte hash> OP_EQUAL`.  Unlocking:
//! `<args...> <redeemScript>` where the serialized redeem script is the
//! final push and the preceding arguments satisfy it.

use svkit_primitives::ec::PrivateKey;
use svkit_primitives::hash::hash160;
use svkit_script::opcodes::*;
use svkit_script::Script;

use crate::sighash::SIGHASH_ALL_FORKID;
use crate::template::{make_signature, UnlockingScriptTemplate, MAX_SIGNATURE_LEN};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Create a P2SH locking script for a redeem script.
///
/// # Arguments
/// * `redeem_script` - The redeem script to commit to.
///
/// # Returns
/// An `OP_HASH160 <hash160(redeem)> OP_EQUAL` script.
pub fn lock(redeem_script: &Script) -> Script {
    lock_from_hash(&hash160(redeem_script.to_bytes()))
}

/// Create a P2SH locking script from a known script hash.
///
/// # Arguments
/// * `hash` - The 20-byte hash160 of the redeem script.
///
/// # Returns
/// An `OP_HASH160 <hash> OP_EQUAL` script.
pub fn lock_from_hash(hash: &[u8; 20]) -> Script {
    let mut bytes = Vec::with_capacity(23);
    bytes.push(OP_HASH160);
    bytes.push(OP_DATA_20);
    bytes.extend_from_slice(hash);
    bytes.push(OP_EQUAL);
    Script::from_bytes(&bytes)
}

/// Recover the script hash from a P2SH locking script.
///
/// # Arguments
/// * `script` - A candidate locking script.
///
/// # Returns
/// The 20-byte script hash, or `NotStandardTemplate` on a mismatch.
pub fn parse_lock(script: &Script) -> Result<[u8; 20], TransactionError> {
    if !script.is_p2sh() {
        return Err(TransactionError::NotStandardTemplate("P2SH"));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&script.to_bytes()[2..22]);
    Ok(hash)
}

/// Create an unlocker for a P2SH-wrapped multisig redeem script.
///
/// Signatures commit to the redeem script (not the P2SH wrapper), and
/// the serialized redeem script is appended as the final push.
///
/// # Arguments
/// * `private_keys` - The M signing keys, in locking-script key order.
/// * `redeem_script` - The multisig redeem script.
/// * `sighash_flag` - Optional sighash flags. Defaults to
///   `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// # Returns
/// A [`P2SHMultisigUnlock`] implementing `UnlockingScriptTemplate`.
pub fn unlock_multisig(
    private_keys: Vec<PrivateKey>,
    redeem_script: Script,
    sighash_flag: Option<u32>,
) -> P2SHMultisigUnlock {
    P2SHMultisigUnlock {
        private_keys,
        redeem_script,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// Create an unlocker from pre-built arguments and a redeem script.
///
/// Useful for redeem scripts whose arguments are not signatures (or
/// were produced elsewhere); appends the redeem script push to the
/// given argument pushes without computing anything.
///
/// # Arguments
/// * `args` - A push-only script supplying the redeem script arguments.
/// * `redeem_script` - The redeem script.
///
/// # Returns
/// A [`P2SHRawUnlock`] implementing `UnlockingScriptTemplate`.
pub fn unlock_with_args(args: Script, redeem_script: Script) -> P2SHRawUnlock {
    P2SHRawUnlock {
        args,
        redeem_script,
    }
}

/// P2SH multisig signing template producing
/// `OP_0 <sig1>..<sigM> <redeemScript>`.
pub struct P2SHMultisigUnlock {
    private_keys: Vec<PrivateKey>,
    redeem_script: Script,
    sighash_flag: u32,
}

impl UnlockingScriptTemplate for P2SHMultisigUnlock {
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError> {
        let mut script = Script::new();
        script.append_opcodes(&[OP_0])?;
        for key in &self.private_keys {
            let sig_buf = make_signature(
                tx,
                input_index,
                self.redeem_script.to_bytes(),
                key,
                self.sighash_flag,
            )?;
            script.append_push_data(&sig_buf)?;
        }
        script.append_push_data(self.redeem_script.to_bytes())?;
        Ok(script)
    }

    fn estimate_length(&self) -> usize {
        1 + (1 + MAX_SIGNATURE_LEN) * self.private_keys.len()
            + 3
            + self.redeem_script.len()
    }
}

/// P2SH template that emits fixed arguments plus the redeem script push.
pub struct P2SHRawUnlock {
    args: Script,
    redeem_script: Script,
}

impl UnlockingScriptTemplate for P2SHRawUnlock {
    fn sign(&self, _tx: &Transaction, _input_index: usize) -> Result<Script, TransactionError> {
        let mut script = Script::from_bytes(self.args.to_bytes());
        script.append_push_data(self.redeem_script.to_bytes())?;
        Ok(script)
    }

    fn estimate_length(&self) -> usize {
        self.args.len() + 3 + self.redeem_script.len()
    }
}
