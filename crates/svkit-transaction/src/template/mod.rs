//! Script templates for the standard transaction types.
//!
//! Each template module provides a locking-script constructor, a parser
//! that recovers the template's parameters (failing with
//! `NotStandardTemplate` on a mismatch), and, for spendable templates,
//! an unlocker implementing [`UnlockingScriptTemplate`].

pub mod data;
pub mod p2ms;
pub mod p2pk;
pub mod p2pkh;
pub mod p2sh;

use svkit_primitives::ec::PrivateKey;
use svkit_script::Script;

use crate::sighash;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Trait for script templates that produce unlocking scripts.
///
/// Any signing strategy (P2PKH, P2SH, custom scripts) should implement
/// this trait.  The `sign` method receives the full transaction and the
/// input index, computes the appropriate signature hash, signs it, and
/// returns the unlocking script.  `estimate_length` is used by the
/// transaction builder to size placeholder scripts for fee computation
/// before the actual signatures exist.
pub trait UnlockingScriptTemplate {
    /// Produce an unlocking script for the given input.
    ///
    /// # Arguments
    /// * `tx` - The transaction being signed.
    /// * `input_index` - The index of the input to sign.
    ///
    /// # Returns
    /// `Ok(Script)` containing the unlocking script, or an error on failure.
    fn sign(&self, tx: &Transaction, input_index: usize) -> Result<Script, TransactionError>;

    /// Estimate the byte length of the unlocking script this template
    /// will produce, for fee calculation.
    fn estimate_length(&self) -> usize;
}

/// Worst-case byte length of a DER signature with the sighash byte
/// appended: 72 bytes of DER plus the flag.
pub(crate) const MAX_SIGNATURE_LEN: usize = 73;

/// Compute a signature over the given script code and append the
/// sighash flag byte.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - The input to sign.
/// * `script_code` - The script committed to by the signature (the
///   previous locking script, or the redeem script for P2SH).
/// * `private_key` - The signing key.
/// * `sighash_flag` - The sighash flags; the low byte is appended.
///
/// # Returns
/// The DER signature with the sighash byte appended.
pub(crate) fn make_signature(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    private_key: &PrivateKey,
    sighash_flag: u32,
) -> Result<Vec<u8>, TransactionError> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or_else(|| {
            TransactionError::SigningError(format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                tx.inputs.len()
            ))
        })?;
    let source = input
        .source_tx_output()
        .ok_or(TransactionError::MissingSourceOutput(input_index))?;

    let sig_hash =
        sighash::signature_hash(tx, input_index, script_code, sighash_flag, source.satoshis)?;
    let signature = private_key.sign(&sig_hash)?;

    let der_sig = signature.to_der();
    let mut sig_buf = Vec::with_capacity(der_sig.len() + 1);
    sig_buf.extend_from_slice(&der_sig);
    sig_buf.push(sighash_flag as u8);
    Ok(sig_buf)
}
