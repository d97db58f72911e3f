//! Input verification through the script interpreter.
//!
//! Implements the interpreter's [`TxContext`] over a transaction so that
//! OP_CHECKSIG and friends can compute signature hashes and verify
//! ECDSA signatures, and exposes [`verify_input`] to run an input's
//! (unlocking, locking) script pair through the engine.

use svkit_primitives::ec::{PublicKey, Signature};
use svkit_script::interpreter::{Engine, InterpreterError, InterpreterErrorCode, ScriptFlags, TxContext};
use svkit_script::Script;

use crate::sighash::{self, SIGHASH_FORKID};
use crate::transaction::Transaction;
use crate::TransactionError;

/// [`TxContext`] implementation backed by a transaction.
pub struct TransactionContext<'a> {
    tx: &'a Transaction,
}

impl<'a> TransactionContext<'a> {
    /// Wrap a transaction for interpreter use.
    pub fn new(tx: &'a Transaction) -> Self {
        TransactionContext { tx }
    }
}

impl TxContext for TransactionContext<'_> {
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, InterpreterError> {
        if full_sig.len() < 2 {
            return Ok(false);
        }
        let der = &full_sig[..full_sig.len() - 1];

        // The FORKID preimage commits to the spent value, so the input
        // must carry its source output.
        let satoshis = match self
            .tx
            .inputs
            .get(input_idx)
            .and_then(|i| i.source_tx_satoshis())
        {
            Some(s) => s,
            None if sighash_flag & SIGHASH_FORKID != 0 => {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::InvalidParams,
                    "missing source output value for forkid sighash".to_string(),
                ));
            }
            None => 0,
        };

        let hash = match sighash::signature_hash(
            self.tx,
            input_idx,
            sub_script.to_bytes(),
            sighash_flag,
            satoshis,
        ) {
            Ok(h) => h,
            Err(_) => return Ok(false),
        };

        let sig = match Signature::from_der(der) {
            Ok(s) => s,
            Err(_) => return Ok(false),
        };
        let key = match PublicKey::from_bytes(pub_key) {
            Ok(k) => k,
            Err(_) => return Ok(false),
        };

        Ok(sig.verify(&hash, &key))
    }

    fn lock_time(&self) -> u32 {
        self.tx.lock_time
    }

    fn tx_version(&self) -> u32 {
        self.tx.version
    }

    fn input_sequence(&self, input_idx: usize) -> u32 {
        self.tx
            .inputs
            .get(input_idx)
            .map(|i| i.sequence_number)
            .unwrap_or(0)
    }
}

/// Verify an input by executing its unlocking script against the
/// locking script of the output it spends.
///
/// The input must carry its source output (the spent value and prior
/// locking script).
///
/// # Arguments
/// * `tx` - The transaction.
/// * `input_index` - The input to verify.
/// * `flags` - Interpreter flags for the evaluation.
///
/// # Returns
/// `Ok(())` when the script pair evaluates true, otherwise an error.
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    flags: ScriptFlags,
) -> Result<(), TransactionError> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        ))
    })?;

    let source = input
        .source_tx_output()
        .ok_or(TransactionError::MissingSourceOutput(input_index))?;

    let unlocking = input.unlocking_script.clone().unwrap_or_default();
    let locking = source.locking_script.clone();

    let ctx = TransactionContext::new(tx);
    Engine::new()
        .execute(&unlocking, &locking, flags, Some(&ctx), input_index)
        .map_err(|e| TransactionError::ScriptVerification(e.to_string()))
}
