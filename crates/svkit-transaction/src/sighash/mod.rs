//! Signature hash computation for transaction signing.
//!
//! Computes the hash that is signed by ECDSA to authorize spending a
//! transaction input.  Two preimage layouts exist: the original
//! modified-transaction form, and the FORKID form introduced for replay
//! protection, which commits to the spent value.  The FORKID bit of the
//! sighash flags selects between them; this library signs with
//! `SIGHASH_ALL | SIGHASH_FORKID` by default.

use svkit_primitives::hash::sha256d;
use svkit_primitives::util::{ByteWriter, VarInt};
use svkit_script::chunk::decode_script;
use svkit_script::opcodes::OP_CODESEPARATOR;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing
/// other inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Replay-protection flag selecting the value-committing preimage.
pub const SIGHASH_FORKID: u32 = 0x40;

/// The standard sighash type used by this library: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// Entry point
// -----------------------------------------------------------------------

/// Compute the signature hash for a given input.
///
/// Dispatches on the FORKID bit: with it set the value-committing
/// preimage is used, otherwise the legacy modified-transaction form.
///
/// # Arguments
/// * `tx`                  - The transaction being signed.
/// * `input_index`         - Index of the input being signed.
/// * `prev_output_script`  - The locking script (scriptCode) of the output being spent.
/// * `sighash_type`        - The combined sighash flags.
/// * `satoshis`            - The satoshi value of the output being spent
///   (committed only by the FORKID form).
///
/// # Returns
/// A 32-byte double-SHA256 hash to be signed by ECDSA.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    prev_output_script: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base_type = sighash_type & SIGHASH_MASK & !SIGHASH_FORKID;
    if !(SIGHASH_ALL..=SIGHASH_SINGLE).contains(&base_type) {
        return Err(TransactionError::InvalidSighashType(sighash_type));
    }

    if sighash_type & SIGHASH_FORKID != 0 {
        let preimage =
            forkid_preimage(tx, input_index, prev_output_script, sighash_type, satoshis)?;
        Ok(sha256d(&preimage))
    } else {
        legacy_signature_hash(tx, input_index, prev_output_script, sighash_type)
    }
}

// -----------------------------------------------------------------------
// FORKID (value-committing) signature hash
// -----------------------------------------------------------------------

/// Compute the preimage bytes for the FORKID sighash before double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script) - the locking script being satisfied
/// 6. value (8 bytes LE) - satoshis of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - sha256d of all outputs or one output
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
///
/// # Arguments
/// * `tx`                  - The transaction being signed.
/// * `input_index`         - Index of the input being signed.
/// * `prev_output_script`  - The locking script of the output being spent.
/// * `sighash_type`        - The combined sighash flags.
/// * `satoshis`            - The satoshi value of the output being spent.
///
/// # Returns
/// The raw preimage bytes (not yet hashed).
pub fn forkid_preimage(
    tx: &Transaction,
    input_index: usize,
    prev_output_script: &[u8],
    sighash_type: u32,
    satoshis: u64,
) -> Result<Vec<u8>, TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let input = &tx.inputs[input_index];
    let base_type = sighash_type & SIGHASH_MASK & !SIGHASH_FORKID;

    // hashPrevouts
    let hash_prevouts = if sighash_type & SIGHASH_ANYONECANPAY == 0 {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    // hashSequence
    let hash_sequence = if sighash_type & SIGHASH_ANYONECANPAY == 0
        && base_type != SIGHASH_SINGLE
        && base_type != SIGHASH_NONE
    {
        sequence_hash(tx)
    } else {
        [0u8; 32]
    };

    // hashOutputs
    let hash_outputs = if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        outputs_hash(tx, -1)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        outputs_hash(tx, input_index as i32)
    } else {
        [0u8; 32]
    };

    let mut writer = ByteWriter::with_capacity(256);

    // Version
    writer.write_u32_le(tx.version);

    // hashPrevouts
    writer.write_bytes(&hash_prevouts);

    // hashSequence
    writer.write_bytes(&hash_sequence);

    // Outpoint (txid + vout)
    writer.write_bytes(&input.source_txid);
    writer.write_u32_le(input.source_tx_out_index);

    // scriptCode
    writer.write_varint(VarInt::from(prev_output_script.len()));
    writer.write_bytes(prev_output_script);

    // Value of the output being spent
    writer.write_u64_le(satoshis);

    // nSequence
    writer.write_u32_le(input.sequence_number);

    // hashOutputs
    writer.write_bytes(&hash_outputs);

    // nLocktime
    writer.write_u32_le(tx.lock_time);

    // Sighash type
    writer.write_u32_le(sighash_type);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Legacy (modified transaction) signature hash
// -----------------------------------------------------------------------

/// The digest defined for SIGHASH_SINGLE with no matching output.
///
/// The original implementation signed the value 1 instead of a
/// transaction digest when the signed input's index exceeded the last
/// output; the quirk must be reproduced for signatures to match.
const SINGLE_OUT_OF_RANGE_DIGEST: [u8; 32] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Output value marker for blanked outputs under SIGHASH_SINGLE (-1 as
/// a 64-bit little-endian integer).
const BLANKED_OUTPUT_VALUE: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Compute the legacy signature hash for a given input.
///
/// The digest is computed over a modified copy of the transaction:
/// every input's unlocking script is cleared, the signed input receives
/// the subscript (the previous locking script with OP_CODESEPARATOR
/// occurrences removed), the NONE/SINGLE masks blank outputs and zero
/// other inputs' sequence numbers, and ANYONECANPAY drops every input
/// but the one being signed.  The 4-byte sighash flags are appended
/// before double hashing.
///
/// # Arguments
/// * `tx`           - The transaction being signed.
/// * `input_index`  - Index of the input being signed.
/// * `sub_script`   - The subscript (previous locking script, possibly
///   already truncated at the last executed OP_CODESEPARATOR).
/// * `sighash_type` - The sighash flags (FORKID bit clear).
///
/// # Returns
/// A 32-byte double-SHA256 digest.
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    sub_script: &[u8],
    sighash_type: u32,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base_type = sighash_type & SIGHASH_MASK;

    // Historical quirk: SINGLE with no matching output signs the
    // constant 1 instead of a transaction digest.
    if base_type == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        return Ok(SINGLE_OUT_OF_RANGE_DIGEST);
    }

    let script_code = strip_code_separators(sub_script)?;
    let anyone_can_pay = sighash_type & SIGHASH_ANYONECANPAY != 0;

    let mut writer = ByteWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs.
    if anyone_can_pay {
        let input = &tx.inputs[input_index];
        writer.write_varint(VarInt::from(1u64));
        writer.write_bytes(&input.source_txid);
        writer.write_u32_le(input.source_tx_out_index);
        writer.write_varint(VarInt::from(script_code.len()));
        writer.write_bytes(&script_code);
        writer.write_u32_le(input.sequence_number);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (i, input) in tx.inputs.iter().enumerate() {
            writer.write_bytes(&input.source_txid);
            writer.write_u32_le(input.source_tx_out_index);
            if i == input_index {
                writer.write_varint(VarInt::from(script_code.len()));
                writer.write_bytes(&script_code);
                writer.write_u32_le(input.sequence_number);
            } else {
                // Other inputs are serialized with empty scripts; their
                // sequences are zeroed under NONE and SINGLE.
                writer.write_varint(VarInt::from(0u64));
                if base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE {
                    writer.write_u32_le(0);
                } else {
                    writer.write_u32_le(input.sequence_number);
                }
            }
        }
    }

    // Outputs.
    match base_type {
        SIGHASH_NONE => {
            writer.write_varint(VarInt::from(0u64));
        }
        SIGHASH_SINGLE => {
            // Keep only the output at the signed input's index; earlier
            // outputs are blanked to value -1 with empty scripts, later
            // outputs are dropped.
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                writer.write_u64_le(BLANKED_OUTPUT_VALUE);
                writer.write_varint(VarInt::from(0u64));
            }
            let output = &tx.outputs[input_index];
            writer.write_u64_le(output.satoshis);
            let script_bytes = output.locking_script.to_bytes();
            writer.write_varint(VarInt::from(script_bytes.len()));
            writer.write_bytes(script_bytes);
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type);

    Ok(sha256d(writer.as_bytes()))
}

/// Remove every OP_CODESEPARATOR from a script, preserving the exact
/// push forms of all other chunks.
fn strip_code_separators(script: &[u8]) -> Result<Vec<u8>, TransactionError> {
    let chunks = decode_script(script)?;
    let mut out = Vec::with_capacity(script.len());
    for chunk in chunks {
        if chunk.op == OP_CODESEPARATOR {
            continue;
        }
        out.extend_from_slice(&chunk.to_bytes());
    }
    Ok(out)
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

/// Compute the double-SHA256 of all input outpoints concatenated.
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        writer.write_bytes(&input.source_txid);
        writer.write_u32_le(input.source_tx_out_index);
    }
    sha256d(writer.as_bytes())
}

/// Compute the double-SHA256 of all input sequence numbers concatenated.
fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// Compute the double-SHA256 of serialized outputs.
///
/// If `n` is -1, all outputs are included.  If `n >= 0`, only the output
/// at that index is included (used for SIGHASH_SINGLE).
fn outputs_hash(tx: &Transaction, n: i32) -> [u8; 32] {
    let mut writer = ByteWriter::new();
    if n == -1 {
        for output in &tx.outputs {
            writer.write_bytes(&output.to_bytes());
        }
    } else {
        writer.write_bytes(&tx.outputs[n as usize].to_bytes());
    }
    sha256d(writer.as_bytes())
}
