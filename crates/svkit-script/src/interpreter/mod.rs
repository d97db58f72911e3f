//! Pre-Genesis Bitcoin script interpreter.
//!
//! Executes locking and unlocking scripts to verify transaction inputs,
//! supporting the pre-Genesis opcode set, resource limits, and
//! verification flags.
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate directly to
//! avoid circular dependencies. Instead, callers provide a [`TxContext`]
//! trait implementation that handles signature hash computation and
//! verification.
//!
//! # Example
//!
//! ```ignore
//! use svkit_script::interpreter::{Engine, ScriptFlags};
//!
//! let engine = Engine::new();
//! engine.execute(
//!     &unlocking_script,
//!     &locking_script,
//!     ScriptFlags::ENABLE_SIGHASH_FORKID | ScriptFlags::BIP16,
//!     None, // no tx context needed for simple scripts
//!     0,
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod flags;
mod ops_arithmetic;
mod ops_crypto;
mod ops_data;
mod ops_flow;
mod ops_stack;
pub mod parsed_opcode;
pub mod scriptnum;
pub mod stack;
pub mod thread;

pub use error::{InterpreterError, InterpreterErrorCode};
pub use flags::ScriptFlags;
pub use parsed_opcode::{ParsedOpcode, ParsedScript};
pub use scriptnum::ScriptNumber;
pub use stack::Stack;

use crate::Script;
use thread::Thread;

/// Transaction context trait — provides signature verification without
/// a circular dependency on the transaction crate.
///
/// Implementors provide the transaction data needed for OP_CHECKSIG,
/// OP_CHECKMULTISIG, OP_CHECKLOCKTIMEVERIFY, and OP_CHECKSEQUENCEVERIFY.
pub trait TxContext {
    /// Verify a signature against a public key for the given input.
    ///
    /// `full_sig` includes the sighash flag byte at the end.
    /// `pub_key` is the public key bytes.
    /// `sub_script` is the relevant portion of the locking script.
    /// `input_idx` is the input being verified.
    /// `sighash_flag` is the sighash type.
    ///
    /// Returns Ok(true) if valid, Ok(false) if invalid, Err on failure.
    fn verify_signature(
        &self,
        full_sig: &[u8],
        pub_key: &[u8],
        sub_script: &Script,
        input_idx: usize,
        sighash_flag: u32,
    ) -> Result<bool, InterpreterError>;

    /// Get the transaction lock time.
    fn lock_time(&self) -> u32;

    /// Get the transaction version.
    fn tx_version(&self) -> u32;

    /// Get the sequence number of the given input.
    fn input_sequence(&self, input_idx: usize) -> u32;
}

/// The script execution engine.
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Engine
    }

    /// Execute unlocking + locking scripts.
    ///
    /// # Arguments
    /// * `unlocking_script` - The input's unlocking (signature) script.
    /// * `locking_script` - The output's locking (pubkey) script.
    /// * `flags` - Verification flags.
    /// * `tx_context` - Optional transaction context for checksig operations.
    /// * `input_idx` - The input index being verified.
    pub fn execute(
        &self,
        unlocking_script: &Script,
        locking_script: &Script,
        flags: ScriptFlags,
        tx_context: Option<&dyn TxContext>,
        input_idx: usize,
    ) -> Result<(), InterpreterError> {
        let mut thread = Thread::new(
            unlocking_script,
            locking_script,
            flags,
            tx_context,
            input_idx,
        )?;
        thread.execute()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::*;

    fn run(unlock: &[u8], lock: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
        Engine::new().execute(
            &Script::from_bytes(unlock),
            &Script::from_bytes(lock),
            flags,
            None,
            0,
        )
    }

    #[test]
    fn test_op_1_op_1_op_equal() {
        assert!(run(&[OP_1], &[OP_1, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_1_op_2_op_equal_fails() {
        let result = run(&[OP_1], &[OP_2, OP_EQUAL], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::EvalFalse);
    }

    #[test]
    fn test_op_add() {
        // 2 + 3 = 5
        assert!(run(&[OP_2, OP_3], &[OP_ADD, OP_5, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_sub() {
        // 5 - 3 = 2
        assert!(run(&[OP_5, OP_3], &[OP_SUB, OP_2, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_dup_hash160_equalverify() {
        use ripemd::{Digest, Ripemd160};
        use sha2::{Digest as D2, Sha256};

        let pubkey = vec![0x04; 33];
        let sha = Sha256::digest(&pubkey);
        let hash160 = Ripemd160::digest(sha);

        let mut unlock_bytes = vec![pubkey.len() as u8];
        unlock_bytes.extend_from_slice(&pubkey);

        let mut lock_bytes = vec![OP_DUP, OP_HASH160];
        lock_bytes.push(hash160.len() as u8);
        lock_bytes.extend_from_slice(&hash160);
        lock_bytes.push(OP_EQUALVERIFY);
        lock_bytes.push(OP_1);

        let result = run(&unlock_bytes, &lock_bytes, ScriptFlags::NONE);
        assert!(result.is_ok(), "hash path should pass: {:?}", result.err());
    }

    #[test]
    fn test_op_if_else_endif() {
        let result = run(&[], &[OP_1, OP_IF, OP_2, OP_ELSE, OP_3, OP_ENDIF], ScriptFlags::NONE);
        assert!(result.is_ok(), "IF/ELSE/ENDIF should work: {:?}", result.err());
    }

    #[test]
    fn test_op_notif() {
        assert!(run(&[], &[OP_0, OP_NOTIF, OP_1, OP_ELSE, OP_0, OP_ENDIF], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_nested_if() {
        assert!(run(&[], &[OP_1, OP_IF, OP_1, OP_IF, OP_2, OP_ENDIF, OP_ENDIF], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_unbalanced_if() {
        let result = run(&[OP_1], &[OP_IF], ScriptFlags::NONE);
        assert_eq!(
            result.unwrap_err().code,
            InterpreterErrorCode::UnbalancedConditional
        );
    }

    #[test]
    fn test_op_return_fails() {
        let result = run(&[OP_1], &[OP_RETURN], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::OpReturn);
    }

    #[test]
    fn test_op_depth() {
        assert!(run(&[OP_1, OP_2, OP_3], &[OP_DEPTH, OP_3, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_size() {
        let unlock = [0x03, 0xaa, 0xbb, 0xcc];
        assert!(run(&unlock, &[OP_SIZE, OP_3, OP_EQUALVERIFY, OP_1], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_cat_disabled_by_default() {
        // Fails at the program counter, before consuming stack items.
        let result = run(&[OP_1], &[OP_CAT], ScriptFlags::NONE);
        let err = result.unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::DisabledOpcode);
        assert_eq!(err.opcode.as_deref(), Some("OP_CAT"));
    }

    #[test]
    fn test_op_cat_extended() {
        let unlock = [0x01, 0xaa, 0x01, 0xbb];
        let lock = [OP_CAT, 0x02, 0xaa, 0xbb, OP_EQUAL];
        let result = run(&unlock, &lock, ScriptFlags::EXTENDED_OPCODES);
        assert!(result.is_ok(), "CAT should concatenate: {:?}", result.err());
    }

    #[test]
    fn test_op_split_extended() {
        // Split [aa, bb] at position 1
        let unlock = [0x02, 0xaa, 0xbb, OP_1];
        let lock = [OP_SPLIT, 0x01, 0xbb, OP_EQUALVERIFY, 0x01, 0xaa, OP_EQUAL];
        let result = run(&unlock, &lock, ScriptFlags::EXTENDED_OPCODES);
        assert!(result.is_ok(), "SPLIT should work: {:?}", result.err());
    }

    #[test]
    fn test_op_negate() {
        assert!(run(&[OP_1], &[OP_NEGATE, OP_1NEGATE, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_abs() {
        assert!(run(&[OP_1NEGATE], &[OP_ABS, OP_1, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_not() {
        assert!(run(&[OP_0], &[OP_NOT], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_within() {
        // 3 is within [2, 5)
        assert!(run(&[OP_3, OP_2, OP_5], &[OP_WITHIN], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_mul_extended() {
        let result = run(&[OP_3, OP_4], &[OP_MUL, OP_12, OP_EQUAL], ScriptFlags::EXTENDED_OPCODES);
        assert!(result.is_ok(), "3 * 4 should equal 12: {:?}", result.err());
    }

    #[test]
    fn test_op_mul_disabled_by_default() {
        let result = run(&[OP_3, OP_4], &[OP_MUL], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::DisabledOpcode);
    }

    #[test]
    fn test_op_div() {
        let result = run(&[OP_6, OP_3], &[OP_DIV, OP_2, OP_EQUAL], ScriptFlags::EXTENDED_OPCODES);
        assert!(result.is_ok(), "6 / 3 should equal 2: {:?}", result.err());
    }

    #[test]
    fn test_op_div_by_zero() {
        let result = run(&[OP_6, OP_0], &[OP_DIV], ScriptFlags::EXTENDED_OPCODES);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::DivByZero);
    }

    #[test]
    fn test_op_mod() {
        let result = run(&[OP_7, OP_3], &[OP_MOD, OP_1, OP_EQUAL], ScriptFlags::EXTENDED_OPCODES);
        assert!(result.is_ok(), "7 % 3 should equal 1: {:?}", result.err());
    }

    #[test]
    fn test_op_mod_by_zero() {
        let result = run(&[OP_7, OP_0], &[OP_MOD], ScriptFlags::EXTENDED_OPCODES);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::ModByZero);
    }

    #[test]
    fn test_op_booland() {
        assert!(run(&[OP_1, OP_1], &[OP_BOOLAND], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_1, OP_0], &[OP_BOOLAND, OP_NOT], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_numequal() {
        assert!(run(&[OP_5, OP_5], &[OP_NUMEQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_lessthan_greaterthan() {
        assert!(run(&[OP_3, OP_5], &[OP_LESSTHAN], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_5, OP_3], &[OP_GREATERTHAN], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_min_max() {
        assert!(run(&[OP_3, OP_5], &[OP_MIN, OP_3, OP_EQUAL], ScriptFlags::NONE).is_ok());
        assert!(run(&[OP_3, OP_5], &[OP_MAX, OP_5, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_hash_ops() {
        // SHA256 of empty pushes 32 bytes
        let lock = [OP_SHA256, OP_SIZE, 0x01, 0x20, OP_EQUALVERIFY, OP_1];
        let result = run(&[OP_0], &lock, ScriptFlags::NONE);
        assert!(result.is_ok(), "SHA256 should produce 32 bytes: {:?}", result.err());
    }

    #[test]
    fn test_op_pick() {
        // PICK: [1, 2, 3], PICK(2) -> [1, 2, 3, 1]
        let unlock = [OP_1, OP_2, OP_3, OP_2];
        let lock = [
            OP_PICK, OP_1, OP_EQUALVERIFY, OP_3, OP_EQUALVERIFY, OP_2, OP_EQUALVERIFY, OP_1,
        ];
        let result = run(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_ok(), "PICK should copy element: {:?}", result.err());
    }

    #[test]
    fn test_op_toaltstack_fromaltstack() {
        let lock = [OP_TOALTSTACK, OP_FROMALTSTACK, OP_5, OP_EQUAL];
        assert!(run(&[OP_5], &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_2mul_always_disabled() {
        let result = run(&[OP_1], &[OP_2MUL], ScriptFlags::EXTENDED_OPCODES);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::DisabledOpcode);
    }

    #[test]
    fn test_op_invert_extended() {
        let unlock = [0x01, 0x00];
        let lock = [OP_INVERT, 0x01, 0xff, OP_EQUAL];
        assert!(run(&unlock, &lock, ScriptFlags::EXTENDED_OPCODES).is_ok());
    }

    #[test]
    fn test_op_and_or_xor_extended() {
        // AND: 0xff AND 0x0f = 0x0f
        assert!(run(
            &[0x01, 0xff, 0x01, 0x0f],
            &[OP_AND, 0x01, 0x0f, OP_EQUAL],
            ScriptFlags::EXTENDED_OPCODES
        )
        .is_ok());

        // OR: 0xf0 OR 0x0f = 0xff
        assert!(run(
            &[0x01, 0xf0, 0x01, 0x0f],
            &[OP_OR, 0x01, 0xff, OP_EQUAL],
            ScriptFlags::EXTENDED_OPCODES
        )
        .is_ok());

        // XOR: 0xff XOR 0xff = 0x00
        assert!(run(
            &[0x01, 0xff, 0x01, 0xff],
            &[OP_XOR, 0x01, 0x00, OP_EQUAL],
            ScriptFlags::EXTENDED_OPCODES
        )
        .is_ok());
    }

    #[test]
    fn test_op_rot() {
        // [1 2 3] ROT -> [2 3 1]
        let unlock = [OP_1, OP_2, OP_3];
        let lock = [
            OP_ROT,
            OP_1, OP_EQUALVERIFY,
            OP_3, OP_EQUALVERIFY,
            OP_2, OP_EQUAL,
        ];
        let result = run(&unlock, &lock, ScriptFlags::NONE);
        assert!(result.is_ok(), "ROT should rotate: {:?}", result.err());
    }

    #[test]
    fn test_op_tuck() {
        // [1 2] TUCK -> [2 1 2]
        let lock = [
            OP_TUCK,
            OP_2, OP_EQUALVERIFY,
            OP_1, OP_EQUALVERIFY,
            OP_2, OP_EQUAL,
        ];
        assert!(run(&[OP_1, OP_2], &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_2dup() {
        let lock = [
            OP_2DUP,
            OP_2, OP_EQUALVERIFY,
            OP_1, OP_EQUALVERIFY,
            OP_2, OP_EQUALVERIFY,
            OP_1, OP_EQUAL,
        ];
        assert!(run(&[OP_1, OP_2], &lock, ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_op_ifdup() {
        assert!(run(&[OP_1], &[OP_IFDUP, OP_EQUAL], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_empty_both_scripts() {
        let result = run(&[], &[], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::EvalFalse);
    }

    #[test]
    fn test_op_verify_fail() {
        let result = run(&[OP_0], &[OP_VERIFY], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::Verify);
    }

    #[test]
    fn test_clean_stack_without_bip16() {
        let result = run(&[OP_1], &[OP_1], ScriptFlags::VERIFY_CLEAN_STACK);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::InvalidFlags);
    }

    #[test]
    fn test_clean_stack_violation() {
        let result = run(
            &[OP_1, OP_1],
            &[OP_1],
            ScriptFlags::VERIFY_CLEAN_STACK | ScriptFlags::BIP16,
        );
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::CleanStack);
    }

    #[test]
    fn test_sig_push_only() {
        let result = run(
            &[OP_1, OP_DUP],
            &[OP_DROP],
            ScriptFlags::VERIFY_SIG_PUSH_ONLY,
        );
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::NotPushOnly);
    }

    #[test]
    fn test_minimal_data_push() {
        // Value 1 pushed as a 1-byte data push instead of OP_1.
        let unlock = [0x01, 0x01];
        let result = run(&unlock, &[OP_1, OP_EQUAL], ScriptFlags::VERIFY_MINIMAL_DATA);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::MinimalData);
    }

    #[test]
    fn test_minimal_if() {
        // A 2-byte truthy value is rejected under MINIMAL_IF.
        let unlock = [0x02, 0x01, 0x00];
        let result = run(
            &unlock,
            &[OP_IF, OP_1, OP_ENDIF, OP_1],
            ScriptFlags::VERIFY_MINIMAL_IF,
        );
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::MinimalIf);
    }

    #[test]
    fn test_discourage_upgradable_nops() {
        let result = run(
            &[OP_1],
            &[OP_NOP1],
            ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS,
        );
        assert_eq!(
            result.unwrap_err().code,
            InterpreterErrorCode::DiscourageUpgradableNops
        );
        // Without the flag, NOPs are fine.
        assert!(run(&[OP_1], &[OP_NOP1], ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_opcount_limit() {
        // 202 non-push opcodes exceed the 201 budget.
        let mut lock = vec![OP_1];
        for _ in 0..202 {
            lock.push(OP_NOP);
        }
        let result = run(&[], &lock, ScriptFlags::NONE);
        assert_eq!(
            result.unwrap_err().code,
            InterpreterErrorCode::TooManyOperations
        );
    }

    #[test]
    fn test_element_size_limit() {
        // A 521-byte push exceeds the element size limit.
        let mut unlock = vec![OP_PUSHDATA2];
        unlock.extend_from_slice(&521u16.to_le_bytes());
        unlock.extend_from_slice(&vec![0xaa; 521]);
        let result = run(&unlock, &[OP_1], ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::ElementTooBig);
    }

    #[test]
    fn test_stack_size_limit() {
        // 1001 pushes exceed the combined stack limit (pushes do not
        // count toward the opcode budget).
        let lock = vec![OP_1; 1001];
        let result = run(&[], &lock, ScriptFlags::NONE);
        assert_eq!(result.unwrap_err().code, InterpreterErrorCode::StackOverflow);
    }

    #[test]
    fn test_error_carries_opcode_and_position() {
        let result = run(&[OP_1], &[OP_1, OP_VERIFY, OP_0, OP_VERIFY], ScriptFlags::NONE);
        let err = result.unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::Verify);
        assert_eq!(err.opcode.as_deref(), Some("OP_VERIFY"));
        assert_eq!(err.position, Some(3));
    }
}
