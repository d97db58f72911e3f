//! Interpreter error types.
//!
//! Every failure carries a typed code plus, once the execution thread
//! has stamped it, the opcode name and script offset where evaluation
//! aborted.

use std::fmt;

/// Error codes for the script interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterErrorCode {
    /// Invalid flag combination supplied to the engine.
    InvalidFlags,
    /// Missing or invalid engine parameters (e.g. checksig without a tx).
    InvalidParams,
    /// OP_RETURN executed.
    OpReturn,
    /// Stack empty at the end of execution.
    EmptyStack,
    /// Final stack value is false.
    EvalFalse,
    /// The program counter moved outside the scripts.
    InvalidProgramCounter,
    /// Script exceeds the maximum script size.
    ScriptTooBig,
    /// Pushed element exceeds the maximum element size.
    ElementTooBig,
    /// Exceeded the non-push opcode budget.
    TooManyOperations,
    /// Combined stack depth exceeds the limit.
    StackOverflow,
    /// Bad pubkey count for CHECKMULTISIG.
    InvalidPubKeyCount,
    /// Bad signature count for CHECKMULTISIG.
    InvalidSignatureCount,
    /// Numeric value exceeds the script number length limit.
    NumberTooBig,
    /// Numeric value below an operation's allowed range.
    NumberTooSmall,
    /// Division by zero.
    DivByZero,
    /// Modulo by zero.
    ModByZero,
    /// A value cannot be represented in the requested width (OP_NUM2BIN).
    ImpossibleEncoding,
    /// OP_VERIFY failed.
    Verify,
    /// OP_EQUALVERIFY failed.
    EqualVerify,
    /// OP_NUMEQUALVERIFY failed.
    NumEqualVerify,
    /// OP_CHECKSIGVERIFY failed.
    CheckSigVerify,
    /// OP_CHECKMULTISIGVERIFY failed.
    CheckMultiSigVerify,
    /// Attempt to execute a disabled opcode.
    DisabledOpcode,
    /// Attempt to execute a reserved opcode.
    ReservedOpcode,
    /// Attempt to execute an undefined opcode.
    BadOpcode,
    /// Truncated or malformed push data.
    MalformedPush,
    /// Stack operation on too few or out-of-range elements.
    InvalidStackOperation,
    /// IF/ELSE/ENDIF nesting is unbalanced.
    UnbalancedConditional,
    /// Operand byte arrays have mismatched lengths (bitwise ops).
    InvalidInputLength,
    /// Push or number is not minimally encoded.
    MinimalData,
    /// OP_IF argument is not exactly empty or 0x01.
    MinimalIf,
    /// Signature sighash type byte is invalid.
    InvalidSigHashType,
    /// DER signature is too short.
    SigTooShort,
    /// DER signature is too long.
    SigTooLong,
    /// DER sequence identifier missing or wrong.
    SigInvalidSeqId,
    /// DER length field inconsistent.
    SigInvalidDataLen,
    /// DER S type indicator missing.
    SigMissingSTypeId,
    /// DER S length missing.
    SigMissingSLen,
    /// DER S length invalid.
    SigInvalidSLen,
    /// DER R integer marker wrong.
    SigInvalidRIntId,
    /// DER R length is zero.
    SigZeroRLen,
    /// DER R is negative.
    SigNegativeR,
    /// DER R has excess padding.
    SigTooMuchRPadding,
    /// DER S integer marker wrong.
    SigInvalidSIntId,
    /// DER S length is zero.
    SigZeroSLen,
    /// DER S is negative.
    SigNegativeS,
    /// DER S has excess padding.
    SigTooMuchSPadding,
    /// Signature S value is in the upper half of the curve order.
    SigHighS,
    /// Unlocking script is not push only.
    NotPushOnly,
    /// CHECKMULTISIG dummy element is not empty.
    SigNullDummy,
    /// Unsupported public key encoding.
    PubKeyType,
    /// More than one element left on the stack with CLEANSTACK.
    CleanStack,
    /// Failed signature check consumed a non-empty signature.
    NullFail,
    /// Upgradable NOP executed with the discourage flag.
    DiscourageUpgradableNops,
    /// Negative lock time on the stack.
    NegativeLockTime,
    /// Lock time requirement not satisfied.
    UnsatisfiedLockTime,
    /// FORKID bit present/absent contrary to the engine flags.
    IllegalForkId,
}

impl fmt::Display for InterpreterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A script interpreter error.
///
/// Carries the error code, a human-readable description, and (once
/// stamped by the execution thread) the opcode name and byte offset
/// where evaluation failed.
#[derive(Debug, Clone)]
pub struct InterpreterError {
    /// The typed error code.
    pub code: InterpreterErrorCode,
    /// Human-readable description.
    pub description: String,
    /// Name of the opcode that was executing, if known.
    pub opcode: Option<String>,
    /// Byte offset of the opcode within its script, if known.
    pub position: Option<usize>,
}

impl InterpreterError {
    /// Create a new error with a code and description.
    pub fn new(code: InterpreterErrorCode, description: String) -> Self {
        InterpreterError {
            code,
            description,
            opcode: None,
            position: None,
        }
    }

    /// Stamp the opcode name and script offset, if not already set.
    pub fn at(mut self, opcode: &str, position: usize) -> Self {
        if self.opcode.is_none() {
            self.opcode = Some(opcode.to_string());
            self.position = Some(position);
        }
        self
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.opcode, self.position) {
            (Some(op), Some(pos)) => {
                write!(f, "{} at offset {}: {}", op, pos, self.description)
            }
            _ => write!(f, "{}", self.description),
        }
    }
}

impl std::error::Error for InterpreterError {}
