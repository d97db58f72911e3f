//! Parsed opcode stream for the execution thread.
//!
//! The thread consumes scripts as a flat sequence of (opcode, payload)
//! pairs.  Parsing and re-encoding are built on the chunk codec in
//! [`crate::chunk`] rather than a second byte-level parser; this module
//! adds the execution-oriented queries (disabled, conditional, and
//! minimal-push classification) plus the subscript scrubbing the
//! signature checks need.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use crate::chunk::{decode_script, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::Script;

/// A parsed opcode with its data payload.
#[derive(Debug, Clone)]
pub struct ParsedOpcode {
    /// The opcode byte value.
    pub opcode: u8,
    /// The payload of push opcodes, and the trailing bytes of a
    /// top-level OP_RETURN; empty for everything else.
    pub data: Vec<u8>,
}

impl ParsedOpcode {
    /// Return the human-readable name of this opcode.
    pub fn name(&self) -> &'static str {
        opcode_to_string(self.opcode)
    }

    /// Return true if this opcode is disabled under the given flags.
    ///
    /// OP_2MUL and OP_2DIV are disabled under every rule set; the
    /// historic splice/bitwise/arithmetic set is disabled unless the
    /// extended-opcodes flag is active.
    pub fn is_disabled(&self, flags: ScriptFlags) -> bool {
        if matches!(self.opcode, OP_2MUL | OP_2DIV) {
            return true;
        }
        !flags.has_flag(ScriptFlags::EXTENDED_OPCODES) && is_initially_disabled(self.opcode)
    }

    /// Return true if this opcode is always illegal (OP_VERIF, OP_VERNOTIF).
    pub fn always_illegal(&self) -> bool {
        matches!(self.opcode, OP_VERIF | OP_VERNOTIF)
    }

    /// Return true if this opcode is a conditional flow control opcode.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self.opcode,
            OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF | OP_VERIF | OP_VERNOTIF
        )
    }

    /// Return true if this opcode requires a transaction context to execute.
    pub fn requires_tx(&self) -> bool {
        matches!(
            self.opcode,
            OP_CHECKSIG
                | OP_CHECKSIGVERIFY
                | OP_CHECKMULTISIG
                | OP_CHECKMULTISIGVERIFY
                | OP_CHECKSEQUENCEVERIFY
        )
    }

    /// Check that this push uses the smallest opcode for its payload.
    pub fn enforce_minimum_data_push(&self) -> Result<(), InterpreterError> {
        let minimal = minimal_push_opcode(&self.data);
        if self.opcode == minimal {
            return Ok(());
        }
        Err(InterpreterError::new(
            InterpreterErrorCode::MinimalData,
            format!(
                "{}-byte push encoded with {} instead of {}",
                self.data.len(),
                self.name(),
                opcode_to_string(minimal)
            ),
        ))
    }

    /// View this opcode as a chunk for re-encoding.
    fn to_chunk(&self) -> ScriptChunk {
        let data = match self.opcode {
            op if (OP_DATA_1..=OP_PUSHDATA4).contains(&op) => Some(self.data.clone()),
            OP_RETURN if !self.data.is_empty() => Some(self.data.clone()),
            _ => None,
        };
        ScriptChunk {
            op: self.opcode,
            data,
        }
    }

    /// Serialize back to script bytes, preserving the push form.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_chunk().to_bytes()
    }
}

/// A parsed script is a sequence of parsed opcodes.
pub type ParsedScript = Vec<ParsedOpcode>;

/// The smallest opcode capable of pushing exactly `data`.
///
/// Empty data is OP_0, single bytes 1..=16 are the small-int opcodes,
/// 0x81 is OP_1NEGATE, and everything else takes the smallest push
/// class [`push_data_prefix`] selects.
pub fn minimal_push_opcode(data: &[u8]) -> u8 {
    if data.is_empty() {
        return OP_0;
    }
    if data.len() == 1 {
        if (1..=16).contains(&data[0]) {
            return OP_1 + data[0] - 1;
        }
        if data[0] == 0x81 {
            return OP_1NEGATE;
        }
    }
    match push_data_prefix(data.len()) {
        Ok(prefix) => prefix[0],
        Err(_) => OP_PUSHDATA4,
    }
}

/// Parse a script into the thread's opcode stream.
///
/// Decoding is delegated to the chunk codec, so push forms and the
/// OP_RETURN trailing-data rule match the rest of the crate exactly.
///
/// # Arguments
/// * `script` - The script to parse.
/// * `error_on_checksig` - Fail on signature-checking opcodes (set when
///   no transaction context is available).
///
/// # Returns
/// The parsed opcodes, or an error for a truncated push.
pub fn parse_script(
    script: &Script,
    error_on_checksig: bool,
) -> Result<ParsedScript, InterpreterError> {
    let chunks = decode_script(script.to_bytes()).map_err(|_| {
        InterpreterError::new(
            InterpreterErrorCode::MalformedPush,
            "script ends inside a push".to_string(),
        )
    })?;

    let mut ops = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let op = ParsedOpcode {
            opcode: chunk.op,
            data: chunk.data.unwrap_or_default(),
        };
        if error_on_checksig && op.requires_tx() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidParams,
                format!("{} needs a transaction context", op.name()),
            ));
        }
        ops.push(op);
    }
    Ok(ops)
}

/// Reassemble a parsed script into its byte form, preserving each
/// push's original encoding.
pub fn encode_script(pscript: &ParsedScript) -> Script {
    let mut bytes = Vec::new();
    for pop in pscript {
        bytes.extend_from_slice(&pop.to_bytes());
    }
    Script::from_bytes(&bytes)
}

/// Drop the chunks a signature hash must not cover.
///
/// Every OP_CODESEPARATOR goes, and, when a signature is supplied, so
/// does any minimally encoded push whose payload contains that
/// signature (a signature can never validly sign itself).
pub fn scrub_subscript(script: &ParsedScript, signature: Option<&[u8]>) -> ParsedScript {
    script
        .iter()
        .filter(|pop| {
            if pop.opcode == OP_CODESEPARATOR {
                return false;
            }
            if let Some(sig) = signature {
                if !sig.is_empty()
                    && pop.opcode == minimal_push_opcode(&pop.data)
                    && pop.data.windows(sig.len()).any(|w| w == sig)
                {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_encode_roundtrip() {
        let script =
            Script::from_hex("76a914e2a623699e81b291c0327f408fea765d534baa2a88ac").unwrap();
        let parsed = parse_script(&script, false).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(encode_script(&parsed), script);
    }

    #[test]
    fn test_roundtrip_preserves_push_forms() {
        // A 5-byte payload pushed with OP_PUSHDATA1 stays OP_PUSHDATA1.
        let script = Script::from_hex("4c050102030405").unwrap();
        let parsed = parse_script(&script, false).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].opcode, OP_PUSHDATA1);
        assert_eq!(encode_script(&parsed), script);
    }

    #[test]
    fn test_parse_truncated_push() {
        let script = Script::from_hex("4c05ffff").unwrap();
        let err = parse_script(&script, false).unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::MalformedPush);
    }

    #[test]
    fn test_error_on_checksig() {
        let script = Script::from_bytes(&[OP_CHECKSIG]);
        assert!(parse_script(&script, true).is_err());
        assert!(parse_script(&script, false).is_ok());
    }

    #[test]
    fn test_minimal_push_opcode() {
        assert_eq!(minimal_push_opcode(&[]), OP_0);
        assert_eq!(minimal_push_opcode(&[1]), OP_1);
        assert_eq!(minimal_push_opcode(&[16]), OP_16);
        assert_eq!(minimal_push_opcode(&[0x81]), OP_1NEGATE);
        assert_eq!(minimal_push_opcode(&[0x11]), OP_DATA_1);
        assert_eq!(minimal_push_opcode(&[0xaa; 75]), OP_DATA_75);
        assert_eq!(minimal_push_opcode(&[0xaa; 76]), OP_PUSHDATA1);
        assert_eq!(minimal_push_opcode(&[0xaa; 300]), OP_PUSHDATA2);
    }

    #[test]
    fn test_enforce_minimum_data_push() {
        // Value 1 belongs in OP_1, not a 1-byte data push.
        let non_minimal = ParsedOpcode {
            opcode: OP_DATA_1,
            data: vec![0x01],
        };
        let err = non_minimal.enforce_minimum_data_push().unwrap_err();
        assert_eq!(err.code, InterpreterErrorCode::MinimalData);

        let minimal = ParsedOpcode {
            opcode: OP_DATA_1,
            data: vec![0x11],
        };
        assert!(minimal.enforce_minimum_data_push().is_ok());
    }

    #[test]
    fn test_disabled_depends_on_flags() {
        let cat = ParsedOpcode {
            opcode: OP_CAT,
            data: vec![],
        };
        assert!(cat.is_disabled(ScriptFlags::NONE));
        assert!(!cat.is_disabled(ScriptFlags::EXTENDED_OPCODES));

        let two_mul = ParsedOpcode {
            opcode: OP_2MUL,
            data: vec![],
        };
        assert!(two_mul.is_disabled(ScriptFlags::NONE));
        assert!(two_mul.is_disabled(ScriptFlags::EXTENDED_OPCODES));
    }

    #[test]
    fn test_scrub_subscript_removes_code_separators() {
        let script = Script::from_bytes(&[OP_DUP, OP_CODESEPARATOR, OP_HASH160]);
        let parsed = parse_script(&script, false).unwrap();
        let scrubbed = scrub_subscript(&parsed, None);
        assert_eq!(scrubbed.len(), 2);
        assert!(scrubbed.iter().all(|p| p.opcode != OP_CODESEPARATOR));
    }

    #[test]
    fn test_scrub_subscript_removes_signature_push() {
        let sig = vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x41];
        let mut script = Script::new();
        script.append_push_data(&sig).unwrap();
        script.append_opcodes(&[OP_CHECKSIG]).unwrap();

        let parsed = parse_script(&script, false).unwrap();
        let scrubbed = scrub_subscript(&parsed, Some(&sig));
        assert_eq!(scrubbed.len(), 1);
        assert_eq!(scrubbed[0].opcode, OP_CHECKSIG);

        // Other pushes survive.
        let kept = scrub_subscript(&parsed, Some(&[0xde, 0xad]));
        assert_eq!(kept.len(), 2);
    }
}
