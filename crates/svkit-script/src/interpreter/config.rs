//! Interpreter resource limits (pre-Genesis rule set).

/// Maximum number of non-push opcodes executed per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;
/// Maximum combined stack size (data + alt).
pub const MAX_STACK_SIZE: usize = 1000;
/// Maximum script byte size.
pub const MAX_SCRIPT_SIZE: usize = 10000;
/// Maximum single data element byte size.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Maximum byte length for numeric operands. Arithmetic results may
/// grow one byte past this; feeding such a result back into a numeric
/// opcode fails.
pub const MAX_SCRIPT_NUMBER_LENGTH: usize = 4;
/// Maximum number of public keys in a multisig operation.
pub const MAX_PUB_KEYS_PER_MULTISIG: usize = 20;
