//! Bitcoin Script parsing, execution, and address handling.
//!
//! Provides the `Script` type, the opcode table with classification,
//! script chunk parsing, address generation/validation for the four
//! standard version bytes, and a pre-Genesis script interpreter engine.

pub mod address;
pub mod chunk;
pub mod interpreter;
pub mod opcodes;
pub mod script;

mod error;
pub use address::{Address, AddressType, Network};
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::Script;
