#![deny(missing_docs)]

//! Pre-Genesis BSV wallet and transaction-construction library.
//!
//! Re-exports all svkit components for convenient single-crate usage.

pub use svkit_message as message;
pub use svkit_primitives as primitives;
pub use svkit_script as script;
pub use svkit_transaction as transaction;
