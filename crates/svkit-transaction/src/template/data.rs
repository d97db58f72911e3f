//! Data-carrier (OP_RETURN) script template.
//!
//! Locking: `OP_FALSE OP_RETURN <data1> <data2> ...`. The output is
//! provably unspendable, so there is no unlocker.

use svkit_script::chunk::decode_script;
use svkit_script::opcodes::{OP_FALSE, OP_RETURN};
use svkit_script::Script;

use crate::TransactionError;

/// Create a data output locking script.
///
/// # Arguments
/// * `parts` - The data payloads; each gets its own push.
///
/// # Returns
/// An `OP_FALSE OP_RETURN <push...>` script.
pub fn lock(parts: &[&[u8]]) -> Result<Script, TransactionError> {
    let mut script = Script::new();
    script.append_opcodes(&[OP_FALSE, OP_RETURN])?;
    for part in parts {
        script.append_push_data(part)?;
    }
    Ok(script)
}

/// Recover the data payloads from a data output script.
///
/// # Arguments
/// * `script` - A candidate locking script.
///
/// # Returns
/// The pushed payloads, or `NotStandardTemplate` if the script does not
/// begin with `OP_FALSE OP_RETURN` or the trailing pushes are malformed.
pub fn parse_lock(script: &Script) -> Result<Vec<Vec<u8>>, TransactionError> {
    let bytes = script.to_bytes();
    if bytes.len() < 2 || bytes[0] != OP_FALSE || bytes[1] != OP_RETURN {
        return Err(TransactionError::NotStandardTemplate("data"));
    }

    let chunks = decode_script(&bytes[2..])
        .map_err(|_| TransactionError::NotStandardTemplate("data"))?;

    let mut parts = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match chunk.data {
            Some(data) => parts.push(data),
            None => return Err(TransactionError::NotStandardTemplate("data")),
        }
    }
    Ok(parts)
}
