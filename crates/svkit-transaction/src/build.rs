//! Fee-aware transaction builder.
//!
//! Assembles a transaction from UTXOs and payment outputs, resolves the
//! change amount against a fee-rate target, and signs every input
//! through its stored unlocking template.  Signing is the terminal
//! operation: it consumes the builder and returns the finished
//! [`Transaction`], so a signed transaction cannot be mutated back into
//! staleness through the builder.

use svkit_primitives::chainhash::Hash;
use svkit_script::{Address, Script};

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::template::{p2pkh, UnlockingScriptTemplate};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Maximum money supply in satoshis (21 million coins).
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Default dust threshold: change below this many satoshis is dropped
/// into the fee instead of creating an output.
pub const DUST_THRESHOLD: u64 = 546;

/// Default fee density in satoshis per 1000 bytes.
pub const DEFAULT_FEE_PER_KB: u64 = 1000;

/// An unspent transaction output to be consumed by the builder.
///
/// The builder stores the locking script and value verbatim until
/// signing.
#[derive(Clone, Debug)]
pub struct Utxo {
    /// Transaction ID of the funding transaction.
    pub txid: Hash,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// Value of the output in satoshis.
    pub satoshis: u64,
    /// The output's locking script.
    pub locking_script: Script,
}

/// Builder assembling and signing a transaction.
///
/// All configuration methods take and return the builder by value so
/// calls chain; [`TransactionBuilder::sign`] is terminal.
pub struct TransactionBuilder {
    tx: Transaction,
    unlockers: Vec<Option<Box<dyn UnlockingScriptTemplate>>>,
    change_script: Option<Script>,
    fee_per_kb: u64,
    dust_threshold: u64,
}

impl TransactionBuilder {
    /// Create an empty builder with default fee rate and dust threshold.
    pub fn new() -> Self {
        TransactionBuilder {
            tx: Transaction::new(),
            unlockers: Vec::new(),
            change_script: None,
            fee_per_kb: DEFAULT_FEE_PER_KB,
            dust_threshold: DUST_THRESHOLD,
        }
    }

    /// Set the transaction version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.tx.version = version;
        self
    }

    /// Set the transaction lock time.
    ///
    /// For the lock time to be enforced, at least one input must use a
    /// sequence number at or below
    /// [`crate::input::MAX_LOCKTIME_SEQUENCE_NUMBER`].
    pub fn with_lock_time(mut self, lock_time: u32) -> Self {
        self.tx.lock_time = lock_time;
        self
    }

    /// Set the target fee density in satoshis per 1000 bytes.
    pub fn with_fee_per_kb(mut self, fee_per_kb: u64) -> Self {
        self.fee_per_kb = fee_per_kb;
        self
    }

    /// Override the dust threshold.
    ///
    /// Change strictly below the threshold is dropped into the fee; a
    /// change amount exactly equal to the threshold is kept.  The
    /// threshold applies regardless of the change script template;
    /// raise it for templates larger than P2PKH.
    pub fn with_dust_threshold(mut self, dust_threshold: u64) -> Self {
        self.dust_threshold = dust_threshold;
        self
    }

    /// Add an input spending the given UTXO.
    ///
    /// The UTXO's value and locking script are stored on the input for
    /// sighash computation, and the unlocking template is kept for
    /// signing.
    ///
    /// # Arguments
    /// * `utxo` - The output being spent.
    /// * `sequence` - Sequence number for the input (commonly
    ///   [`crate::input::DEFAULT_SEQUENCE_NUMBER`]).
    /// * `unlocker` - Template that will produce the unlocking script.
    pub fn spend_from_output(
        mut self,
        utxo: Utxo,
        sequence: u32,
        unlocker: Box<dyn UnlockingScriptTemplate>,
    ) -> Self {
        let mut input = TransactionInput::new();
        input.source_txid = *utxo.txid.as_bytes();
        input.source_tx_out_index = utxo.vout;
        input.sequence_number = sequence;
        input.set_source_output(Some(TransactionOutput {
            satoshis: utxo.satoshis,
            locking_script: utxo.locking_script,
            change: false,
        }));

        self.tx.add_input(input);
        self.unlockers.push(Some(unlocker));
        self
    }

    /// Add an input spending the given UTXO without an unlocking
    /// template.
    ///
    /// The input participates in fee sizing with a zero-length
    /// placeholder, but [`TransactionBuilder::sign`] fails with
    /// `MissingUnlocker` unless every input has a template; use this
    /// only for transactions finished elsewhere.
    pub fn spend_from_output_unsigned(mut self, utxo: Utxo, sequence: u32) -> Self {
        let mut input = TransactionInput::new();
        input.source_txid = *utxo.txid.as_bytes();
        input.source_tx_out_index = utxo.vout;
        input.sequence_number = sequence;
        input.set_source_output(Some(TransactionOutput {
            satoshis: utxo.satoshis,
            locking_script: utxo.locking_script,
            change: false,
        }));

        self.tx.add_input(input);
        self.unlockers.push(None);
        self
    }

    /// Add a P2PKH payment output to the given address.
    ///
    /// # Arguments
    /// * `address` - The recipient address.
    /// * `satoshis` - The payment amount.
    ///
    /// # Returns
    /// The builder, or `ExcessiveSatoshis` when the amount exceeds the
    /// money supply.
    pub fn spend_to_address(
        self,
        address: &Address,
        satoshis: u64,
    ) -> Result<Self, TransactionError> {
        let script = p2pkh::lock(address)?;
        self.spend_to_script(script, satoshis)
    }

    /// Add a payment output with an explicit locking script.
    ///
    /// # Arguments
    /// * `locking_script` - The output's locking script.
    /// * `satoshis` - The payment amount.
    ///
    /// # Returns
    /// The builder, or `ExcessiveSatoshis` when the amount exceeds the
    /// money supply.
    pub fn spend_to_script(
        mut self,
        locking_script: Script,
        satoshis: u64,
    ) -> Result<Self, TransactionError> {
        if satoshis > MAX_MONEY {
            return Err(TransactionError::ExcessiveSatoshis(satoshis));
        }
        self.tx.add_output(TransactionOutput {
            satoshis,
            locking_script,
            change: false,
        });
        Ok(self)
    }

    /// Designate a change address.
    ///
    /// The builder adds a P2PKH change output during signing when the
    /// leftover satoshis reach the dust threshold.
    ///
    /// # Arguments
    /// * `address` - The change address.
    pub fn send_change_to(mut self, address: &Address) -> Result<Self, TransactionError> {
        self.change_script = Some(p2pkh::lock(address)?);
        Ok(self)
    }

    /// Access the transaction under construction.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Resolve the fee and sign every input.
    ///
    /// Runs the fee fixed point (sizing the transaction with
    /// placeholder unlocking scripts from each template's length
    /// estimate), adds or drops the change output, signs each input
    /// through its stored unlocking template, and returns the finished
    /// transaction.
    ///
    /// # Returns
    /// The signed `Transaction`, or an error for missing funds, missing
    /// unlocking templates, or signing failures.
    pub fn sign(mut self) -> Result<Transaction, TransactionError> {
        self.finalize_fee()?;

        for index in 0..self.tx.inputs.len() {
            let unlocker = self.unlockers[index]
                .as_ref()
                .ok_or(TransactionError::MissingUnlocker(index))?;
            let script = unlocker.sign(&self.tx, index)?;
            self.tx.inputs[index].unlocking_script = Some(script);
        }

        Ok(self.tx)
    }

    /// Compute the fee target and set or drop the change output.
    ///
    /// fee = ceil(estimated_size * fee_per_kb / 1000);
    /// change = inputs - outputs - fee.  Change below the dust
    /// threshold is dropped and the fee recomputed without the change
    /// output; insufficient inputs surface `InsufficientFunds`.
    fn finalize_fee(&mut self) -> Result<(), TransactionError> {
        let total_in = self.tx.total_input_satoshis()?;
        let total_out = self.tx.total_output_satoshis();

        if let Some(change_script) = self.change_script.clone() {
            let fee_with_change = self.fee_for_size(self.estimated_size(Some(&change_script)));
            if total_in >= total_out + fee_with_change {
                let change = total_in - total_out - fee_with_change;
                if change >= self.dust_threshold {
                    self.tx.add_output(TransactionOutput {
                        satoshis: change,
                        locking_script: change_script,
                        change: true,
                    });
                    return Ok(());
                }
            }
        }

        // No change output: the whole remainder is fee.
        let fee = self.fee_for_size(self.estimated_size(None));
        let needed = total_out + fee;
        if total_in < needed {
            return Err(TransactionError::InsufficientFunds {
                needed,
                available: total_in,
            });
        }
        Ok(())
    }

    /// Serialized size of the transaction with placeholder unlocking
    /// scripts (and optionally a change output) in place.
    fn estimated_size(&self, change_script: Option<&Script>) -> usize {
        let mut sized = self.tx.clone();
        for (index, input) in sized.inputs.iter_mut().enumerate() {
            let estimate = self.unlockers[index]
                .as_ref()
                .map(|u| u.estimate_length())
                .unwrap_or(0);
            input.unlocking_script = Some(Script::from_bytes(&vec![0u8; estimate]));
        }
        if let Some(script) = change_script {
            sized.add_output(TransactionOutput {
                satoshis: 0,
                locking_script: script.clone(),
                change: true,
            });
        }
        sized.size()
    }

    /// fee = ceil(size * fee_per_kb / 1000).
    fn fee_for_size(&self, size: usize) -> u64 {
        (size as u64 * self.fee_per_kb).div_ceil(1000)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::p2pkh;
    use svkit_primitives::ec::PrivateKey;
    use svkit_script::{Address, Network};

    fn fixed_key(tag: u8) -> PrivateKey {
        let mut bytes = [0x11u8; 32];
        bytes[31] = tag;
        PrivateKey::from_bytes(&bytes).unwrap()
    }

    fn funding_utxo(key: &PrivateKey, satoshis: u64) -> Utxo {
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);
        Utxo {
            txid: Hash::from_hex(&"aa".repeat(32)).unwrap(),
            vout: 0,
            satoshis,
            locking_script: p2pkh::lock(&addr).unwrap(),
        }
    }

    /// The fee fixed point produces a change output whose implied fee
    /// matches the signed size within one satoshi at 1000 sat/kB.
    #[test]
    fn test_fee_fixed_point() {
        let key_a = fixed_key(1);
        let key_b = fixed_key(2);
        let addr_a = Address::from_public_key(&key_a.pub_key(), Network::Mainnet);
        let addr_b = Address::from_public_key(&key_b.pub_key(), Network::Mainnet);

        let tx = TransactionBuilder::new()
            .with_fee_per_kb(1000)
            .spend_from_output(
                funding_utxo(&key_a, 100_000),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
                Box::new(p2pkh::unlock(key_a.clone(), None)),
            )
            .spend_to_address(&addr_b, 30_000)
            .unwrap()
            .send_change_to(&addr_a)
            .unwrap()
            .sign()
            .unwrap();

        assert_eq!(tx.output_count(), 2);
        let change = tx.outputs[1].satoshis;
        let fee_paid = 100_000 - 30_000 - change;
        let target_fee = tx.size() as u64; // 1000 sat/kB = 1 sat per byte
        assert!(
            fee_paid >= target_fee,
            "fee {} underpays the target {}",
            fee_paid,
            target_fee
        );
        // The placeholder estimate overshoots the real signature by at
        // most a couple of bytes.
        assert!(
            fee_paid - target_fee <= 2,
            "fee {} overshoots target {} by more than the estimate slack",
            fee_paid,
            target_fee
        );
    }

    /// Change below the dust threshold is dropped into the fee.
    #[test]
    fn test_dust_change_is_dropped() {
        let key = fixed_key(3);
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);

        // Inputs barely exceed output + fee; leftover is below dust.
        let tx = TransactionBuilder::new()
            .spend_from_output(
                funding_utxo(&key, 30_500),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
                Box::new(p2pkh::unlock(key.clone(), None)),
            )
            .spend_to_address(&addr, 30_000)
            .unwrap()
            .send_change_to(&addr)
            .unwrap()
            .sign()
            .unwrap();

        assert_eq!(tx.output_count(), 1);
    }

    /// Change exactly at the dust threshold is kept.
    #[test]
    fn test_change_at_dust_threshold_is_kept() {
        let key = fixed_key(4);
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);

        // Compute the with-change fee for this single-input, two-output
        // shape, then fund inputs so change lands exactly on the
        // threshold.
        let probe = TransactionBuilder::new()
            .spend_from_output(
                funding_utxo(&key, 1_000_000),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
                Box::new(p2pkh::unlock(key.clone(), None)),
            )
            .spend_to_address(&addr, 30_000)
            .unwrap();
        let fee = probe.fee_for_size(probe.estimated_size(Some(&p2pkh::lock(&addr).unwrap())));

        let tx = TransactionBuilder::new()
            .spend_from_output(
                funding_utxo(&key, 30_000 + fee + DUST_THRESHOLD),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
                Box::new(p2pkh::unlock(key.clone(), None)),
            )
            .spend_to_address(&addr, 30_000)
            .unwrap()
            .send_change_to(&addr)
            .unwrap()
            .sign()
            .unwrap();

        assert_eq!(tx.output_count(), 2);
        assert_eq!(tx.outputs[1].satoshis, DUST_THRESHOLD);
    }

    /// Spending more than the inputs carry fails with InsufficientFunds.
    #[test]
    fn test_insufficient_funds() {
        let key = fixed_key(5);
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);

        let result = TransactionBuilder::new()
            .spend_from_output(
                funding_utxo(&key, 10_000),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
                Box::new(p2pkh::unlock(key.clone(), None)),
            )
            .spend_to_address(&addr, 50_000)
            .unwrap()
            .sign();

        assert!(matches!(
            result,
            Err(TransactionError::InsufficientFunds { .. })
        ));
    }

    /// Signing fails when an input has no unlocking template.
    #[test]
    fn test_missing_unlocker() {
        let key = fixed_key(7);
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);

        let result = TransactionBuilder::new()
            .spend_from_output_unsigned(
                funding_utxo(&key, 100_000),
                crate::input::DEFAULT_SEQUENCE_NUMBER,
            )
            .spend_to_address(&addr, 30_000)
            .unwrap()
            .sign();

        assert!(matches!(result, Err(TransactionError::MissingUnlocker(0))));
    }

    /// Output values above MAX_MONEY are rejected.
    #[test]
    fn test_excessive_satoshis() {
        let key = fixed_key(6);
        let addr = Address::from_public_key(&key.pub_key(), Network::Mainnet);

        let result = TransactionBuilder::new().spend_to_address(&addr, MAX_MONEY + 1);
        assert!(matches!(
            result,
            Err(TransactionError::ExcessiveSatoshis(_))
        ));
    }
}
