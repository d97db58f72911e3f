//! BIP-39 mnemonic generation and seed derivation.
//!
//! Provides mnemonic phrase generation from entropy, phrase validation
//! with checksum verification, and PBKDF2-based seed derivation for HD
//! wallet use.  The standard 2048-word English wordlist is embedded.

use std::sync::OnceLock;

use rand::RngCore;

use crate::hash::{pbkdf2_hmac_sha512, sha256};
use crate::PrimitivesError;

/// The embedded English wordlist, whitespace separated.
const WORDLIST_RAW: &str = include_str!("english.txt");

/// Number of words in the wordlist (11 bits of entropy per word).
const WORDLIST_LEN: usize = 2048;

/// PBKDF2 iteration count for seed derivation.
const SEED_ROUNDS: u32 = 2048;

/// Salt prefix for seed derivation; the passphrase is appended.
const SEED_SALT_PREFIX: &str = "mnemonic";

/// Return the parsed English wordlist.
fn wordlist() -> &'static [&'static str] {
    static WORDS: OnceLock<Vec<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        let words: Vec<&'static str> = WORDLIST_RAW.split_whitespace().collect();
        debug_assert_eq!(words.len(), WORDLIST_LEN);
        words
    })
}

/// Look up a word's index in the (sorted) wordlist.
fn word_index(word: &str) -> Option<usize> {
    wordlist().binary_search_by(|w| str::cmp(w, word)).ok()
}

/// A validated BIP-39 mnemonic phrase.
///
/// Holds the source entropy and the derived phrase.  Construct from
/// entropy ([`Mnemonic::from_entropy`]), from an existing phrase
/// ([`Mnemonic::from_phrase`], checksum verified), or randomly
/// ([`Mnemonic::generate`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mnemonic {
    entropy: Vec<u8>,
    phrase: String,
}

impl Mnemonic {
    /// Create a mnemonic from raw entropy.
    ///
    /// The entropy must be 16, 20, 24, 28, or 32 bytes (128..=256 bits
    /// in 32-bit steps), producing 12, 15, 18, 21, or 24 words.  The
    /// checksum is the first ENT/32 bits of SHA-256(entropy), appended
    /// to the entropy before splitting into 11-bit word indices.
    ///
    /// # Arguments
    /// * `entropy` - The entropy bytes.
    ///
    /// # Returns
    /// `Ok(Mnemonic)` on success, or an error for an invalid length.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, PrimitivesError> {
        if !matches!(entropy.len(), 16 | 20 | 24 | 28 | 32) {
            return Err(PrimitivesError::InvalidEntropyLength(entropy.len()));
        }

        let ent_bits = entropy.len() * 8;
        let cs_bits = ent_bits / 32;
        let word_count = (ent_bits + cs_bits) / 11;

        // Entropy followed by the checksum byte; at most 8 checksum bits
        // are ever used.
        let mut data = entropy.to_vec();
        data.push(sha256(entropy)[0]);

        let words = wordlist();
        let mut parts = Vec::with_capacity(word_count);
        for i in 0..word_count {
            let mut index = 0usize;
            for j in 0..11 {
                let bit = i * 11 + j;
                index <<= 1;
                index |= ((data[bit / 8] >> (7 - bit % 8)) & 1) as usize;
            }
            parts.push(words[index]);
        }

        Ok(Mnemonic {
            entropy: entropy.to_vec(),
            phrase: parts.join(" "),
        })
    }

    /// Generate a random mnemonic with the given entropy size.
    ///
    /// # Arguments
    /// * `entropy_len` - Entropy length in bytes (16, 20, 24, 28, or 32).
    ///
    /// # Returns
    /// `Ok(Mnemonic)` with OS-sourced entropy, or an error for an
    /// invalid length.
    pub fn generate(entropy_len: usize) -> Result<Self, PrimitivesError> {
        if !matches!(entropy_len, 16 | 20 | 24 | 28 | 32) {
            return Err(PrimitivesError::InvalidEntropyLength(entropy_len));
        }
        let mut entropy = vec![0u8; entropy_len];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        Self::from_entropy(&entropy)
    }

    /// Parse and validate an existing mnemonic phrase.
    ///
    /// The phrase must have 12, 15, 18, 21, or 24 words, every word must
    /// be in the wordlist, and the embedded checksum must match.
    ///
    /// # Arguments
    /// * `phrase` - A whitespace-separated mnemonic phrase.
    ///
    /// # Returns
    /// `Ok(Mnemonic)` on success, or an error describing the failure.
    pub fn from_phrase(phrase: &str) -> Result<Self, PrimitivesError> {
        let parts: Vec<&str> = phrase.split_whitespace().collect();
        if !matches!(parts.len(), 12 | 15 | 18 | 21 | 24) {
            return Err(PrimitivesError::InvalidMnemonic(format!(
                "invalid word count {}",
                parts.len()
            )));
        }

        let total_bits = parts.len() * 11;
        let ent_bits = total_bits * 32 / 33;
        let cs_bits = total_bits - ent_bits;

        // Rebuild the bit stream from word indices.
        let mut data = vec![0u8; (total_bits + 7) / 8];
        for (i, word) in parts.iter().enumerate() {
            let index = word_index(word).ok_or_else(|| {
                PrimitivesError::InvalidMnemonic(format!("unknown word '{}'", word))
            })?;
            for j in 0..11 {
                if index & (1 << (10 - j)) != 0 {
                    let bit = i * 11 + j;
                    data[bit / 8] |= 1 << (7 - bit % 8);
                }
            }
        }

        let entropy = data[..ent_bits / 8].to_vec();

        // Verify the checksum bits against SHA-256(entropy).
        let checksum = sha256(&entropy)[0];
        let mask = !0u8 << (8 - cs_bits);
        if data[ent_bits / 8] & mask != checksum & mask {
            return Err(PrimitivesError::InvalidMnemonic(
                "checksum mismatch".to_string(),
            ));
        }

        Ok(Mnemonic {
            entropy,
            phrase: parts.join(" "),
        })
    }

    /// Return the mnemonic phrase.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Return the source entropy bytes.
    pub fn to_entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// Return the number of words in the phrase.
    pub fn word_count(&self) -> usize {
        self.phrase.split(' ').count()
    }

    /// Derive the 64-byte seed for HD key generation.
    ///
    /// `seed = PBKDF2-HMAC-SHA512(phrase, "mnemonic" || passphrase,
    /// 2048, 64)`.
    ///
    /// # Arguments
    /// * `passphrase` - Optional passphrase; pass "" for none.
    ///
    /// # Returns
    /// The 64-byte seed.
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        let salt = format!("{}{}", SEED_SALT_PREFIX, passphrase);
        pbkdf2_hmac_sha512(self.phrase.as_bytes(), salt.as_bytes(), SEED_ROUNDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The embedded wordlist has exactly 2048 unique, sorted words.
    #[test]
    fn test_wordlist_shape() {
        let words = wordlist();
        assert_eq!(words.len(), WORDLIST_LEN);
        for pair in words.windows(2) {
            assert!(pair[0] < pair[1], "wordlist not sorted at '{}'", pair[1]);
        }
    }

    /// All-zero 128-bit entropy produces the canonical phrase.
    #[test]
    fn test_zero_entropy_vector() {
        let m = Mnemonic::from_entropy(&[0u8; 16]).unwrap();
        assert_eq!(
            m.phrase(),
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        );
        assert_eq!(m.word_count(), 12);
    }

    /// Seed derivation matches the published vector (passphrase "TREZOR").
    ///
    /// The seed depends only on the phrase string, not the wordlist.
    #[test]
    fn test_seed_vector() {
        let m = Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        )
        .unwrap();
        let seed = m.to_seed("TREZOR");
        assert_eq!(
            hex::encode(seed),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    /// Entropy round-trips through the phrase at every supported size.
    #[test]
    fn test_entropy_roundtrip_all_sizes() {
        for (len, words) in [(16, 12), (20, 15), (24, 18), (28, 21), (32, 24)] {
            let entropy: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37).wrapping_add(5)).collect();
            let m = Mnemonic::from_entropy(&entropy).unwrap();
            assert_eq!(m.word_count(), words);

            let parsed = Mnemonic::from_phrase(m.phrase()).unwrap();
            assert_eq!(parsed.to_entropy(), entropy.as_slice());
        }
    }

    /// Invalid entropy lengths are rejected.
    #[test]
    fn test_invalid_entropy_length() {
        assert!(Mnemonic::from_entropy(&[0u8; 15]).is_err());
        assert!(Mnemonic::from_entropy(&[0u8; 17]).is_err());
        assert!(Mnemonic::from_entropy(&[0u8; 33]).is_err());
    }

    /// A phrase with a word outside the list is rejected.
    #[test]
    fn test_unknown_word() {
        let result = Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon qwerty"
        );
        assert!(matches!(result, Err(PrimitivesError::InvalidMnemonic(_))));
    }

    /// A phrase with a failing checksum is rejected.
    #[test]
    fn test_bad_checksum() {
        // 12 x "abandon" encodes all-zero entropy with checksum bits 0000,
        // but the real checksum for zero entropy is 0011.
        let result = Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"
        );
        assert!(matches!(result, Err(PrimitivesError::InvalidMnemonic(_))));
    }

    /// A bad word count is rejected.
    #[test]
    fn test_bad_word_count() {
        assert!(Mnemonic::from_phrase("abandon ability able").is_err());
    }

    /// Generated mnemonics validate and round-trip.
    #[test]
    fn test_generate() {
        let m = Mnemonic::generate(32).unwrap();
        assert_eq!(m.word_count(), 24);
        let parsed = Mnemonic::from_phrase(m.phrase()).unwrap();
        assert_eq!(parsed, m);
    }
}
