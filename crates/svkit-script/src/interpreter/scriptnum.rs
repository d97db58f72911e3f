//! Script number arithmetic with Bitcoin consensus rules.
//!
//! All numbers on the script stack are encoded as little-endian byte
//! arrays with a sign bit in the most significant bit of the last byte.
//! Numeric opcodes operate on operands of at most 4 bytes; results may
//! overflow to 5 bytes and remain valid stack values, but feeding such
//! a value back into a numeric opcode fails.  With 4-byte operands
//! every reachable result fits an i64.

use super::error::{InterpreterError, InterpreterErrorCode};

/// A script number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptNumber(i64);

impl ScriptNumber {
    /// Create a new ScriptNumber from an i64 value.
    pub fn new(val: i64) -> Self {
        ScriptNumber(val)
    }

    /// Parse a byte array into a ScriptNumber.
    ///
    /// # Arguments
    /// * `bb` - The little-endian sign-magnitude bytes.
    /// * `max_len` - Maximum allowed byte length for the operand.
    /// * `require_minimal` - Enforce minimal encoding.
    ///
    /// # Returns
    /// `Ok(ScriptNumber)` or an error for an over-long or (when
    /// required) non-minimal encoding.
    pub fn from_bytes(
        bb: &[u8],
        max_len: usize,
        require_minimal: bool,
    ) -> Result<Self, InterpreterError> {
        if bb.len() > max_len {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooBig,
                format!(
                    "numeric value encoded as {:02x?} is {} bytes which exceeds the max allowed of {}",
                    bb, bb.len(), max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bb)?;
        }

        if bb.is_empty() {
            return Ok(ScriptNumber(0));
        }

        // Decode from little endian with sign bit.
        let mut v: i64 = 0;
        for (i, &b) in bb.iter().enumerate() {
            if i == bb.len() - 1 {
                v |= ((b & 0x7f) as i64) << (8 * i);
            } else {
                v |= (b as i64) << (8 * i);
            }
        }

        if bb[bb.len() - 1] & 0x80 != 0 {
            v = -v;
        }

        Ok(ScriptNumber(v))
    }

    /// Serialize the number to bytes in little-endian with sign bit.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.0 == 0 {
            return vec![];
        }

        let is_negative = self.0 < 0;
        let mut abs = self.0.unsigned_abs();

        let mut result: Vec<u8> = Vec::new();
        while abs > 0 {
            result.push((abs & 0xff) as u8);
            abs >>= 8;
        }

        // Handle the sign bit.
        let last = result.len() - 1;
        if result[last] & 0x80 != 0 {
            result.push(if is_negative { 0x80 } else { 0x00 });
        } else if is_negative {
            result[last] |= 0x80;
        }

        result
    }

    /// Return the raw i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Return true if this number is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert to i32, clamping out-of-range values.
    pub fn to_i32(&self) -> i32 {
        if self.0 > i32::MAX as i64 {
            i32::MAX
        } else if self.0 < i32::MIN as i64 {
            i32::MIN
        } else {
            self.0 as i32
        }
    }
}

impl std::ops::Add for ScriptNumber {
    type Output = ScriptNumber;
    fn add(self, rhs: Self) -> Self {
        ScriptNumber(self.0 + rhs.0)
    }
}

impl std::ops::Sub for ScriptNumber {
    type Output = ScriptNumber;
    fn sub(self, rhs: Self) -> Self {
        ScriptNumber(self.0 - rhs.0)
    }
}

impl std::ops::Neg for ScriptNumber {
    type Output = ScriptNumber;
    fn neg(self) -> Self {
        ScriptNumber(-self.0)
    }
}

/// Minimally encode a byte array (used by OP_BIN2NUM).
pub fn minimally_encode(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![];
    }

    let mut data = data.to_vec();
    let last = data[data.len() - 1];

    if last & 0x7f != 0 {
        return data;
    }

    if data.len() == 1 {
        return vec![];
    }

    if data[data.len() - 2] & 0x80 != 0 {
        return data;
    }

    let mut i = data.len() - 1;
    while i > 0 {
        if data[i - 1] != 0 {
            if data[i - 1] & 0x80 != 0 {
                data[i] = last;
                return data[..=i].to_vec();
            } else {
                data[i - 1] |= last;
                return data[..i].to_vec();
            }
        }
        i -= 1;
    }

    vec![]
}

/// Check that a byte array uses minimal numeric encoding.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), InterpreterError> {
    if v.is_empty() {
        return Ok(());
    }

    if v[v.len() - 1] & 0x7f == 0 {
        if v.len() == 1 || v[v.len() - 2] & 0x80 == 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::MinimalData,
                format!(
                    "numeric value encoded as {:02x?} is not minimally encoded",
                    v
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_script_num_bytes() {
        let tests: Vec<(i64, Vec<u8>)> = vec![
            (0, vec![]),
            (1, hex_to_bytes("01")),
            (-1, hex_to_bytes("81")),
            (127, hex_to_bytes("7f")),
            (-127, hex_to_bytes("ff")),
            (128, hex_to_bytes("8000")),
            (-128, hex_to_bytes("8080")),
            (129, hex_to_bytes("8100")),
            (-129, hex_to_bytes("8180")),
            (256, hex_to_bytes("0001")),
            (-256, hex_to_bytes("0081")),
            (32767, hex_to_bytes("ff7f")),
            (-32767, hex_to_bytes("ffff")),
            (32768, hex_to_bytes("008000")),
            (-32768, hex_to_bytes("008080")),
            (65535, hex_to_bytes("ffff00")),
            (-65535, hex_to_bytes("ffff80")),
            (8388608, hex_to_bytes("00008000")),
            (-8388608, hex_to_bytes("00008080")),
            (2147483647, hex_to_bytes("ffffff7f")),
            (-2147483647, hex_to_bytes("ffffffff")),
            // 5-byte results from arithmetic overflow stay representable.
            (2147483648, hex_to_bytes("0000008000")),
            (-2147483648, hex_to_bytes("0000008080")),
            (4294967295, hex_to_bytes("ffffffff00")),
            (-4294967295, hex_to_bytes("ffffffff80")),
        ];

        for (num, expected) in &tests {
            let got = ScriptNumber::new(*num).to_bytes();
            assert_eq!(
                &got, expected,
                "to_bytes: num={}, got={:02x?}, want={:02x?}",
                num, got, expected
            );
        }
    }

    #[test]
    fn test_make_script_num() {
        struct Test {
            serialized: Vec<u8>,
            num: i64,
            num_len: usize,
            minimal_encoding: bool,
            expect_err: bool,
        }

        let tests = vec![
            // Minimal encoding rejects negative zero.
            Test { serialized: hex_to_bytes("80"), num: 0, num_len: 4, minimal_encoding: true, expect_err: true },
            // Valid minimally encoded values.
            Test { serialized: vec![], num: 0, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("01"), num: 1, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("81"), num: -1, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("7f"), num: 127, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("ff"), num: -127, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("8000"), num: 128, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("8080"), num: -128, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("0001"), num: 256, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffff7f"), num: 2147483647, num_len: 4, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffffff"), num: -2147483647, num_len: 4, minimal_encoding: true, expect_err: false },
            // 5-byte numbers with a widened limit (locktime reads).
            Test { serialized: hex_to_bytes("ffffffff7f"), num: 549755813887, num_len: 5, minimal_encoding: true, expect_err: false },
            Test { serialized: hex_to_bytes("ffffffffff"), num: -549755813887, num_len: 5, minimal_encoding: true, expect_err: false },
            // Out of range for 4-byte operands.
            Test { serialized: hex_to_bytes("0000008000"), num: 0, num_len: 4, minimal_encoding: true, expect_err: true },
            // Non-minimally encoded with the flag set.
            Test { serialized: hex_to_bytes("00"), num: 0, num_len: 4, minimal_encoding: true, expect_err: true },
            Test { serialized: hex_to_bytes("0100"), num: 0, num_len: 4, minimal_encoding: true, expect_err: true },
            // Non-minimally encoded without the flag (accepted).
            Test { serialized: hex_to_bytes("00"), num: 0, num_len: 4, minimal_encoding: false, expect_err: false },
            Test { serialized: hex_to_bytes("0100"), num: 1, num_len: 4, minimal_encoding: false, expect_err: false },
        ];

        for test in &tests {
            let result = ScriptNumber::from_bytes(
                &test.serialized,
                test.num_len,
                test.minimal_encoding,
            );
            match result {
                Ok(sn) => {
                    assert!(
                        !test.expect_err,
                        "from_bytes({:02x?}): expected error",
                        test.serialized
                    );
                    assert_eq!(
                        sn.value(),
                        test.num,
                        "from_bytes({:02x?}): got {}, want {}",
                        test.serialized,
                        sn.value(),
                        test.num
                    );
                }
                Err(_) => {
                    assert!(
                        test.expect_err,
                        "from_bytes({:02x?}): unexpected error",
                        test.serialized
                    );
                }
            }
        }
    }

    /// Round-trip law over the full 4-byte operand range boundaries.
    #[test]
    fn test_roundtrip_is_minimal() {
        let values = [
            0i64, 1, -1, 127, -127, 128, -128, 255, -255, 256, -256,
            32767, -32767, 32768, -32768, 2147483647, -2147483647,
        ];
        for v in values {
            let bytes = ScriptNumber::new(v).to_bytes();
            assert!(check_minimal_data_encoding(&bytes).is_ok(), "non-minimal for {}", v);
            let back = ScriptNumber::from_bytes(&bytes, 4, true).unwrap();
            assert_eq!(back.value(), v);
        }
    }

    #[test]
    fn test_script_num_int32_clamp() {
        assert_eq!(ScriptNumber::new(2147483648).to_i32(), 2147483647);
        assert_eq!(ScriptNumber::new(-2147483649).to_i32(), -2147483648);
        assert_eq!(ScriptNumber::new(5).to_i32(), 5);
    }

    #[test]
    fn test_minimally_encode() {
        // Empty stays empty.
        assert_eq!(minimally_encode(&[]), Vec::<u8>::new());
        // Already minimal.
        assert_eq!(minimally_encode(&[0x7f]), vec![0x7f]);
        // Single zero byte becomes empty.
        assert_eq!(minimally_encode(&[0x00]), Vec::<u8>::new());
        // Negative zero becomes empty.
        assert_eq!(minimally_encode(&[0x80]), Vec::<u8>::new());
        // Trailing zero absorbed into the sign position.
        assert_eq!(minimally_encode(&[0x01, 0x00]), vec![0x01]);
        assert_eq!(minimally_encode(&[0xff, 0x00]), vec![0xff, 0x00]);
    }
}
