//! Arithmetic operations for the script interpreter.
//!
//! OP_MUL, OP_DIV, OP_MOD, OP_LSHIFT, and OP_RSHIFT are only reachable
//! when the extended-opcodes flag is active.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::parsed_opcode::ParsedOpcode;
use super::scriptnum::ScriptNumber;
use super::thread::Thread;

impl<'a> Thread<'a> {
    pub(crate) fn op_unary_int(
        &mut self,
        f: impl FnOnce(ScriptNumber) -> ScriptNumber,
    ) -> Result<(), InterpreterError> {
        let m = self.dstack.pop_int()?;
        self.dstack.push_int(f(m));
        Ok(())
    }

    pub(crate) fn op_not(&mut self) -> Result<(), InterpreterError> {
        let m = self.dstack.pop_int()?;
        let n = if m.is_zero() { 1i64 } else { 0 };
        self.dstack.push_int(ScriptNumber::new(n));
        Ok(())
    }

    pub(crate) fn op_0notequal(&mut self) -> Result<(), InterpreterError> {
        let m = self.dstack.pop_int()?;
        let n = if m.is_zero() { 0i64 } else { 1 };
        self.dstack.push_int(ScriptNumber::new(n));
        Ok(())
    }

    pub(crate) fn op_add(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v1 + v0);
        Ok(())
    }

    pub(crate) fn op_sub(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v1 - v0);
        Ok(())
    }

    pub(crate) fn op_mul(&mut self) -> Result<(), InterpreterError> {
        let n1 = self.dstack.pop_int()?;
        let n2 = self.dstack.pop_int()?;
        self.dstack.push_int(ScriptNumber::new(n1.value() * n2.value()));
        Ok(())
    }

    pub(crate) fn op_div(&mut self) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        if b.is_zero() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::DivByZero,
                "divide by zero".to_string(),
            ));
        }
        // i64 division truncates toward zero, matching consensus.
        self.dstack.push_int(ScriptNumber::new(a.value() / b.value()));
        Ok(())
    }

    pub(crate) fn op_mod(&mut self) -> Result<(), InterpreterError> {
        let b = self.dstack.pop_int()?;
        let a = self.dstack.pop_int()?;
        if b.is_zero() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ModByZero,
                "mod by zero".to_string(),
            ));
        }
        self.dstack.push_int(ScriptNumber::new(a.value() % b.value()));
        Ok(())
    }

    pub(crate) fn op_lshift(&mut self) -> Result<(), InterpreterError> {
        let num = self.dstack.pop_int()?;
        if num.value() < 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooSmall,
                "n less than 0".to_string(),
            ));
        }
        let n = num.value() as usize;
        let x = self.dstack.pop_byte_array()?;

        let bit_shift = n % 8;
        let byte_shift = n / 8;
        let masks: [u8; 8] = [0xFF, 0x7F, 0x3F, 0x1F, 0x0F, 0x07, 0x03, 0x01];
        let mask = masks[bit_shift];
        let overflow_mask = !mask;

        let mut result = vec![0u8; x.len()];
        for idx in (1..=x.len()).rev() {
            let i = idx - 1;
            if byte_shift <= i {
                let k = i - byte_shift;
                let val = (x[i] & mask) << bit_shift;
                result[k] |= val;
                if k >= 1 && bit_shift > 0 {
                    let carry = (x[i] & overflow_mask) >> (8 - bit_shift);
                    result[k - 1] |= carry;
                }
            }
        }
        self.dstack.push_byte_array(result);
        Ok(())
    }

    pub(crate) fn op_rshift(&mut self) -> Result<(), InterpreterError> {
        let num = self.dstack.pop_int()?;
        if num.value() < 0 {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NumberTooSmall,
                "n less than 0".to_string(),
            ));
        }
        let n = num.value() as usize;
        let x = self.dstack.pop_byte_array()?;

        let byte_shift = n / 8;
        let bit_shift = n % 8;
        let masks: [u8; 8] = [0xFF, 0xFE, 0xFC, 0xF8, 0xF0, 0xE0, 0xC0, 0x80];
        let mask = masks[bit_shift];
        let overflow_mask = !mask;

        let mut result = vec![0u8; x.len()];
        for (i, &b) in x.iter().enumerate() {
            let k = i + byte_shift;
            if k < x.len() {
                let val = (b & mask) >> bit_shift;
                result[k] |= val;
            }
            if k + 1 < x.len() && bit_shift > 0 {
                let carry = (b & overflow_mask) << (8 - bit_shift);
                result[k + 1] |= carry;
            }
        }
        self.dstack.push_byte_array(result);
        Ok(())
    }

    pub(crate) fn op_bool_binop(
        &mut self,
        f: impl FnOnce(ScriptNumber, ScriptNumber) -> bool,
    ) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        let n = if f(v1, v0) { 1i64 } else { 0 };
        self.dstack.push_int(ScriptNumber::new(n));
        Ok(())
    }

    pub(crate) fn op_numequalverify(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        self.op_bool_binop(|a, b| a == b)?;
        self.abstract_verify(pop, InterpreterErrorCode::NumEqualVerify)
    }

    pub(crate) fn op_min(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v0.min(v1));
        Ok(())
    }

    pub(crate) fn op_max(&mut self) -> Result<(), InterpreterError> {
        let v0 = self.dstack.pop_int()?;
        let v1 = self.dstack.pop_int()?;
        self.dstack.push_int(v0.max(v1));
        Ok(())
    }

    pub(crate) fn op_within(&mut self) -> Result<(), InterpreterError> {
        let max_val = self.dstack.pop_int()?;
        let min_val = self.dstack.pop_int()?;
        let x = self.dstack.pop_int()?;
        let n = if min_val <= x && x < max_val { 1i64 } else { 0 };
        self.dstack.push_int(ScriptNumber::new(n));
        Ok(())
    }
}
