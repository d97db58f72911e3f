//! Alt-stack transfer and index-driven stack opcodes.
//!
//! The fixed-shape shuffles (OP_DROP, OP_DUP, OP_SWAP and friends)
//! dispatch directly onto the [`super::stack::Stack`] primitives from
//! the thread; the opcodes here need something more: moving items
//! between the two stacks, peeking a condition, or popping a runtime
//! depth operand.

use super::error::InterpreterError;
use super::thread::Thread;

impl<'a> Thread<'a> {
    /// OP_TOALTSTACK: move the top item onto the alt stack.
    pub(crate) fn op_to_alt_stack(&mut self) -> Result<(), InterpreterError> {
        let item = self.dstack.pop_byte_array()?;
        self.astack.push_byte_array(item);
        Ok(())
    }

    /// OP_FROMALTSTACK: move the alt stack's top back to the main stack.
    pub(crate) fn op_from_alt_stack(&mut self) -> Result<(), InterpreterError> {
        let item = self.astack.pop_byte_array()?;
        self.dstack.push_byte_array(item);
        Ok(())
    }

    /// OP_IFDUP: duplicate the top item only when it is truthy.
    pub(crate) fn op_ifdup(&mut self) -> Result<(), InterpreterError> {
        if self.dstack.peek_bool(0)? {
            let top = self.dstack.peek_byte_array(0)?;
            self.dstack.push_byte_array(top);
        }
        Ok(())
    }

    /// OP_PICK: pop a depth, then copy the item that far down to the top.
    pub(crate) fn op_pick(&mut self) -> Result<(), InterpreterError> {
        let depth = self.pop_stack_depth()?;
        self.dstack.pick_n(depth)
    }

    /// OP_ROLL: pop a depth, then move the item that far down to the top.
    pub(crate) fn op_roll(&mut self) -> Result<(), InterpreterError> {
        let depth = self.pop_stack_depth()?;
        self.dstack.roll_n(depth)
    }

    /// Pop the numeric operand OP_PICK and OP_ROLL take as a stack
    /// depth. Out-of-range depths surface from the stack primitive.
    fn pop_stack_depth(&mut self) -> Result<i32, InterpreterError> {
        Ok(self.dstack.pop_int()?.to_i32())
    }
}
